//! Routing core configuration

use crate::Result;
use serde::{Deserialize, Serialize};

/// Settings of the routing core.
///
/// All fields have defaults so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Reject legacy `path` entries instead of logging a warning
    pub strict_validation: bool,

    /// Maximum number of redirect rewrites followed for one request
    pub max_redirects: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            strict_validation: false,
            max_redirects: 5,
        }
    }
}

impl CoreConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
