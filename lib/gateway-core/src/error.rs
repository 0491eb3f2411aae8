use crate::pattern::PatternError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid pathPattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("Invalid routing entry in {section}: {reason}")]
    InvalidEntry { section: String, reason: String },

    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Redirect limit of {limit} exceeded at {uri}")]
    RedirectLoop { uri: String, limit: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] serde_yaml::Error),
}

/// Outcome of tenant module operations.
///
/// Expected conditions (missing tenant, module not enabled) are reported
/// through this value rather than as errors; the web-service layer decides
/// how to present them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Ok,
    NotFound,
    User,
    Internal,
}

impl ErrorKind {
    pub fn is_ok(&self) -> bool {
        matches!(self, ErrorKind::Ok)
    }

    /// HTTP status a web-service layer would typically answer with
    pub fn status_hint(&self) -> u16 {
        match self {
            ErrorKind::Ok => 200,
            ErrorKind::NotFound => 404,
            ErrorKind::User => 400,
            ErrorKind::Internal => 500,
        }
    }
}
