use crate::RoutingEntrySpec;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Routing entries provided by one module
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module identifier, e.g. "users-1.2.0"
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Routes served by this module
    #[serde(default)]
    pub routing_entries: Vec<RoutingEntrySpec>,
}

impl ModuleDescriptor {
    pub fn new(id: impl Into<String>, routing_entries: Vec<RoutingEntrySpec>) -> Self {
        Self {
            id: id.into(),
            name: None,
            routing_entries,
        }
    }
}

/// JSON schema for authoring module descriptors
pub fn module_descriptor_schema() -> RootSchema {
    schemars::schema_for!(ModuleDescriptor)
}
