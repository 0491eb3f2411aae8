//! Tenant state held by the registry

use chrono::{DateTime, Utc};
use gateway_api::TenantDescriptor;
use std::collections::BTreeSet;

/// A tenant and the modules currently enabled for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tenant {
    pub descriptor: TenantDescriptor,
    enabled: BTreeSet<String>,
    /// Last modification of the descriptor, if recorded
    pub timestamp: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn new(descriptor: TenantDescriptor) -> Self {
        Self::with_modules(descriptor, BTreeSet::new())
    }

    pub fn with_modules(descriptor: TenantDescriptor, enabled: BTreeSet<String>) -> Self {
        Self {
            descriptor,
            enabled,
            timestamp: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }

    /// Enable a module. Enabling twice is not an error
    pub fn enable_module(&mut self, module_id: impl Into<String>) {
        self.enabled.insert(module_id.into());
    }

    /// Disable a module, returning whether it was enabled
    pub fn disable_module(&mut self, module_id: &str) -> bool {
        self.enabled.remove(module_id)
    }

    pub fn is_enabled(&self, module_id: &str) -> bool {
        self.enabled.contains(module_id)
    }

    pub fn list_modules(&self) -> &BTreeSet<String> {
        &self.enabled
    }
}
