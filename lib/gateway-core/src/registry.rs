//! Tenant registry tracking which modules each tenant has enabled

use crate::{ErrorKind, Tenant};
use chrono::{DateTime, Utc};
use gateway_api::TenantDescriptor;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Hook consulted before a module is enabled for a tenant
pub trait ModuleGate: Send + Sync {
    /// Return false to refuse enabling `module_id` for `tenant_id`
    fn permits(&self, tenant_id: &str, module_id: &str) -> bool;
}

/// Gate that permits every module
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl ModuleGate for AllowAll {
    fn permits(&self, _tenant_id: &str, _module_id: &str) -> bool {
        true
    }
}

/// TenantRegistry maintains the tenants known to this node.
///
/// Each operation takes the lock once, so concurrent readers never see a
/// half-applied change. Expected conditions are reported as `bool`,
/// `Option` or [`ErrorKind`], never as errors.
pub struct TenantRegistry {
    // Map of tenant id to tenant
    tenants: Arc<RwLock<HashMap<String, Tenant>>>,
    gate: Arc<dyn ModuleGate>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::with_gate(Arc::new(AllowAll))
    }

    pub fn with_gate(gate: Arc<dyn ModuleGate>) -> Self {
        Self {
            tenants: Arc::new(RwLock::new(HashMap::new())),
            gate,
        }
    }

    /// Add a tenant. Returns false if the id is taken
    pub fn insert(&self, tenant: Tenant) -> bool {
        let mut tenants = self.tenants.write();
        if tenants.contains_key(tenant.id()) {
            debug!(tenant_id = tenant.id(), "Not inserting duplicate tenant");
            return false;
        }
        debug!(tenant_id = tenant.id(), "Inserted tenant");
        tenants.insert(tenant.id().to_string(), tenant);
        true
    }

    /// Replace a tenant, enabled modules included. Returns false if unknown
    pub fn update(&self, tenant: Tenant) -> bool {
        let mut tenants = self.tenants.write();
        match tenants.get_mut(tenant.id()) {
            Some(existing) => {
                *existing = tenant;
                true
            }
            None => {
                debug!(tenant_id = tenant.id(), "Tenant not found, can not update");
                false
            }
        }
    }

    /// Replace the descriptor of a tenant, keeping its enabled modules.
    ///
    /// Returns false if the tenant is unknown or the descriptor names another id.
    pub fn update_descriptor(
        &self,
        id: &str,
        descriptor: TenantDescriptor,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if descriptor.id != id {
            debug!(tenant_id = id, descriptor_id = %descriptor.id, "Descriptor id mismatch, can not update descriptor");
            return false;
        }
        let mut tenants = self.tenants.write();
        let Some(existing) = tenants.get_mut(id) else {
            debug!(tenant_id = id, "Tenant not found, can not update descriptor");
            return false;
        };
        let mut tenant = Tenant::with_modules(descriptor, existing.list_modules().clone());
        tenant.set_timestamp(timestamp);
        *existing = tenant;
        true
    }

    /// Remove a tenant. Returns false if unknown
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.tenants.write().remove(id).is_some();
        if removed {
            debug!(tenant_id = id, "Deleted tenant");
        } else {
            debug!(tenant_id = id, "Tenant not found, can not delete");
        }
        removed
    }

    pub fn get_ids(&self) -> BTreeSet<String> {
        self.tenants.read().keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Tenant> {
        self.tenants.read().get(id).cloned()
    }

    /// Enable a module for a tenant.
    ///
    /// `NotFound` if the tenant is unknown, `User` if the module gate refuses.
    /// Enabling an already enabled module is `Ok`.
    pub fn enable_module(&self, id: &str, module_id: &str) -> ErrorKind {
        let mut tenants = self.tenants.write();
        let Some(tenant) = tenants.get_mut(id) else {
            return ErrorKind::NotFound;
        };
        if !self.gate.permits(id, module_id) {
            debug!(tenant_id = id, module_id, "Module gate refused module");
            return ErrorKind::User;
        }
        tenant.enable_module(module_id);
        debug!(tenant_id = id, module_id, "Enabled module");
        ErrorKind::Ok
    }

    /// Disable a module for a tenant.
    ///
    /// `User` if the tenant is unknown, `NotFound` if the module is not enabled.
    pub fn disable_module(&self, id: &str, module_id: &str) -> ErrorKind {
        let mut tenants = self.tenants.write();
        let Some(tenant) = tenants.get_mut(id) else {
            return ErrorKind::User;
        };
        if tenant.disable_module(module_id) {
            debug!(tenant_id = id, module_id, "Disabled module");
            ErrorKind::Ok
        } else {
            ErrorKind::NotFound
        }
    }

    /// Enabled modules of a tenant, `None` if the tenant is unknown
    pub fn list_modules(&self, id: &str) -> Option<BTreeSet<String>> {
        self.tenants
            .read()
            .get(id)
            .map(|tenant| tenant.list_modules().clone())
    }

    pub fn is_enabled(&self, id: &str, module_id: &str) -> bool {
        self.tenants
            .read()
            .get(id)
            .is_some_and(|tenant| tenant.is_enabled(module_id))
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.read().len()
    }
}

impl Default for TenantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
