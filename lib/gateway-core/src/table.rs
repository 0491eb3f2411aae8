//! Routing table of compiled entries, keyed by owning module

use crate::entry::{RoutingEntry, Section};
use crate::{CoreConfig, CoreError, Result};
use gateway_api::ModuleDescriptor;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// An entry that matched a request, with the module serving it
#[derive(Clone, Debug)]
pub struct RouteMatch {
    pub module_id: Arc<str>,
    pub entry: Arc<RoutingEntry>,
}

struct ModuleRoutes {
    module_id: Arc<str>,
    entries: Vec<Arc<RoutingEntry>>,
}

/// RoutingTable holds the compiled entries of every registered module.
///
/// Entries are compiled and validated when a module is registered; a module
/// with any malformed entry is rejected as a whole and never becomes visible.
pub struct RoutingTable {
    // Map of module id to its compiled entries
    modules: Arc<RwLock<BTreeMap<String, ModuleRoutes>>>,
    strict: bool,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            modules: Arc::new(RwLock::new(BTreeMap::new())),
            strict: config.strict_validation,
        }
    }

    fn compile(&self, module: &ModuleDescriptor) -> Result<ModuleRoutes> {
        let entries = module
            .routing_entries
            .iter()
            .map(|spec| {
                RoutingEntry::compile_with(spec.clone(), self.strict, Section::TopLevel).map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ModuleRoutes {
            module_id: Arc::from(module.id.as_str()),
            entries,
        })
    }

    /// Compile and install the entries of a new module.
    ///
    /// Fails if the module id is already registered or any entry is invalid.
    /// Returns the number of installed entries.
    pub fn register_module(&self, module: &ModuleDescriptor) -> Result<usize> {
        let routes = self.compile(module)?;
        let count = routes.entries.len();

        let mut modules = self.modules.write();
        if modules.contains_key(&module.id) {
            return Err(CoreError::DuplicateModule(module.id.clone()));
        }
        modules.insert(module.id.clone(), routes);

        info!(module_id = %module.id, entries = count, "Registered module routes");
        Ok(count)
    }

    /// Compile and install the entries of a module, replacing any previous set.
    /// On error the previous entries stay in place.
    pub fn replace_module(&self, module: &ModuleDescriptor) -> Result<usize> {
        let routes = self.compile(module)?;
        let count = routes.entries.len();
        self.modules.write().insert(module.id.clone(), routes);

        info!(module_id = %module.id, entries = count, "Replaced module routes");
        Ok(count)
    }

    /// Drop the entries of a module. Returns false if it was not registered
    pub fn remove_module(&self, module_id: &str) -> bool {
        let removed = self.modules.write().remove(module_id).is_some();
        if removed {
            info!(module_id, "Removed module routes");
        } else {
            debug!(module_id, "Module not registered, nothing to remove");
        }
        removed
    }

    pub fn module_ids(&self) -> Vec<String> {
        self.modules.read().keys().cloned().collect()
    }

    /// Entries of one module in declaration order
    pub fn entries(&self, module_id: &str) -> Option<Vec<Arc<RoutingEntry>>> {
        self.modules
            .read()
            .get(module_id)
            .map(|routes| routes.entries.clone())
    }

    /// Total number of installed entries
    pub fn len(&self) -> usize {
        self.modules.read().values().map(|r| r.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries of `enabled` modules that match the request, in pipeline order.
    ///
    /// Ordered by phase level; equal levels keep module id order, then
    /// declaration order.
    pub fn matching(
        &self,
        uri: &str,
        method: Option<&str>,
        enabled: &BTreeSet<String>,
    ) -> Vec<RouteMatch> {
        let modules = self.modules.read();
        let mut matched: Vec<RouteMatch> = enabled
            .iter()
            .filter_map(|module_id| modules.get(module_id))
            .flat_map(|routes| {
                routes
                    .entries
                    .iter()
                    .filter(move |entry| entry.matches(uri, method))
                    .map(move |entry| RouteMatch {
                        module_id: routes.module_id.clone(),
                        entry: entry.clone(),
                    })
            })
            .collect();
        drop(modules);

        matched.sort_by(|a, b| a.entry.phase_level().cmp(&b.entry.phase_level()));
        matched
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}
