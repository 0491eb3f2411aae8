//! Router for resolving requests to the ordered entries of a tenant's pipeline

use crate::table::{RouteMatch, RoutingTable};
use crate::{CoreConfig, CoreError, Result, TenantRegistry};
use gateway_api::ProxyType;
use std::sync::Arc;
use tracing::debug;

/// The pipeline to run for a request
#[derive(Clone, Debug)]
pub struct Resolution {
    /// URI after redirect rewrites
    pub uri: String,
    /// Matching entries in execution order
    pub pipeline: Vec<RouteMatch>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }
}

/// Router for matching requests against the routing table, limited to the
/// modules the requesting tenant has enabled
pub struct Router {
    table: Arc<RoutingTable>,
    tenants: Arc<TenantRegistry>,
    config: CoreConfig,
}

impl Router {
    pub fn new(table: Arc<RoutingTable>, tenants: Arc<TenantRegistry>, config: CoreConfig) -> Self {
        Self {
            table,
            tenants,
            config,
        }
    }

    /// Build the pipeline for a request of `tenant_id`.
    ///
    /// When the pipeline contains a redirect entry, nothing is executed for the
    /// current URI: routing starts over with the rewritten URI, up to
    /// `max_redirects` times.
    pub fn resolve(&self, tenant_id: &str, method: &str, uri: &str) -> Result<Resolution> {
        let enabled = self
            .tenants
            .list_modules(tenant_id)
            .ok_or_else(|| CoreError::TenantNotFound(tenant_id.to_string()))?;

        let mut uri = uri.to_string();
        let mut redirects = 0;
        loop {
            let pipeline = self.table.matching(&uri, Some(method), &enabled);
            let position = pipeline
                .iter()
                .position(|m| m.entry.proxy_type() == ProxyType::Redirect);

            let Some(position) = position else {
                debug!(tenant_id, %uri, entries = pipeline.len(), "Resolved pipeline");
                return Ok(Resolution { uri, pipeline });
            };
            let redirect = &pipeline[position];

            if redirects == self.config.max_redirects {
                return Err(CoreError::RedirectLoop {
                    uri,
                    limit: self.config.max_redirects,
                });
            }
            let target = redirect.entry.redirect_uri(&uri).ok_or_else(|| CoreError::InvalidEntry {
                section: redirect.module_id.to_string(),
                reason: "Redirect entry without redirectPath".to_string(),
            })?;
            debug!(tenant_id, from = %uri, to = %target, module_id = %redirect.module_id, "Following redirect");
            uri = target;
            redirects += 1;
        }
    }

    pub fn table(&self) -> &Arc<RoutingTable> {
        &self.table
    }

    pub fn tenants(&self) -> &Arc<TenantRegistry> {
        &self.tenants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tenant;
    use gateway_api::{EntryType, ModuleDescriptor, RoutingEntrySpec, TenantDescriptor};

    fn redirect(pattern: &str, target: &str) -> RoutingEntrySpec {
        let mut spec = RoutingEntrySpec::pattern(["*"], pattern);
        spec.entry_type = Some(EntryType::Redirect);
        spec.redirect_path = Some(target.to_string());
        spec
    }

    fn router(max_redirects: usize) -> Router {
        let table = Arc::new(RoutingTable::new());
        table
            .register_module(&ModuleDescriptor::new(
                "items",
                vec![
                    RoutingEntrySpec::pattern(["GET"], "/items/{id}"),
                    redirect("/legacy/items/{id}", "/items/{id}"),
                    redirect("/loop/a", "/loop/b"),
                    redirect("/loop/b", "/loop/a"),
                ],
            ))
            .unwrap();

        let tenants = Arc::new(TenantRegistry::new());
        tenants.insert(Tenant::new(TenantDescriptor::new("acme", "Acme")));
        tenants.enable_module("acme", "items");
        tenants.insert(Tenant::new(TenantDescriptor::new("empty", "Empty")));

        let config = CoreConfig {
            max_redirects,
            ..Default::default()
        };
        Router::new(table, tenants, config)
    }

    #[test]
    fn test_resolve_direct() {
        let resolution = router(5).resolve("acme", "GET", "/items/3").unwrap();
        assert_eq!(resolution.uri, "/items/3");
        assert_eq!(resolution.pipeline.len(), 1);
        assert_eq!(&*resolution.pipeline[0].module_id, "items");
    }

    #[test]
    fn test_resolve_follows_redirect() {
        let resolution = router(5).resolve("acme", "GET", "/legacy/items/3?full=1").unwrap();
        assert_eq!(resolution.uri, "/items/3?full=1");
        assert_eq!(resolution.pipeline.len(), 1);
        assert_eq!(resolution.pipeline[0].entry.proxy_type(), ProxyType::RequestResponse);
    }

    #[test]
    fn test_resolve_redirect_loop() {
        let err = router(3).resolve("acme", "GET", "/loop/a").unwrap_err();
        assert!(matches!(err, CoreError::RedirectLoop { limit: 3, .. }));
    }

    #[test]
    fn test_resolve_redirects_disabled() {
        let err = router(0).resolve("acme", "GET", "/legacy/items/3").unwrap_err();
        assert!(matches!(err, CoreError::RedirectLoop { limit: 0, .. }));
    }

    #[test]
    fn test_resolve_unknown_tenant() {
        let err = router(5).resolve("nobody", "GET", "/items/3").unwrap_err();
        assert!(matches!(err, CoreError::TenantNotFound(id) if id == "nobody"));
    }

    #[test]
    fn test_resolve_tenant_without_modules() {
        let resolution = router(5).resolve("empty", "GET", "/items/3").unwrap();
        assert!(resolution.is_empty());
    }

    #[test]
    fn test_resolve_method_mismatch() {
        let resolution = router(5).resolve("acme", "DELETE", "/items/3").unwrap();
        assert!(resolution.is_empty());
    }
}
