//! Core routing and tenant registry functionality
//!
//! This library provides:
//! - Path pattern compilation and request matching for routing entries
//! - Routing table of compiled entries per module, ordered by phase level
//! - Tenant registry tracking which modules each tenant has enabled
//! - Router resolving a tenant's request to its pipeline, following redirects

pub mod config;
pub mod entry;
pub mod error;
pub mod pattern;
pub mod registry;
pub mod router;
pub mod table;
pub mod tenant;

pub use config::CoreConfig;
pub use entry::{validate, PhaseLevel, RoutingEntry, Section};
pub use error::{CoreError, ErrorKind, Result};
pub use pattern::{PathPattern, PatternError};
pub use registry::{AllowAll, ModuleGate, TenantRegistry};
pub use router::{Resolution, Router};
pub use table::{RouteMatch, RoutingTable};
pub use tenant::Tenant;
