//! Gateway API types shared between module registration and the routing core
//!
//! This library defines the serialized shapes handled by the gateway:
//! - RoutingEntrySpec: one declared route of a module (methods, path pattern, ordering hints)
//! - ModuleDescriptor: the set of routing entries a module provides
//! - TenantDescriptor: identity and metadata of a tenant

pub mod module;
pub mod routing_entry;
pub mod tenant;

pub use module::{module_descriptor_schema, ModuleDescriptor};
pub use routing_entry::{EntryType, Phase, ProxyType, RoutingEntrySpec, TokenError};
pub use tenant::TenantDescriptor;
