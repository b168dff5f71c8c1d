//! Module Group Allocator Library
//!
//! Picks which module row (server, reseller account, API endpoint) of a
//! module group should service a newly provisioned service, honoring each
//! row's capacity limit and the group's selection policy.

pub mod config;
pub mod inventory;
pub mod lifecycle;
pub mod observability;
pub mod scheduler;

pub use config::schema::AllocatorConfig;
pub use inventory::Inventory;
pub use scheduler::{AllocationScheduler, Backend, PolicyKind, RowId, Selection};
