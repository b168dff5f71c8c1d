//! Module group inventory subsystem.
//!
//! # Data Flow
//! ```text
//! AllocatorConfig (groups + rows)
//!     → store.rs (Inventory: group name → settings + rows)
//!
//! Service add:
//!     allocate(group)
//!         → lock group entry
//!         → row.rs (rows → Backend snapshots, malformed rows skipped)
//!         → scheduler::AllocationScheduler::select
//!         → bump chosen row's total field
//!         → unlock
//!
//! Service cancel:
//!     release(group, row) → decrement total field
//! ```
//!
//! # Design Decisions
//! - Select and commit happen under one per-group lock
//! - Totals are written back into the row meta under the group's field name
//! - Reload keeps live totals for rows that still exist

pub mod row;
pub mod store;

pub use row::{GroupSettings, ModuleRow};
pub use store::{GroupSummary, Inventory, InventoryError};
