//! Allocation scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! Service add event → module group identified
//!     → inventory (materialize pool snapshot: Vec<Backend>)
//!     → allocation.rs (resolve policy kind, strict-limit filter)
//!     → Apply selection policy:
//!         - first_available.rs (first candidate with capacity)
//!         - round_robin.rs (least loaded candidate)
//!     → capacity.rs (limit/total interpretation used by both)
//!     → Selection::Selected(row) or Selection::NoEligibleBackend
//! ```
//!
//! # Design Decisions
//! - Scheduler is stateless and pure; the store owns live totals
//! - Policies are a closed enum, each carrying a plain `fn` callback
//! - Strict-limit filtering and the round-robin at-limit tier stay separate;
//!   the latter is only reachable when the group does not force limits
//! - Running out of capacity is a value, not an error

pub mod allocation;
pub mod backend;
pub mod capacity;
pub mod error;
pub mod first_available;
pub mod policy;
pub mod round_robin;

pub use allocation::{AllocationScheduler, Selection};
pub use backend::{Backend, FieldMap, Limit, MetaValue, RowId};
pub use error::{ExtractError, MalformedField, SchedulerError};
pub use policy::{PolicyKind, SelectionPolicy};
