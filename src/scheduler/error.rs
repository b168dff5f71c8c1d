//! Scheduler error types.

use thiserror::Error;

/// Errors surfaced by [`AllocationScheduler`](crate::scheduler::AllocationScheduler).
///
/// Running out of capacity is not an error; it is reported as
/// [`Selection::NoEligibleBackend`](crate::scheduler::Selection::NoEligibleBackend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The requested policy kind does not name a known strategy.
    #[error("unsupported policy kind: {0:?}")]
    UnsupportedPolicy(String),
}

/// Why a policy could not produce a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Nothing was inserted.
    #[error("no candidates were inserted")]
    Empty,

    /// Candidates exist but none passed the eligibility predicate.
    #[error("no candidate satisfied the eligibility predicate")]
    NoEligibleCandidate,
}

/// A limit or total value that is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field {field:?} holds non-numeric value {value:?}")]
pub struct MalformedField {
    pub field: String,
    pub value: String,
}
