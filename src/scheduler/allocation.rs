//! Allocation scheduler: the single entry point for picking a module row.
//!
//! # Responsibilities
//! - Resolve the policy kind named by the caller
//! - Pre-exclude saturated backends when the group enforces strict limits
//! - Feed candidates to the policy and report the chosen row

use serde::{Deserialize, Serialize};

use crate::scheduler::backend::{Backend, RowId};
use crate::scheduler::capacity::is_at_or_over_limit;
use crate::scheduler::error::SchedulerError;
use crate::scheduler::policy::{PolicyKind, SelectionPolicy};

/// Outcome of one scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// The row that should service the request.
    Selected(RowId),
    /// Empty pool, or nothing with room. A normal outcome.
    NoEligibleBackend,
}

impl Selection {
    pub fn id(&self) -> Option<RowId> {
        match self {
            Selection::Selected(id) => Some(*id),
            Selection::NoEligibleBackend => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selection::Selected(_))
    }
}

/// Stateless scheduler. Every call is independent of the previous ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationScheduler;

impl AllocationScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Select a backend using a policy named by string (`"first"` or `"roundrobin"`).
    ///
    /// An empty pool short-circuits to `NoEligibleBackend` before the policy
    /// name is looked at.
    pub fn select(
        &self,
        pool: &[Backend],
        policy_kind: &str,
        strict_limits: bool,
    ) -> Result<Selection, SchedulerError> {
        if pool.is_empty() {
            return Ok(Selection::NoEligibleBackend);
        }

        let kind: PolicyKind = policy_kind.parse()?;
        Ok(self.select_with(pool, kind, strict_limits))
    }

    /// Select a backend with an already resolved policy kind.
    pub fn select_with(&self, pool: &[Backend], kind: PolicyKind, strict_limits: bool) -> Selection {
        if pool.is_empty() {
            return Selection::NoEligibleBackend;
        }

        let mut policy = SelectionPolicy::for_kind(kind);
        for backend in pool {
            if strict_limits && is_at_or_over_limit(backend) {
                tracing::trace!(row = %backend.id, total = backend.total, "Skipping saturated backend");
                continue;
            }
            policy.insert(backend);
        }

        match policy.extract() {
            Ok(backend) => {
                tracing::debug!(
                    policy = %kind,
                    strict = strict_limits,
                    pool_size = pool.len(),
                    candidates = policy.len(),
                    row = %backend.id,
                    "Backend selected"
                );
                Selection::Selected(backend.id)
            }
            Err(reason) => {
                tracing::debug!(
                    policy = %kind,
                    strict = strict_limits,
                    pool_size = pool.len(),
                    candidates = policy.len(),
                    %reason,
                    "No eligible backend"
                );
                Selection::NoEligibleBackend
            }
        }
    }
}
