//! Round-robin (least loaded) selection strategy.
//!
//! There is no rotating cursor. Each call picks the least loaded candidate;
//! rotation emerges because the store bumps the winner's total after every
//! allocation and the next call sees the updated pool.

use std::cmp::Ordering;

use crate::scheduler::backend::Backend;
use crate::scheduler::capacity::{is_at_or_over_limit, overage};
use crate::scheduler::error::ExtractError;

/// Three-way comparator; `Less` means the left backend is preferred.
pub type Comparator = fn(&Backend, &Backend) -> Ordering;

/// Default load comparator.
///
/// 1. A backend with headroom always beats one at or over its limit.
/// 2. Two saturated backends compare by overage (`total - limit`).
/// 3. Otherwise raw totals compare; the smaller total is preferred.
pub fn compare_load(left: &Backend, right: &Backend) -> Ordering {
    let left_full = is_at_or_over_limit(left);
    let right_full = is_at_or_over_limit(right);

    match (left_full, right_full) {
        (true, true) => overage(left).cmp(&overage(right)),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.total.cmp(&right.total),
    }
}

/// Least-loaded selector.
#[derive(Debug, Clone)]
pub struct RoundRobin<'a> {
    candidates: Vec<&'a Backend>,
    compare: Comparator,
}

impl<'a> RoundRobin<'a> {
    pub fn new(compare: Comparator) -> Self {
        Self {
            candidates: Vec::new(),
            compare,
        }
    }

    pub fn insert(&mut self, backend: &'a Backend) {
        self.candidates.push(backend);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Single linear scan keeping the running best.
    /// In case of tie, the earliest inserted candidate is selected.
    pub fn extract(&self) -> Result<&'a Backend, ExtractError> {
        self.candidates
            .iter()
            .copied()
            .min_by(|a, b| (self.compare)(a, b))
            .ok_or(ExtractError::Empty)
    }
}

impl Default for RoundRobin<'_> {
    fn default() -> Self {
        Self::new(compare_load)
    }
}
