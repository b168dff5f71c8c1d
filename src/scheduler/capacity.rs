//! Capacity rule shared by every policy.
//!
//! `has_capacity` uses `total < limit` and `is_at_or_over_limit` uses
//! `total >= limit`, so a backend with `total == limit` is full under both.

use crate::scheduler::backend::{Backend, Limit};

/// True if the backend can take one more unit.
pub fn has_capacity(backend: &Backend) -> bool {
    match backend.limit {
        Limit::Unlimited => true,
        Limit::AtMost(limit) => backend.total < limit,
    }
}

/// True if the backend has a limit and has reached or passed it.
pub fn is_at_or_over_limit(backend: &Backend) -> bool {
    match backend.limit {
        Limit::Unlimited => false,
        Limit::AtMost(limit) => backend.total >= limit,
    }
}

/// How far past its limit a backend is (`total - limit`), zero when under.
/// Unlimited backends are never over.
pub fn overage(backend: &Backend) -> u64 {
    match backend.limit {
        Limit::Unlimited => 0,
        Limit::AtMost(limit) => backend.total.saturating_sub(limit),
    }
}
