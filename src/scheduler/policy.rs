//! Policy kinds and the tagged policy instance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scheduler::backend::Backend;
use crate::scheduler::error::{ExtractError, SchedulerError};
use crate::scheduler::first_available::FirstAvailable;
use crate::scheduler::round_robin::RoundRobin;

/// Selection strategy named by a group's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(rename = "first")]
    First,
    #[serde(rename = "roundrobin")]
    RoundRobin,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::First => "first",
            PolicyKind::RoundRobin => "roundrobin",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "first" => Ok(PolicyKind::First),
            "roundrobin" => Ok(PolicyKind::RoundRobin),
            _ => Err(SchedulerError::UnsupportedPolicy(s.to_string())),
        }
    }
}

/// A policy instance with its default callback attached.
#[derive(Debug, Clone)]
pub enum SelectionPolicy<'a> {
    FirstAvailable(FirstAvailable<'a>),
    RoundRobin(RoundRobin<'a>),
}

impl<'a> SelectionPolicy<'a> {
    /// Build the policy for `kind` with the capacity-rule callback.
    pub fn for_kind(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::First => SelectionPolicy::FirstAvailable(FirstAvailable::default()),
            PolicyKind::RoundRobin => SelectionPolicy::RoundRobin(RoundRobin::default()),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            SelectionPolicy::FirstAvailable(_) => PolicyKind::First,
            SelectionPolicy::RoundRobin(_) => PolicyKind::RoundRobin,
        }
    }

    pub fn insert(&mut self, backend: &'a Backend) {
        match self {
            SelectionPolicy::FirstAvailable(p) => p.insert(backend),
            SelectionPolicy::RoundRobin(p) => p.insert(backend),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SelectionPolicy::FirstAvailable(p) => p.len(),
            SelectionPolicy::RoundRobin(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extract(&self) -> Result<&'a Backend, ExtractError> {
        match self {
            SelectionPolicy::FirstAvailable(p) => p.extract(),
            SelectionPolicy::RoundRobin(p) => p.extract(),
        }
    }
}
