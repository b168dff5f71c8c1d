//! First-available selection strategy.

use crate::scheduler::backend::Backend;
use crate::scheduler::capacity;
use crate::scheduler::error::ExtractError;

/// Eligibility predicate consulted at extraction time.
pub type Predicate = fn(&Backend) -> bool;

/// First-available selector.
/// Returns the earliest inserted candidate that passes the predicate.
#[derive(Debug, Clone)]
pub struct FirstAvailable<'a> {
    candidates: Vec<&'a Backend>,
    eligible: Predicate,
}

impl<'a> FirstAvailable<'a> {
    pub fn new(eligible: Predicate) -> Self {
        Self {
            candidates: Vec::new(),
            eligible,
        }
    }

    /// Append a candidate. Eligibility is not checked here.
    pub fn insert(&mut self, backend: &'a Backend) {
        self.candidates.push(backend);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Scan in insertion order; first match wins.
    pub fn extract(&self) -> Result<&'a Backend, ExtractError> {
        if self.candidates.is_empty() {
            return Err(ExtractError::Empty);
        }

        self.candidates
            .iter()
            .copied()
            .find(|b| (self.eligible)(b))
            .ok_or(ExtractError::NoEligibleCandidate)
    }
}

impl Default for FirstAvailable<'_> {
    fn default() -> Self {
        Self::new(capacity::has_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_available() {
        let full = Backend::new(1, Some(2), 2);
        let open = Backend::new(2, Some(5), 4);
        let later = Backend::new(3, None, 0);

        let mut policy = FirstAvailable::default();
        policy.insert(&full);
        policy.insert(&open);
        policy.insert(&later);

        // Should skip 1 (full) and pick 2 even though 3 is emptier
        assert_eq!(policy.extract().unwrap().id, open.id);
        // Extraction does not consume candidates
        assert_eq!(policy.extract().unwrap().id, open.id);
        assert_eq!(policy.len(), 3);
    }

    #[test]
    fn test_first_available_none_eligible() {
        let a = Backend::new(1, Some(0), 0);
        let b = Backend::new(2, Some(3), 7);

        let mut policy = FirstAvailable::default();
        policy.insert(&a);
        policy.insert(&b);

        assert_eq!(policy.extract(), Err(ExtractError::NoEligibleCandidate));
    }

    #[test]
    fn test_first_available_empty() {
        let policy = FirstAvailable::default();
        assert!(policy.is_empty());
        assert_eq!(policy.extract(), Err(ExtractError::Empty));
    }

    #[test]
    fn test_custom_predicate() {
        fn even_only(b: &Backend) -> bool {
            b.id.0 % 2 == 0
        }

        let a = Backend::new(1, None, 0);
        let b = Backend::new(4, Some(1), 9);

        let mut policy = FirstAvailable::new(even_only);
        policy.insert(&a);
        policy.insert(&b);

        assert_eq!(policy.extract().unwrap().id.0, 4);
    }
}
