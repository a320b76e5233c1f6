//! Wall-clock budget tracking for the staged pipeline.

use std::time::{Duration, Instant};

/// A query's wall-clock budget, checked between pipeline stages.
///
/// Expiry never aborts a query; stages that have not started yet are
/// skipped and recorded, and whatever was computed so far is served as a
/// partial result with `budget_exceeded` set.
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget_ms: u64) -> Self {
        Self {
            started: Instant::now(),
            budget: Duration::from_millis(budget_ms),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget.as_millis() as u64
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_not_expired() {
        let deadline = Deadline::new(60_000);
        assert!(!deadline.expired());
        assert_eq!(deadline.budget_ms(), 60_000);
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let deadline = Deadline::new(0);
        assert!(deadline.expired());
    }
}
