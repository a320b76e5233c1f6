//! Token budget accounting for greedy pack assembly.

/// Tracks spend against a token budget with a bounded slack allowance.
///
/// The slack factor lets the final admitted item overshoot the budget by
/// at most `budget * slack`; everything after a refusal is omitted and
/// counted, never silently dropped.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    total: usize,
    slack: f64,
    used: usize,
}

impl BudgetLedger {
    /// A ledger over `total` tokens with the given slack factor
    /// (0.1 = 10% overshoot allowed on the last admission).
    pub fn new(total: usize, slack: f64) -> Self {
        Self {
            total,
            slack: slack.max(0.0),
            used: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.used)
    }

    /// The hard ceiling: budget plus slack, rounded down.
    pub fn ceiling(&self) -> usize {
        self.total + (self.total as f64 * self.slack) as usize
    }

    /// Whether an item of `cost` tokens may still be admitted.
    pub fn admits(&self, cost: usize) -> bool {
        self.used + cost <= self.ceiling()
    }

    /// Charge an admitted item against the budget.
    /// Call only after `admits` returned true.
    pub fn charge(&mut self, cost: usize) {
        self.used += cost;
    }

    /// Admit and charge in one step. Returns false without charging when
    /// the item does not fit.
    pub fn try_charge(&mut self, cost: usize) -> bool {
        if self.admits(cost) {
            self.charge(cost);
            true
        } else {
            false
        }
    }
}
