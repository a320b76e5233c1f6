use lore_tokens::{BudgetLedger, TokenCounter};
use proptest::prelude::*;

proptest! {
    #[test]
    fn spend_is_bounded_by_ceiling(
        total in 1usize..5_000,
        slack in 0.0f64..0.5,
        costs in prop::collection::vec(1usize..500, 0..50),
    ) {
        let mut ledger = BudgetLedger::new(total, slack);
        for cost in costs {
            ledger.try_charge(cost);
        }
        prop_assert!(ledger.used() <= ledger.ceiling());
    }

    #[test]
    fn admitted_costs_sum_to_used(costs in prop::collection::vec(1usize..200, 0..30)) {
        let mut ledger = BudgetLedger::new(1_000, 0.1);
        let mut admitted = 0usize;
        for cost in costs {
            if ledger.try_charge(cost) {
                admitted += cost;
            }
        }
        prop_assert_eq!(ledger.used(), admitted);
    }

    #[test]
    fn cached_count_matches_uncached(s in ".{0,200}") {
        let counter = TokenCounter::default();
        prop_assert_eq!(counter.count(&s), counter.count_cached(&s));
    }
}
