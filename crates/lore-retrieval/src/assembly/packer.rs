//! Greedy token-budget fill over ranked candidates.

use tracing::debug;

use lore_core::errors::LoreResult;
use lore_core::models::{ContextPack, DepthLevel};
use lore_graph::DependencyGraph;
use lore_tokens::BudgetLedger;

use crate::assembly::renderer::PackRenderer;
use crate::deadline::Deadline;
use crate::ranking::RankedCandidate;

/// What one assembly pass produced. Omissions are explicit: a truncated
/// result always says how many candidates it left out.
#[derive(Debug)]
pub struct AssemblyOutcome {
    pub packs: Vec<ContextPack>,
    /// Candidates that survived ranking but were not delivered.
    pub omitted: usize,
    /// True when the query deadline stopped assembly early.
    pub cut_short: bool,
}

/// Fills the token budget with packs in rank order.
pub struct PackAssembler {
    renderer: PackRenderer,
    budget_slack: f64,
}

impl PackAssembler {
    pub fn new(renderer: PackRenderer, budget_slack: f64) -> Self {
        Self {
            renderer,
            budget_slack,
        }
    }

    /// Render candidates in rank order until the budget, the pack cap,
    /// or the deadline refuses the next one.
    ///
    /// The first refusal ends the pass: packing is greedy by rank, not
    /// best-fit, so a later smaller pack never leapfrogs a refused
    /// better-ranked one.
    pub fn assemble(
        &self,
        ranked: &[RankedCandidate],
        depth: DepthLevel,
        token_budget: usize,
        max_packs: usize,
        deadline: &Deadline,
        graph: &DependencyGraph,
    ) -> LoreResult<AssemblyOutcome> {
        let mut ledger = BudgetLedger::new(token_budget, self.budget_slack);
        let mut packs = Vec::new();
        let mut omitted = 0;
        let mut cut_short = false;

        for (index, candidate) in ranked.iter().enumerate() {
            if packs.len() == max_packs {
                omitted = ranked.len() - index;
                break;
            }
            if deadline.expired() {
                debug!(
                    delivered = packs.len(),
                    remaining = ranked.len() - index,
                    "deadline expired during assembly"
                );
                omitted = ranked.len() - index;
                cut_short = true;
                break;
            }

            let pack = self.renderer.render(candidate, depth, graph)?;
            if !ledger.try_charge(pack.token_cost) {
                debug!(
                    entity = %candidate.entity.id,
                    cost = pack.token_cost,
                    used = ledger.used(),
                    ceiling = ledger.ceiling(),
                    "pack refused by token budget"
                );
                omitted = ranked.len() - index;
                break;
            }
            packs.push(pack);
        }

        Ok(AssemblyOutcome {
            packs,
            omitted,
            cut_short,
        })
    }
}
