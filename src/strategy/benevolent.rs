//! Benevolent strategy.
//!
//! Shores up its weakest countries and never attacks.

use std::collections::BTreeSet;

use log::debug;

use super::{Decision, Plan, Strategy, StrategyKind, TurnContext};
use crate::board::{CardKind, CountryId, OrderKind};
use crate::engine::phase::Phase;

#[derive(Debug, Default)]
pub struct Benevolent {
    plan: Plan,
}

impl Benevolent {
    fn build_plan(ctx: &TurnContext<'_>, owned: &[CountryId]) -> Vec<OrderKind> {
        let mut orders = Vec::new();

        // Weakest first; each country gives to at most one neighbor.
        let mut by_strength = owned.to_vec();
        by_strength.sort_by_key(|id| (ctx.strength(*id), *id));
        let mut givers: BTreeSet<CountryId> = BTreeSet::new();
        for &weak in &by_strength {
            if givers.contains(&weak) {
                continue;
            }
            let need = ctx.strength(weak);
            let donors: Vec<CountryId> = ctx
                .own_neighbors(weak)
                .into_iter()
                .filter(|n| !givers.contains(n) && ctx.strength(*n) >= need + 2)
                .collect();
            if let Some(source) = ctx.strongest(&donors) {
                let armies = (ctx.strength(source) - need) / 2;
                givers.insert(source);
                givers.insert(weak);
                orders.push(OrderKind::Advance {
                    source,
                    target: weak,
                    armies,
                });
            }
        }

        if ctx.spare_cards(CardKind::Airlift) > 0 {
            if let (Some(source), Some(target)) = (ctx.strongest(owned), ctx.weakest(owned)) {
                let armies = ctx.strength(source) / 2;
                if source != target && armies > 0 {
                    orders.push(OrderKind::Airlift {
                        source,
                        target,
                        armies,
                    });
                }
            }
        }

        if ctx.spare_cards(CardKind::Diplomacy) > 0 {
            let map = ctx.map();
            let strongest = ctx
                .opponents()
                .iter()
                .max_by_key(|name| (map.owned_count(name), std::cmp::Reverse(name.as_str())));
            if let Some(other) = strongest {
                orders.push(OrderKind::Negotiate {
                    other: other.clone(),
                });
            }
        }
        orders
    }
}

impl Strategy for Benevolent {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Benevolent
    }

    fn decide(&mut self, ctx: &mut TurnContext<'_>) -> Decision {
        let owned = ctx.owned();
        let Some(weakest) = ctx.weakest(&owned) else {
            return Decision::Done;
        };
        if ctx.pool() > 0 && matches!(ctx.phase(), Phase::Reinforcement | Phase::IssueOrder) {
            return Decision::Issue(OrderKind::Deploy {
                target: weakest,
                armies: 1,
            });
        }
        if ctx.phase() != Phase::IssueOrder {
            return Decision::Done;
        }
        if !self.plan.is_for(ctx.round(), ctx.phase()) {
            let orders = Self::build_plan(ctx, &owned);
            debug!("{} plans {} orders", ctx.name(), orders.len());
            self.plan.reset(ctx.round(), ctx.phase(), orders);
        }
        self.plan.next().map_or(Decision::Done, Decision::Issue)
    }
}
