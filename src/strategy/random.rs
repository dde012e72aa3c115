//! Random strategy.
//!
//! Deploys random amounts to random countries and then issues a handful of
//! orders drawn uniformly from everything it could legally do.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Decision, Plan, Strategy, StrategyKind, TurnContext};
use crate::board::{CardKind, CountryId, OrderKind};
use crate::engine::phase::Phase;

/// Most orders issued in one phase, deploys excluded.
pub const MAX_RANDOM_ORDERS: usize = 3;

#[derive(Debug, Default)]
pub struct RandomStrategy {
    plan: Plan,
}

/// Every order the player could issue right now, with random amounts.
fn legal_actions(ctx: &mut TurnContext<'_>, owned: &[CountryId]) -> Vec<OrderKind> {
    let mut actions = Vec::new();
    for &source in owned {
        let available = ctx.strength(source);
        if available == 0 {
            continue;
        }
        let neighbors: Vec<CountryId> = ctx
            .map()
            .neighbors_of(source)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default();
        for target in neighbors {
            let armies = ctx.rng().gen_range(1..=available);
            actions.push(OrderKind::Advance {
                source,
                target,
                armies,
            });
        }
    }

    if ctx.spare_cards(CardKind::Bomb) > 0 {
        let mut targets: Vec<CountryId> = owned
            .iter()
            .flat_map(|id| ctx.attackable_neighbors(*id))
            .collect();
        targets.sort_unstable();
        targets.dedup();
        actions.extend(targets.into_iter().map(|target| OrderKind::Bomb { target }));
    }
    if ctx.spare_cards(CardKind::Blockade) > 0 {
        actions.extend(owned.iter().map(|&target| OrderKind::Blockade { target }));
    }
    if ctx.spare_cards(CardKind::Airlift) > 0 && owned.len() >= 2 {
        let picked: Vec<CountryId> = owned.choose_multiple(ctx.rng(), 2).copied().collect();
        let available = ctx.strength(picked[0]);
        if available > 0 {
            let armies = ctx.rng().gen_range(1..=available);
            actions.push(OrderKind::Airlift {
                source: picked[0],
                target: picked[1],
                armies,
            });
        }
    }
    if ctx.spare_cards(CardKind::Diplomacy) > 0 {
        actions.extend(ctx.opponents().iter().map(|other| OrderKind::Negotiate {
            other: other.clone(),
        }));
    }
    actions
}

impl Strategy for RandomStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }

    fn decide(&mut self, ctx: &mut TurnContext<'_>) -> Decision {
        let owned = ctx.owned();
        if owned.is_empty() {
            return Decision::Done;
        }
        let pool = ctx.pool();
        if pool > 0 && matches!(ctx.phase(), Phase::Reinforcement | Phase::IssueOrder) {
            let target = owned[ctx.rng().gen_range(0..owned.len())];
            let armies = ctx.rng().gen_range(1..=pool);
            return Decision::Issue(OrderKind::Deploy { target, armies });
        }
        if ctx.phase() != Phase::IssueOrder {
            return Decision::Done;
        }
        if !self.plan.is_for(ctx.round(), ctx.phase()) {
            let actions = legal_actions(ctx, &owned);
            let count = ctx.rng().gen_range(1..=MAX_RANDOM_ORDERS);
            let chosen: Vec<OrderKind> = actions
                .choose_multiple(ctx.rng(), count)
                .cloned()
                .collect();
            self.plan.reset(ctx.round(), ctx.phase(), chosen);
        }
        self.plan.next().map_or(Decision::Done, Decision::Issue)
    }
}
