//! Aggressive strategy.
//!
//! Concentrates everything on its strongest border country, attacks the
//! weakest neighbor it can reach from there (neutral ones first on ties),
//! and pulls adjacent armies in behind the attack.

use log::debug;

use super::{Decision, Plan, Strategy, StrategyKind, TurnContext};
use crate::board::{CardKind, CountryId, OrderKind};
use crate::engine::phase::Phase;
use crate::error::GameError;

#[derive(Debug, Default)]
pub struct Aggressive {
    plan: Plan,
}

impl Aggressive {
    /// The country to build up: the strongest one bordering a foreign
    /// country, or the strongest overall when nothing borders one.
    fn spearhead(ctx: &TurnContext<'_>, owned: &[CountryId]) -> Option<CountryId> {
        let frontier: Vec<CountryId> = owned
            .iter()
            .copied()
            .filter(|id| ctx.is_frontier(*id))
            .collect();
        if frontier.is_empty() {
            ctx.strongest(owned)
        } else {
            ctx.strongest(&frontier)
        }
    }

    fn build_plan(ctx: &TurnContext<'_>, spearhead: CountryId) -> Vec<OrderKind> {
        let mut orders = Vec::new();
        let targets = ctx.attackable_neighbors(spearhead);
        let neutral = ctx
            .map()
            .unowned_neighbors_of(spearhead)
            .unwrap_or_default();

        if ctx.spare_cards(CardKind::Bomb) > 0 {
            let strongest_enemy = targets
                .iter()
                .copied()
                .filter(|id| !neutral.contains(id))
                .max_by_key(|id| {
                    let armies = ctx.map().country(*id).map_or(0, |c| c.armies);
                    (armies, std::cmp::Reverse(*id))
                });
            if let Some(target) = strongest_enemy {
                orders.push(OrderKind::Bomb { target });
            }
        }

        let force = ctx.strength(spearhead);
        // neutral countries go first among equally weak targets
        let weakest = targets.iter().copied().min_by_key(|id| {
            let armies = ctx.map().country(*id).map_or(0, |c| c.armies);
            (armies, !neutral.contains(id), *id)
        });
        if let (Some(target), true) = (weakest, force > 0) {
            orders.push(OrderKind::Advance {
                source: spearhead,
                target,
                armies: force,
            });
        }

        for source in ctx.own_neighbors(spearhead) {
            let armies = ctx.strength(source);
            if armies > 0 {
                orders.push(OrderKind::Advance {
                    source,
                    target: spearhead,
                    armies,
                });
            }
        }
        orders
    }
}

impl Strategy for Aggressive {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aggressive
    }

    fn decide(&mut self, ctx: &mut TurnContext<'_>) -> Decision {
        let owned = ctx.owned();
        let Some(spearhead) = Self::spearhead(ctx, &owned) else {
            return Decision::Done;
        };
        if ctx.pool() > 0 && matches!(ctx.phase(), Phase::Reinforcement | Phase::IssueOrder) {
            return Decision::Issue(OrderKind::Deploy {
                target: spearhead,
                armies: ctx.pool(),
            });
        }
        if ctx.phase() != Phase::IssueOrder {
            return Decision::Done;
        }
        if !self.plan.is_for(ctx.round(), ctx.phase()) {
            let orders = Self::build_plan(ctx, spearhead);
            debug!("{} plans {} orders from {}", ctx.name(), orders.len(), spearhead);
            self.plan.reset(ctx.round(), ctx.phase(), orders);
        }
        self.plan.next().map_or(Decision::Done, Decision::Issue)
    }

    fn order_rejected(&mut self, error: &GameError) {
        debug!("aggressive order rejected: {error}");
    }
}
