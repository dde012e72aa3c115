//! Cheater strategy.
//!
//! Once per round the cheater takes every foreign country bordering its
//! own, skipping truce partners, and then doubles the armies on every
//! country it holds that still borders a foreign one. It issues no orders
//! beyond deploying its pool.

use log::debug;

use super::{Decision, Strategy, StrategyKind, TurnContext};
use crate::board::{CountryId, OrderKind};
use crate::engine::phase::Phase;

#[derive(Debug, Default)]
pub struct Cheater {
    acted_round: Option<u32>,
}

impl Cheater {
    fn cheat(ctx: &mut TurnContext<'_>) {
        let owned = ctx.owned();
        let mut targets: Vec<CountryId> = owned
            .iter()
            .flat_map(|id| ctx.attackable_neighbors(*id))
            .collect();
        targets.sort_unstable();
        targets.dedup();
        for target in &targets {
            if let Err(e) = ctx.seize(*target) {
                debug!("cheater skipped {target}: {e}");
            }
        }

        let frontier: Vec<CountryId> = ctx
            .owned()
            .into_iter()
            .filter(|id| ctx.is_frontier(*id))
            .collect();
        for id in &frontier {
            if let Err(e) = ctx.double_armies(*id) {
                debug!("cheater could not double {id}: {e}");
            }
        }
        debug!(
            "{} seized {} countries and doubled {} in round {}",
            ctx.name(),
            targets.len(),
            frontier.len(),
            ctx.round()
        );
    }
}

impl Strategy for Cheater {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Cheater
    }

    fn decide(&mut self, ctx: &mut TurnContext<'_>) -> Decision {
        let owned = ctx.owned();
        let Some(&first) = owned.first() else {
            return Decision::Done;
        };
        let pool = ctx.pool();
        if pool > 0 && matches!(ctx.phase(), Phase::Reinforcement | Phase::IssueOrder) {
            let target = owned
                .iter()
                .copied()
                .find(|id| ctx.is_frontier(*id))
                .unwrap_or(first);
            return Decision::Issue(OrderKind::Deploy {
                target,
                armies: pool,
            });
        }
        if ctx.phase() == Phase::IssueOrder && self.acted_round != Some(ctx.round()) {
            self.acted_round = Some(ctx.round());
            Self::cheat(ctx);
        }
        Decision::Done
    }
}
