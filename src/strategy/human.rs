//! Console-driven player.

use super::{Decision, Strategy, StrategyKind, TurnContext};

/// Waits for orders typed at the console.
#[derive(Debug, Default)]
pub struct Human;

impl Strategy for Human {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Human
    }

    fn decide(&mut self, _ctx: &mut TurnContext<'_>) -> Decision {
        Decision::AwaitInput
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::split_map;
    use crate::board::Player;
    use crate::engine::phase::Phase;
    use crate::strategy::testing::Board;

    #[test]
    fn always_waits_for_input() {
        let alice = Player::new("alice", StrategyKind::Human);
        let mut board = Board::new(split_map(1), alice, &["bob"]);
        let mut human = Human;
        assert_eq!(board.decide(&mut human, Phase::Reinforcement, 1), Decision::AwaitInput);
        assert_eq!(board.decide(&mut human, Phase::IssueOrder, 1), Decision::AwaitInput);
    }
}
