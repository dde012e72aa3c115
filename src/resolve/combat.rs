//! Battle resolution.
//!
//! Battles are deterministic: each attacking army destroys 0.6 defenders and
//! each defending army destroys 0.7 attackers, with losses rounded down and
//! capped at the armies actually present.

/// Percentage of the attacking force that the defender loses.
pub const ATTACKER_KILL_PERCENT: u64 = 60;

/// Percentage of the defending force that the attacker loses.
pub const DEFENDER_KILL_PERCENT: u64 = 70;

/// The result of one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleOutcome {
    pub attacker_losses: u32,
    pub defender_losses: u32,
    pub attackers_left: u32,
    pub defenders_left: u32,
    /// True if the defender was wiped out and at least one attacker survived.
    pub conquered: bool,
}

/// Armies the defender loses to `attackers`, before capping.
pub fn defender_losses(attackers: u32) -> u32 {
    (u64::from(attackers) * ATTACKER_KILL_PERCENT / 100) as u32
}

/// Armies the attacker loses to `defenders`, before capping.
pub fn attacker_losses(defenders: u32) -> u32 {
    (u64::from(defenders) * DEFENDER_KILL_PERCENT / 100) as u32
}

/// Resolves an attack of `attackers` against `defenders`.
pub fn resolve_battle(attackers: u32, defenders: u32) -> BattleOutcome {
    let defender_lost = defender_losses(attackers).min(defenders);
    let attacker_lost = attacker_losses(defenders).min(attackers);
    let attackers_left = attackers - attacker_lost;
    let defenders_left = defenders - defender_lost;
    BattleOutcome {
        attacker_losses: attacker_lost,
        defender_losses: defender_lost,
        attackers_left,
        defenders_left,
        conquered: defenders_left == 0 && attackers_left > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_against_five() {
        assert_eq!(defender_losses(10), 6);
        assert_eq!(attacker_losses(5), 3);
        let out = resolve_battle(10, 5);
        assert_eq!(out.defender_losses, 5);
        assert_eq!(out.attacker_losses, 3);
        assert_eq!(out.attackers_left, 7);
        assert_eq!(out.defenders_left, 0);
        assert!(out.conquered);
    }

    #[test]
    fn rounding_is_floor() {
        // 0.6 * 3 = 1.8 and 0.7 * 3 = 2.1
        let out = resolve_battle(3, 3);
        assert_eq!(out.defender_losses, 1);
        assert_eq!(out.attacker_losses, 2);
        assert!(!out.conquered);
    }

    #[test]
    fn single_armies_do_not_hurt_each_other() {
        let out = resolve_battle(1, 1);
        assert_eq!(out.defender_losses, 0);
        assert_eq!(out.attacker_losses, 0);
        assert_eq!(out.attackers_left, 1);
        assert_eq!(out.defenders_left, 1);
        assert!(!out.conquered);
    }

    #[test]
    fn empty_country_falls_to_one_army() {
        let out = resolve_battle(1, 0);
        assert_eq!(out.attackers_left, 1);
        assert!(out.conquered);
    }

    #[test]
    fn no_attackers_no_conquest() {
        let out = resolve_battle(0, 0);
        assert!(!out.conquered);
        let out = resolve_battle(0, 4);
        assert_eq!(out.defenders_left, 4);
        assert!(!out.conquered);
    }

    #[test]
    fn losses_are_capped() {
        let out = resolve_battle(3, 10);
        assert_eq!(out.attacker_losses, 3);
        assert_eq!(out.defender_losses, 1);
        assert_eq!(out.attackers_left, 0);
        assert_eq!(out.defenders_left, 9);
        assert!(!out.conquered);
    }

    #[test]
    fn narrow_wins_still_conquer() {
        // 0.6 * 2 = 1 defender lost, 0.7 * 1 = 0 attackers lost
        let out = resolve_battle(2, 1);
        assert!(out.conquered);
        // 0.6 * 5 = 3 of 3 defenders, 0.7 * 3 = 2 of 5 attackers
        let out = resolve_battle(5, 3);
        assert_eq!(out.attackers_left, 3);
        assert!(out.conquered);
    }

    #[test]
    fn huge_armies_do_not_overflow() {
        let out = resolve_battle(u32::MAX, u32::MAX);
        assert_eq!(out.defender_losses, defender_losses(u32::MAX));
        assert!(!out.conquered);
    }
}
