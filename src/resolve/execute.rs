//! Order execution and expiry.
//!
//! Each order checks its own preconditions against the board at the moment
//! it runs. An order that can no longer take effect is not an error: it
//! returns a message describing what happened. Errors are reserved for
//! missing cards and lookups of entities that no longer exist.

use rand::rngs::SmallRng;

use super::combat::resolve_battle;
use crate::board::{random_card, Card, CardKind, CountryId, Map, Order, OrderKind, Player};
use crate::error::{GameError, Result};

/// Everything an order may touch while executing.
pub struct World<'a> {
    pub map: &'a mut Map,
    pub players: &'a mut [Player],
    pub rng: &'a mut SmallRng,
    pub round: u32,
}

impl World<'_> {
    pub fn player(&self, name: &str) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| GameError::not_found("player", name))
    }

    pub fn player_mut(&mut self, name: &str) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| GameError::not_found("player", name))
    }

    /// Returns true if `a` has a truce with the owner of a country.
    fn at_truce(&self, a: &str, owner: Option<&str>) -> bool {
        match (owner, self.player(a)) {
            (Some(b), Ok(p)) => p.is_at_truce_with(b),
            _ => false,
        }
    }

    /// Removes one card of `kind` from `owner`'s hand.
    fn spend_card(&mut self, owner: &str, kind: CardKind) -> Result<Card> {
        self.player_mut(owner)?
            .take_card(kind)
            .ok_or_else(|| GameError::CardNotFound {
                player: owner.to_string(),
                card: kind,
            })
    }

    fn name(&self, id: CountryId) -> String {
        self.map.country_name(id)
    }
}

impl Order {
    /// Executes the order against the world and returns an outcome message.
    pub fn execute(&self, world: &mut World<'_>) -> Result<String> {
        let owner = self.owner().to_string();
        match self.kind {
            OrderKind::Deploy { target, armies } => deploy(world, &owner, target, armies),
            OrderKind::Advance {
                source,
                target,
                armies,
            } => advance(world, &owner, source, target, armies),
            OrderKind::Bomb { target } => {
                world.spend_card(&owner, CardKind::Bomb)?;
                bomb(world, &owner, target)
            }
            OrderKind::Blockade { target } => {
                world.spend_card(&owner, CardKind::Blockade)?;
                blockade(world, &owner, target)
            }
            OrderKind::Airlift {
                source,
                target,
                armies,
            } => {
                world.spend_card(&owner, CardKind::Airlift)?;
                airlift(world, &owner, source, target, armies)
            }
            OrderKind::Negotiate { ref other } => {
                world.spend_card(&owner, CardKind::Diplomacy)?;
                negotiate(world, &owner, other)
            }
        }
    }

    /// Withdraws the order at a round boundary or when the game is cancelled.
    ///
    /// `executed` tells whether the order already ran. A pending Deploy
    /// returns its armies to the pool, a pending card order spends its card
    /// without effect, a fired Negotiate lifts its truce, and Advance has
    /// nothing to undo.
    pub fn expire(&self, world: &mut World<'_>, executed: bool) -> String {
        let owner = self.owner();
        match (&self.kind, executed) {
            (OrderKind::Negotiate { other }, true) => {
                if let Ok(p) = world.player_mut(owner) {
                    p.remove_truce(other);
                }
                if let Ok(p) = world.player_mut(other) {
                    p.remove_truce(owner);
                }
                format!("truce between {owner} and {other} has ended")
            }
            (_, true) => format!("{} by {owner} already executed", self.kind.keyword()),
            (OrderKind::Deploy { armies, .. }, false) => {
                if let Ok(p) = world.player_mut(owner) {
                    p.reinforcements = p.reinforcements.saturating_add(*armies);
                }
                format!("{armies} armies returned to {owner}'s pool")
            }
            (OrderKind::Advance { .. }, false) => format!("advance by {owner} dropped"),
            (kind, false) => {
                let card = kind.card().unwrap_or(CardKind::Empty);
                match world.player_mut(owner).map(|p| p.take_card(card)) {
                    Ok(Some(_)) => format!("{owner}'s {card} card spent without effect"),
                    _ => format!("{} by {owner} dropped", kind.keyword()),
                }
            }
        }
    }
}

fn deploy(world: &mut World<'_>, owner: &str, target: CountryId, armies: u32) -> Result<String> {
    let country = world.map.country_mut(target)?;
    if !country.is_owned_by(owner) {
        let name = country.name().to_string();
        let player = world.player_mut(owner)?;
        player.reinforcements = player.reinforcements.saturating_add(armies);
        return Ok(format!(
            "{owner} no longer holds {name}; {armies} armies returned to the pool"
        ));
    }
    country.armies = country.armies.saturating_add(armies);
    Ok(format!(
        "{owner} deployed {armies} armies to {} ({} now)",
        country.name(),
        country.armies
    ))
}

fn advance(
    world: &mut World<'_>,
    owner: &str,
    source: CountryId,
    target: CountryId,
    armies: u32,
) -> Result<String> {
    let (src_name, dst_name) = (world.name(source), world.name(target));
    let available = {
        let src = world.map.country(source)?;
        if !src.is_owned_by(owner) {
            return Ok(format!("{owner} no longer holds {src_name}; advance cancelled"));
        }
        src.armies
    };
    if !world.map.is_adjacent(source, target) {
        return Ok(format!("{src_name} does not border {dst_name}; advance cancelled"));
    }
    let moving = armies.min(available);
    if moving == 0 {
        return Ok(format!("{src_name} has no armies to advance"));
    }

    let defender = world.map.country(target)?.owner.clone();
    if defender.as_deref() == Some(owner) {
        world.map.country_mut(source)?.armies -= moving;
        let dst = world.map.country_mut(target)?;
        dst.armies = dst.armies.saturating_add(moving);
        return Ok(format!("{owner} moved {moving} armies from {src_name} to {dst_name}"));
    }
    if world.at_truce(owner, defender.as_deref()) {
        let other = defender.unwrap_or_default();
        return Ok(format!(
            "{owner} is at truce with {other}; attack on {dst_name} cancelled"
        ));
    }

    world.map.country_mut(source)?.armies -= moving;
    let defenders = world.map.country(target)?.armies;
    let battle = resolve_battle(moving, defenders);
    let defender_name = defender.unwrap_or_else(|| "neutral".to_string());

    if battle.conquered {
        // one survivor stays behind unless it is the only one
        let occupying = battle.attackers_left.saturating_sub(1).max(1);
        let dst = world.map.country_mut(target)?;
        dst.owner = Some(owner.to_string());
        dst.armies = occupying;
        let src = world.map.country_mut(source)?;
        src.armies = src.armies.saturating_add(battle.attackers_left - occupying);
        let kind = random_card(world.rng);
        let round = world.round;
        world.player_mut(owner)?.add_card(Card::new(kind, round));
        Ok(format!(
            "{owner} conquered {dst_name} from {defender_name} with {occupying} armies and drew a {kind} card"
        ))
    } else {
        world.map.country_mut(target)?.armies = battle.defenders_left;
        let src = world.map.country_mut(source)?;
        src.armies = src.armies.saturating_add(battle.attackers_left);
        Ok(format!(
            "{owner} attacked {dst_name} ({defender_name}) and was repelled: lost {}, killed {}",
            battle.attacker_losses, battle.defender_losses
        ))
    }
}

fn bomb(world: &mut World<'_>, owner: &str, target: CountryId) -> Result<String> {
    let name = world.name(target);
    let country = world.map.country(target)?;
    if country.is_owned_by(owner) {
        return Ok(format!("{owner} cannot bomb its own country {name}"));
    }
    let defender = country.owner.clone();
    if world.at_truce(owner, defender.as_deref()) {
        return Ok(format!("{owner} is at truce with the owner of {name}; bomb wasted"));
    }
    let bordered = country.neighbors().iter().any(|n| {
        world
            .map
            .country(*n)
            .is_ok_and(|c| c.is_owned_by(owner))
    });
    if !bordered {
        return Ok(format!("{owner} does not border {name}; bomb wasted"));
    }
    let country = world.map.country_mut(target)?;
    let before = country.armies;
    country.armies /= 2;
    Ok(format!("{owner} bombed {name}: {before} -> {} armies", country.armies))
}

fn blockade(world: &mut World<'_>, owner: &str, target: CountryId) -> Result<String> {
    let country = world.map.country_mut(target)?;
    if !country.is_owned_by(owner) {
        return Ok(format!(
            "{owner} no longer holds {}; blockade wasted",
            country.name()
        ));
    }
    country.armies = country.armies.saturating_mul(3);
    country.owner = None;
    Ok(format!(
        "{owner} blockaded {}: {} armies, now neutral",
        country.name(),
        country.armies
    ))
}

fn airlift(
    world: &mut World<'_>,
    owner: &str,
    source: CountryId,
    target: CountryId,
    armies: u32,
) -> Result<String> {
    let (src_name, dst_name) = (world.name(source), world.name(target));
    let src = world.map.country(source)?;
    let dst = world.map.country(target)?;
    if source == target || !src.is_owned_by(owner) || !dst.is_owned_by(owner) {
        return Ok(format!(
            "{owner} cannot airlift from {src_name} to {dst_name}; airlift wasted"
        ));
    }
    let moving = armies.min(src.armies);
    world.map.country_mut(source)?.armies -= moving;
    let dst = world.map.country_mut(target)?;
    dst.armies = dst.armies.saturating_add(moving);
    Ok(format!("{owner} airlifted {moving} armies from {src_name} to {dst_name}"))
}

fn negotiate(world: &mut World<'_>, owner: &str, other: &str) -> Result<String> {
    if owner == other {
        return Ok(format!("{owner} cannot negotiate with itself"));
    }
    world.player(other)?;
    world.player_mut(owner)?.add_truce(other);
    world.player_mut(other)?.add_truce(owner);
    Ok(format!("{owner} and {other} are at truce this round"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::split_map;
    use crate::strategy::StrategyKind;
    use rand::SeedableRng;

    struct Table {
        map: Map,
        players: Vec<Player>,
        rng: SmallRng,
    }

    impl Table {
        fn new(armies: u32) -> Self {
            Table {
                map: split_map(armies),
                players: vec![
                    Player::new("alice", StrategyKind::Human),
                    Player::new("bob", StrategyKind::Human),
                ],
                rng: SmallRng::seed_from_u64(1),
            }
        }

        fn run(&mut self, owner: &str, kind: OrderKind) -> Result<String> {
            let order = Order::new(owner, kind, 1, 0);
            let mut world = World {
                map: &mut self.map,
                players: &mut self.players,
                rng: &mut self.rng,
                round: 1,
            };
            order.execute(&mut world)
        }

        fn give(&mut self, idx: usize, kind: CardKind) {
            self.players[idx].add_card(Card::new(kind, 0));
        }

        fn armies(&self, id: CountryId) -> u32 {
            self.map.country(id).unwrap().armies
        }

        fn owner(&self, id: CountryId) -> Option<&str> {
            self.map.country(id).unwrap().owner()
        }
    }

    #[test]
    fn deploy_adds_armies() {
        let mut t = Table::new(1);
        t.run("alice", OrderKind::Deploy { target: 1, armies: 4 }).unwrap();
        assert_eq!(t.armies(1), 5);
    }

    #[test]
    fn deploy_onto_lost_country_refunds() {
        let mut t = Table::new(1);
        let msg = t.run("alice", OrderKind::Deploy { target: 4, armies: 4 }).unwrap();
        assert!(msg.contains("returned"));
        assert_eq!(t.armies(4), 1);
        assert_eq!(t.players[0].reinforcements, 4);
    }

    #[test]
    fn advance_between_own_countries_transfers() {
        let mut t = Table::new(5);
        t.run(
            "alice",
            OrderKind::Advance {
                source: 1,
                target: 2,
                armies: 3,
            },
        )
        .unwrap();
        assert_eq!(t.armies(1), 2);
        assert_eq!(t.armies(2), 8);
    }

    #[test]
    fn advance_conquers_and_draws_card() {
        let mut t = Table::new(5);
        t.map.country_mut(3).unwrap().armies = 10;
        // C (3) borders D (4)
        let msg = t
            .run(
                "alice",
                OrderKind::Advance {
                    source: 3,
                    target: 4,
                    armies: 10,
                },
            )
            .unwrap();
        assert!(msg.contains("conquered"), "{msg}");
        assert_eq!(t.owner(4), Some("alice"));
        // 7 survivors: 6 occupy, 1 held back in the source
        assert_eq!(t.armies(4), 6);
        assert_eq!(t.armies(3), 1);
        assert_eq!(t.players[0].hand().len(), 1);
    }

    #[test]
    fn lone_survivor_occupies_the_conquest() {
        let mut t = Table::new(5);
        t.map.country_mut(4).unwrap().armies = 0;
        t.run(
            "alice",
            OrderKind::Advance {
                source: 3,
                target: 4,
                armies: 1,
            },
        )
        .unwrap();
        assert_eq!(t.owner(4), Some("alice"));
        assert_eq!(t.armies(4), 1);
        assert_eq!(t.armies(3), 4);
    }

    #[test]
    fn repelled_attack_returns_survivors() {
        let mut t = Table::new(5);
        t.map.country_mut(4).unwrap().armies = 10;
        t.run(
            "alice",
            OrderKind::Advance {
                source: 3,
                target: 4,
                armies: 5,
            },
        )
        .unwrap();
        // attacker loses 5 (capped), defender loses 3
        assert_eq!(t.owner(4), Some("bob"));
        assert_eq!(t.armies(4), 7);
        assert_eq!(t.armies(3), 0);
        assert!(t.players[0].hand().is_empty());
    }

    #[test]
    fn advance_uses_available_armies() {
        let mut t = Table::new(2);
        t.run(
            "alice",
            OrderKind::Advance {
                source: 1,
                target: 2,
                armies: 50,
            },
        )
        .unwrap();
        assert_eq!(t.armies(1), 0);
        assert_eq!(t.armies(2), 4);
    }

    #[test]
    fn advance_to_non_neighbor_is_a_no_op() {
        let mut t = Table::new(2);
        let msg = t
            .run(
                "alice",
                OrderKind::Advance {
                    source: 1,
                    target: 4,
                    armies: 1,
                },
            )
            .unwrap();
        assert!(msg.contains("does not border"));
        assert_eq!(t.armies(1), 2);
    }

    #[test]
    fn truce_cancels_attack() {
        let mut t = Table::new(5);
        t.players[0].add_truce("bob");
        t.players[1].add_truce("alice");
        let msg = t
            .run(
                "alice",
                OrderKind::Advance {
                    source: 3,
                    target: 4,
                    armies: 5,
                },
            )
            .unwrap();
        assert!(msg.contains("truce"));
        assert_eq!(t.armies(3), 5);
        assert_eq!(t.armies(4), 5);
    }

    #[test]
    fn card_order_without_card_fails() {
        let mut t = Table::new(5);
        let err = t.run("alice", OrderKind::Bomb { target: 4 }).unwrap_err();
        assert!(matches!(err, GameError::CardNotFound { card: CardKind::Bomb, .. }));
    }

    #[test]
    fn bomb_halves_adjacent_enemy() {
        let mut t = Table::new(7);
        t.give(0, CardKind::Bomb);
        t.run("alice", OrderKind::Bomb { target: 4 }).unwrap();
        assert_eq!(t.armies(4), 3);
        assert_eq!(t.players[0].card_count(CardKind::Bomb), 0);
    }

    #[test]
    fn bomb_far_away_is_wasted_but_spends_card() {
        let mut t = Table::new(7);
        t.give(0, CardKind::Bomb);
        // E (5) borders only D and F, both bob's
        let msg = t.run("alice", OrderKind::Bomb { target: 5 }).unwrap();
        assert!(msg.contains("wasted"));
        assert_eq!(t.armies(5), 7);
        assert_eq!(t.players[0].card_count(CardKind::Bomb), 0);
    }

    #[test]
    fn blockade_triples_and_neutralizes() {
        let mut t = Table::new(4);
        t.give(0, CardKind::Blockade);
        t.run("alice", OrderKind::Blockade { target: 2 }).unwrap();
        assert_eq!(t.armies(2), 12);
        assert_eq!(t.owner(2), None);
    }

    #[test]
    fn airlift_ignores_adjacency() {
        let mut t = Table::new(4);
        t.give(1, CardKind::Airlift);
        t.map.country_mut(6).unwrap().owner = Some("bob".to_string());
        t.run(
            "bob",
            OrderKind::Airlift {
                source: 4,
                target: 6,
                armies: 3,
            },
        )
        .unwrap();
        assert_eq!(t.armies(4), 1);
        assert_eq!(t.armies(6), 7);
    }

    #[test]
    fn negotiate_sets_truce_both_ways_and_expiry_lifts_it() {
        let mut t = Table::new(1);
        t.give(0, CardKind::Diplomacy);
        let order = Order::new(
            "alice",
            OrderKind::Negotiate {
                other: "bob".to_string(),
            },
            1,
            0,
        );
        let mut world = World {
            map: &mut t.map,
            players: &mut t.players,
            rng: &mut t.rng,
            round: 2,
        };
        order.execute(&mut world).unwrap();
        assert!(world.player("alice").unwrap().is_at_truce_with("bob"));
        assert!(world.player("bob").unwrap().is_at_truce_with("alice"));

        order.expire(&mut world, true);
        assert!(!world.player("alice").unwrap().is_at_truce_with("bob"));
        assert!(!world.player("bob").unwrap().is_at_truce_with("alice"));
    }

    #[test]
    fn negotiate_with_unknown_player_fails() {
        let mut t = Table::new(1);
        t.give(0, CardKind::Diplomacy);
        let err = t
            .run(
                "alice",
                OrderKind::Negotiate {
                    other: "zed".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, GameError::EntityNotFound { kind: "player", .. }));
    }

    #[test]
    fn expiring_pending_orders() {
        let mut t = Table::new(1);
        t.give(0, CardKind::Airlift);
        let mut world = World {
            map: &mut t.map,
            players: &mut t.players,
            rng: &mut t.rng,
            round: 1,
        };
        let deploy = Order::new("alice", OrderKind::Deploy { target: 1, armies: 3 }, 1, 0);
        deploy.expire(&mut world, false);
        assert_eq!(world.player("alice").unwrap().reinforcements, 3);

        let lift = Order::new(
            "alice",
            OrderKind::Airlift {
                source: 1,
                target: 2,
                armies: 1,
            },
            1,
            1,
        );
        let msg = lift.expire(&mut world, false);
        assert!(msg.contains("spent without effect"));
        assert_eq!(world.player("alice").unwrap().card_count(CardKind::Airlift), 0);

        let adv = Order::new(
            "alice",
            OrderKind::Advance {
                source: 1,
                target: 2,
                armies: 1,
            },
            1,
            2,
        );
        assert!(adv.expire(&mut world, false).contains("dropped"));
    }
}
