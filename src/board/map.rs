//! Map graph: continents, countries and the neighbor relation.
//!
//! Countries and continents carry map-local serial ids starting at
//! [`SERIAL_BASE`]. The neighbor relation is kept symmetric by every
//! mutating operation. Ownership lives on the country only, so a country can
//! never have two owners; a player's holdings are derived by scanning.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::error::{GameError, Result};

pub type CountryId = u32;
pub type ContinentId = u32;

/// First serial id handed out after a reset.
pub const SERIAL_BASE: u32 = 1;

/// A country on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    id: CountryId,
    name: String,
    continent: ContinentId,
    neighbors: BTreeSet<CountryId>,
    /// Owning player's name; `None` for neutral countries.
    pub owner: Option<String>,
    pub armies: u32,
}

impl Country {
    pub fn id(&self) -> CountryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn continent(&self) -> ContinentId {
        self.continent
    }

    pub fn neighbors(&self) -> &BTreeSet<CountryId> {
        &self.neighbors
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns true if `player` owns this country.
    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.as_deref() == Some(player)
    }
}

/// A continent: a named group of countries with a control bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continent {
    id: ContinentId,
    name: String,
    control_value: u32,
    countries: Vec<CountryId>,
}

impl Continent {
    pub fn id(&self) -> ContinentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bonus armies awarded for owning every member country.
    pub fn control_value(&self) -> u32 {
        self.control_value
    }

    pub fn countries(&self) -> &[CountryId] {
        &self.countries
    }
}

/// The id handed out after `id`. Ids at the top of the range are refused
/// so the serial counter cannot wrap.
fn successor(kind: &str, id: u32) -> Result<u32> {
    id.checked_add(1)
        .filter(|_| id >= SERIAL_BASE)
        .ok_or_else(|| GameError::InvalidArgument(format!("{kind} id {id} is out of range")))
}

/// The map graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    continents: BTreeMap<ContinentId, Continent>,
    countries: BTreeMap<CountryId, Country>,
    next_continent: u32,
    next_country: u32,
}

impl Default for Map {
    fn default() -> Self {
        Map::new()
    }
}

impl Map {
    /// Creates an empty map with serials at the base.
    pub fn new() -> Self {
        Map {
            continents: BTreeMap::new(),
            countries: BTreeMap::new(),
            next_continent: SERIAL_BASE,
            next_country: SERIAL_BASE,
        }
    }

    /// Removes everything and resets the serial counters.
    pub fn clear(&mut self) {
        self.continents.clear();
        self.countries.clear();
        self.reset_serial_numbers();
    }

    /// Resets the serial counters to the base, or just past the highest id
    /// still in use so ids stay unique.
    pub fn reset_serial_numbers(&mut self) {
        self.next_continent = self
            .continents
            .keys()
            .next_back()
            .map_or(SERIAL_BASE, |id| id.saturating_add(1));
        self.next_country = self
            .countries
            .keys()
            .next_back()
            .map_or(SERIAL_BASE, |id| id.saturating_add(1));
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.continents.is_empty()
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }

    pub fn continents(&self) -> impl Iterator<Item = &Continent> {
        self.continents.values()
    }

    /// Adds a continent and returns its id.
    pub fn add_continent(&mut self, name: &str, control_value: u32) -> Result<ContinentId> {
        if name.is_empty() {
            return Err(GameError::InvalidArgument("continent name is empty".to_string()));
        }
        if self.continents.values().any(|c| c.name == name) {
            return Err(GameError::InvalidArgument(format!(
                "continent '{name}' already exists"
            )));
        }
        let id = self.next_continent;
        self.restore_continent(id, name, control_value)?;
        Ok(id)
    }

    /// Creates a country inside an existing continent and returns its id.
    pub fn add_country_to_continent(&mut self, country: &str, continent: &str) -> Result<CountryId> {
        if country.is_empty() {
            return Err(GameError::InvalidArgument("country name is empty".to_string()));
        }
        if self.countries.values().any(|c| c.name == country) {
            return Err(GameError::InvalidArgument(format!(
                "country '{country}' already exists"
            )));
        }
        let continent_id = self.find_continent(continent)?.id;
        let id = self.next_country;
        self.restore_country(id, country, continent_id, None, 0)?;
        Ok(id)
    }

    /// Inserts a continent under a known id. Used when rebuilding a saved map.
    pub(crate) fn restore_continent(
        &mut self,
        id: ContinentId,
        name: &str,
        control_value: u32,
    ) -> Result<()> {
        let next = successor("continent", id)?;
        self.continents.insert(
            id,
            Continent {
                id,
                name: name.to_string(),
                control_value,
                countries: Vec::new(),
            },
        );
        self.next_continent = self.next_continent.max(next);
        Ok(())
    }

    /// Inserts a country under a known id. Used when rebuilding a saved map.
    pub(crate) fn restore_country(
        &mut self,
        id: CountryId,
        name: &str,
        continent: ContinentId,
        owner: Option<String>,
        armies: u32,
    ) -> Result<()> {
        if self.countries.contains_key(&id) {
            return Err(GameError::InvalidArgument(format!("duplicate country id {id}")));
        }
        let next = successor("country", id)?;
        let cont = self
            .continents
            .get_mut(&continent)
            .ok_or_else(|| GameError::not_found("continent", continent.to_string()))?;
        cont.countries.push(id);
        self.countries.insert(
            id,
            Country {
                id,
                name: name.to_string(),
                continent,
                neighbors: BTreeSet::new(),
                owner,
                armies,
            },
        );
        self.next_country = self.next_country.max(next);
        Ok(())
    }

    /// Links two countries by name in both directions.
    pub fn add_neighbor(&mut self, a: &str, b: &str) -> Result<()> {
        let a = self.find_country(a)?.id;
        let b = self.find_country(b)?.id;
        self.add_neighbor_ids(a, b)
    }

    /// Links two countries by id in both directions.
    pub fn add_neighbor_ids(&mut self, a: CountryId, b: CountryId) -> Result<()> {
        if a == b {
            return Err(GameError::InvalidArgument(format!(
                "country {a} cannot neighbor itself"
            )));
        }
        self.country(a)?;
        self.country(b)?;
        if let Some(c) = self.countries.get_mut(&a) {
            c.neighbors.insert(b);
        }
        if let Some(c) = self.countries.get_mut(&b) {
            c.neighbors.insert(a);
        }
        Ok(())
    }

    /// Removes the link between two countries in both directions.
    pub fn remove_neighbor(&mut self, a: &str, b: &str) -> Result<()> {
        let a = self.find_country(a)?.id;
        let b = self.find_country(b)?.id;
        if !self.is_adjacent(a, b) {
            return Err(GameError::InvalidArgument(format!(
                "countries {a} and {b} are not neighbors"
            )));
        }
        if let Some(c) = self.countries.get_mut(&a) {
            c.neighbors.remove(&b);
        }
        if let Some(c) = self.countries.get_mut(&b) {
            c.neighbors.remove(&a);
        }
        Ok(())
    }

    /// Removes a country and every link to it.
    pub fn remove_country(&mut self, name: &str) -> Result<()> {
        let id = self.find_country(name)?.id;
        self.remove_country_id(id);
        Ok(())
    }

    fn remove_country_id(&mut self, id: CountryId) {
        let Some(country) = self.countries.remove(&id) else {
            return;
        };
        for n in &country.neighbors {
            if let Some(c) = self.countries.get_mut(n) {
                c.neighbors.remove(&id);
            }
        }
        if let Some(cont) = self.continents.get_mut(&country.continent) {
            cont.countries.retain(|c| *c != id);
        }
    }

    /// Removes a continent together with its countries.
    pub fn remove_continent(&mut self, name: &str) -> Result<()> {
        let continent = self.find_continent(name)?;
        let id = continent.id;
        let members = continent.countries.clone();
        for c in members {
            self.remove_country_id(c);
        }
        self.continents.remove(&id);
        Ok(())
    }

    pub fn find_continent(&self, name: &str) -> Result<&Continent> {
        self.continents
            .values()
            .find(|c| c.name == name)
            .ok_or_else(|| GameError::not_found("continent", name))
    }

    pub fn continent(&self, id: ContinentId) -> Result<&Continent> {
        self.continents
            .get(&id)
            .ok_or_else(|| GameError::not_found("continent", id.to_string()))
    }

    pub fn find_country(&self, name: &str) -> Result<&Country> {
        self.countries
            .values()
            .find(|c| c.name == name)
            .ok_or_else(|| GameError::not_found("country", name))
    }

    pub fn country(&self, id: CountryId) -> Result<&Country> {
        self.countries
            .get(&id)
            .ok_or_else(|| GameError::not_found("country", id.to_string()))
    }

    pub fn country_mut(&mut self, id: CountryId) -> Result<&mut Country> {
        self.countries
            .get_mut(&id)
            .ok_or_else(|| GameError::not_found("country", id.to_string()))
    }

    /// Returns the display name of a country, or its id if it is gone.
    pub fn country_name(&self, id: CountryId) -> String {
        self.countries
            .get(&id)
            .map_or_else(|| format!("#{id}"), |c| c.name.clone())
    }

    pub fn neighbors_of(&self, id: CountryId) -> Result<&BTreeSet<CountryId>> {
        Ok(&self.country(id)?.neighbors)
    }

    /// Neighbors of `id` that nobody owns.
    pub fn unowned_neighbors_of(&self, id: CountryId) -> Result<Vec<CountryId>> {
        Ok(self
            .neighbors_of(id)?
            .iter()
            .copied()
            .filter(|n| self.countries.get(n).is_some_and(|c| c.owner.is_none()))
            .collect())
    }

    /// Neighbors of `id` not owned by `player`, neutral ones included.
    pub fn enemy_neighbors_of(&self, id: CountryId, player: &str) -> Result<Vec<CountryId>> {
        Ok(self
            .neighbors_of(id)?
            .iter()
            .copied()
            .filter(|n| self.countries.get(n).is_some_and(|c| !c.is_owned_by(player)))
            .collect())
    }

    pub fn is_adjacent(&self, a: CountryId, b: CountryId) -> bool {
        self.countries
            .get(&a)
            .is_some_and(|c| c.neighbors.contains(&b))
    }

    /// Ids of every country owned by `player`, ascending.
    pub fn countries_owned_by(&self, player: &str) -> Vec<CountryId> {
        self.countries
            .values()
            .filter(|c| c.is_owned_by(player))
            .map(|c| c.id)
            .collect()
    }

    pub fn owned_count(&self, player: &str) -> usize {
        self.countries.values().filter(|c| c.is_owned_by(player)).count()
    }

    /// Returns true if `player` owns every country of the continent.
    pub fn owns_continent(&self, player: &str, continent: ContinentId) -> bool {
        self.continents.get(&continent).is_some_and(|cont| {
            !cont.countries.is_empty()
                && cont
                    .countries
                    .iter()
                    .all(|id| self.countries.get(id).is_some_and(|c| c.is_owned_by(player)))
        })
    }

    /// Returns the player owning every country, if there is one.
    pub fn sole_owner(&self) -> Option<&str> {
        let mut iter = self.countries.values();
        let first = iter.next()?.owner.as_deref()?;
        iter.all(|c| c.owner.as_deref() == Some(first)).then_some(first)
    }

    /// Checks the map can be played on.
    ///
    /// Every continent must own at least one country, the whole graph must be
    /// connected, and so must the subgraph of each continent.
    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            return Err(GameError::InvalidMap("map has no countries".to_string()));
        }
        if self.continents.is_empty() {
            return Err(GameError::InvalidMap("map has no continents".to_string()));
        }
        for cont in self.continents.values() {
            if cont.countries.is_empty() {
                return Err(GameError::InvalidMap(format!(
                    "continent '{}' has no countries",
                    cont.name
                )));
            }
        }
        for country in self.countries.values() {
            for n in &country.neighbors {
                let back = self
                    .countries
                    .get(n)
                    .is_some_and(|c| c.neighbors.contains(&country.id));
                if !back {
                    return Err(GameError::InvalidMap(format!(
                        "border {} -> {} is not symmetric",
                        country.name, n
                    )));
                }
            }
        }

        let all: BTreeSet<CountryId> = self.countries.keys().copied().collect();
        if let Some(lost) = self.first_unreachable(&all) {
            return Err(GameError::InvalidMap(format!(
                "country '{}' is unreachable",
                self.country_name(lost)
            )));
        }
        for cont in self.continents.values() {
            let members: BTreeSet<CountryId> = cont.countries.iter().copied().collect();
            if let Some(lost) = self.first_unreachable(&members) {
                return Err(GameError::InvalidMap(format!(
                    "continent '{}' is not connected: '{}' is cut off",
                    cont.name,
                    self.country_name(lost)
                )));
            }
        }
        Ok(())
    }

    /// BFS restricted to `within`; returns the first member not reached.
    fn first_unreachable(&self, within: &BTreeSet<CountryId>) -> Option<CountryId> {
        let start = *within.iter().next()?;
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(cur) = queue.pop_front() {
            let Some(country) = self.countries.get(&cur) else {
                continue;
            };
            for n in &country.neighbors {
                if within.contains(n) && seen.insert(*n) {
                    queue.push_back(*n);
                }
            }
        }
        within.iter().copied().find(|id| !seen.contains(id))
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cont in self.continents.values() {
            writeln!(f, "{} (bonus {})", cont.name, cont.control_value)?;
            for id in &cont.countries {
                let Some(c) = self.countries.get(id) else {
                    continue;
                };
                let neighbors: Vec<String> =
                    c.neighbors.iter().map(|n| self.country_name(*n)).collect();
                writeln!(
                    f,
                    "  {} [{}, {} armies] -> {}",
                    c.name,
                    c.owner.as_deref().unwrap_or("neutral"),
                    c.armies,
                    neighbors.join(", ")
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::twin_map;

    #[test]
    fn serials_start_at_base() {
        let map = twin_map();
        assert_eq!(map.find_continent("North").unwrap().id(), SERIAL_BASE);
        assert_eq!(map.find_country("A").unwrap().id(), SERIAL_BASE);
        assert_eq!(map.find_country("F").unwrap().id(), SERIAL_BASE + 5);
    }

    #[test]
    fn clear_resets_serials() {
        let mut map = twin_map();
        map.clear();
        assert!(map.is_empty());
        map.add_continent("X", 1).unwrap();
        let id = map.add_country_to_continent("x1", "X").unwrap();
        assert_eq!(id, SERIAL_BASE);
    }

    #[test]
    fn reset_serials_skips_ids_in_use() {
        let mut map = twin_map();
        map.reset_serial_numbers();
        let id = map.add_country_to_continent("G", "South").unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn neighbors_are_symmetric() {
        let map = twin_map();
        for c in map.countries() {
            for n in c.neighbors() {
                assert!(map.neighbors_of(*n).unwrap().contains(&c.id()));
            }
        }
    }

    #[test]
    fn remove_neighbor_is_symmetric() {
        let mut map = twin_map();
        map.remove_neighbor("A", "B").unwrap();
        let a = map.find_country("A").unwrap().id();
        let b = map.find_country("B").unwrap().id();
        assert!(!map.is_adjacent(a, b));
        assert!(!map.is_adjacent(b, a));
        assert!(map.remove_neighbor("A", "B").is_err());
    }

    #[test]
    fn self_neighbor_rejected() {
        let mut map = twin_map();
        let err = map.add_neighbor("A", "A").unwrap_err();
        assert!(matches!(err, GameError::InvalidArgument(_)));
    }

    #[test]
    fn lookups_fail_with_entity_not_found() {
        let map = twin_map();
        assert!(matches!(
            map.find_country("Nowhere"),
            Err(GameError::EntityNotFound { kind: "country", .. })
        ));
        assert!(matches!(
            map.find_continent("Nowhere"),
            Err(GameError::EntityNotFound { kind: "continent", .. })
        ));
        assert!(map.country(99).is_err());
        assert!(map.continent(99).is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut map = twin_map();
        assert!(map.add_continent("North", 1).is_err());
        assert!(map.add_country_to_continent("A", "South").is_err());
        assert!(matches!(
            map.add_country_to_continent("Z", "Atlantis"),
            Err(GameError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn unowned_and_enemy_neighbors() {
        let mut map = twin_map();
        let a = map.find_country("A").unwrap().id();
        let b = map.find_country("B").unwrap().id();
        let f = map.find_country("F").unwrap().id();
        map.country_mut(a).unwrap().owner = Some("alice".to_string());
        map.country_mut(b).unwrap().owner = Some("bob".to_string());

        assert_eq!(map.unowned_neighbors_of(a).unwrap(), vec![f]);
        assert_eq!(map.enemy_neighbors_of(a, "alice").unwrap(), vec![b, f]);
        assert!(map.enemy_neighbors_of(b, "bob").unwrap().contains(&a));
    }

    #[test]
    fn valid_map_passes() {
        assert!(twin_map().validate().is_ok());
    }

    #[test]
    fn every_country_in_exactly_one_continent() {
        let map = twin_map();
        for c in map.countries() {
            let holders = map
                .continents()
                .filter(|cont| cont.countries().contains(&c.id()))
                .count();
            assert_eq!(holders, 1);
        }
    }

    #[test]
    fn empty_continent_is_invalid() {
        let mut map = twin_map();
        map.add_continent("Empty", 1).unwrap();
        assert!(matches!(map.validate(), Err(GameError::InvalidMap(_))));
    }

    #[test]
    fn unreachable_country_is_invalid() {
        let mut map = twin_map();
        map.add_country_to_continent("Island", "South").unwrap();
        let err = map.validate().unwrap_err();
        assert!(err.to_string().contains("Island"));
    }

    #[test]
    fn disconnected_continent_is_invalid() {
        let mut map = twin_map();
        // North becomes A and C joined only through the south.
        map.remove_neighbor("A", "B").unwrap();
        map.remove_neighbor("B", "C").unwrap();
        map.add_neighbor("B", "D").unwrap();
        let err = map.validate().unwrap_err();
        assert!(err.to_string().contains("North"));
    }

    #[test]
    fn remove_continent_drops_members_and_links() {
        let mut map = twin_map();
        map.remove_continent("North").unwrap();
        assert_eq!(map.country_count(), 3);
        let f = map.find_country("F").unwrap();
        assert_eq!(f.neighbors().len(), 1);
    }

    #[test]
    fn ownership_queries() {
        let mut map = twin_map();
        let ids: Vec<CountryId> = map.countries().map(|c| c.id()).collect();
        for id in &ids[..3] {
            map.country_mut(*id).unwrap().owner = Some("alice".to_string());
        }
        let north = map.find_continent("North").unwrap().id();
        let south = map.find_continent("South").unwrap().id();
        assert!(map.owns_continent("alice", north));
        assert!(!map.owns_continent("alice", south));
        assert_eq!(map.owned_count("alice"), 3);
        assert_eq!(map.sole_owner(), None);

        for id in &ids[3..] {
            map.country_mut(*id).unwrap().owner = Some("alice".to_string());
        }
        assert_eq!(map.sole_owner(), Some("alice"));
    }

    #[test]
    fn display_lists_countries() {
        let text = twin_map().to_string();
        assert!(text.contains("North (bonus 3)"));
        assert!(text.contains("A [neutral, 0 armies] -> B, F"));
    }
}
