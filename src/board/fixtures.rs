//! Shared test fixtures.

use super::map::Map;

/// Two continents, six countries in a ring: A-B-C (North) and D-E-F (South).
pub(crate) fn twin_map() -> Map {
    let mut map = Map::new();
    map.add_continent("North", 3).unwrap();
    map.add_continent("South", 2).unwrap();
    for name in ["A", "B", "C"] {
        map.add_country_to_continent(name, "North").unwrap();
    }
    for name in ["D", "E", "F"] {
        map.add_country_to_continent(name, "South").unwrap();
    }
    for (a, b) in [("A", "B"), ("B", "C"), ("C", "D"), ("D", "E"), ("E", "F"), ("F", "A")] {
        map.add_neighbor(a, b).unwrap();
    }
    map
}

/// The twin map with North (A, B, C) owned by `alice` and South (D, E, F)
/// by `bob`, every country holding `armies`.
pub(crate) fn split_map(armies: u32) -> Map {
    let mut map = twin_map();
    for id in 1..=6 {
        let c = map.country_mut(id).unwrap();
        c.owner = Some(if id <= 3 { "alice" } else { "bob" }.to_string());
        c.armies = armies;
    }
    map
}
