//! Domination `.map` files.
//!
//! A map file has three required sections:
//!
//! ```text
//! [continents]
//! North 3
//! South 2
//!
//! [countries]
//! 1 Alaska 1 40 50
//! 2 Alberta 1 90 55
//!
//! [borders]
//! 1 2
//! 2 1
//! ```
//!
//! Continents are numbered by position starting at 1. A country line is
//! `<id> <name> <continent> [x y]`; coordinates are ignored. A border line is
//! a country id followed by the ids of its neighbors. Lines starting with `;`
//! and any other section (`[files]`, `[map]`) are skipped.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::board::{ContinentId, CountryId, Map};
use crate::error::{GameError, Result};

const CONTINENTS: &str = "continents";
const COUNTRIES: &str = "countries";
const BORDERS: &str = "borders";

/// Splits the text into named sections of (line number, line) pairs.
fn sections(text: &str) -> BTreeMap<String, Vec<(usize, &str)>> {
    let mut out: BTreeMap<String, Vec<(usize, &str)>> = BTreeMap::new();
    let mut current: Option<String> = None;
    for (n, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_ascii_lowercase();
            out.entry(name.clone()).or_default();
            current = Some(name);
        } else if let Some(name) = &current {
            out.entry(name.clone()).or_default().push((n + 1, line));
        }
    }
    out
}

fn bad_line(n: usize, what: &str, line: &str) -> GameError {
    GameError::InvalidMap(format!("line {n}: {what}: '{line}'"))
}

fn parse_num<T: std::str::FromStr>(token: Option<&str>, n: usize, line: &str) -> Result<T> {
    token
        .and_then(|t| t.parse::<T>().ok())
        .ok_or_else(|| bad_line(n, "expected a number", line))
}

/// Parses a map file into a fresh map. The map is not validated.
pub fn parse_map(text: &str) -> Result<Map> {
    let sections = sections(text);
    let section = |name: &str| {
        sections
            .get(name)
            .ok_or_else(|| GameError::AbsentTag(name.to_string()))
    };
    let continent_lines = section(CONTINENTS)?;
    let country_lines = section(COUNTRIES)?;
    let border_lines = section(BORDERS)?;

    let mut map = Map::new();
    for (pos, (n, line)) in continent_lines.iter().enumerate() {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        let value: u32 = parse_num(tokens.next(), *n, line)?;
        if map.find_continent(name).is_ok() {
            return Err(bad_line(*n, "duplicate continent", line));
        }
        map.restore_continent(pos as ContinentId + 1, name, value)
            .map_err(|e| bad_line(*n, &e.to_string(), line))?;
    }

    for (n, line) in country_lines {
        let mut tokens = line.split_whitespace();
        let id: CountryId = parse_num(tokens.next(), *n, line)?;
        let name = tokens
            .next()
            .ok_or_else(|| bad_line(*n, "missing country name", line))?;
        let continent: ContinentId = parse_num(tokens.next(), *n, line)?;
        if map.find_country(name).is_ok() {
            return Err(bad_line(*n, "duplicate country", line));
        }
        map.restore_country(id, name, continent, None, 0)
            .map_err(|e| bad_line(*n, &e.to_string(), line))?;
    }

    for (n, line) in border_lines {
        let mut tokens = line.split_whitespace();
        let id: CountryId = parse_num(tokens.next(), *n, line)?;
        for token in tokens {
            let neighbor: CountryId = parse_num(Some(token), *n, line)?;
            map.add_neighbor_ids(id, neighbor)
                .map_err(|e| bad_line(*n, &e.to_string(), line))?;
        }
    }
    map.reset_serial_numbers();
    Ok(map)
}

/// Renders a map in the Domination format.
pub fn write_map(map: &Map) -> String {
    let mut out = String::new();
    let mut positions: BTreeMap<ContinentId, usize> = BTreeMap::new();

    let _ = writeln!(out, "[{CONTINENTS}]");
    for (pos, continent) in map.continents().enumerate() {
        positions.insert(continent.id(), pos + 1);
        let _ = writeln!(out, "{} {}", continent.name(), continent.control_value());
    }

    let _ = writeln!(out, "\n[{COUNTRIES}]");
    for country in map.countries() {
        let pos = positions.get(&country.continent()).copied().unwrap_or(0);
        let _ = writeln!(out, "{} {} {} 0 0", country.id(), country.name(), pos);
    }

    let _ = writeln!(out, "\n[{BORDERS}]");
    for country in map.countries() {
        let _ = write!(out, "{}", country.id());
        for n in country.neighbors() {
            let _ = write!(out, " {n}");
        }
        out.push('\n');
    }
    out
}
