//! Builds orders from console commands and saved records.

use super::parser::Command;
use super::snapshot::OrderRecord;
use crate::board::{CountryId, Map, Order, OrderKind};
use crate::error::{GameError, Result};

fn country(map: &Map, name: &str) -> Result<CountryId> {
    Ok(map.find_country(name)?.id())
}

fn arg<'a>(keyword: &str, args: &'a [String], idx: usize) -> Result<&'a str> {
    args.get(idx).map(String::as_str).ok_or_else(|| {
        GameError::InvalidArgument(format!("{keyword} is missing argument {}", idx + 1))
    })
}

fn count(keyword: &str, args: &[String], idx: usize) -> Result<u32> {
    let raw = arg(keyword, args, idx)?;
    raw.parse::<u32>()
        .map_err(|_| GameError::InvalidArgument(format!("'{raw}' is not a valid number")))
}

/// Builds an order kind from a keyword and its positional values, resolving
/// country names against `map`.
pub fn order_kind(keyword: &str, args: &[String], map: &Map) -> Result<OrderKind> {
    let kind = match keyword.to_ascii_lowercase().as_str() {
        "deploy" => OrderKind::Deploy {
            target: country(map, arg(keyword, args, 0)?)?,
            armies: count(keyword, args, 1)?,
        },
        "advance" => OrderKind::Advance {
            source: country(map, arg(keyword, args, 0)?)?,
            target: country(map, arg(keyword, args, 1)?)?,
            armies: count(keyword, args, 2)?,
        },
        "bomb" => OrderKind::Bomb {
            target: country(map, arg(keyword, args, 0)?)?,
        },
        "blockade" => OrderKind::Blockade {
            target: country(map, arg(keyword, args, 0)?)?,
        },
        "airlift" => OrderKind::Airlift {
            source: country(map, arg(keyword, args, 0)?)?,
            target: country(map, arg(keyword, args, 1)?)?,
            armies: count(keyword, args, 2)?,
        },
        "negotiate" => OrderKind::Negotiate {
            other: arg(keyword, args, 0)?.to_string(),
        },
        other => {
            return Err(GameError::InvalidCommand(format!(
                "'{other}' is not an order"
            )))
        }
    };
    Ok(kind)
}

/// Builds the order kind a console command asks for.
pub fn order_from_command(command: &Command, map: &Map) -> Result<OrderKind> {
    if !command.kind.is_order() {
        return Err(GameError::InvalidCommand(format!(
            "{} is not an order",
            command.kind
        )));
    }
    order_kind(command.kind.keyword(), &command.args, map)
}

/// Rebuilds a saved order with its original scheduling.
pub fn order_from_record(record: &OrderRecord, map: &Map) -> Result<Order> {
    let kind = order_kind(&record.keyword, &record.args, map)?;
    Ok(Order::restore(
        &record.owner,
        kind,
        record.seq,
        record.execution_index,
        record.expiry_index,
    ))
}
