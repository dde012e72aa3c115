//! Console protocol and file formats.
//!
//! Parsing of console commands, conversion of commands and saved records
//! into orders, the Domination `.map` format, and the serde records used to
//! save a game.

pub mod mapfile;
pub mod mapper;
pub mod parser;
pub mod snapshot;

pub use mapfile::{parse_map, write_map};
pub use mapper::{order_from_command, order_from_record, order_kind};
pub use parser::{parse_command, Command, CommandKind, OptionGroup};
pub use snapshot::{GameSnapshot, MapRecord, OrderRecord, PlayerRecord};
