//! Selective extraction of events, tick data and grenade paths from demo files.
//!
//! This crate ties the framing, schema, codec and selection crates into the
//! six operations callers use:
//!
//! - [`parse_header`] - header key/value metadata
//! - [`list_game_events`] - event names declared by the demo
//! - [`parse_event`] / [`parse_events`] - game events enriched with player data
//! - [`parse_ticks`] - per-tick player rows, row- or column-oriented
//! - [`parse_grenades`] - projectile trajectories
//!
//! Every operation takes an in-memory buffer and makes one forward pass over
//! it. Entity properties that no column needs are skipped, not decoded.
//!
//! # Design Principles
//!
//! - **Only decode what's asked** - Filters are compiled against the demo's
//!   class table before entity data is read.
//! - **Deterministic** - Same buffer and filters produce the same output.
//! - **Forward compatible** - Unknown frames and events become warnings;
//!   only broken framing is fatal.
//! - **No shared state** - Each call owns its session, so independent calls
//!   may run on separate threads.

mod error;
mod events;
mod grenades;
mod limits;
mod output;
mod parser;
mod players;
mod scan;
mod ticks;
mod warning;

pub use codec::{PropValue, Tick};
pub use error::{ParseError, ParseResult};
pub use limits::ParserLimits;
pub use output::{
    EventOutput, GameEvent, GrenadeOutput, GrenadePoint, GrenadeTrajectory, TickColumns,
    TickOutput, TickRow, TickTable,
};
pub use parser::{
    list_game_events, parse_event, parse_events, parse_grenades, parse_header, parse_ticks,
    DemoParser,
};
pub use selection::{EventFilter, EventQuery, PlayerFilter, TickFilter, TickQuery};
pub use warning::ParseWarning;
