//! Selection and projection: decide what to decode, not how.
//!
//! Callers describe what they want with [`EventQuery`] and [`TickQuery`].
//! Once a demo's class table is known, the property names are compiled into
//! a [`Selection`]: per-class decode masks (used by the entity table through
//! [`codec::PropInterest`]) plus the resolved output [`Column`]s.
//!
//! # Design Principles
//!
//! - **Pure** - A selection depends only on the class table and the request,
//!   so identical inputs give identical output.
//! - **Missing names are data** - A name that matches no property is
//!   reported, never an error.

mod alias;
mod plan;
mod query;

pub use alias::{
    resolve_alias, ClassRole, PropPath, CONTROLLER_CLASS, GAME_RULES_CLASS, ORIGIN_PROP,
    PAWN_CLASS, PLAYER_NAME_PROP, PLAYER_PAWN_PROP, PROJECTILE_MARKER, STEAM_ID_PROP, TEAM_PROP,
    THROWER_PROP,
};
pub use plan::{
    Column, ColumnSource, GrenadeProps, PlayerIdentity, Selection, SelectionRequest,
};
pub use query::{EventFilter, EventQuery, PlayerFilter, TickFilter, TickQuery};
