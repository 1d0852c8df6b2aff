//! Friendly property names and entity class roles.

use schema::EntityClass;

pub const CONTROLLER_CLASS: &str = "CCSPlayerController";
pub const PAWN_CLASS: &str = "CCSPlayerPawn";
pub const GAME_RULES_CLASS: &str = "CCSGameRulesProxy";
/// Substring shared by every grenade projectile class name.
pub const PROJECTILE_MARKER: &str = "Projectile";

pub const PLAYER_NAME_PROP: &str = "m_iszPlayerName";
pub const STEAM_ID_PROP: &str = "m_steamID";
pub const PLAYER_PAWN_PROP: &str = "m_hPlayerPawn";
pub const TEAM_PROP: &str = "m_iTeamNum";
pub const ORIGIN_PROP: &str = "m_vecOrigin";
pub const THROWER_PROP: &str = "m_hThrower";

/// A property name with an optional vector component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropPath {
    pub prop: String,
    /// Component of a `Vector3` value, `0..3`.
    pub component: Option<usize>,
}

impl PropPath {
    #[must_use]
    pub fn new(prop: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            component: None,
        }
    }

    #[must_use]
    pub fn component(prop: impl Into<String>, component: usize) -> Self {
        Self {
            prop: prop.into(),
            component: Some(component),
        }
    }
}

/// Maps a requested name to the property it reads.
///
/// Names that are not aliases are used as-is.
#[must_use]
pub fn resolve_alias(name: &str) -> PropPath {
    match name {
        "X" => PropPath::component(ORIGIN_PROP, 0),
        "Y" => PropPath::component(ORIGIN_PROP, 1),
        "Z" => PropPath::component(ORIGIN_PROP, 2),
        "health" => PropPath::new("m_iHealth"),
        "team_num" => PropPath::new(TEAM_PROP),
        "armor_value" => PropPath::new("m_ArmorValue"),
        "total_rounds_played" => PropPath::new("m_totalRoundsPlayed"),
        "is_warmup_period" => PropPath::new("m_bWarmupPeriod"),
        other => PropPath::new(other),
    }
}

/// What a class is used for when building output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassRole {
    Controller,
    Pawn,
    GameRules,
    Grenade,
    Other,
}

impl ClassRole {
    #[must_use]
    pub fn of(class: &EntityClass) -> Self {
        match class.name.as_str() {
            CONTROLLER_CLASS => Self::Controller,
            PAWN_CLASS => Self::Pawn,
            GAME_RULES_CLASS => Self::GameRules,
            name if name.contains(PROJECTILE_MARKER) => Self::Grenade,
            _ => Self::Other,
        }
    }
}
