//! Classes and events of the synthetic match.
//!
//! Names follow the CS2 conventions the parser understands; property
//! indices are exported so tests can write entity data directly.

use schema::{
    ClassId, ClassTable, EventDescriptor, EventDescriptorTable, EventKey, EventKeyType, PropDef,
    PropType, QuantizedFloat, Serializer,
};

pub const GAME_RULES: ClassId = 1;
pub const CONTROLLER: ClassId = 2;
pub const PAWN: ClassId = 3;
pub const SMOKE_PROJECTILE: ClassId = 4;
pub const HE_PROJECTILE: ClassId = 5;
/// Bound without a serializer.
pub const WORLD: ClassId = 6;

pub mod game_rules {
    pub const TOTAL_ROUNDS_PLAYED: usize = 0;
    pub const WARMUP_PERIOD: usize = 1;
    pub const ROUND_TIME: usize = 2;
}

pub mod controller {
    pub const PLAYER_NAME: usize = 0;
    pub const STEAM_ID: usize = 1;
    pub const PLAYER_PAWN: usize = 2;
    pub const TEAM_NUM: usize = 3;
    pub const SCORE: usize = 4;
}

pub mod pawn {
    pub const HEALTH: usize = 0;
    pub const ARMOR_VALUE: usize = 1;
    pub const ORIGIN: usize = 2;
    pub const EYE_YAW: usize = 3;
    pub const VELOCITY: usize = 4;
}

pub mod projectile {
    pub const ORIGIN: usize = 0;
    pub const THROWER: usize = 1;
}

pub const ROUND_START: u32 = 1;
pub const ROUND_END: u32 = 2;
pub const PLAYER_DEATH: u32 = 3;
pub const PLAYER_HURT: u32 = 4;
pub const WEAPON_FIRE: u32 = 5;

/// Serializers sent in the `SendTables` frame.
#[must_use]
pub fn serializers() -> Vec<Serializer> {
    let projectile = vec![
        PropDef::new("m_vecOrigin", PropType::Vector3),
        PropDef::new("m_hThrower", PropType::Handle),
    ];
    vec![
        Serializer::new(
            "CCSGameRulesProxy",
            vec![
                PropDef::new("m_totalRoundsPlayed", PropType::UInt { bits: 8 }),
                PropDef::new("m_bWarmupPeriod", PropType::Bool),
                PropDef::new("m_iRoundTime", PropType::VarUInt),
            ],
        ),
        Serializer::new(
            "CCSPlayerController",
            vec![
                PropDef::new("m_iszPlayerName", PropType::String),
                PropDef::new("m_steamID", PropType::UInt64),
                PropDef::new("m_hPlayerPawn", PropType::Handle),
                PropDef::new("m_iTeamNum", PropType::UInt { bits: 3 }),
                PropDef::new("m_iScore", PropType::VarSInt),
            ],
        ),
        Serializer::new(
            "CCSPlayerPawn",
            vec![
                PropDef::new("m_iHealth", PropType::UInt { bits: 8 }),
                PropDef::new("m_ArmorValue", PropType::UInt { bits: 8 }),
                PropDef::new("m_vecOrigin", PropType::Vector3),
                PropDef::new(
                    "m_angEyeYaw",
                    PropType::QuantizedFloat(QuantizedFloat::new(10, 0.0, 360.0)),
                ),
                PropDef::new("m_flVelocity", PropType::Float32),
            ],
        ),
        Serializer::new("CSmokeGrenadeProjectile", projectile.clone()),
        Serializer::new("CHEGrenadeProjectile", projectile),
    ]
}

/// Class id bindings sent in the `ClassInfo` frame.
#[must_use]
pub fn class_bindings() -> Vec<(ClassId, &'static str)> {
    vec![
        (GAME_RULES, "CCSGameRulesProxy"),
        (CONTROLLER, "CCSPlayerController"),
        (PAWN, "CCSPlayerPawn"),
        (SMOKE_PROJECTILE, "CSmokeGrenadeProjectile"),
        (HE_PROJECTILE, "CHEGrenadeProjectile"),
        (WORLD, "CWorld"),
    ]
}

/// The class table a decoder ends up with after both schema frames.
#[must_use]
pub fn class_table() -> ClassTable {
    let mut table = ClassTable::new();
    table.add_serializers(serializers());
    let _ = table.bind_classes(
        class_bindings()
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect(),
    );
    table
}

/// Events declared by the `GameEventList` message.
#[must_use]
pub fn event_descriptors() -> EventDescriptorTable {
    let mut table = EventDescriptorTable::new();
    table.insert(EventDescriptor::new(
        ROUND_START,
        "round_start",
        vec![EventKey::new("timelimit", EventKeyType::Long)],
    ));
    table.insert(EventDescriptor::new(
        ROUND_END,
        "round_end",
        vec![
            EventKey::new("winner", EventKeyType::Byte),
            EventKey::new("reason", EventKeyType::Byte),
            EventKey::new("message", EventKeyType::String),
        ],
    ));
    table.insert(EventDescriptor::new(
        PLAYER_DEATH,
        "player_death",
        vec![
            EventKey::new("userid", EventKeyType::PlayerController),
            EventKey::new("attacker", EventKeyType::PlayerController),
            EventKey::new("weapon", EventKeyType::String),
            EventKey::new("headshot", EventKeyType::Bool),
        ],
    ));
    table.insert(EventDescriptor::new(
        PLAYER_HURT,
        "player_hurt",
        vec![
            EventKey::new("userid", EventKeyType::PlayerPawn),
            EventKey::new("attacker", EventKeyType::PlayerPawn),
            EventKey::new("dmg_health", EventKeyType::Short),
            EventKey::new("health", EventKeyType::Byte),
        ],
    ));
    table.insert(EventDescriptor::new(
        WEAPON_FIRE,
        "weapon_fire",
        vec![
            EventKey::new("userid", EventKeyType::PlayerController),
            EventKey::new("weapon", EventKeyType::String),
        ],
    ));
    table
}
