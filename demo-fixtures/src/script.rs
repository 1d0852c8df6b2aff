//! A scripted, deterministic match.
//!
//! Players move on fixed paths, take random damage from a seeded generator,
//! throw grenades at a fixed cadence and play rounds of fixed length. The
//! script records what it wrote so tests can compare parser output against
//! ground truth.

use std::collections::BTreeMap;

use codec::{DemoHeader, EntityHandle, EntityIndex, PropValue, SUPPORTED_HEADER_VERSIONS};
use schema::{ClassId, ClassTable, EventDescriptorTable};
use wire::FrameKind;

use crate::builder::{DemoBuilder, EntityBatch, Packet};
use crate::catalog::{
    self, controller, game_rules, pawn, projectile, CONTROLLER, GAME_RULES, HE_PROJECTILE, PAWN,
    PLAYER_DEATH, PLAYER_HURT, ROUND_END, ROUND_START, SMOKE_PROJECTILE, WEAPON_FIRE, WORLD,
};
use crate::error::FixtureResult;

pub const WORLD_SLOT: u32 = 0;
pub const GAME_RULES_SLOT: u32 = 64;
pub const FIRST_PAWN_SLOT: u32 = 65;
pub const FIRST_GRENADE_SLOT: u32 = 200;
pub const GRENADE_SLOTS: u32 = 16;
/// Ticks a projectile stays alive.
pub const GRENADE_LIFETIME: u32 = 12;
pub const MAX_PLAYERS: u32 = 32;
pub const FIRST_STEAM_ID: u64 = 76_561_198_000_000_001;

const NAMES: [&str; 10] = [
    "s1mple", "ZywOo", "NiKo", "m0NESY", "donk", "ropz", "device", "sh1ro", "Twistzz", "b1t",
];

/// Shape of the scripted match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Number of players, clamped to `1..=MAX_PLAYERS`.
    pub players: u32,
    /// Last in-game tick.
    pub ticks: u32,
    /// Ticks per round; a round ends on every multiple.
    pub round_ticks: u32,
    /// A grenade is thrown on every multiple.
    pub grenade_every: u32,
    /// Snappy-compress frame payloads.
    pub compress: bool,
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            players: 10,
            ticks: 640,
            round_ticks: 128,
            grenade_every: 24,
            compress: false,
            seed: 1,
        }
    }
}

impl MatchConfig {
    /// A short match that fits within test limits.
    #[must_use]
    pub const fn small() -> Self {
        Self {
            players: 4,
            ticks: 96,
            round_ticks: 32,
            grenade_every: 20,
            compress: false,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub controller: u32,
    pub pawn: u32,
    pub name: String,
    pub steamid: u64,
    pub team: u64,
}

/// A projectile lifetime as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrownGrenade {
    pub entity_id: u32,
    pub grenade_type: &'static str,
    pub created_tick: i32,
    /// Index into [`SyntheticMatch::players`].
    pub thrower: usize,
    /// Position at the end of each tick the projectile was alive.
    pub points: Vec<(i32, [f32; 3])>,
}

/// One event occurrence as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedEvent {
    pub name: &'static str,
    pub tick: i32,
}

/// Encoded demo plus what it contains.
#[derive(Debug, Clone)]
pub struct SyntheticMatch {
    pub bytes: Vec<u8>,
    pub header: BTreeMap<String, String>,
    pub players: Vec<PlayerInfo>,
    pub events: Vec<ScriptedEvent>,
    pub grenades: Vec<ThrownGrenade>,
    pub last_tick: u32,
}

impl SyntheticMatch {
    /// Number of occurrences of `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name == name).count()
    }

    /// Ticks of every occurrence of `name`, in order.
    #[must_use]
    pub fn ticks_of(&self, name: &str) -> Vec<i32> {
        self.events
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.tick)
            .collect()
    }
}

/// Position of player `player` at the end of `tick`.
#[must_use]
pub fn player_origin(player: u32, tick: u32) -> [f32; 3] {
    [
        (player as f32).mul_add(256.0, (tick % 1024) as f32 * 0.5),
        (player as f32).mul_add(64.0, -1024.0) + ((tick * 3) % 512) as f32 * 0.25,
        64.0,
    ]
}

/// Position of the `n`th grenade `age` ticks after it was thrown.
#[must_use]
pub fn grenade_origin(n: u32, age: u32) -> [f32; 3] {
    [
        100.0 + (n * 32 + age * 8) as f32,
        200.0 + (age * 4) as f32,
        64.0 + (age * 2) as f32,
    ]
}

/// Handle of the pawn of player `player`.
#[must_use]
pub const fn pawn_handle(player: u32) -> u32 {
    EntityHandle::for_index(EntityIndex::new(FIRST_PAWN_SLOT + player), player + 1).raw()
}

/// Encodes a full match.
pub fn build_match(config: &MatchConfig) -> FixtureResult<SyntheticMatch> {
    Script::new(config).run()
}

struct Rng {
    state: u64,
}

impl Rng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n.max(1)
    }
}

struct LiveGrenade {
    n: u32,
    slot: u32,
    thrown: u32,
    record: usize,
}

struct Script {
    config: MatchConfig,
    players: u32,
    events: EventDescriptorTable,
    rng: Rng,
    health: Vec<u64>,
    score: Vec<i64>,
    live: Vec<LiveGrenade>,
    thrown: u32,
    out: SyntheticMatch,
}

impl Script {
    fn new(config: &MatchConfig) -> Self {
        let players = config.players.clamp(1, MAX_PLAYERS);
        let header: BTreeMap<String, String> = [
            ("map_name", "de_synthetic"),
            ("server_name", "demo-fixtures"),
            ("client_name", "SourceTV Demo"),
            ("game_directory", "csgo"),
            ("demo_version_name", "valve_demo_2"),
            ("fullpackets_version", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let roster = (0..players)
            .map(|i| PlayerInfo {
                controller: i + 1,
                pawn: FIRST_PAWN_SLOT + i,
                name: player_name(i),
                steamid: FIRST_STEAM_ID + u64::from(i),
                team: if i % 2 == 0 { 2 } else { 3 },
            })
            .collect();
        Self {
            config: config.clone(),
            players,
            events: catalog::event_descriptors(),
            rng: Rng::new(config.seed),
            health: vec![100; players as usize],
            score: vec![0; players as usize],
            live: Vec::new(),
            thrown: 0,
            out: SyntheticMatch {
                bytes: Vec::new(),
                header,
                players: roster,
                events: Vec::new(),
                grenades: Vec::new(),
                last_tick: config.ticks,
            },
        }
    }

    fn run(mut self) -> FixtureResult<SyntheticMatch> {
        let mut demo = DemoBuilder::new().compressed(self.config.compress);
        demo.header(&DemoHeader {
            version: *SUPPORTED_HEADER_VERSIONS.end(),
            entries: self.out.header.clone(),
        })?;
        demo.send_tables(&catalog::serializers())?;
        demo.class_info(&catalog::class_bindings())?;
        let classes = catalog::class_table();
        let signon = self.signon(&classes)?;
        demo.packet(FrameKind::SignonPacket, wire::PREGAME_TICK, &signon)?;

        for tick in 1..=self.config.ticks {
            let packet = self.tick(&classes, tick)?;
            demo.packet(FrameKind::Packet, tick, &packet)?;
        }
        demo.stop(self.config.ticks)?;

        self.out.bytes = demo.finish();
        Ok(self.out)
    }

    fn signon(&self, classes: &ClassTable) -> FixtureResult<Packet> {
        let mut packet = Packet::new();
        packet.event_list(&self.events)?;
        packet.baseline(
            classes,
            PAWN,
            &[
                (pawn::HEALTH, PropValue::UInt(100)),
                (pawn::ARMOR_VALUE, PropValue::UInt(0)),
            ],
        )?;
        packet.baseline(
            classes,
            CONTROLLER,
            &[(controller::SCORE, PropValue::SInt(0))],
        )?;

        let mut batch = EntityBatch::new(classes);
        batch.create(WORLD_SLOT, WORLD, 1, Vec::new());
        batch.create(
            GAME_RULES_SLOT,
            GAME_RULES,
            1,
            vec![
                (game_rules::TOTAL_ROUNDS_PLAYED, PropValue::UInt(0)),
                (game_rules::WARMUP_PERIOD, PropValue::Bool(true)),
                (
                    game_rules::ROUND_TIME,
                    PropValue::UInt(u64::from(self.config.round_ticks)),
                ),
            ],
        );
        for (i, player) in (0..self.players).zip(&self.out.players) {
            batch.create(
                player.controller,
                CONTROLLER,
                i + 1,
                vec![
                    (controller::PLAYER_NAME, PropValue::String(player.name.clone())),
                    (controller::STEAM_ID, PropValue::UInt(player.steamid)),
                    (controller::PLAYER_PAWN, PropValue::Handle(pawn_handle(i))),
                    (controller::TEAM_NUM, PropValue::UInt(player.team)),
                ],
            );
            batch.create(
                player.pawn,
                PAWN,
                i + 1,
                vec![
                    (pawn::ORIGIN, PropValue::Vector(player_origin(i, 0))),
                    (pawn::EYE_YAW, PropValue::Float(90.0)),
                    (pawn::VELOCITY, PropValue::Float(0.0)),
                ],
            );
        }
        packet.entities(batch, false)?;
        Ok(packet)
    }

    fn tick(&mut self, classes: &ClassTable, tick: u32) -> FixtureResult<Packet> {
        let mut batch = EntityBatch::new(classes);
        let mut events: Vec<(u32, Vec<PropValue>)> = Vec::new();
        let round_ticks = self.config.round_ticks.max(1);

        if tick == 1 {
            batch.set(
                GAME_RULES_SLOT,
                GAME_RULES,
                game_rules::WARMUP_PERIOD,
                PropValue::Bool(false),
            );
        }
        if (tick - 1) % round_ticks == 0 {
            for i in 0..self.players {
                self.health[i as usize] = 100;
                batch.set(FIRST_PAWN_SLOT + i, PAWN, pawn::HEALTH, PropValue::UInt(100));
            }
            events.push((
                ROUND_START,
                vec![PropValue::SInt(i64::from(round_ticks))],
            ));
        }

        for i in 0..self.players {
            batch.set(
                FIRST_PAWN_SLOT + i,
                PAWN,
                pawn::ORIGIN,
                PropValue::Vector(player_origin(i, tick)),
            );
        }

        self.damage(&mut batch, &mut events);

        if tick % 3 == 0 {
            let shooter = tick % self.players;
            events.push((
                WEAPON_FIRE,
                vec![
                    PropValue::UInt(u64::from(shooter + 1)),
                    PropValue::String("weapon_m4a1".into()),
                ],
            ));
        }

        self.grenades(tick, &mut batch);

        if tick % round_ticks == 0 {
            batch.set(
                GAME_RULES_SLOT,
                GAME_RULES,
                game_rules::TOTAL_ROUNDS_PLAYED,
                PropValue::UInt(u64::from(tick / round_ticks)),
            );
            let ct_win = self.rng.below(2) == 0;
            events.push((
                ROUND_END,
                vec![
                    PropValue::UInt(if ct_win { 3 } else { 2 }),
                    PropValue::UInt(u64::from(self.rng.below(10))),
                    PropValue::String(
                        if ct_win {
                            "#SFUI_Notice_CTs_Win"
                        } else {
                            "#SFUI_Notice_Terrorists_Win"
                        }
                        .into(),
                    ),
                ],
            ));
        }

        let mut packet = Packet::new();
        packet.net_tick(tick)?;
        if !batch.is_empty() {
            packet.entities(batch, true)?;
        }
        for (id, values) in events {
            // Descriptors come from the catalog, so every id is present.
            if let Some(descriptor) = self.events.get(id) {
                packet.event(descriptor, &values)?;
                self.out.events.push(ScriptedEvent {
                    name: event_name(id),
                    tick: tick as i32,
                });
            }
        }
        Ok(packet)
    }

    fn damage(&mut self, batch: &mut EntityBatch<'_>, events: &mut Vec<(u32, Vec<PropValue>)>) {
        if self.rng.below(5) != 0 {
            return;
        }
        let victim = self.rng.below(self.players);
        let attacker = if self.players > 1 {
            (victim + 1 + self.rng.below(self.players - 1)) % self.players
        } else {
            victim
        };
        let health = &mut self.health[victim as usize];
        if *health == 0 {
            return;
        }
        let dealt = 10 + self.rng.below(45);
        *health = health.saturating_sub(u64::from(dealt));
        let remaining = *health;
        batch.set(
            FIRST_PAWN_SLOT + victim,
            PAWN,
            pawn::HEALTH,
            PropValue::UInt(remaining),
        );
        events.push((
            PLAYER_HURT,
            vec![
                PropValue::Handle(pawn_handle(victim)),
                PropValue::Handle(pawn_handle(attacker)),
                PropValue::SInt(i64::from(dealt)),
                PropValue::UInt(remaining),
            ],
        ));
        if remaining == 0 {
            let score = &mut self.score[attacker as usize];
            *score += 1;
            batch.set(
                attacker + 1,
                CONTROLLER,
                controller::SCORE,
                PropValue::SInt(*score),
            );
            events.push((
                PLAYER_DEATH,
                vec![
                    PropValue::UInt(u64::from(victim + 1)),
                    PropValue::UInt(u64::from(attacker + 1)),
                    PropValue::String("weapon_ak47".into()),
                    PropValue::Bool(self.rng.below(3) == 0),
                ],
            ));
        }
    }

    fn grenades(&mut self, tick: u32, batch: &mut EntityBatch<'_>) {
        let mut still_live = Vec::with_capacity(self.live.len());
        for grenade in self.live.drain(..) {
            let age = tick - grenade.thrown;
            if age >= GRENADE_LIFETIME {
                batch.delete(grenade.slot);
                continue;
            }
            batch.set(
                grenade.slot,
                class_of_grenade(grenade.n),
                projectile::ORIGIN,
                PropValue::Vector(grenade_origin(grenade.n, age)),
            );
            still_live.push(grenade);
        }
        self.live = still_live;

        if self.config.grenade_every > 0 && tick % self.config.grenade_every == 0 {
            let n = self.thrown;
            self.thrown += 1;
            let slot = FIRST_GRENADE_SLOT + n % GRENADE_SLOTS;
            let thrower = n % self.players;
            batch.create(
                slot,
                class_of_grenade(n),
                n + 1,
                vec![
                    (projectile::ORIGIN, PropValue::Vector(grenade_origin(n, 0))),
                    (projectile::THROWER, PropValue::Handle(pawn_handle(thrower))),
                ],
            );
            self.live.push(LiveGrenade {
                n,
                slot,
                thrown: tick,
                record: self.out.grenades.len(),
            });
            self.out.grenades.push(ThrownGrenade {
                entity_id: slot,
                grenade_type: grenade_type(n),
                created_tick: tick as i32,
                thrower: thrower as usize,
                points: Vec::new(),
            });
        }

        for grenade in &self.live {
            if let Some(record) = self.out.grenades.get_mut(grenade.record) {
                record
                    .points
                    .push((tick as i32, grenade_origin(grenade.n, tick - grenade.thrown)));
            }
        }
    }
}

fn player_name(i: u32) -> String {
    let base = NAMES[i as usize % NAMES.len()];
    if (i as usize) < NAMES.len() {
        base.to_string()
    } else {
        format!("{base}_{}", i as usize / NAMES.len())
    }
}

const fn class_of_grenade(n: u32) -> ClassId {
    if n % 2 == 0 {
        SMOKE_PROJECTILE
    } else {
        HE_PROJECTILE
    }
}

const fn grenade_type(n: u32) -> &'static str {
    if n % 2 == 0 {
        "CSmokeGrenadeProjectile"
    } else {
        "CHEGrenadeProjectile"
    }
}

const fn event_name(id: u32) -> &'static str {
    match id {
        ROUND_START => "round_start",
        ROUND_END => "round_end",
        PLAYER_DEATH => "player_death",
        PLAYER_HURT => "player_hurt",
        WEAPON_FIRE => "weapon_fire",
        _ => "unknown",
    }
}
