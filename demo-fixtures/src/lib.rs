//! Deterministic synthetic demo files.
//!
//! [`DemoBuilder`], [`Packet`] and [`EntityBatch`] assemble demos frame by
//! frame from the workspace encoders. [`build_match`] scripts a complete
//! match on top of them and records what it wrote, so parser output can be
//! checked against ground truth.

mod builder;
pub mod catalog;
mod error;
mod script;

pub use builder::{DemoBuilder, EntityBatch, Packet};
pub use error::{FixtureError, FixtureResult};
pub use script::{
    build_match, grenade_origin, pawn_handle, player_origin, MatchConfig, PlayerInfo,
    ScriptedEvent, SyntheticMatch, ThrownGrenade, FIRST_GRENADE_SLOT, FIRST_PAWN_SLOT,
    FIRST_STEAM_ID, GAME_RULES_SLOT, GRENADE_LIFETIME, GRENADE_SLOTS, MAX_PLAYERS, WORLD_SLOT,
};

#[cfg(test)]
mod tests {
    use super::*;
    use wire::{FrameKind, FrameReader, Limits};

    #[test]
    fn public_api_exports() {
        let _ = DemoBuilder::new();
        let _ = Packet::new();
        let _ = MatchConfig::default();
        let _ = catalog::class_table();
        let _ = pawn_handle(0);
    }

    #[test]
    fn matches_are_deterministic() {
        let a = build_match(&MatchConfig::small()).unwrap();
        let b = build_match(&MatchConfig::small()).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.events, b.events);

        let other = build_match(&MatchConfig {
            seed: 99,
            ..MatchConfig::small()
        })
        .unwrap();
        assert_ne!(a.bytes, other.bytes);
    }

    #[test]
    fn script_records_rounds_and_grenades() {
        let config = MatchConfig::small();
        let m = build_match(&config).unwrap();
        assert_eq!(m.ticks_of("round_end"), vec![32, 64, 96]);
        assert_eq!(m.count("round_start"), 3);
        assert_eq!(m.players.len(), 4);
        // Thrown at 20, 40, 60 and 80.
        assert_eq!(m.grenades.len(), 4);
        assert!(m
            .grenades
            .iter()
            .all(|g| g.points.len() == GRENADE_LIFETIME as usize));
        assert_eq!(m.grenades[1].grenade_type, "CHEGrenadeProjectile");
    }

    #[test]
    fn frames_end_with_stop() {
        let m = build_match(&MatchConfig {
            compress: true,
            ..MatchConfig::small()
        })
        .unwrap();
        let frames: Vec<_> = FrameReader::new(&m.bytes, Limits::for_testing())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames[0].header.kind, FrameKind::FileHeader);
        assert_eq!(frames.last().unwrap().header.kind, FrameKind::Stop);
        // header, send tables, class info, signon, one packet per tick, stop
        assert_eq!(frames.len(), 4 + 96 + 1);
    }
}
