//! Every entry point against a scripted match.

use demo_fixtures::catalog::{self, controller, pawn, projectile};
use demo_fixtures::{
    build_match, pawn_handle, player_origin, DemoBuilder, EntityBatch, MatchConfig, Packet,
    SyntheticMatch, FIRST_GRENADE_SLOT, FIRST_PAWN_SLOT, FIRST_STEAM_ID,
};
use demoparser::{
    list_game_events, parse_event, parse_events, parse_grenades, parse_header, parse_ticks,
    DemoParser, EventFilter, EventQuery, ParseError, ParseWarning, ParserLimits, PlayerFilter,
    PropValue, TickFilter, TickQuery, TickTable,
};
use wire::{FrameKind, FrameReader, Limits, MessageKind};

fn small_match() -> SyntheticMatch {
    build_match(&MatchConfig::small()).unwrap()
}

#[test]
fn header_round_trips() {
    let m = small_match();
    assert_eq!(parse_header(&m.bytes).unwrap(), m.header);
}

#[test]
fn lists_declared_events() {
    let m = small_match();
    assert_eq!(
        list_game_events(&m.bytes).unwrap(),
        vec![
            "player_death",
            "player_hurt",
            "round_end",
            "round_start",
            "weapon_fire"
        ]
    );
}

#[test]
fn round_end_occurrences_are_exact_and_ordered() {
    let m = small_match();
    let query = EventQuery::new().other_props(["total_rounds_played", "is_warmup_period"]);
    let output = parse_event(&m.bytes, "round_end", &query).unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);

    let ticks: Vec<i32> = output.events.iter().map(|e| e.tick).collect();
    assert_eq!(ticks, m.ticks_of("round_end"));
    for (round, event) in output.events.iter().enumerate() {
        assert_eq!(event.name, "round_end");
        assert!(event.get("winner").is_some());
        assert!(event.get("message").and_then(PropValue::as_str).is_some());
        assert_eq!(
            event.get("total_rounds_played"),
            Some(&PropValue::UInt(round as u64 + 1))
        );
        assert_eq!(event.get("is_warmup_period"), Some(&PropValue::Bool(false)));
    }
}

#[test]
fn player_keys_are_enriched() {
    let m = small_match();
    let query = EventQuery::new().player_props(["health", "X", "team_num"]);
    let output = parse_events(
        &m.bytes,
        &query
            .clone()
            .events(["player_hurt", "player_death"].into_iter().collect()),
    )
    .unwrap();
    assert!(!output.events.is_empty());

    for event in &output.events {
        let keys: Vec<&str> = event.fields.keys().map(String::as_str).collect();
        assert!(keys.contains(&"user_name"), "{keys:?}");
        assert!(keys.contains(&"attacker_steamid"), "{keys:?}");
        assert!(keys.contains(&"user_X"), "{keys:?}");

        match event.name.as_str() {
            "player_hurt" => {
                assert_eq!(event.get("user_health"), event.get("health"));
            }
            "player_death" => {
                let victim = event.get("userid").and_then(PropValue::as_u64).unwrap();
                let player = &m.players[victim as usize - 1];
                assert_eq!(
                    event.get("user_name"),
                    Some(&PropValue::String(player.name.clone()))
                );
                assert_eq!(
                    event.get("user_steamid"),
                    Some(&PropValue::UInt(player.steamid))
                );
                assert_eq!(event.get("user_health"), Some(&PropValue::UInt(0)));
                assert_eq!(
                    event.get("user_team_num"),
                    Some(&PropValue::UInt(player.team))
                );
                let x = player_origin(victim as u32 - 1, event.tick as u32)[0];
                assert_eq!(event.get("user_X"), Some(&PropValue::Float(x)));
            }
            other => panic!("unexpected event {other}"),
        }
    }
}

#[test]
fn all_events_arrive_in_script_order() {
    let m = small_match();
    let output = parse_events(&m.bytes, &EventQuery::new()).unwrap();
    let seen: Vec<(&str, i32)> = output
        .events
        .iter()
        .map(|e| (e.name.as_str(), e.tick))
        .collect();
    let expected: Vec<(&str, i32)> = m.events.iter().map(|e| (e.name, e.tick)).collect();
    assert_eq!(seen, expected);
}

#[test]
fn unknown_event_name_is_reported() {
    let m = small_match();
    let output = parse_event(&m.bytes, "bomb_planted", &EventQuery::new()).unwrap();
    assert!(output.events.is_empty());
    assert_eq!(
        output.warnings,
        vec![ParseWarning::InvalidFilter {
            item: "bomb_planted".into()
        }]
    );
}

#[test]
fn tick_rows_follow_player_paths() {
    let m = small_match();
    let query = TickQuery::new(["X", "Y", "health", "team_num"]);
    let output = parse_ticks(&m.bytes, &query).unwrap();
    assert_eq!(output.columns, vec!["X", "Y", "health", "team_num"]);
    let TickTable::Rows(rows) = &output.table else {
        panic!("expected rows");
    };
    assert_eq!(rows.len(), m.players.len() * m.last_tick as usize);

    for row in rows {
        let player = m
            .players
            .iter()
            .position(|p| p.controller == row.entity_id)
            .unwrap();
        let info = &m.players[player];
        assert_eq!(row.name.as_deref(), Some(info.name.as_str()));
        assert_eq!(row.steamid, Some(info.steamid));
        let [x, y, _] = player_origin(player as u32, row.tick as u32);
        assert_eq!(row.values["X"], Some(PropValue::Float(x)));
        assert_eq!(row.values["Y"], Some(PropValue::Float(y)));
        assert_eq!(row.values["team_num"], Some(PropValue::UInt(info.team)));
        assert!(row.values["health"].is_some());
    }
}

#[test]
fn rows_are_ordered_by_tick_then_entity() {
    let m = small_match();
    let output = parse_ticks(&m.bytes, &TickQuery::new(["health"])).unwrap();
    let TickTable::Rows(rows) = output.table else {
        panic!("expected rows");
    };
    let keys: Vec<(i32, u32)> = rows.iter().map(|r| (r.tick, r.entity_id)).collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert_eq!(keys.first(), Some(&(1, 1)));
}

#[test]
fn tick_and_player_filters_narrow_rows() {
    let m = small_match();
    let target = &m.players[2];
    let query = TickQuery::new(["X"])
        .ticks(TickFilter::Set([10, 20, 500].into_iter().collect()))
        .players(PlayerFilter::SteamIds([target.steamid].into_iter().collect()));
    let output = parse_ticks(&m.bytes, &query).unwrap();
    let TickTable::Rows(rows) = output.table else {
        panic!("expected rows");
    };
    let ticks: Vec<i32> = rows.iter().map(|r| r.tick).collect();
    assert_eq!(ticks, vec![10, 20]);
    assert!(rows.iter().all(|r| r.entity_id == target.controller));
}

#[test]
fn filters_that_exclude_everything_give_empty_output() {
    let m = small_match();
    let query = TickQuery::new(["X"])
        .ticks(TickFilter::Range(40..=50))
        .players(PlayerFilter::SteamIds([1].into_iter().collect()));
    let output = parse_ticks(&m.bytes, &query).unwrap();
    assert!(output.table.is_empty());
    assert!(output.warnings.is_empty());
    assert_eq!(output.columns, vec!["X"]);
}

#[test]
fn unknown_props_are_omitted_with_a_warning() {
    let m = small_match();
    let query = TickQuery::new(["X", "m_bogus", "X"]);
    let output = parse_ticks(&m.bytes, &query).unwrap();
    assert_eq!(output.columns, vec!["X"]);
    assert_eq!(
        output.warnings,
        vec![ParseWarning::InvalidFilter {
            item: "m_bogus".into()
        }]
    );
}

#[test]
fn struct_of_arrays_matches_rows() {
    let m = small_match();
    let query = TickQuery::new(["X", "health", "armor_value"]).ticks(TickFilter::Range(30..=40));
    let rows = parse_ticks(&m.bytes, &query).unwrap();
    let columns = parse_ticks(&m.bytes, &query.clone().struct_of_arrays(true)).unwrap();
    assert!(matches!(columns.table, TickTable::Columns(_)));
    assert_eq!(rows.table.len(), columns.table.len());
    assert_eq!(rows.into_columns(), columns.into_columns());
}

#[test]
fn grenade_paths_match_the_script() {
    let m = small_match();
    let output = parse_grenades(&m.bytes).unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    assert_eq!(output.grenades.len(), m.grenades.len());

    for (parsed, thrown) in output.grenades.iter().zip(&m.grenades) {
        let thrower = &m.players[thrown.thrower];
        assert_eq!(parsed.entity_id, thrown.entity_id);
        assert_eq!(parsed.grenade_type, thrown.grenade_type);
        assert_eq!(parsed.created_tick, thrown.created_tick);
        assert_eq!(parsed.thrower_name.as_deref(), Some(thrower.name.as_str()));
        assert_eq!(parsed.thrower_steamid, Some(thrower.steamid));
        let points: Vec<(i32, [f32; 3])> = parsed
            .points
            .iter()
            .map(|p| (p.tick, [p.x, p.y, p.z]))
            .collect();
        assert_eq!(points, thrown.points);
    }
}

#[test]
fn reused_grenade_slots_start_new_trajectories() {
    let m = build_match(&MatchConfig {
        ticks: 200,
        grenade_every: 2,
        ..MatchConfig::small()
    })
    .unwrap();
    let output = parse_grenades(&m.bytes).unwrap();
    assert_eq!(output.grenades.len(), 100);
    let first = &output.grenades[0];
    let reuse = &output.grenades[16];
    assert_eq!(first.entity_id, reuse.entity_id);
    assert!(reuse.created_tick > first.points.last().unwrap().tick);
}

#[test]
fn compression_does_not_change_output() {
    let plain = small_match();
    let packed = build_match(&MatchConfig {
        compress: true,
        ..MatchConfig::small()
    })
    .unwrap();
    assert_ne!(plain.bytes, packed.bytes);
    let query = TickQuery::new(["X", "health"]);
    assert_eq!(
        parse_ticks(&plain.bytes, &query).unwrap(),
        parse_ticks(&packed.bytes, &query).unwrap()
    );
    assert_eq!(
        parse_events(&plain.bytes, &EventQuery::new()).unwrap(),
        parse_events(&packed.bytes, &EventQuery::new()).unwrap()
    );
}

#[test]
fn truncated_frame_is_fatal_at_its_offset() {
    let m = small_match();
    let frame = FrameReader::new(&m.bytes, Limits::default())
        .unwrap()
        .map(Result::unwrap)
        .filter(|f| f.header.kind == FrameKind::Packet)
        .nth(40)
        .unwrap();
    let cut = &m.bytes[..frame.payload_offset + frame.payload.len() / 2];

    for result in [
        parse_ticks(cut, &TickQuery::new(["X"])).map(|_| ()),
        parse_events(cut, &EventQuery::new()).map(|_| ()),
        parse_grenades(cut).map(|_| ()),
    ] {
        let err = result.unwrap_err();
        assert_eq!(err, ParseError::TruncatedInput { offset: frame.offset });
    }
}

#[test]
fn header_only_demo_gives_empty_results() {
    let mut demo = DemoBuilder::new();
    demo.header(&codec::DemoHeader {
        version: 1,
        entries: [("map_name".to_string(), "de_dust2".to_string())]
            .into_iter()
            .collect(),
    })
    .unwrap();
    let bytes = demo.finish();

    assert_eq!(parse_header(&bytes).unwrap()["map_name"], "de_dust2");
    assert!(list_game_events(&bytes).unwrap().is_empty());

    let ticks = parse_ticks(&bytes, &TickQuery::new(["X", "m_bogus"])).unwrap();
    assert!(ticks.table.is_empty());
    assert!(ticks.warnings.is_empty());

    let events = parse_events(&bytes, &EventQuery::new()).unwrap();
    assert!(events.events.is_empty());
    assert!(events.warnings.is_empty());
    assert!(parse_grenades(&bytes).unwrap().grenades.is_empty());
}

#[test]
fn newer_header_version_is_rejected() {
    let mut demo = DemoBuilder::new();
    demo.header(&codec::DemoHeader {
        version: 2,
        entries: Default::default(),
    })
    .unwrap();
    let err = parse_header(&demo.finish()).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnsupportedFormatVersion {
            found: 2,
            offset: wire::ENVELOPE_SIZE
        }
    );
}

#[test]
fn forward_compatibility_gaps_become_warnings() {
    let events = catalog::event_descriptors();
    let mut demo = DemoBuilder::new();
    let mut signon = Packet::new();
    signon.event_list(&events).unwrap();
    demo.packet(FrameKind::SignonPacket, wire::PREGAME_TICK, &signon)
        .unwrap();
    let unknown_frame_offset = demo.len();
    demo.frame(FrameKind::Unknown(31), 3, b"from the future").unwrap();

    let mut packet = Packet::new();
    // Event id 42 was never declared.
    packet.message(MessageKind::GameEvent, &[42, 1, 2, 3]).unwrap();
    packet.message(MessageKind::Unknown(999), b"opaque").unwrap();
    let round_end = events.get(catalog::ROUND_END).unwrap();
    packet
        .event(
            round_end,
            &[
                PropValue::UInt(3),
                PropValue::UInt(7),
                PropValue::String("#SFUI_Notice_CTs_Win".into()),
            ],
        )
        .unwrap();
    demo.packet(FrameKind::Packet, 5, &packet).unwrap();
    demo.stop(5).unwrap();
    let bytes = demo.finish();

    let output = parse_events(&bytes, &EventQuery::new()).unwrap();
    assert_eq!(output.events.len(), 1);
    assert_eq!(output.events[0].tick, 5);
    assert_eq!(
        output.warnings,
        vec![
            ParseWarning::UnknownFrameKind {
                kind: 31,
                offset: unknown_frame_offset
            },
            ParseWarning::UnknownEventDescriptor {
                event_id: 42,
                tick: 5
            },
        ]
    );
}

#[test]
fn limits_are_enforced() {
    let m = small_match();
    let limits = ParserLimits {
        codec: codec::CodecLimits {
            max_entities: 8,
            ..codec::CodecLimits::for_testing()
        },
        ..ParserLimits::for_testing()
    };
    let err = DemoParser::with_limits(&m.bytes, limits)
        .parse_ticks(&TickQuery::new(["X"]))
        .unwrap_err();
    assert!(matches!(err, ParseError::Codec(_)), "{err:?}");
    assert!(err.offset() > 0);
}

#[test]
fn event_filter_accepts_explicit_all() {
    let m = small_match();
    let query = EventQuery::new().events(EventFilter::All);
    let output = DemoParser::new(&m.bytes).parse_events(&query).unwrap();
    assert_eq!(output.events.len(), m.events.len());
}

/// One player: controller in slot 1, pawn in the first pawn slot.
fn one_player(batch: &mut EntityBatch<'_>, pawn_props: Vec<(usize, PropValue)>) {
    batch.create(
        1,
        catalog::CONTROLLER,
        1,
        vec![
            (controller::PLAYER_NAME, PropValue::String("alpha".into())),
            (controller::STEAM_ID, PropValue::UInt(FIRST_STEAM_ID)),
            (controller::PLAYER_PAWN, PropValue::Handle(pawn_handle(0))),
            (controller::SCORE, PropValue::SInt(3)),
        ],
    );
    batch.create(FIRST_PAWN_SLOT, catalog::PAWN, 1, pawn_props);
}

#[test]
fn full_packet_keeps_grenade_trajectory_whole() {
    let classes = catalog::class_table();
    let smoke = |origin: [f32; 3]| {
        vec![
            (projectile::ORIGIN, PropValue::Vector(origin)),
            (projectile::THROWER, PropValue::Handle(pawn_handle(0))),
        ]
    };
    let mut demo = DemoBuilder::new();
    demo.send_tables(&catalog::serializers()).unwrap();
    demo.class_info(&catalog::class_bindings()).unwrap();

    let mut batch = EntityBatch::new(&classes);
    one_player(&mut batch, vec![(pawn::HEALTH, PropValue::UInt(100))]);
    batch.create(
        FIRST_GRENADE_SLOT,
        catalog::SMOKE_PROJECTILE,
        9,
        smoke([1.0, 2.0, 3.0]),
    );
    let mut packet = Packet::new();
    packet.entities(batch, true).unwrap();
    demo.packet(FrameKind::Packet, 1, &packet).unwrap();

    // A full snapshot resends every live entity under its current serial.
    let mut batch = EntityBatch::new(&classes);
    one_player(&mut batch, vec![(pawn::HEALTH, PropValue::UInt(100))]);
    batch.create(
        FIRST_GRENADE_SLOT,
        catalog::SMOKE_PROJECTILE,
        9,
        smoke([4.0, 5.0, 6.0]),
    );
    let mut packet = Packet::new();
    packet.entities(batch, false).unwrap();
    demo.packet(FrameKind::FullPacket, 2, &packet).unwrap();

    let mut batch = EntityBatch::new(&classes);
    batch.set(
        FIRST_GRENADE_SLOT,
        catalog::SMOKE_PROJECTILE,
        projectile::ORIGIN,
        PropValue::Vector([7.0, 8.0, 9.0]),
    );
    let mut packet = Packet::new();
    packet.entities(batch, true).unwrap();
    demo.packet(FrameKind::Packet, 3, &packet).unwrap();
    demo.stop(3).unwrap();
    let bytes = demo.finish();

    let output = parse_grenades(&bytes).unwrap();
    assert_eq!(output.grenades.len(), 1);
    let grenade = &output.grenades[0];
    assert_eq!(grenade.created_tick, 1);
    assert_eq!(grenade.thrower_steamid, Some(FIRST_STEAM_ID));
    let path: Vec<(i32, f32)> = grenade.points.iter().map(|p| (p.tick, p.x)).collect();
    assert_eq!(path, vec![(1, 1.0), (2, 4.0), (3, 7.0)]);
}

#[test]
fn columns_stay_aligned_after_class_rebind() {
    let classes = catalog::class_table();
    let mut without_pawn = catalog::class_bindings();
    without_pawn.retain(|(id, _)| *id != catalog::PAWN);

    let mut demo = DemoBuilder::new();
    demo.send_tables(&catalog::serializers()).unwrap();
    demo.class_info(&without_pawn).unwrap();
    let mut batch = EntityBatch::new(&classes);
    batch.create(
        1,
        catalog::CONTROLLER,
        1,
        vec![
            (controller::PLAYER_NAME, PropValue::String("alpha".into())),
            (controller::STEAM_ID, PropValue::UInt(FIRST_STEAM_ID)),
            (controller::PLAYER_PAWN, PropValue::Handle(pawn_handle(0))),
            (controller::SCORE, PropValue::SInt(3)),
        ],
    );
    let mut packet = Packet::new();
    packet.entities(batch, true).unwrap();
    demo.packet(FrameKind::Packet, 1, &packet).unwrap();

    // The pawn class arrives late and resolves `health` ahead of `m_iScore`.
    demo.class_info(&catalog::class_bindings()).unwrap();
    let mut batch = EntityBatch::new(&classes);
    batch.create(
        FIRST_PAWN_SLOT,
        catalog::PAWN,
        1,
        vec![(pawn::HEALTH, PropValue::UInt(100))],
    );
    let mut packet = Packet::new();
    packet.entities(batch, true).unwrap();
    demo.packet(FrameKind::Packet, 2, &packet).unwrap();
    demo.stop(2).unwrap();
    let bytes = demo.finish();

    let output = parse_ticks(&bytes, &TickQuery::new(["health", "m_iScore"])).unwrap();
    assert_eq!(output.columns, vec!["m_iScore"]);
    let TickTable::Rows(rows) = output.table else {
        panic!("expected rows");
    };
    let scores: Vec<(i32, Option<PropValue>)> = rows
        .iter()
        .map(|row| (row.tick, row.values.get("m_iScore").cloned().flatten()))
        .collect();
    assert_eq!(
        scores,
        vec![
            (1, Some(PropValue::SInt(3))),
            (2, Some(PropValue::SInt(3))),
        ]
    );
}
