#![no_main]

use demoparser::{DemoParser, EventQuery, ParserLimits, TickQuery};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Prefix the magic so most inputs get past the envelope.
    let mut buf = wire::DEMO_MAGIC.to_vec();
    buf.extend_from_slice(data);

    for input in [data, buf.as_slice()] {
        let parser = DemoParser::with_limits(input, ParserLimits::for_testing());
        let _ = parser.parse_header();
        let _ = parser.list_game_events();
        let _ = parser.parse_events(&EventQuery::new().player_props(["health"]));
        let _ = parser.parse_ticks(&TickQuery::new(["X", "health"]).struct_of_arrays(true));
        let _ = parser.parse_grenades();
    }
});
