use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use demo_fixtures::{build_match, MatchConfig, SyntheticMatch};
use demoparser::{parse_events, parse_grenades, parse_ticks, EventQuery, TickQuery};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "demo-sim",
    version,
    about = "Deterministic synthetic demo generator"
)]
struct Cli {
    /// Number of simulated players.
    #[arg(long, default_value_t = 10)]
    players: u32,
    /// Number of in-game ticks to simulate.
    #[arg(long, default_value_t = 640)]
    ticks: u32,
    /// Round length in ticks.
    #[arg(long, default_value_t = 128)]
    round_ticks: u32,
    /// Grenade throw cadence in ticks.
    #[arg(long, default_value_t = 24)]
    grenade_every: u32,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Snappy-compress frame payloads.
    #[arg(long)]
    compress: bool,
    /// Output directory for the demo and its summary.
    #[arg(long, default_value = "captures")]
    out_dir: PathBuf,
    /// Skip parsing the written demo back.
    #[arg(long)]
    no_validate: bool,
    /// Fail if the demo averages more bytes per tick than this.
    #[arg(long)]
    max_bytes_per_tick: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = MatchConfig {
        players: cli.players,
        ticks: cli.ticks,
        round_ticks: cli.round_ticks,
        grenade_every: cli.grenade_every,
        compress: cli.compress,
        seed: cli.seed,
    };

    let demo = build_match(&config).context("build synthetic match")?;
    log::info!(
        "built {} players over {} ticks: {} bytes",
        demo.players.len(),
        demo.last_tick,
        demo.bytes.len()
    );

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create output dir {}", cli.out_dir.display()))?;
    let path = cli.out_dir.join(format!("match_{:04}.dem", cli.seed));
    fs::write(&path, &demo.bytes).with_context(|| format!("write {}", path.display()))?;

    let mut summary = Summary::new(&config, &demo);
    if !cli.no_validate {
        validate(&demo).with_context(|| format!("validate {}", path.display()))?;
        summary.validated = true;
    }
    summary.assert_budget(cli.max_bytes_per_tick)?;
    write_summary_json(&cli.out_dir, &summary)?;

    Ok(())
}

/// Parses the demo back and compares it with what the script recorded.
fn validate(demo: &SyntheticMatch) -> Result<()> {
    let events = parse_events(&demo.bytes, &EventQuery::new()).context("parse events")?;
    let mut parsed: BTreeMap<&str, usize> = BTreeMap::new();
    for event in &events.events {
        *parsed.entry(event.name.as_str()).or_default() += 1;
    }
    let mut scripted: BTreeMap<&str, usize> = BTreeMap::new();
    for event in &demo.events {
        *scripted.entry(event.name).or_default() += 1;
    }
    if parsed != scripted {
        anyhow::bail!("event counts differ: parsed {parsed:?}, scripted {scripted:?}");
    }

    let ticks = parse_ticks(&demo.bytes, &TickQuery::new(["X", "Y", "Z"])).context("parse ticks")?;
    let expected_rows = demo.players.len() * demo.last_tick as usize;
    if ticks.table.len() != expected_rows {
        anyhow::bail!(
            "tick rows {} differ from {expected_rows} expected",
            ticks.table.len()
        );
    }

    let grenades = parse_grenades(&demo.bytes).context("parse grenades")?;
    if grenades.grenades.len() != demo.grenades.len() {
        anyhow::bail!(
            "grenade count {} differs from {} thrown",
            grenades.grenades.len(),
            demo.grenades.len()
        );
    }

    let warnings = events.warnings.len() + ticks.warnings.len() + grenades.warnings.len();
    if warnings > 0 {
        anyhow::bail!("parsing a well-formed demo produced {warnings} warnings");
    }
    Ok(())
}

fn write_summary_json(out_dir: &Path, summary: &Summary) -> Result<()> {
    let path = out_dir.join("summary.json");
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct Summary {
    players: u32,
    ticks: u32,
    seed: u64,
    compressed: bool,
    bytes_total: u64,
    avg_bytes_per_tick: u64,
    events: BTreeMap<&'static str, usize>,
    grenades: usize,
    validated: bool,
}

impl Summary {
    fn new(config: &MatchConfig, demo: &SyntheticMatch) -> Self {
        let mut events = BTreeMap::new();
        for event in &demo.events {
            *events.entry(event.name).or_default() += 1;
        }
        let bytes_total = demo.bytes.len() as u64;
        Self {
            players: demo.players.len() as u32,
            ticks: demo.last_tick,
            seed: config.seed,
            compressed: config.compress,
            bytes_total,
            avg_bytes_per_tick: bytes_total / u64::from(demo.last_tick.max(1)),
            events,
            grenades: demo.grenades.len(),
            validated: false,
        }
    }

    fn assert_budget(&self, max_per_tick: Option<u64>) -> Result<()> {
        if let Some(max) = max_per_tick {
            if self.avg_bytes_per_tick > max {
                anyhow::bail!(
                    "avg bytes per tick {} exceeds budget {}",
                    self.avg_bytes_per_tick,
                    max
                );
            }
        }
        Ok(())
    }
}
