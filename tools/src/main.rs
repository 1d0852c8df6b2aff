use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use demofile_tools::{format_report_pretty, inspect_demo, InspectReport};
use demoparser::{
    DemoParser, EventFilter, EventQuery, ParseWarning, PlayerFilter, TickFilter, TickQuery,
};
use glob::Pattern;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "demofile-tools",
    version,
    about = "Demo file inspection and extraction tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize frame and message structure.
    Inspect {
        /// A demo file, or a directory of them.
        demo_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected demos.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected demos (after sorting).
        #[arg(long)]
        limit: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Print header metadata.
    Header { demo: PathBuf },
    /// List the event names the demo declares.
    ListEvents { demo: PathBuf },
    /// Extract game events.
    Events {
        demo: PathBuf,
        /// Event names to keep; every event when omitted.
        #[arg(long = "name")]
        names: Vec<String>,
        /// Player properties added for each player key.
        #[arg(long = "player-prop")]
        player_props: Vec<String>,
        /// Game-rules properties added to every event.
        #[arg(long = "other-prop")]
        other_props: Vec<String>,
    },
    /// Extract per-tick player rows.
    Ticks {
        demo: PathBuf,
        /// Properties to project.
        #[arg(long = "prop", required = true)]
        props: Vec<String>,
        /// Ticks to keep; every tick when omitted.
        #[arg(long = "tick")]
        ticks: Vec<i32>,
        /// Players to keep by steam id; everyone when omitted.
        #[arg(long = "steamid")]
        steamids: Vec<u64>,
        /// Emit columns instead of rows.
        #[arg(long)]
        columns: bool,
    },
    /// Extract grenade trajectories.
    Grenades { demo: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            demo_path,
            glob,
            sort,
            limit,
            format,
        } => {
            if demo_path.is_dir() {
                let entries = collect_demo_entries(&demo_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    let report = inspect_file(&entry.path)?;
                    if matches!(format, Format::Pretty) {
                        println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    }
                    print_report(&report, format)?;
                }
            } else {
                let report = inspect_file(&demo_path)?;
                print_report(&report, format)?;
            }
        }
        Command::Header { demo } => {
            let bytes = read_demo(&demo)?;
            print_json(&DemoParser::new(&bytes).parse_header()?)?;
        }
        Command::ListEvents { demo } => {
            let bytes = read_demo(&demo)?;
            print_json(&DemoParser::new(&bytes).list_game_events()?)?;
        }
        Command::Events {
            demo,
            names,
            player_props,
            other_props,
        } => {
            let bytes = read_demo(&demo)?;
            let events = if names.is_empty() {
                EventFilter::All
            } else {
                names.into_iter().collect()
            };
            let query = EventQuery::new()
                .events(events)
                .player_props(player_props)
                .other_props(other_props);
            let output = DemoParser::new(&bytes).parse_events(&query)?;
            log_warnings(&output.warnings);
            print_json(&output.events)?;
        }
        Command::Ticks {
            demo,
            props,
            ticks,
            steamids,
            columns,
        } => {
            let bytes = read_demo(&demo)?;
            let mut query = TickQuery::new(props).struct_of_arrays(columns);
            if !ticks.is_empty() {
                query = query.ticks(TickFilter::Set(ticks.into_iter().collect()));
            }
            if !steamids.is_empty() {
                query = query.players(PlayerFilter::SteamIds(
                    steamids.into_iter().collect::<BTreeSet<_>>(),
                ));
            }
            let output = DemoParser::new(&bytes).parse_ticks(&query)?;
            log_warnings(&output.warnings);
            print_json(&output.table)?;
        }
        Command::Grenades { demo } => {
            let bytes = read_demo(&demo)?;
            let output = DemoParser::new(&bytes).parse_grenades()?;
            log_warnings(&output.warnings);
            print_json(&output.grenades)?;
        }
    }
    Ok(())
}

fn read_demo(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read demo {}", path.display()))
}

fn inspect_file(path: &Path) -> Result<InspectReport> {
    let bytes = read_demo(path)?;
    inspect_demo(&bytes, &wire::Limits::default())
        .with_context(|| format!("inspect {}", path.display()))
}

fn print_report(report: &InspectReport, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(report),
        Format::Pretty => {
            print!("{}", format_report_pretty(report));
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{json}");
    Ok(())
}

fn log_warnings(warnings: &[ParseWarning]) {
    for warning in warnings {
        log::warn!("{warning}");
    }
}

struct DemoEntry {
    path: PathBuf,
    size: u64,
}

fn collect_demo_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<DemoEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_name && !pattern.matches_path(&path) {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(DemoEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn maybe_sort_entries(mut entries: Vec<DemoEntry>, sort: Option<InspectSort>) -> Vec<DemoEntry> {
    if let Some(InspectSort::Size) = sort {
        entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    }
    entries
}
