//! Introspection and extraction tools for demo files.
//!
//! This crate backs the `demofile-tools` binary:
//!
//! - Summarize frame and message structure ([`inspect_demo`])
//! - Render that summary for humans ([`format_report_pretty`])
//!
//! Extraction subcommands call straight into `demoparser` and print its
//! output as JSON.
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see where a demo's bytes go.

mod inspect;

pub use inspect::{format_report_pretty, inspect_demo, FrameStats, InspectReport};
