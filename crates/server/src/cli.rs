//! CLI argument parsing and the `check` subcommand.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};

use oncall_core::{Rotation, RotationError};

/// Oncall rotation status service.
#[derive(Parser, Debug)]
#[command(name = "oncall-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Validate a rotation file and show who is on call.
    Check {
        /// Rotation file to parse.
        file: PathBuf,
        /// Instant to query (RFC 3339); defaults to now.
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<FixedOffset>>,
    },
}

fn parse_instant(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

/// Parse `file` and render a short report of its state at `at`.
pub fn check(file: &Path, at: Option<DateTime<FixedOffset>>) -> anyhow::Result<String> {
    let rotation = Rotation::from_file(file)
        .with_context(|| format!("Unable to read {}", file.display()))?;
    let at = at.unwrap_or_else(|| Utc::now().fixed_offset());
    Ok(report(&rotation, at))
}

fn report(rotation: &Rotation, at: DateTime<FixedOffset>) -> String {
    let mut out = String::new();
    let mut keys: Vec<_> = rotation.metadata().iter().collect();
    keys.sort();
    for (key, value) in keys {
        out.push_str(&format!("{key}: {value}\n"));
    }
    out.push_str(&format!("entries: {}\n", rotation.len()));
    match rotation.at(at) {
        Ok(entry) => out.push_str(&format!("at {at}: {entry}\n")),
        Err(RotationError::NoEntries) => out.push_str(&format!("at {at}: (no entries)\n")),
        Err(e) => out.push_str(&format!("at {at}: {e}\n")),
    }
    out.push_str(&format!("next: {}\n", rotation.next(at)));
    out
}
