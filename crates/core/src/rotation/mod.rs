//! Rotation model: an ordered, gap-free timeline of entries plus metadata.
//!
//! # Format
//!
//! ```text
//! # free-form comment, ignored
//! #@ title: Serving oncall
//! 2021-03-01T01:00:00Z | alice
//! 2021-03-08T01:00:00Z | bob extra words
//! ```
//!
//! Entry lines must be strictly ascending. Each entry ends where the next one
//! starts; the last entry is presumed to hold for [`LAST_ENTRY_HORIZON_DAYS`]
//! unless a later revision of the file supersedes it.

mod parser;
mod timeline;


use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;

/// Data token of the synthetic entry returned by `at` before the first entry.
pub const BEFORE_ROTATION: &str = "before rotation";

/// Data token of the synthetic entry returned by `next` on an empty rotation.
pub const NO_ENTRIES: &str = "no entries";

/// How long the last entry of a rotation is presumed to last.
pub const LAST_ENTRY_HORIZON_DAYS: i64 = 365;

pub(crate) fn last_entry_horizon() -> TimeDelta {
    TimeDelta::days(LAST_ENTRY_HORIZON_DAYS)
}

/// One `[start, end)` slot of a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub data: Vec<String>,
}

impl Entry {
    fn sentinel(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>, token: &str) -> Self {
        Self {
            start,
            end,
            data: vec![token.to_string()],
        }
    }

    /// First data token, typically the handle of whoever is on call.
    pub fn handle(&self) -> Option<&str> {
        self.data.first().map(String::as_str)
    }

    /// True for the synthetic "before rotation" / "no entries" entries.
    pub fn is_sentinel(&self) -> bool {
        matches!(self.data.as_slice(), [token] if token == BEFORE_ROTATION || token == NO_ENTRIES)
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: DateTime<FixedOffset>) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}: {:?}", self.start, self.end, self.data)
    }
}

/// A parsed rotation file. Built once by the parser, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rotation {
    entries: Vec<Entry>,
    metadata: HashMap<String, String>,
}

impl Rotation {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Look up a `#@ key: value` annotation.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
