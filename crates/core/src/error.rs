use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("line {line}: parsing time {token:?} as RFC 3339 (e.g. 2021-03-01T01:00:00Z): {source}")]
    InvalidTimestamp {
        line: usize,
        token: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("line {line}: expected \"<DATE> | <DATA>\", missing \"|\" in {content:?}")]
    MissingSeparator { line: usize, content: String },

    #[error("dates out of order at {index}: {previous} >= {current}")]
    OutOfOrder {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },

    #[error("rotation has no entries")]
    NoEntries,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid source: {0}")]
    InvalidSource(String),
}
