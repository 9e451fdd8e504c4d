//! Oncall rotation files: parsing, validation and point-in-time queries.
//!
//! A rotation is a line-oriented text file of `RFC3339 | data...` entries,
//! `#@ key: value` metadata and `#` comments. See [`rotation`] for the format.

pub mod config;
pub mod error;
pub mod rotation;

pub use config::Config;
pub use error::*;
pub use rotation::{Entry, Rotation, BEFORE_ROTATION, LAST_ENTRY_HORIZON_DAYS, NO_ENTRIES};
