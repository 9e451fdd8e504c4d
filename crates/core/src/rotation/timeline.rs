//! Point-in-time queries over a parsed rotation.
//!
//! Entries cover half-open intervals `[start, end)`: a query at exactly an
//! entry's start matches that entry, not the one before it.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use super::{Entry, Rotation, BEFORE_ROTATION, NO_ENTRIES};
use crate::error::RotationError;

fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

impl Rotation {
    /// Number of entries starting at or before `t`.
    fn started_by(&self, t: DateTime<FixedOffset>) -> usize {
        self.entries.partition_point(|entry| entry.start <= t)
    }

    /// The entry in effect at `t`.
    ///
    /// Before the first entry this is a synthetic [`BEFORE_ROTATION`] entry
    /// ending where the rotation begins. Past the last entry's nominal end the
    /// last entry is still returned.
    ///
    /// # Errors
    /// [`RotationError::NoEntries`] when the rotation is empty.
    pub fn at<Tz: TimeZone>(&self, t: DateTime<Tz>) -> Result<Entry, RotationError> {
        let first = self.entries.first().ok_or(RotationError::NoEntries)?;
        let started = self.started_by(t.fixed_offset());
        if started == 0 {
            return Ok(Entry::sentinel(epoch(), first.start, BEFORE_ROTATION));
        }
        Ok(self.entries[started - 1].clone())
    }

    /// The first entry starting strictly after `t`, or the last entry when
    /// nothing later is scheduled. An empty rotation yields a synthetic
    /// [`NO_ENTRIES`] entry.
    pub fn next<Tz: TimeZone>(&self, t: DateTime<Tz>) -> Entry {
        let started = self.started_by(t.fixed_offset());
        match self.entries.get(started).or(self.entries.last()) {
            Some(entry) => entry.clone(),
            None => Entry::sentinel(epoch(), epoch(), NO_ENTRIES),
        }
    }

    /// Up to `limit` entries starting strictly after `t`, oldest first.
    pub fn upcoming<Tz: TimeZone>(&self, t: DateTime<Tz>, limit: usize) -> Vec<Entry> {
        let started = self.started_by(t.fixed_offset());
        self.entries[started..].iter().take(limit).cloned().collect()
    }
}
