//! Line-oriented parser for rotation files.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use chrono::DateTime;
use tracing::debug;

use super::{last_entry_horizon, Entry, Rotation};
use crate::error::RotationError;

const METADATA_PREFIX: &str = "#@";
const COMMENT_PREFIX: &str = "#";
const SEPARATOR: &str = "|";

impl Rotation {
    /// Read a rotation from any byte stream. The stream is consumed to the end
    /// before the rotation is returned; the first violation aborts the parse.
    ///
    /// Lines are decoded one at a time; bytes that are not UTF-8 are replaced
    /// with U+FFFD rather than failing the read.
    pub fn read<R: Read>(reader: R) -> Result<Self, RotationError> {
        let mut reader = BufReader::new(reader);
        let mut parser = Parser::default();
        let mut buf = Vec::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;
            parser.parse_line(line_no, &String::from_utf8_lossy(&buf))?;
        }
        parser.finish()
    }

    /// Parse a rotation held in memory.
    pub fn parse(text: &str) -> Result<Self, RotationError> {
        Self::read(text.as_bytes())
    }

    /// Read a rotation from a local file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RotationError> {
        let file = File::open(path.as_ref())?;
        Self::read(file)
    }
}

impl FromStr for Rotation {
    type Err = RotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Default)]
struct Parser {
    entries: Vec<Entry>,
    metadata: HashMap<String, String>,
}

impl Parser {
    fn parse_line(&mut self, line_no: usize, raw: &str) -> Result<(), RotationError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }
        if let Some(annotation) = line.strip_prefix(METADATA_PREFIX) {
            let (key, value) = annotation.split_once(':').unwrap_or((annotation, ""));
            self.metadata
                .insert(key.trim().to_string(), value.trim().to_string());
            return Ok(());
        }
        if line.starts_with(COMMENT_PREFIX) {
            return Ok(());
        }

        let mut fields = line.split_whitespace();
        // Non-empty after trim, so there is always a first field.
        let token = fields.next().unwrap_or_default();
        let start = DateTime::parse_from_rfc3339(token).map_err(|source| {
            RotationError::InvalidTimestamp {
                line: line_no,
                token: token.to_string(),
                source,
            }
        })?;
        if fields.next() != Some(SEPARATOR) {
            return Err(RotationError::MissingSeparator {
                line: line_no,
                content: line.to_string(),
            });
        }

        self.entries.push(Entry {
            start,
            // Closed in `finish` once the following entry is known.
            end: start,
            data: fields.map(str::to_string).collect(),
        });
        Ok(())
    }

    fn finish(self) -> Result<Rotation, RotationError> {
        let Parser {
            mut entries,
            metadata,
        } = self;

        for index in 1..entries.len() {
            let previous = entries[index - 1].start;
            let current = entries[index].start;
            if previous >= current {
                return Err(RotationError::OutOfOrder {
                    index,
                    previous,
                    current,
                });
            }
            entries[index - 1].end = current;
        }
        if let Some(last) = entries.last_mut() {
            last.end = last.start + last_entry_horizon();
        }

        debug!(
            entries = entries.len(),
            metadata_keys = metadata.len(),
            "parsed rotation"
        );
        Ok(Rotation { entries, metadata })
    }
}
