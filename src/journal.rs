//! Price journal.
//!
//! Appends one plain-text line per successful check to a flat file in the
//! working directory. The file is never rotated or truncated.

use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{MonitorError, PriceReading};

/// Default journal file path.
pub const DEFAULT_LOG_FILE: &str = "price_log.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Whether the logged check saw a new price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Changed,
    Unchanged,
}

impl EntryStatus {
    fn prefix(self) -> &'static str {
        match self {
            EntryStatus::Changed => "New price",
            EntryStatus::Unchanged => "Checked, no change, current price",
        }
    }
}

/// Render a single journal line (without trailing newline).
pub fn format_entry(status: EntryStatus, price: &PriceReading, at: NaiveDateTime) -> String {
    format!(
        "{}: {}€ - {}",
        status.prefix(),
        price,
        at.format(TIMESTAMP_FORMAT)
    )
}

pub struct PriceJournal {
    path: PathBuf,
}

impl PriceJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current local time.
    pub fn append(&self, status: EntryStatus, price: &PriceReading) -> Result<(), MonitorError> {
        let line = format_entry(status, price, Local::now().naive_local());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        debug!(path = %self.path.display(), %line, "Journal entry written");
        Ok(())
    }
}
