use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::csv::{Table, format_row};
use crate::error::{Result, TrackerError};
use crate::model::record::{CSV_COLUMNS, GameRecord};
use crate::sink::{RecordSink, SaveOutcome, SkipReason};

pub const CSV_FILE_NAME: &str = "daily_challenges.csv";

/// Flat-file sink: one CSV row per challenge date.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

/// What the sink found on disk before appending.
struct Existing {
    dates: HashSet<String>,
    has_header: bool,
    needs_newline: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink writing `daily_challenges.csv` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CSV_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the date column once. A missing file is an empty sink.
    fn load_existing(&self) -> Result<Existing> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(TrackerError::sink(format!("Failed to read {}: {}", self.path.display(), e))),
        };
        let needs_newline = !text.is_empty() && !text.ends_with('\n');

        let Some(table) = Table::parse(&text) else {
            return Ok(Existing { dates: HashSet::new(), has_header: false, needs_newline });
        };
        let date_idx = table.column(CSV_COLUMNS[0]).ok_or_else(|| {
            TrackerError::sink(format!("{} has no '{}' column", self.path.display(), CSV_COLUMNS[0]))
        })?;
        // Rows are appended in CSV_COLUMNS order, so the header must match it exactly.
        if !table.headers.iter().map(String::as_str).eq(CSV_COLUMNS) {
            return Err(TrackerError::sink(format!(
                "{} header {:?} does not match the expected columns",
                self.path.display(),
                table.headers
            )));
        }
        let dates = table.values(date_idx).map(|d| d.trim().to_string()).collect();

        Ok(Existing { dates, has_header: true, needs_newline })
    }
}

impl RecordSink for CsvSink {
    fn name(&self) -> &str {
        "CSV file"
    }

    #[instrument(level = "info", skip(self, record), fields(path = %self.path.display(), date = %record.date))]
    fn save(&self, record: &GameRecord) -> Result<SaveOutcome> {
        let key = record.date_key();
        let existing = self.load_existing()?;
        if existing.dates.contains(&key) {
            info!(date = %key, "Entry already exists in the CSV file");
            return Ok(SaveOutcome::Skipped(SkipReason::DuplicateDate));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut out = String::new();
        if existing.needs_newline {
            out.push('\n');
        }
        if !existing.has_header {
            out.push_str(&format_row(&CSV_COLUMNS));
        }
        out.push_str(&format_row(&record.to_row()));

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(out.as_bytes())?;

        info!(date = %key, "Added new entry to the CSV file");
        Ok(SaveOutcome::Inserted)
    }
}
