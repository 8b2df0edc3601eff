use std::fmt;

use crate::error::Result;
use crate::model::record::GameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DuplicateDate,
}

/// Result of a dedup-append. Skipping is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Skipped(SkipReason),
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOutcome::Inserted => f.write_str("added new entry"),
            SaveOutcome::Skipped(SkipReason::DuplicateDate) => f.write_str("entry already exists"),
        }
    }
}

/// A durable destination holding at most one row per date.
pub trait RecordSink {
    /// Short label used in logs and summaries.
    fn name(&self) -> &str;

    /// Append `record` unless a row for its date is already present.
    fn save(&self, record: &GameRecord) -> Result<SaveOutcome>;
}
