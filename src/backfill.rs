use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::csv::Table;
use crate::error::{Result, TrackerError};
use crate::model::record::ChallengeToken;

/// Auxiliary file mapping past dates to result links.
pub const LINKS_FILE_NAME: &str = "previous_daily_links.csv";
pub const LINK_DATE_FORMAT: &str = "%d/%m/%Y";

const DATE_COLUMN: &str = "Date";
const URL_COLUMN: &str = "URL";

/// Challenge token from a result URL: its last path segment, ignoring a trailing slash,
/// query and fragment.
pub fn token_from_url(url: &str) -> Option<ChallengeToken> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let segment = path.trim().trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(ChallengeToken::new(segment))
}

/// Parse the links file. Unusable rows are skipped with a warning; a repeated date keeps
/// its last token. Iteration order is chronological.
pub fn parse_previous_challenges(text: &str) -> BTreeMap<NaiveDate, ChallengeToken> {
    let mut challenges = BTreeMap::new();
    let Some(table) = Table::parse(text) else {
        return challenges;
    };
    let (Some(date_idx), Some(url_idx)) = (table.column(DATE_COLUMN), table.column(URL_COLUMN)) else {
        warn!(headers = ?table.headers, "Links file needs Date and URL columns");
        return challenges;
    };

    for (line, row) in table.rows.iter().enumerate() {
        let raw_date = row.get(date_idx).map(|s| s.trim()).unwrap_or("");
        let raw_url = row.get(url_idx).map(|s| s.trim()).unwrap_or("");
        let date = match NaiveDate::parse_from_str(raw_date, LINK_DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                warn!(row = line + 2, date = %raw_date, error = %e, "Skipping row with invalid date");
                continue;
            }
        };
        match token_from_url(raw_url) {
            Some(token) => {
                challenges.insert(date, token);
            }
            None => warn!(row = line + 2, url = %raw_url, "Skipping row without a challenge id"),
        }
    }

    challenges
}

/// Load the links file. A missing file is an empty backfill set.
pub fn load_previous_challenges(path: &Path) -> Result<BTreeMap<NaiveDate, ChallengeToken>> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let challenges = parse_previous_challenges(&text);
            info!(path = %path.display(), entries = challenges.len(), "Loaded previous challenges");
            Ok(challenges)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Links file not found, nothing to fill");
            Ok(BTreeMap::new())
        }
        Err(e) => Err(TrackerError::sink(format!("Failed to read {}: {}", path.display(), e))),
    }
}
