use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::{error, info, instrument};

use crate::backfill::{LINKS_FILE_NAME, load_previous_challenges};
use crate::config::Settings;
use crate::csv_sink::CsvSink;
use crate::error::Result;
use crate::geoguessr::{ChallengeSource, GeoGuessr};
use crate::model::record::{ChallengeToken, GameRecord, MAX_ROUNDS};
use crate::sheets::{GoogleSheets, SheetsSink};
use crate::sink::{RecordSink, SaveOutcome};

/// Outcome of one record against every enabled sink.
#[derive(Debug, Clone)]
pub struct TrackReport {
    pub date: NaiveDate,
    pub token: ChallengeToken,
    pub total_score: i64,
    pub outcomes: Vec<(String, SaveOutcome)>,
}

impl fmt::Display for TrackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge {} ({} points) for {}", self.token, self.total_score, self.date)?;
        for (sink, outcome) in &self.outcomes {
            write!(f, "\n  {}: {}", sink, outcome)?;
        }
        Ok(())
    }
}

/// Result of a backfill run. Failed entries carry their error message.
#[derive(Debug, Clone, Default)]
pub struct FillSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<(NaiveDate, String)>,
}

impl fmt::Display for FillSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filled {} of {} previous challenges", self.succeeded, self.attempted)?;
        for (date, e) in &self.failed {
            write!(f, "\n  {}: {}", date, e)?;
        }
        Ok(())
    }
}

/// Fetch, project and save, against one source and a fixed list of sinks.
pub struct Tracker<S: ChallengeSource> {
    source: S,
    sinks: Vec<Box<dyn RecordSink>>,
}

impl<S: ChallengeSource> Tracker<S> {
    pub fn new(source: S, sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self { source, sinks }
    }

    /// Record today's challenge under `today`.
    pub fn track_today(&self, today: NaiveDate) -> Result<TrackReport> {
        let token = self.source.fetch_today_token()?;
        self.record_challenge(&token, today)
    }

    /// Fetch one challenge and save it dated `date`. The first failing sink aborts the record.
    #[instrument(level = "info", skip(self, token), fields(token = %token))]
    pub fn record_challenge(&self, token: &ChallengeToken, date: NaiveDate) -> Result<TrackReport> {
        let game = self.source.fetch_game_detail(token)?;
        let record = GameRecord::from_response(token.clone(), &game, date)?;
        if record.rounds.len() > MAX_ROUNDS {
            info!(rounds = record.rounds.len(), "Only the first {} rounds are stored", MAX_ROUNDS);
        }

        let mut outcomes = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let outcome = sink.save(&record)?;
            outcomes.push((sink.name().to_string(), outcome));
        }

        Ok(TrackReport { date, token: token.clone(), total_score: record.total_score, outcomes })
    }

    /// Replay historical challenges. A failing entry is logged and the rest still run.
    pub fn fill(&self, entries: &BTreeMap<NaiveDate, ChallengeToken>) -> FillSummary {
        let mut summary = FillSummary::default();
        for (date, token) in entries {
            summary.attempted += 1;
            info!(date = %date, token = %token, "Filling previous challenge");
            match self.record_challenge(token, *date) {
                Ok(report) => {
                    summary.succeeded += 1;
                    info!(date = %date, "Saved challenge results");
                    for (sink, outcome) in &report.outcomes {
                        info!(date = %date, sink = %sink, outcome = %outcome, "Sink outcome");
                    }
                }
                Err(e) => {
                    error!(date = %date, error = %e, "Error filling challenge");
                    summary.failed.push((*date, e.to_string()));
                }
            }
        }
        summary
    }

    /// Backfill from the links file in the data directory.
    pub fn fill_from_data_dir(&self, settings: &Settings) -> Result<FillSummary> {
        let entries = load_previous_challenges(&settings.data_dir.join(LINKS_FILE_NAME))?;
        Ok(self.fill(&entries))
    }
}

impl Tracker<GeoGuessr> {
    /// Tracker over the live API with every sink `settings` enables.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = GeoGuessr::new(settings.ncfa_cookie()?)?;
        Ok(Self::new(source, build_sinks(settings)?))
    }
}

pub fn build_sinks(settings: &Settings) -> Result<Vec<Box<dyn RecordSink>>> {
    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    if settings.csv_enabled {
        sinks.push(Box::new(CsvSink::in_dir(&settings.data_dir)));
    }
    if let Some(sheets) = &settings.sheets {
        let api = GoogleSheets::new(&sheets.sheet_id, &sheets.credentials_path)?;
        sinks.push(Box::new(SheetsSink::new(api)));
    }
    Ok(sinks)
}
