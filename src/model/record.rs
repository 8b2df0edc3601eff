use std::fmt;

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::error::{Result, TrackerError};
use crate::model::game::{GameResponse, PlayerGuess};

/// Number of round column pairs in a sink row.
pub const MAX_ROUNDS: usize = 5;

pub const RESULTS_URL: &str = "https://www.geoguessr.com/results/";

/// Date key format shared by every sink.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical CSV layout. Dedup reads the `date` column by name, so this must not change
/// for an existing file.
pub const CSV_COLUMNS: [&str; 14] = [
    "date",
    "total_score",
    "total_distance",
    "round1_score",
    "round1_distance",
    "round2_score",
    "round2_distance",
    "round3_score",
    "round3_distance",
    "round4_score",
    "round4_distance",
    "round5_score",
    "round5_distance",
    "link",
];

/// Same layout as `CSV_COLUMNS`, labelled for the spreadsheet header row.
pub const SHEET_HEADERS: [&str; 14] = [
    "Date",
    "Total Score",
    "Total Distance",
    "Round 1 Score",
    "Round 1 Distance",
    "Round 2 Score",
    "Round 2 Distance",
    "Round 3 Score",
    "Round 3 Distance",
    "Round 4 Score",
    "Round 4 Distance",
    "Round 5 Score",
    "Round 5 Distance",
    "Link",
];

/// Opaque identifier of a daily challenge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeToken(String);

impl ChallengeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    /// 1-based position of the guess in the response.
    pub round_number: u32,
    pub score: i64,
    pub distance: f64,
}

/// One day's result, flattened. Rounds are ordered by `round_number` starting at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub token: ChallengeToken,
    pub total_score: i64,
    pub total_distance: f64,
    pub rounds: Vec<RoundResult>,
    pub date: NaiveDate,
}

impl GameRecord {
    /// Build a record from the raw guess list and aggregate totals.
    /// Rounds are numbered by guess order.
    pub fn project(
        token: ChallengeToken,
        guesses: &[PlayerGuess],
        total_amount: &str,
        total_distance: f64,
        date: NaiveDate,
    ) -> Result<Self> {
        let total_score = parse_score_amount(total_amount)?;
        let rounds = guesses
            .iter()
            .zip(1u32..)
            .map(|(guess, round_number)| RoundResult {
                round_number,
                score: guess.round_score_in_points,
                distance: guess.distance_in_meters,
            })
            .collect();

        Ok(Self { token, total_score, total_distance, rounds, date })
    }

    /// Project a game detail response fetched for `token`.
    pub fn from_response(token: ChallengeToken, response: &GameResponse, date: NaiveDate) -> Result<Self> {
        let player = &response.player;
        Self::project(
            token,
            &player.guesses,
            &player.total_score.amount,
            player.total_distance_in_meters,
            date,
        )
    }

    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn link(&self) -> String {
        format!("{}{}", RESULTS_URL, self.token)
    }

    /// Cells in `CSV_COLUMNS` order. Unplayed rounds are empty; rounds past `MAX_ROUNDS` are dropped.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(CSV_COLUMNS.len());
        row.push(self.date_key());
        row.push(self.total_score.to_string());
        row.push(format_distance(self.total_distance));
        for idx in 0..MAX_ROUNDS {
            match self.rounds.get(idx) {
                Some(round) => {
                    row.push(round.score.to_string());
                    row.push(format_distance(round.distance));
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
        }
        row.push(self.link());
        row
    }

    /// Typed cell values in `SHEET_HEADERS` order, numbers kept numeric.
    pub fn to_sheet_values(&self) -> Vec<Value> {
        let mut values = Vec::with_capacity(SHEET_HEADERS.len());
        values.push(json!(self.date_key()));
        values.push(json!(self.total_score));
        values.push(json!(self.total_distance));
        for idx in 0..MAX_ROUNDS {
            match self.rounds.get(idx) {
                Some(round) => {
                    values.push(json!(round.score));
                    values.push(json!(round.distance));
                }
                None => {
                    values.push(json!(""));
                    values.push(json!(""));
                }
            }
        }
        values.push(json!(self.link()));
        values
    }
}

/// Coerce the API's string amount to whole points.
/// Grouping separators are ignored; anything from the first other character on
/// (a fractional part or a unit suffix) is truncated.
pub fn parse_score_amount(amount: &str) -> Result<i64> {
    let mut digits = String::with_capacity(amount.len());
    for (i, ch) in amount.trim().chars().enumerate() {
        match ch {
            '0'..='9' => digits.push(ch),
            '-' | '+' if i == 0 => digits.push(ch),
            ',' | '_' | ' ' | '\u{a0}' => continue,
            _ => break,
        }
    }
    digits
        .parse::<i64>()
        .map_err(|_| TrackerError::fetch(format!("Invalid score amount: {:?}", amount)))
}

/// Shortest decimal form; integral values keep one fractional digit (`0.0`, `125.0`).
pub fn format_distance(distance: f64) -> String {
    if distance.is_finite() && distance.fract() == 0.0 {
        format!("{:.1}", distance)
    } else {
        distance.to_string()
    }
}
