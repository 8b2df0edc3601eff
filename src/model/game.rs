use serde::{Deserialize, Serialize};

/// Body of `GET /challenges/{token}/game`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub token: String,
    pub map_name: Option<String>,
    pub state: Option<String>,
    pub round_count: Option<u32>,
    pub player: Player,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub total_score: ScoreUnit,
    pub total_distance_in_meters: f64,
    pub guesses: Vec<PlayerGuess>,
    pub nick: Option<String>,
}

/// Score as the API encodes it: a numeric string plus a unit, e.g. `{"amount": "23456", "unit": "points"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreUnit {
    pub amount: String,
    pub unit: Option<String>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGuess {
    pub round_score_in_points: i64,
    pub distance_in_meters: f64,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub skipped_round: bool,
}
