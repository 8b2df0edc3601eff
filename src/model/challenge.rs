use serde::{Deserialize, Serialize};

/// Body of `GET /challenges/daily-challenges/today`. Only `token` is required.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallengeResponse {
    pub token: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub participants: Option<u64>,
    #[serde(default)]
    pub picked_winner: bool,
}
