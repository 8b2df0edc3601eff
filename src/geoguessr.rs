use serde::de::DeserializeOwned;
use tracing::{error, info, info_span, instrument};

use crate::error::{Result, TrackerError};
use crate::model::challenge::DailyChallengeResponse;
use crate::model::game::GameResponse;
use crate::model::record::ChallengeToken;

pub const BASE_URL: &str = "https://www.geoguessr.com/api/v3";

/// Where daily challenge results come from.
pub trait ChallengeSource {
    fn fetch_today_token(&self) -> Result<ChallengeToken>;
    fn fetch_game_detail(&self, token: &ChallengeToken) -> Result<GameResponse>;
}

/// Blocking GeoGuessr API client authenticated with the `_ncfa` session cookie.
#[derive(Debug, Clone)]
pub struct GeoGuessr {
    cookie_header: String,
    base_url: String,
}

impl GeoGuessr {
    pub fn new(ncfa_cookie: &str) -> Result<Self> {
        if ncfa_cookie.trim().is_empty() {
            return Err(TrackerError::config("NCFA_COOKIE is required in environment or config"));
        }
        Ok(Self { cookie_header: format!("_ncfa={}", ncfa_cookie.trim()), base_url: BASE_URL.to_string() })
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }

    /// Parse a `daily-challenges/today` body (no network).
    pub fn parse_today(body: &str) -> Result<ChallengeToken> {
        let today: DailyChallengeResponse = Self::deserialize(body, "daily challenge")?;
        Ok(ChallengeToken::new(today.token))
    }

    /// Parse a `challenges/{token}/game` body (no network).
    pub fn parse_game(body: &str) -> Result<GameResponse> {
        Self::deserialize(body, "game detail")
    }

    #[instrument(level = "info", skip(body), fields(bytes = body.len()))]
    fn deserialize<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
        serde_json::from_str::<T>(body).map_err(|e| {
            error!(error = %e, "Failed to deserialize {} response", what);
            TrackerError::fetch(format!("Failed to deserialize {} response: {}", what, e))
        })
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = {
            let _span = info_span!("geoguessr_fetch", url = %url).entered();
            ureq::get(&url).header("Cookie", &self.cookie_header).call()
        };
        match response {
            Ok(response) => response.into_body().read_to_string().map_err(|e| {
                error!(error = %e, "Failed to read response body");
                TrackerError::fetch(format!("Failed to read response body: {}", e))
            }),
            Err(e) => {
                error!(error = %e, url = %url, "Request failed");
                Err(TrackerError::fetch(format!("Request to {} failed: {}", url, e)))
            }
        }
    }
}

impl ChallengeSource for GeoGuessr {
    fn fetch_today_token(&self) -> Result<ChallengeToken> {
        let body = self.get("/challenges/daily-challenges/today")?;
        let token = Self::parse_today(&body)?;
        info!(token = %token, "Fetched today's challenge token");
        Ok(token)
    }

    fn fetch_game_detail(&self, token: &ChallengeToken) -> Result<GameResponse> {
        let body = self.get(&format!("/challenges/{}/game", token))?;
        let game = Self::parse_game(&body)?;
        info!(
            token = %token,
            map = game.map_name.as_deref().unwrap_or("unknown"),
            rounds = game.player.guesses.len(),
            "Fetched game detail"
        );
        Ok(game)
    }
}
