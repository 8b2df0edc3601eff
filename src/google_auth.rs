use std::cell::RefCell;
use std::path::Path;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::{Result, TrackerError};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Cached tokens this close to expiry are refreshed.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Fields of a Google service-account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::config(format!("Failed to read credentials {}: {}", path.display(), e))
        })?;
        Self::from_json(&body)
    }

    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| TrackerError::config(format!("Invalid service account credentials: {}", e)))
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// OAuth access tokens for a service account, obtained with the JWT-bearer grant and cached.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: RefCell<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| TrackerError::config(format!("Invalid service account private key: {}", e)))?;
        Ok(Self { key, encoding_key, cached: RefCell::new(None) })
    }

    /// Signed assertion for the token endpoint, issued at `iat` (unix seconds).
    pub fn signed_assertion(&self, iat: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: self.key.token_uri(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TrackerError::sink(format!("Failed to sign token request: {}", e)))
    }

    /// A valid bearer token, exchanging a fresh assertion when the cached one is stale.
    pub fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached.borrow().as_ref() {
            if Instant::now() + EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.exchange()?;
        let value = fresh.value.clone();
        *self.cached.borrow_mut() = Some(fresh);
        Ok(value)
    }

    #[instrument(level = "info", skip(self), fields(client = %self.key.client_email))]
    fn exchange(&self) -> Result<CachedToken> {
        let assertion = self.signed_assertion(chrono::Utc::now().timestamp())?;
        let response = ureq::post(self.key.token_uri())
            .send_form([("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .map_err(|e| {
                error!(error = %e, "Token exchange failed");
                TrackerError::sink(format!("Token exchange failed: {}", e))
            })?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| TrackerError::sink(format!("Failed to read token response: {}", e)))?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TrackerError::sink(format!("Unexpected token response: {}", e)))?;

        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS as u64);
        info!(expires_in = lifetime, "Obtained Google access token");
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }
}
