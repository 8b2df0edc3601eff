use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TrackerError};

pub const CONFIG_FILE_NAME: &str = ".geoguessr_tracker.json";
pub const DATA_DIR_NAME: &str = ".geoguessr_tracker";

/// Raw key/value configuration as persisted in the config file and read from the environment.
/// Keys are spelled the same in both places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(rename = "NCFA_COOKIE", alias = "ncfa_cookie", default, skip_serializing_if = "Option::is_none")]
    pub ncfa_cookie: Option<String>,
    #[serde(rename = "USE_GSHEETS", alias = "use_gsheets", default, skip_serializing_if = "Option::is_none")]
    pub use_gsheets: Option<String>,
    #[serde(rename = "GSHEET_ID", alias = "gsheet_id", default, skip_serializing_if = "Option::is_none")]
    pub gsheet_id: Option<String>,
    #[serde(rename = "GSHEET_CREDENTIALS", alias = "gsheet_credentials", default, skip_serializing_if = "Option::is_none")]
    pub gsheet_credentials: Option<String>,
    #[serde(rename = "DATA_DIR", alias = "data_dir", default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(rename = "TRACKER_TIMEZONE", alias = "tracker_timezone", default, skip_serializing_if = "Option::is_none")]
    pub tracker_timezone: Option<String>,
    #[serde(rename = "USE_CSV", alias = "use_csv", default, skip_serializing_if = "Option::is_none")]
    pub use_csv: Option<String>,
}

impl StoredConfig {
    /// Layer `over` on top of `self`; every key set in `over` wins.
    pub fn overlay(self, over: StoredConfig) -> StoredConfig {
        StoredConfig {
            ncfa_cookie: over.ncfa_cookie.or(self.ncfa_cookie),
            use_gsheets: over.use_gsheets.or(self.use_gsheets),
            gsheet_id: over.gsheet_id.or(self.gsheet_id),
            gsheet_credentials: over.gsheet_credentials.or(self.gsheet_credentials),
            data_dir: over.data_dir.or(self.data_dir),
            tracker_timezone: over.tracker_timezone.or(self.tracker_timezone),
            use_csv: over.use_csv.or(self.use_csv),
        }
    }

    /// Key/value pairs for display, with the session cookie masked.
    pub fn display_entries(&self) -> Vec<(&'static str, String)> {
        let shown = |v: &Option<String>| v.clone().unwrap_or_else(|| "not set".to_string());
        vec![
            ("NCFA_COOKIE", self.ncfa_cookie.as_deref().map(mask_secret).unwrap_or_else(|| "not set".to_string())),
            ("USE_GSHEETS", shown(&self.use_gsheets)),
            ("GSHEET_ID", shown(&self.gsheet_id)),
            ("GSHEET_CREDENTIALS", shown(&self.gsheet_credentials)),
            ("DATA_DIR", shown(&self.data_dir)),
            ("TRACKER_TIMEZONE", shown(&self.tracker_timezone)),
            ("USE_CSV", shown(&self.use_csv)),
        ]
    }
}

/// `****` followed by the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{}", tail)
}

fn flag_enabled(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" => true,
        Some(v) if v == "false" => false,
        Some(_) => false,
        None => default,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetsSettings {
    pub sheet_id: String,
    pub credentials_path: PathBuf,
}

/// Resolved, immutable settings. Built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ncfa_cookie: Option<String>,
    pub csv_enabled: bool,
    pub sheets: Option<SheetsSettings>,
    pub data_dir: PathBuf,
    pub timezone: Option<Tz>,
}

impl Settings {
    /// Config file overlaid with the process environment.
    pub fn resolve() -> Result<Self> {
        Self::from_config(&load_merged()?)
    }

    pub fn from_config(config: &StoredConfig) -> Result<Self> {
        let csv_enabled = flag_enabled(config.use_csv.as_deref(), true);

        let sheets = if flag_enabled(config.use_gsheets.as_deref(), false) {
            let sheet_id = non_empty(&config.gsheet_id)
                .ok_or_else(|| TrackerError::config("GSHEET_ID is required when USE_GSHEETS is true"))?;
            let credentials = non_empty(&config.gsheet_credentials)
                .ok_or_else(|| TrackerError::config("GSHEET_CREDENTIALS is required when USE_GSHEETS is true"))?;
            Some(SheetsSettings { sheet_id: sheet_id.to_string(), credentials_path: PathBuf::from(credentials) })
        } else {
            None
        };

        if !csv_enabled && sheets.is_none() {
            return Err(TrackerError::config("No sink enabled: set USE_CSV or USE_GSHEETS to true"));
        }

        let timezone = match non_empty(&config.tracker_timezone) {
            Some(name) => Some(
                name.parse::<Tz>()
                    .map_err(|_| TrackerError::config(format!("Unknown timezone {:?}", name)))?,
            ),
            None => None,
        };

        let data_dir = match non_empty(&config.data_dir) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir(),
        };

        Ok(Settings {
            ncfa_cookie: non_empty(&config.ncfa_cookie).map(str::to_string),
            csv_enabled,
            sheets,
            data_dir,
            timezone,
        })
    }

    pub fn ncfa_cookie(&self) -> Result<&str> {
        self.ncfa_cookie
            .as_deref()
            .ok_or_else(|| TrackerError::config("NCFA_COOKIE is required in environment or config"))
    }

    /// Calendar date "now", in the configured timezone or the system's.
    pub fn today(&self) -> NaiveDate {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

pub fn config_path() -> PathBuf {
    home_dir().unwrap_or_default().join(CONFIG_FILE_NAME)
}

/// `./data` when it exists (working from a checkout), otherwise `~/.geoguessr_tracker`.
pub fn default_data_dir() -> PathBuf {
    let local = PathBuf::from("data");
    if local.is_dir() {
        return local;
    }
    home_dir().unwrap_or_default().join(DATA_DIR_NAME)
}

/// Read the persisted config. Missing or unreadable files yield an empty config.
pub fn load_file(path: &Path) -> StoredConfig {
    let body = match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(_) => return StoredConfig::default(),
    };
    match serde_json::from_str(&body) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Ignoring invalid config file");
            StoredConfig::default()
        }
    }
}

pub fn load_env() -> Result<StoredConfig> {
    load_vars(std::env::vars())
}

/// Config from `KEY=value` pairs. Keys are matched case-insensitively; unrelated ones are ignored.
pub fn load_vars<I>(vars: I) -> Result<StoredConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::from_iter::<_, StoredConfig>(vars)
        .map_err(|e| TrackerError::config(format!("Invalid environment configuration: {}", e)))
}

pub fn load_merged() -> Result<StoredConfig> {
    Ok(load_file(&config_path()).overlay(load_env()?))
}

pub fn save(path: &Path, config: &StoredConfig) -> Result<()> {
    let body = serde_json::to_string_pretty(config)
        .map_err(|e| TrackerError::config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, body)
        .map_err(|e| TrackerError::config(format!("Failed to write {}: {}", path.display(), e)))?;
    info!(path = %path.display(), "Configuration saved");
    Ok(())
}
