use std::path::PathBuf;

use tempfile::TempDir;

use geoguessr_daily_tracker::config::{self, Settings, StoredConfig, mask_secret};
use geoguessr_daily_tracker::error::TrackerError;

fn base() -> StoredConfig {
    StoredConfig {
        ncfa_cookie: Some("file-cookie".to_string()),
        data_dir: Some("/tmp/tracker-data".to_string()),
        ..StoredConfig::default()
    }
}

#[test]
fn environment_overrides_file_per_key() {
    let file = StoredConfig {
        ncfa_cookie: Some("file-cookie".to_string()),
        gsheet_id: Some("file-sheet".to_string()),
        ..StoredConfig::default()
    };
    let env = StoredConfig { ncfa_cookie: Some("env-cookie".to_string()), ..StoredConfig::default() };

    let merged = file.overlay(env);
    assert_eq!(merged.ncfa_cookie.as_deref(), Some("env-cookie"));
    assert_eq!(merged.gsheet_id.as_deref(), Some("file-sheet"));
}

#[test]
fn environment_variables_resolve_by_upper_case_name() {
    let vars = vec![
        ("NCFA_COOKIE".to_string(), "env-cookie".to_string()),
        ("USE_GSHEETS".to_string(), "true".to_string()),
        ("GSHEET_ID".to_string(), "env-sheet".to_string()),
        ("GSHEET_CREDENTIALS".to_string(), "/env/creds.json".to_string()),
        ("PATH".to_string(), "/usr/bin".to_string()),
    ];
    let env = config::load_vars(vars).expect("env config");

    assert_eq!(env.ncfa_cookie.as_deref(), Some("env-cookie"));
    assert_eq!(env.gsheet_id.as_deref(), Some("env-sheet"));
    assert!(env.data_dir.is_none());

    let merged = base().overlay(env);
    let settings = Settings::from_config(&merged).expect("settings");
    assert_eq!(settings.ncfa_cookie().unwrap(), "env-cookie");
    assert_eq!(settings.sheets.as_ref().map(|s| s.sheet_id.as_str()), Some("env-sheet"));
    assert_eq!(settings.data_dir, PathBuf::from("/tmp/tracker-data"));
}

#[test]
fn file_uses_upper_case_keys_and_env_style_keys_are_accepted() {
    let from_file: StoredConfig =
        serde_json::from_str(r#"{"NCFA_COOKIE": "abc", "USE_GSHEETS": "true", "GSHEET_ID": "sheet"}"#).unwrap();
    assert_eq!(from_file.ncfa_cookie.as_deref(), Some("abc"));
    assert_eq!(from_file.use_gsheets.as_deref(), Some("true"));

    let lower: StoredConfig = serde_json::from_str(r#"{"gsheet_credentials": "/creds.json"}"#).unwrap();
    assert_eq!(lower.gsheet_credentials.as_deref(), Some("/creds.json"));

    let written = serde_json::to_string(&from_file).unwrap();
    assert!(written.contains("\"GSHEET_ID\""), "written: {}", written);
    assert!(!written.contains("DATA_DIR"), "unset keys are omitted: {}", written);
}

#[test]
fn sheets_enabled_without_id_is_a_configuration_error() {
    let config = StoredConfig {
        use_gsheets: Some("TRUE".to_string()),
        gsheet_credentials: Some("/creds.json".to_string()),
        ..base()
    };
    let err = Settings::from_config(&config).unwrap_err();
    assert!(matches!(err, TrackerError::Configuration(_)), "got {:?}", err);
    assert!(err.to_string().contains("GSHEET_ID"));
}

#[test]
fn resolves_sheets_and_csv_settings() {
    let config = StoredConfig {
        use_gsheets: Some("true".to_string()),
        gsheet_id: Some("sheet-123".to_string()),
        gsheet_credentials: Some("/creds.json".to_string()),
        tracker_timezone: Some("Europe/Madrid".to_string()),
        ..base()
    };
    let settings = Settings::from_config(&config).expect("settings");

    assert!(settings.csv_enabled);
    let sheets = settings.sheets.as_ref().expect("sheets enabled");
    assert_eq!(sheets.sheet_id, "sheet-123");
    assert_eq!(sheets.credentials_path, PathBuf::from("/creds.json"));
    assert_eq!(settings.data_dir, PathBuf::from("/tmp/tracker-data"));
    assert_eq!(settings.timezone, Some(chrono_tz::Europe::Madrid));
    assert_eq!(settings.ncfa_cookie().unwrap(), "file-cookie");
}

#[test]
fn sheets_flag_other_than_true_disables_sheets() {
    let config = StoredConfig { use_gsheets: Some("yes".to_string()), ..base() };
    assert!(Settings::from_config(&config).unwrap().sheets.is_none());
}

#[test]
fn unknown_timezone_and_no_sink_are_rejected() {
    let bad_tz = StoredConfig { tracker_timezone: Some("Mars/Olympus".to_string()), ..base() };
    assert!(matches!(Settings::from_config(&bad_tz), Err(TrackerError::Configuration(_))));

    let no_sink = StoredConfig { use_csv: Some("false".to_string()), ..base() };
    assert!(matches!(Settings::from_config(&no_sink), Err(TrackerError::Configuration(_))));
}

#[test]
fn missing_cookie_surfaces_when_requested() {
    let settings = Settings::from_config(&StoredConfig { ncfa_cookie: None, ..base() }).unwrap();
    assert!(matches!(settings.ncfa_cookie(), Err(TrackerError::Configuration(_))));
}

#[test]
fn display_masks_cookie() {
    assert_eq!(mask_secret("abcdef123456"), "****3456");
    assert_eq!(mask_secret("ab"), "****ab");

    let entries = base().display_entries();
    let cookie = entries.iter().find(|(k, _)| *k == "NCFA_COOKIE").unwrap();
    assert_eq!(cookie.1, "****okie");
    let sheet = entries.iter().find(|(k, _)| *k == "GSHEET_ID").unwrap();
    assert_eq!(sheet.1, "not set");
}

#[test]
fn saved_config_round_trips_and_bad_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");

    config::save(&path, &base()).unwrap();
    assert_eq!(config::load_file(&path), base());

    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(config::load_file(&path), StoredConfig::default());
    assert_eq!(config::load_file(&dir.path().join("absent.json")), StoredConfig::default());
}
