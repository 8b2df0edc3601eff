use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use geoguessr_daily_tracker::error::TrackerError;
use geoguessr_daily_tracker::google_auth::{SHEETS_SCOPE, ServiceAccountAuth, ServiceAccountKey};

#[derive(Debug, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

fn test_key() -> ServiceAccountKey {
    ServiceAccountKey::from_json(include_str!("test_service_account.json")).expect("key file")
}

#[test]
fn assertion_is_rs256_signed_with_sheets_scope() {
    let key = test_key();
    let auth = ServiceAccountAuth::new(key.clone()).expect("auth");
    let iat = chrono::Utc::now().timestamp();
    let jwt = auth.signed_assertion(iat).expect("jwt");

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[key.token_uri()]);
    let decoding = DecodingKey::from_rsa_pem(include_bytes!("test_service_account.pub.pem")).unwrap();
    let data = decode::<Claims>(&jwt, &decoding, &validation).expect("valid signature");

    assert_eq!(data.header.kid.as_deref(), Some("0123456789abcdef"));
    assert_eq!(data.claims.iss, "tracker@tracker-test.iam.gserviceaccount.com");
    assert_eq!(data.claims.scope, SHEETS_SCOPE);
    assert_eq!(data.claims.aud, "https://oauth2.googleapis.com/token");
    assert_eq!(data.claims.exp - data.claims.iat, 3600);
    assert_eq!(data.claims.iat, iat);
}

#[test]
fn token_uri_defaults_to_google() {
    let key = ServiceAccountKey::from_json(r#"{"client_email": "a@b", "private_key": "x"}"#).unwrap();
    assert_eq!(key.token_uri(), "https://oauth2.googleapis.com/token");
}

#[test]
fn bad_credentials_are_configuration_errors() {
    let err = ServiceAccountKey::from_json(r#"{"client_email": "a@b"}"#).unwrap_err();
    assert!(matches!(err, TrackerError::Configuration(_)), "got {:?}", err);

    let key = ServiceAccountKey::from_json(r#"{"client_email": "a@b", "private_key": "not a pem"}"#).unwrap();
    assert!(matches!(ServiceAccountAuth::new(key), Err(TrackerError::Configuration(_))));

    let missing = ServiceAccountKey::from_file(std::path::Path::new("tests/does_not_exist.json")).unwrap_err();
    assert!(matches!(missing, TrackerError::Configuration(_)));
}
