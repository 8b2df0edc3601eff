pub mod backfill;
pub mod config;
pub mod csv;
pub mod csv_sink;
pub mod error;
pub mod geoguessr;
pub mod google_auth;
pub mod handler;
pub mod model;
pub mod sheets;
pub mod sink;
pub mod tracker;
