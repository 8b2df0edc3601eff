pub mod challenge;
pub mod game;
pub mod record;
