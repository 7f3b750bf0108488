pub mod achievements;
pub mod ai;
pub mod collision;
pub mod config;
pub mod constants;
pub mod economy;
pub mod effects;
pub mod engine;
pub mod error;
pub mod food;
pub mod player;
pub mod player_store;
pub mod respawn;
pub mod rng;
pub mod score;
pub mod snake;
pub mod stats;
pub mod types;
