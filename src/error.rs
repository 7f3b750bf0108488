use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("grid size {0} is too small (minimum 8)")]
    GridTooSmall(i32),
    #[error("initial length must be at least 1")]
    ZeroInitialLength,
    #[error("move interval must be positive")]
    InvalidMoveInterval,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("player 1 must be selected")]
    MissingFirstPlayer,
    #[error("player 2 must be selected for a two-player match")]
    MissingSecondPlayer,
    #[error("the same player cannot take both seats")]
    SamePlayerTwice,
    #[error("a match is already in progress")]
    MatchInProgress,
    #[error("no valid session has been set up")]
    InvalidSession,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("player name '{0}' is already taken")]
    DuplicateName(String),
    #[error("player '{0}' does not exist")]
    UnknownPlayer(String),
    #[error("import payload is invalid: {0}")]
    InvalidImport(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io failure at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported store version {0}")]
    UnsupportedVersion(u8),
}
