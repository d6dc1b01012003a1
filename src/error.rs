// src/error.rs
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a progress snapshot was rejected. The store is untouched in every case.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("snapshot is not a JSON object")]
    NotAnObject,
    #[error("snapshot has no starProgress field")]
    MissingStarProgress,
    #[error("snapshot field {field} is malformed: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode progress: {0}")]
    Encode(#[from] bincode::Error),
    #[error("failed to write snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to persist temp file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MissionError {
    #[error("no mission is active")]
    NoActiveMission,
    #[error("mission already completed")]
    AlreadyCompleted,
    #[error("slot {slot} is out of range (mission has {len} slots)")]
    SlotOutOfRange { slot: usize, len: usize },
    #[error("slot {0} was given up and is locked")]
    SlotLocked(usize),
    #[error("no session is running")]
    NoSession,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
