// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("terrain pool error: {0}")]
    Terrain(#[from] crate::scene::terrain::TerrainError),

    #[error("malformed pose log {path} at row {row}: {message}")]
    PoseLog {
        path: PathBuf,
        row: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
