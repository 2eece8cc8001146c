use std::{
    io,
    path::PathBuf,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history not saved: {0}")]
    Persistence(#[from] StorageError),
    #[error("discarded malformed saved history: {0}")]
    MalformedData(String),
    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
}
