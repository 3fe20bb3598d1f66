use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Failure of a single download task.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("download worker stopped unexpectedly: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Search(ApiError),

    #[error("Invalid input. Exiting...")]
    InvalidSelection(#[from] std::num::ParseIntError),

    #[error("Failed to read selection: {0}")]
    Input(#[source] std::io::Error),

    #[error("Download of {name} failed: {source}")]
    Download {
        name: String,
        #[source]
        source: DownloadError,
    },

    #[error("Interrupted")]
    Cancelled,
}
