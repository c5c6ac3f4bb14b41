use std::path::PathBuf;

use thiserror::Error;

/// Library error type for backdrop operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The image pool has no entries; the rotator cannot seed its window.
    #[error("image pool is empty")]
    EmptyPool,

    /// An image record failed validation.
    #[error("invalid image {src:?}: {reason}")]
    InvalidImage { src: String, reason: String },

    /// One or more configured library directories are invalid or unreadable.
    #[error("invalid library directory: {0}")]
    BadDir(String),

    /// `start()` was called on a rotator that has already been torn down.
    #[error("rotator has already been stopped")]
    AlreadyStopped,

    /// `start()` was called with no tokio runtime to host the timers.
    #[error("rotator must be started from within a tokio runtime")]
    NoRuntime,

    /// An image could not be decoded while building the pool.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML manifest error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON manifest error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
