//! Error types for the story tray
//!
//! Only two failures ever reach a caller of the tray:
//! - Upload failures during publish
//! - A publish attempted while another one is still in flight
//!
//! Everything else (remote list/create failures, store writes, stale timers)
//! degrades locally and is only logged.

use std::path::PathBuf;

/// Errors from the local persisted store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error reading or writing a record
    #[error("io error on {path}: {source}")]
    Io {
        /// Record file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Record could not be encoded or decoded
    #[error("record '{key}' is not valid json: {source}")]
    Codec {
        /// Record key
        key: String,
        /// Underlying failure
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create codec error for record key
    pub fn codec_error(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Codec {
            key: key.into(),
            source,
        }
    }
}

/// Errors from the remote content service
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Service unreachable or connection dropped
    #[error("transport error: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("remote returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Create status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

/// Errors from the media upload collaborator
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Local file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File being uploaded
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Upload service unreachable
    #[error("upload transport error: {0}")]
    Transport(String),

    /// Upload service refused the file
    #[error("upload rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Reason given by the service
        message: String,
    },

    /// Upload service answered without a usable URL
    #[error("invalid upload response: {0}")]
    Decode(String),
}

impl UploadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create rejection error
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Errors surfaced by the publish flow
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Another publish is still uploading
    #[error("a story is already being published")]
    Busy,

    /// Media upload failed; nothing was recorded
    #[error("failed to upload story: {0}")]
    Upload(#[from] UploadError),

    /// The publish task was dropped before it finished
    #[error("publish cancelled")]
    Cancelled,
}

impl PublishError {
    /// Whether the viewer can simply try again
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy | Self::Cancelled | Self::Upload(UploadError::Transport(_))
        )
    }
}

/// Errors loading configuration files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected shape
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Parser failure
        #[source]
        source: toml::de::Error,
    },
}

/// Errors talking to a running tray driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The driver task has exited
    #[error("tray driver stopped")]
    Stopped,
}
