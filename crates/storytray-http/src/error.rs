//! Setup errors for the HTTP collaborators
//!
//! Request-time failures are reported through the core error types
//! (`RemoteError`, `UploadError`); this only covers construction.

/// Errors building an HTTP collaborator
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Configured base URL does not parse
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl {
        /// The configured value
        url: String,
        /// Why it was refused
        reason: String,
    },

    /// reqwest client could not be built
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
