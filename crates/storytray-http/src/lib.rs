//! HTTP collaborators for the story tray
//!
//! - [`HttpStoryService`]: list and register stories on the status-stories API
//! - [`HttpMediaUploader`]: multipart media upload returning a durable URL
//!
//! Both are built from an [`HttpConfig`] and plugged into
//! `storytray_core::Collaborators`.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod error;
pub mod upload;
pub mod wire;

pub use client::HttpStoryService;
pub use config::HttpConfig;
pub use error::HttpError;
pub use upload::HttpMediaUploader;

/// Build the shared reqwest client for a config
pub(crate) fn build_client(config: &HttpConfig) -> Result<reqwest::Client, HttpError> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!("storytray/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Validate and normalise a base URL
pub(crate) fn base_url(raw: &str) -> Result<String, HttpError> {
    let trimmed = raw.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| HttpError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}
