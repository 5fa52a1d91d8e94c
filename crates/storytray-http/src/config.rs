//! HTTP endpoint configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the remote service and the upload service live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base of the status-stories API
    pub api_base: String,
    /// Base of the media upload service; the category is appended
    pub upload_base: String,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            upload_base: "http://localhost:5000/api/upload".to_string(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// Create with default endpoints
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// With upload base URL
    #[must_use]
    pub fn with_upload_base(mut self, base: impl Into<String>) -> Self {
        self.upload_base = base.into();
        self
    }

    /// With bearer token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Request timeout, at least one second
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
