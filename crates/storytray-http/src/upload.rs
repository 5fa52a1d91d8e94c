//! Multipart media upload

use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::wire::UploadResponse;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use storytray_core::{MediaFile, MediaUploader, UploadError};

/// Multipart form field carrying the file
const FILE_FIELD: &str = "file";

/// Media uploader posting to `{upload_base}/{category}`
#[derive(Debug, Clone)]
pub struct HttpMediaUploader {
    base_url: String,
    auth_token: Option<String>,
    http: Client,
}

impl HttpMediaUploader {
    /// Create an uploader for `config.upload_base`
    ///
    /// # Errors
    /// - `HttpError::InvalidBaseUrl` if the base URL does not parse
    /// - `HttpError::Client` if the reqwest client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        Ok(Self {
            base_url: crate::base_url(&config.upload_base)?,
            auth_token: config.auth_token.clone(),
            http: crate::build_client(config)?,
        })
    }

    fn upload_url(&self, category: &str) -> String {
        format!("{}/{}", self.base_url, category.trim_matches('/'))
    }

    async fn form(file: &MediaFile) -> Result<Form, UploadError> {
        let content_type = file.content_type.as_deref().filter(|ct| {
            let usable = usable_content_type(ct);
            if !usable {
                tracing::warn!("Ignoring unusable content type '{}'", ct);
            }
            usable
        });

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| UploadError::io_error(&file.path, e))?;

        let part = Part::bytes(bytes).file_name(file.file_name.clone());
        let part = match content_type {
            Some(ct) => part
                .mime_str(ct)
                .map_err(|e| UploadError::Transport(e.to_string()))?,
            None => part,
        };
        Ok(Form::new().part(FILE_FIELD, part))
    }
}

/// Whether reqwest accepts `content_type` as a part's MIME type
fn usable_content_type(content_type: &str) -> bool {
    Part::bytes(Vec::new()).mime_str(content_type).is_ok()
}

#[async_trait]
impl MediaUploader for HttpMediaUploader {
    async fn upload(&self, file: &MediaFile, category: &str) -> Result<String, UploadError> {
        let form = Self::form(file).await?;
        let url = self.upload_url(category);
        tracing::debug!("Uploading {} to {}", file.file_name, url);

        let mut request = self.http.post(&url).multipart(form);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::rejected(status.as_u16(), body));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Decode(e.to_string()))?;
        body.url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| UploadError::Decode("response has no url".to_string()))
    }
}
