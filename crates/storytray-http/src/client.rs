//! Status-stories API client

use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::wire::{CreateResponse, ListResponse};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use storytray_core::{NewStory, RemoteError, StoryRecord, StoryService};

/// Remote story service over HTTP
#[derive(Debug, Clone)]
pub struct HttpStoryService {
    base_url: String,
    auth_token: Option<String>,
    http: Client,
}

impl HttpStoryService {
    /// Create a client for `config.api_base`
    ///
    /// # Errors
    /// - `HttpError::InvalidBaseUrl` if the base URL does not parse
    /// - `HttpError::Client` if the reqwest client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        Ok(Self {
            base_url: crate::base_url(&config.api_base)?,
            auth_token: config.auth_token.clone(),
            http: crate::build_client(config)?,
        })
    }

    fn stories_url(&self) -> String {
        format!("{}/api/status-stories", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn checked(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::status(status.as_u16(), body))
    }
}

#[async_trait]
impl StoryService for HttpStoryService {
    async fn list(&self) -> Result<Vec<StoryRecord>, RemoteError> {
        let url = self.stories_url();
        tracing::debug!("GET {}", url);

        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(transport)?;
        let body: ListResponse = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(decode)?;

        Ok(body.into_records())
    }

    async fn create(&self, story: &NewStory) -> Result<StoryRecord, RemoteError> {
        let url = self.stories_url();
        tracing::debug!("POST {} ({})", url, story.media_kind);

        let response = self
            .authorized(self.http.post(&url).json(story))
            .send()
            .await
            .map_err(transport)?;
        let body: CreateResponse = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(decode)?;

        Ok(body.into_story().into())
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

fn decode(e: reqwest::Error) -> RemoteError {
    RemoteError::Decode(e.to_string())
}
