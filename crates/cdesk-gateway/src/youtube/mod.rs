//! YouTube Data API v3 comment gateway
//!
//! Talks to `commentThreads` and `comments` with a bearer token supplied by
//! the identity provider. No retries, no pagination: one listing page of at
//! most `max_results` threads.

pub mod wire;

use crate::error::GatewayError;
use crate::video::VideoId;
use crate::{CommentGateway, Listing};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Threads requested per listing (API allows 1..=100)
    pub max_results: u32,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl YouTubeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With threads per listing
    #[inline]
    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: 20,
            request_timeout_ms: 30_000,
        }
    }
}

/// Comment gateway backed by the YouTube Data API
#[derive(Debug)]
pub struct YouTubeGateway {
    client: reqwest::Client,
    config: YouTubeConfig,
    bearer: RwLock<Option<String>>,
}

impl YouTubeGateway {
    /// Create gateway without a credential
    ///
    /// # Errors
    /// `GatewayError::Transport` if the HTTP client cannot be built
    pub fn new(config: YouTubeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            config,
            bearer: RwLock::new(None),
        })
    }

    /// With bearer token
    #[must_use]
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.set_bearer_token(token);
        self
    }

    /// Replace the bearer token (after the identity provider refreshed it)
    pub fn set_bearer_token(&self, token: impl Into<String>) {
        *self.bearer.write() = Some(token.into());
    }

    /// Forget the bearer token (sign-out)
    pub fn clear_bearer_token(&self) {
        *self.bearer.write() = None;
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    fn bearer(&self) -> Result<String, GatewayError> {
        self.bearer
            .read()
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(GatewayError::Unauthenticated)
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{resource}", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), GatewayError> {
        let response = request.bearer_auth(self.bearer()?).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl CommentGateway for YouTubeGateway {
    async fn list_threads(&self, video_id: &VideoId) -> Result<Listing, GatewayError> {
        tracing::debug!(video_id = %video_id, "listing comment threads");
        let max_results = self.config.max_results.to_string();
        let request = self.client.get(self.endpoint("commentThreads")).query(&[
            ("part", "snippet,replies"),
            ("videoId", video_id.as_str()),
            ("maxResults", max_results.as_str()),
        ]);

        let (status, body) = self.send(request).await?;
        let listing = wire::parse_listing(status, &body);
        if let Err(e) = &listing {
            tracing::warn!(video_id = %video_id, error = %e, "comment listing failed");
        }
        listing
    }

    async fn post_top_level_comment(&self, video_id: &VideoId, body: &str) -> Result<(), GatewayError> {
        tracing::debug!(video_id = %video_id, "inserting top-level comment");
        let request = self
            .client
            .post(self.endpoint("commentThreads"))
            .query(&[("part", "snippet")])
            .json(&wire::top_level_comment_body(video_id.as_str(), body));

        let (status, response) = self.send(request).await?;
        wire::check_write(status, &response)
    }

    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<(), GatewayError> {
        tracing::debug!(parent_id, "inserting reply");
        let request = self
            .client
            .post(self.endpoint("comments"))
            .query(&[("part", "snippet")])
            .json(&wire::reply_body(parent_id, body));

        let (status, response) = self.send(request).await?;
        wire::check_write(status, &response)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), GatewayError> {
        tracing::debug!(comment_id = id, "deleting comment");
        let request = self
            .client
            .delete(self.endpoint("comments"))
            .query(&[("id", id)]);

        let (status, response) = self.send(request).await?;
        wire::check_write(status, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = YouTubeConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_results, 20);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let gateway =
            YouTubeGateway::new(YouTubeConfig::new().with_base_url("http://localhost:9/v3/")).unwrap();
        assert_eq!(gateway.endpoint("comments"), "http://localhost:9/v3/comments");
    }

    #[tokio::test]
    async fn calls_without_token_are_unauthenticated() {
        let gateway = YouTubeGateway::new(YouTubeConfig::new()).unwrap();
        let result = gateway.list_threads(&VideoId::new("vid1")).await;
        assert_eq!(result, Err(GatewayError::Unauthenticated));

        gateway.set_bearer_token("");
        let result = gateway.delete_by_id("c1").await;
        assert_eq!(result, Err(GatewayError::Unauthenticated));
    }
}
