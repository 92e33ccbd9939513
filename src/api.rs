//! Headlines API client.
//!
//! This module talks to a GNews-compatible `top-headlines` endpoint:
//! - [`HeadlinesSource`]: Core trait the event loop fetches through
//! - [`GNewsClient`]: `reqwest`-backed implementation
//! - [`FetchError`]: Everything that can go wrong between request and decode
//!
//! # Outcomes
//!
//! A structurally valid JSON body always succeeds, even when its `articles`
//! field is missing or empty. Network errors, non-success statuses and bodies
//! that do not decode are errors. No retries are attempted here; the next user
//! action is the only recovery path.

use crate::controller::RequestParams;
use crate::models::{Article, HeadlinesResponse};
use crate::utils::truncate_for_log;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Public GNews v4 API.
pub const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";

const HEADLINES_PATH: &str = "top-headlines";

/// Failure to obtain a page of headlines.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can produce a page of headlines for a set of parameters.
///
/// Implementors must not retry on their own.
pub trait HeadlinesSource {
    /// Fetch one page. An empty `Vec` means the request succeeded with no results.
    async fn fetch(&self, params: &RequestParams) -> Result<Vec<Article>, FetchError>;
}

/// Client for the GNews `top-headlines` endpoint.
#[derive(Clone)]
pub struct GNewsClient {
    http: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for GNewsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GNewsClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GNewsClient {
    /// Create a client for `base_url` (e.g. [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            HEADLINES_PATH
        ))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            token: token.into(),
        })
    }

    /// Full request URL, token included. Never log the result.
    pub fn request_url(&self, params: &RequestParams) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", &self.token);
            for (key, value) in params.pairs() {
                query.append_pair(key, &value);
            }
        }
        url
    }
}

impl HeadlinesSource for GNewsClient {
    #[instrument(level = "info", skip_all, fields(page = params.page, filter = ?params.filter))]
    async fn fetch(&self, params: &RequestParams) -> Result<Vec<Article>, FetchError> {
        let t0 = Instant::now();
        let response = self.http.get(self.request_url(params)).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Headlines request rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: HeadlinesResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "Response is not a headlines document"
            );
            FetchError::Decode(e)
        })?;
        debug!(total = ?parsed.totalArticles, "Decoded headlines response");

        let articles = parsed.into_articles();
        info!(
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched headlines"
        );
        Ok(articles)
    }
}
