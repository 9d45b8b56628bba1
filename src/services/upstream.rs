//! Client for the upstream tagging API.
//!
//! The API takes a wildcard key pattern and a `YYYYMMDD` window and answers
//! with the flat dot-path keyed series the engine consumes.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;
use crate::models::series::{RawSeriesByKey, UPSTREAM_DAY_FORMAT};
use crate::models::time::{DateRange, Granularity};

/// One upstream query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesQuery {
    pub pattern: String,
    pub range: DateRange,
    pub granularity: Granularity,
}

impl SeriesQuery {
    pub fn new(pattern: impl Into<String>, range: DateRange, granularity: Granularity) -> Self {
        Self {
            pattern: pattern.into(),
            range,
            granularity,
        }
    }

    pub fn start_time(&self) -> String {
        self.range.start.format(UPSTREAM_DAY_FORMAT).to_string()
    }

    pub fn end_time(&self) -> String {
        self.range.end.format(UPSTREAM_DAY_FORMAT).to_string()
    }

    /// Same pattern over the trailing comparison window.
    pub fn previous(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            range: self.range.previous(),
            granularity: self.granularity,
        }
    }
}

/// Source of raw keyed series.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<RawSeriesByKey, FetchError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamRequest<'a> {
    id: &'a str,
    start_time: String,
    end_time: String,
    granularity: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamResponse {
    Wrapped { output: RawSeriesByKey },
    Bare(RawSeriesByKey),
}

impl UpstreamResponse {
    fn into_series(self) -> RawSeriesByKey {
        match self {
            UpstreamResponse::Wrapped { output } => output,
            UpstreamResponse::Bare(series) => series,
        }
    }
}

/// HTTP client for the tagging API with retry on transient failures.
pub struct TaggingApiClient {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
    max_retries: usize,
}

impl TaggingApiClient {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    pub fn with_client(endpoint: Url, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint,
            token: None,
            max_retries: 2,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_once(&self, query: &SeriesQuery) -> Result<RawSeriesByKey, FetchError> {
        let body = UpstreamRequest {
            id: &query.pattern,
            start_time: query.start_time(),
            end_time: query.end_time(),
            granularity: query.granularity.as_str(),
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let parsed: UpstreamResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(parsed.into_series())
    }
}

#[async_trait]
impl SeriesProvider for TaggingApiClient {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<RawSeriesByKey, FetchError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_times(self.max_retries);

        let series = (|| self.post_once(query))
            .retry(backoff)
            .when(FetchError::is_transient)
            .notify(|err: &FetchError, delay: Duration| {
                warn!(
                    pattern = %query.pattern,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Upstream request failed, retrying"
                );
            })
            .await?;

        debug!(
            pattern = %query.pattern,
            start = %query.start_time(),
            end = %query.end_time(),
            keys = series.len(),
            "Fetched upstream series"
        );
        Ok(series)
    }
}
