//! Catalog client wrapper around the TMDB API client.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tmdb_api_v3::Client as APIClient;
use tracing::{debug, instrument};

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::policy::RetryPolicy;
use crate::types::{PageEnvelope, SearchOptions};
use crate::MapApiErrorExt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const READ_TIMEOUT: Duration = Duration::from_secs(15);

#[cfg(any(test, feature = "tests"))]
pub const EMPTY_SEARCH_RESPONSE: &PageEnvelope = &PageEnvelope {
    page: Some(1),
    results: vec![],
    total_pages: 0,
    total_results: Some(0),
};

/// Build a search response with one result per `(id, title)`.
#[cfg(any(test, feature = "tests"))]
pub fn page_envelope(movies: &[(i64, &str)], total_pages: i64) -> PageEnvelope {
    PageEnvelope {
        page: None,
        results: movies
            .iter()
            .map(|(id, title)| crate::types::RawMovie {
                id: *id,
                title: title.to_string(),
                overview: format!("{title} overview"),
                poster_path: Some(format!("/{id}.jpg")),
                vote_average: 7.5,
            })
            .collect(),
        total_pages,
        total_results: None,
    }
}

/// A client for the movie catalog.
///
/// This is a wrapper around the [`APIClient`] that handles:
/// - HTTP client configuration with timeouts
/// - API key authentication
/// - Retrying rate limited and failed requests once
/// - Request logging
pub struct CatalogClient {
    client: APIClient,
    config: CatalogClientConfig,
    retry_policy: RetryPolicy,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("tmdb_url", &self.config.tmdb_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let http_client = build_http_client(&config)?;
        let client = APIClient::new_with_client(&config.tmdb_url, http_client);

        Ok(Self {
            client,
            config,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy, mostly useful in tests.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Access the underlying API client for making requests.
    pub fn api(&self) -> &APIClient {
        &self.client
    }

    /// Get the configured catalog URL.
    pub fn tmdb_url(&self) -> &str {
        &self.config.tmdb_url
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The catalog API interface used by movielist.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the TMDB API via [`CatalogClient`]
/// - **Mock**: Canned responses without HTTP via [`MockClient`]
pub trait ClientTrait {
    /// Fetch one page of movies matching `query`.
    ///
    /// `page` is 1-based and passed through as is,
    /// out of range pages are reported by the catalog.
    fn search_movies(
        &self,
        query: &str,
        page: i64,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<PageEnvelope, CatalogClientError>> + Send;
}

impl ClientTrait for CatalogClient {
    #[instrument(skip_all, fields(query = %query, page = page))]
    async fn search_movies(
        &self,
        query: &str,
        page: i64,
        options: &SearchOptions,
    ) -> Result<PageEnvelope, CatalogClientError> {
        if query.trim().is_empty() {
            return Err(CatalogClientError::EmptyQuery);
        }
        debug!(?options, "sending search request");

        let response = self
            .retry_policy
            .run(|attempt| async move {
                let started = Instant::now();
                let result = self
                    .client
                    .search_movie(
                        &self.config.api_key,
                        query,
                        page,
                        options.include_adult,
                        &options.language,
                    )
                    .await
                    .map_api_error()
                    .await;
                self.config
                    .request_logging
                    .log_attempt("search/movie", attempt, started, &result);
                result
            })
            .await?;

        let envelope = response.into_inner();
        debug!(
            n_results = envelope.results.len(),
            total_pages = envelope.total_pages,
            "received search results"
        );

        Ok(envelope)
    }
}

// ---------------------------------------------------------------------------
// Client selection
// ---------------------------------------------------------------------------

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

impl ClientTrait for Client {
    async fn search_movies(
        &self,
        query: &str,
        page: i64,
        options: &SearchOptions,
    ) -> Result<PageEnvelope, CatalogClientError> {
        match self {
            Client::Catalog(client) => client.search_movies(query, page, options).await,
            Client::Mock(client) => client.search_movies(query, page, options).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Mock client
// ---------------------------------------------------------------------------

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// A canned answer of the [`MockClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MockResponse {
    Page(PageEnvelope),
    /// A failed request with the given HTTP status.
    ///
    /// Retryable statuses go through the client's [`RetryPolicy`],
    /// so a retry consumes the next response.
    Status(u16),
}

#[derive(Debug, Error)]
pub enum MockDataError {
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// A catalog client that can be seeded with mock responses.
///
/// Responses are handed out in order, regardless of the query.
/// Every request is recorded so tests can assert on what was sent.
/// Clients built with [`MockClient::new`] never retry,
/// clients loaded [from a file](MockClient::from_file) retry like [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<VecDeque<MockResponse>>,
    pub requests: MockField<Vec<(String, i64)>>,
    retry_policy: RetryPolicy,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            mock_responses: Default::default(),
            requests: Default::default(),
            retry_policy: RetryPolicy::never(),
        }
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client from a JSON array of responses on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
        let responses: VecDeque<MockResponse> =
            serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
        Ok(Self {
            mock_responses: Arc::new(Mutex::new(responses)),
            retry_policy: RetryPolicy::default(),
            ..Default::default()
        })
    }

    /// Replace the retry policy applied to failed mock responses.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Push a new response into the list of mock responses
    pub fn push_search_response(&self, resp: PageEnvelope) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(MockResponse::Page(resp));
    }

    /// Push a failed request into the list of mock responses
    pub fn push_error_response(&self, status_code: u16) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(MockResponse::Status(status_code));
    }

    /// Record the request and hand out the next canned response.
    fn next_response(&self, query: &str, page: i64) -> Result<PageEnvelope, CatalogClientError> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push((query.to_string(), page));

        let mock_resp = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();
        match mock_resp {
            Some(MockResponse::Page(resp)) => Ok(resp),
            Some(MockResponse::Status(code)) => Err(CatalogClientError::HttpStatus {
                code,
                message: None,
            }),
            None => Err(CatalogClientError::Other(format!(
                "no mock response left for query '{query}', page {page}"
            ))),
        }
    }

    /// All `(query, page)` pairs requested so far.
    pub fn requests(&self) -> Vec<(String, i64)> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }
}

impl ClientTrait for MockClient {
    async fn search_movies(
        &self,
        query: &str,
        page: i64,
        _options: &SearchOptions,
    ) -> Result<PageEnvelope, CatalogClientError> {
        if query.trim().is_empty() {
            return Err(CatalogClientError::EmptyQuery);
        }
        self.retry_policy
            .run(|_attempt| async move { self.next_response(query, page) })
            .await
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the HTTP client used for all catalog requests.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    debug!(
        tmdb_url = %config.tmdb_url,
        has_api_key = !config.api_key.is_empty(),
        request_logging = ?config.request_logging,
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
