use std::time::Duration;

use progenitor_client::{Error, ResponseValue};
use tracing::trace;

use crate::types;

/// Client for the TMDB v3 API.
///
/// Every method issues exactly one request.
/// Credentials, retries and request logging are the caller's concern.
#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) baseurl: String,
    pub(crate) client: reqwest::Client,
}

impl Client {
    /// Create a new client.
    ///
    /// `baseurl` is the base URL provided to the internal
    /// `reqwest::Client`, and should include a scheme and hostname,
    /// as well as port and a path stem if applicable,
    /// e.g. `https://api.themoviedb.org/3`.
    ///
    /// Fails if the TLS backend of the internal `reqwest::Client`
    /// cannot be initialized.
    pub fn new(baseurl: &str) -> Result<Self, reqwest::Error> {
        let dur = Duration::from_secs(15);
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(dur)
            .read_timeout(dur)
            .build()?;
        Ok(Self::new_with_client(baseurl, client))
    }

    /// Construct a new client with an existing `reqwest::Client`,
    /// allowing more control over its configuration.
    ///
    /// A trailing slash on `baseurl` is ignored.
    pub fn new_with_client(baseurl: &str, client: reqwest::Client) -> Self {
        Self {
            baseurl: baseurl.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL to which requests are made.
    pub fn baseurl(&self) -> &String {
        &self.baseurl
    }

    /// Get the internal `reqwest::Client` used to make requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Search for movies by their original, translated and alternative titles.
    ///
    /// Query Parameters:
    /// - **api_key**: API key used to authenticate the request
    /// - **query**: the search keyword, must not be empty
    /// - **page**: 1-based page number; TMDB rejects values outside `1..=500`
    /// - **include_adult**: whether adult titles are included
    /// - **language**: ISO 639-1 language tag for translated fields, e.g. `en-US`
    ///
    /// Sends a `GET` request to `/search/movie`
    ///
    /// Any `2xx` response is decoded as a result page.
    /// Every other status is returned as [Error::UnexpectedResponse]
    /// with the body unread, since TMDB and the proxies in front of it
    /// do not reliably send a JSON error body.
    pub async fn search_movie<'a>(
        &'a self,
        api_key: &'a str,
        query: &'a str,
        page: i64,
        include_adult: bool,
        language: &'a str,
    ) -> Result<ResponseValue<types::SearchMovieResponse>, Error<types::ErrorResponse>> {
        let url = format!("{}/search/movie", self.baseurl);
        let query_params = [
            ("api_key", api_key.to_string()),
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("include_adult", include_adult.to_string()),
            ("language", language.to_string()),
        ];
        let request = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                reqwest::header::HeaderValue::from_static("application/json"),
            )
            .query(&query_params)
            .build()?;
        trace!(method = %request.method(), path = request.url().path(), page, "sending request");

        let response = self.client.execute(request).await?;
        match response.status().as_u16() {
            200u16..=299u16 => ResponseValue::from_response(response).await,
            _ => Err(Error::UnexpectedResponse(response)),
        }
    }
}
