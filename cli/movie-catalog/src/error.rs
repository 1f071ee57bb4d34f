//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;
use tmdb_api_v3::types as api_types;
use tmdb_api_v3::Error as APIError;

/// Alias to type representing the error bodies documented by TMDB.
pub type ApiErrorResponse = api_types::ErrorResponse;

/// Common error type for catalog API operations.
///
/// Every failure of a catalog call ends up in exactly one of these variants.
/// [`CatalogClientError::Transport`] means no response was received,
/// [`CatalogClientError::HttpStatus`] means the catalog answered with a non-2xx status
/// (after the retry described by [`RetryPolicy`](crate::RetryPolicy)).
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("search query must not be empty")]
    EmptyQuery,
    #[error("could not reach the movie catalog")]
    Transport(#[source] reqwest::Error),
    #[error("{}", fmt_http_status(*.code, .message.as_deref()))]
    HttpStatus { code: u16, message: Option<String> },
    #[error("movie catalog returned a malformed response")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("{}", .0)]
    Other(String),
}

impl CatalogClientError {
    /// Whether the request policy should try the same request once more.
    ///
    /// Only rate limiting (429) and server errors (5xx) qualify.
    /// Client errors such as 400 or 401 would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogClientError::HttpStatus { code, .. } => {
                *code == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..=599).contains(code)
            },
            _ => false,
        }
    }

    /// The HTTP status the catalog answered with, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CatalogClientError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Extension trait for converting API errors into client errors.
pub trait MapApiErrorExt<T> {
    /// Consumes a `Result<T, APIError<ApiErrorResponse>>`, maps any APIError
    /// into `CatalogClientError`, and returns `Ok(T)` or `Err(...)`.
    fn map_api_error(
        self,
    ) -> impl std::future::Future<Output = Result<T, CatalogClientError>> + Send;
}

impl<T: Send> MapApiErrorExt<T> for Result<T, APIError<ApiErrorResponse>> {
    async fn map_api_error(self) -> Result<T, CatalogClientError> {
        let err = match self {
            Ok(v) => return Ok(v),
            Err(err) => err,
        };

        let mapped = match err {
            APIError::ErrorResponse(response) => CatalogClientError::HttpStatus {
                code: response.status().as_u16(),
                message: Some(response.into_inner().status_message),
            },
            // Non-2xx responses arrive unread; a TMDB error body
            // contributes its `status_message`.
            APIError::UnexpectedResponse(response) => parse_api_error(response).await,
            // The request URL carries the api key.
            APIError::CommunicationError(e) | APIError::ResponseBodyError(e) => {
                CatalogClientError::Transport(e.without_url())
            },
            APIError::InvalidResponsePayload(_, e) => CatalogClientError::InvalidPayload(e),
            other => CatalogClientError::Other(other.to_string()),
        };
        Err(mapped)
    }
}

async fn parse_api_error(response: reqwest::Response) -> CatalogClientError {
    let code = response.status().as_u16();
    // The body is only used for the message;
    // it may as well be an HTML error page, which we don't format.
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ApiErrorResponse>(&body)
            .ok()
            .map(|parsed| parsed.status_message),
        Err(_) => None,
    };
    CatalogClientError::HttpStatus { code, message }
}

fn fmt_http_status(code: u16, message: Option<&str>) -> String {
    let status = StatusCode::from_u16(code)
        .map(|status| status.to_string())
        .unwrap_or_else(|_| code.to_string());
    match message {
        Some(message) => format!("movie catalog responded with {status}: {message}"),
        None => format!("movie catalog responded with {status}"),
    }
}
