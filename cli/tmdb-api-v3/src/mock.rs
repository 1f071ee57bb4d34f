pub mod operations {
    //! [`When`](httpmock::When) and [`Then`](httpmock::Then)
    //! wrappers for each operation. Each can be converted to
    //! its inner type with a call to `into_inner()`. This can
    //! be used to explicitly deviate from permitted values.
    use crate::types;

    pub struct SearchMovieWhen(httpmock::When);
    impl SearchMovieWhen {
        pub fn new(inner: httpmock::When) -> Self {
            Self(inner.method(httpmock::Method::GET).path("/search/movie"))
        }

        pub fn into_inner(self) -> httpmock::When {
            self.0
        }

        pub fn api_key(self, value: &str) -> Self {
            Self(self.0.query_param("api_key", value))
        }

        pub fn query(self, value: &str) -> Self {
            Self(self.0.query_param("query", value))
        }

        pub fn page(self, value: i64) -> Self {
            Self(self.0.query_param("page", value.to_string()))
        }

        pub fn include_adult(self, value: bool) -> Self {
            Self(self.0.query_param("include_adult", value.to_string()))
        }

        pub fn language(self, value: &str) -> Self {
            Self(self.0.query_param("language", value))
        }
    }

    pub struct SearchMovieThen(httpmock::Then);
    impl SearchMovieThen {
        pub fn new(inner: httpmock::Then) -> Self {
            Self(inner)
        }

        pub fn into_inner(self) -> httpmock::Then {
            self.0
        }

        pub fn ok(self, value: &types::SearchMovieResponse) -> Self {
            Self(
                self.0
                    .status(200u16)
                    .header("content-type", "application/json")
                    .json_body_obj(value),
            )
        }

        pub fn unauthorized(self, value: &types::ErrorResponse) -> Self {
            Self(
                self.0
                    .status(401u16)
                    .header("content-type", "application/json")
                    .json_body_obj(value),
            )
        }

        pub fn not_found(self, value: &types::ErrorResponse) -> Self {
            Self(
                self.0
                    .status(404u16)
                    .header("content-type", "application/json")
                    .json_body_obj(value),
            )
        }

        /// Respond with an arbitrary status and no body,
        /// e.g. rate limiting or server errors.
        pub fn status(self, status: u16) -> Self {
            Self(self.0.status(status))
        }
    }
}

/// An extension trait for [`MockServer`](httpmock::MockServer) that
/// adds a method for each operation. These are the equivalent of
/// type-checked [`mock()`](httpmock::MockServer::mock) calls.
pub trait MockServerExt {
    fn search_movie<F>(&self, config_fn: F) -> httpmock::Mock<'_>
    where
        F: FnOnce(operations::SearchMovieWhen, operations::SearchMovieThen);
}

impl MockServerExt for httpmock::MockServer {
    fn search_movie<F>(&self, config_fn: F) -> httpmock::Mock<'_>
    where
        F: FnOnce(operations::SearchMovieWhen, operations::SearchMovieThen),
    {
        self.mock(|when, then| {
            config_fn(
                operations::SearchMovieWhen::new(when),
                operations::SearchMovieThen::new(then),
            )
        })
    }
}
