//! Page source backed by the movie catalog.

use std::sync::Arc;

use movie_catalog::types::Movie;
use movie_catalog::{ClientTrait, SearchOptions};
use tracing::{debug, instrument};

use crate::load_state::LoadError;
use crate::page_key::PageKey;
use crate::page_source::{LoadParams, Page, PageSource, PageSourceFactory, PagingItem, PagingState};

impl PagingItem for Movie {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Pages through the search results for one query.
#[derive(Debug)]
pub struct MoviePageSource<C> {
    client: Arc<C>,
    query: String,
    options: SearchOptions,
}

impl<C> MoviePageSource<C> {
    pub fn new(client: Arc<C>, query: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            client,
            query: query.into(),
            options,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl<C> PageSource for MoviePageSource<C>
where
    C: ClientTrait + Send + Sync + 'static,
{
    type Item = Movie;

    #[instrument(skip_all, fields(query = %self.query, key = ?params.key))]
    async fn load(&self, params: LoadParams) -> Result<Page<Movie>, LoadError> {
        let key = params.key.unwrap_or(PageKey::FIRST);

        let envelope = self
            .client
            .search_movies(&self.query, key.into(), &self.options)
            .await
            .map_err(|e| LoadError::new(params.key, e))?;

        let page = Page {
            items: envelope.results.into_iter().map(Movie::from).collect(),
            prev_key: key.prev(),
            next_key: key.next(envelope.total_pages),
        };
        debug!(
            n_items = page.items.len(),
            total_pages = envelope.total_pages,
            next_key = ?page.next_key,
            "loaded page"
        );
        Ok(page)
    }

    fn refresh_key(&self, state: &PagingState<'_, Movie>) -> Option<PageKey> {
        state.anchor_page_key()
    }
}

/// Creates a [`MoviePageSource`] per query, all sharing one client.
#[derive(Debug)]
pub struct MoviePageSourceFactory<C> {
    client: Arc<C>,
    options: SearchOptions,
}

impl<C> MoviePageSourceFactory<C> {
    pub fn new(client: Arc<C>, options: SearchOptions) -> Self {
        Self { client, options }
    }
}

impl<C> PageSourceFactory for MoviePageSourceFactory<C>
where
    C: ClientTrait + Send + Sync + 'static,
{
    type Source = MoviePageSource<C>;

    fn create(&self, query: &str) -> MoviePageSource<C> {
        MoviePageSource::new(Arc::clone(&self.client), query, self.options.clone())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use movie_catalog::{
        CatalogClient,
        CatalogClientConfig,
        CatalogClientError,
        EMPTY_SEARCH_RESPONSE,
        MockClient,
        page_envelope,
    };
    use pretty_assertions::assert_eq;
    use tmdb_api_v3::mock::MockServerExt;

    use super::*;

    fn source(client: &Arc<MockClient>, query: &str) -> MoviePageSource<MockClient> {
        MoviePageSource::new(Arc::clone(client), query, SearchOptions::default())
    }

    fn params(page: Option<u32>) -> LoadParams {
        LoadParams {
            key: page.and_then(PageKey::new),
            load_size: 20,
        }
    }

    #[tokio::test]
    async fn first_page_of_single_page_result() {
        let client = Arc::new(MockClient::new());
        client.push_search_response(page_envelope(&[(1, "Alien")], 1));

        let page = source(&client, "alien").load(params(None)).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Alien");
        assert_eq!(page.prev_key, None);
        assert_eq!(page.next_key, None);
        assert_eq!(client.requests(), vec![("alien".to_string(), 1)]);
    }

    #[tokio::test]
    async fn middle_page_of_five() {
        let client = Arc::new(MockClient::new());
        client.push_search_response(page_envelope(&[(21, "Aliens")], 5));

        let page = source(&client, "alien").load(params(Some(2))).await.unwrap();

        assert_eq!(page.prev_key, PageKey::new(1));
        assert_eq!(page.next_key, PageKey::new(3));
        assert_eq!(client.requests(), vec![("alien".to_string(), 2)]);
    }

    #[tokio::test]
    async fn zero_pages_is_an_empty_page() {
        let client = Arc::new(MockClient::new());
        client.push_search_response(EMPTY_SEARCH_RESPONSE.clone());

        let page = source(&client, "zzzzzz").load(params(None)).await.unwrap();

        assert_eq!(page, Page::empty());
    }

    #[tokio::test]
    async fn items_are_mapped() {
        let client = Arc::new(MockClient::new());
        client.push_search_response(page_envelope(&[(1, "Alien"), (2, "Aliens")], 1));

        let page = source(&client, "alien").load(params(None)).await.unwrap();

        assert_eq!(page.items[1], Movie {
            id: 2,
            title: "Aliens".to_string(),
            overview: "Aliens overview".to_string(),
            poster_url: Some("https://image.tmdb.org/t/p/w500/2.jpg".to_string()),
            rating: 7.5,
        });
    }

    #[tokio::test]
    async fn http_error_is_a_load_error() {
        let client = Arc::new(MockClient::new());
        client.push_error_response(500);

        let error = source(&client, "alien")
            .load(params(Some(3)))
            .await
            .unwrap_err();

        assert_eq!(error.key(), PageKey::new(3));
        assert!(matches!(
            error.downcast_ref::<CatalogClientError>(),
            Some(CatalogClientError::HttpStatus { code: 500, .. })
        ));
        // no retry at this level
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn factory_binds_query() {
        let client = Arc::new(MockClient::new());
        let factory = MoviePageSourceFactory::new(client, SearchOptions::default());
        assert_eq!(factory.create("alien").query(), "alien");
        assert_eq!(factory.create("blade runner").query(), "blade runner");
    }

    /// Two server errors in a row reach the page source as one load error,
    /// after the catalog client retried once.
    #[tokio::test]
    async fn persistent_server_error_over_http() {
        let server = MockServer::start_async().await;
        let mock = server.search_movie(|when, then| {
            when.query("alien").page(1);
            then.status(500);
        });
        let client = CatalogClient::new(CatalogClientConfig {
            tmdb_url: server.base_url(),
            api_key: "key".to_string(),
            ..Default::default()
        })
        .unwrap();

        let source = MoviePageSource::new(Arc::new(client), "alien", SearchOptions::default());
        let error = source.load(params(None)).await.unwrap_err();

        mock.assert_hits(2);
        assert_eq!(
            error
                .downcast_ref::<CatalogClientError>()
                .and_then(CatalogClientError::status_code),
            Some(500)
        );
    }
}
