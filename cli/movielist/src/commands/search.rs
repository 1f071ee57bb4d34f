use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use movie_catalog::types::Movie;
use movie_paging::{LoadError, Pager, PagingSnapshot};
use tracing::{debug, instrument};

use super::show::{DisplayMovieDetails, DisplayMovies, text_width};
use crate::utils::errors::format_load_error;
use crate::utils::message;

// Search for movies by title
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Display search results as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Number of result pages to load
    #[bpaf(long, argument("N"), fallback(1))]
    pub pages: usize,

    /// Show details of the N-th result
    #[bpaf(long, argument("N"))]
    pub show: Option<usize>,

    /// The title to search for
    #[bpaf(positional("query"))]
    pub query: String,
}

/// What a search loaded before it stopped.
#[derive(Debug)]
struct SearchResults {
    movies: Vec<Movie>,
    /// Set if loading further pages failed.
    append_error: Option<LoadError>,
}

impl Search {
    #[instrument(name = "search", fields(query = self.query, pages = self.pages, json = self.json), skip_all)]
    pub async fn handle(self, pager: Pager<Movie>) -> Result<()> {
        if self.query.trim().is_empty() {
            bail!("search query must not be empty");
        }
        if self.show == Some(0) {
            bail!("'--show' counts results from 1");
        }

        let results = collect_pages(&pager, &self.query, self.pages).await;
        pager.close();
        let results = results?;

        if let Some(n) = self.show {
            let movie = results.movies.get(n - 1).with_context(|| {
                format!("only {} movies found for '{}'", results.movies.len(), self.query)
            })?;
            if self.json {
                println!("{}", serde_json::to_string_pretty(movie)?);
            } else {
                println!("{}", DisplayMovieDetails::new(movie, text_width()));
            }
        } else if self.json {
            println!("{}", serde_json::to_string_pretty(&results.movies)?);
        } else if results.movies.is_empty() {
            message::plain(format!("No movies found for '{}'", self.query));
        } else {
            println!("{}", DisplayMovies::new(&results.movies, 0));
        }

        if let Some(error) = results.append_error {
            message::warning(format!(
                "Showing the first {} movies, loading more failed: {}",
                results.movies.len(),
                format_load_error(&error)
            ));
        }
        Ok(())
    }
}

/// Search for `query` and load up to `pages` pages through the prefetch trigger.
///
/// A failed first page fails the search,
/// a failed later page ends it with what was loaded so far.
async fn collect_pages(pager: &Pager<Movie>, query: &str, pages: usize) -> Result<SearchResults> {
    let mut subscription = pager.subscribe();
    pager.set_query(query);

    let mut snapshot = subscription
        .wait_for(|snapshot| snapshot.query == query && !snapshot.load_states.refresh.is_loading())
        .await
        .context("search was cancelled")?;

    if let Some(error) = snapshot.load_states.refresh.error() {
        return Err(error.clone()).context(format!("searching for '{query}' failed"));
    }

    while !is_done(&snapshot, pages) {
        let loaded = snapshot.page_count;
        debug!(loaded, "loading next page");
        pager.prefetch();
        snapshot = subscription
            .wait_for(|snapshot| snapshot.page_count > loaded || is_done(snapshot, pages))
            .await
            .context("search was cancelled")?;
    }

    Ok(SearchResults {
        append_error: snapshot.load_states.append.error().cloned(),
        movies: snapshot.items,
    })
}

fn is_done(snapshot: &PagingSnapshot<Movie>, pages: usize) -> bool {
    let append = &snapshot.load_states.append;
    snapshot.page_count >= pages || append.end_of_pagination() || append.is_error()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use movie_catalog::{
        CatalogClientError,
        EMPTY_SEARCH_RESPONSE,
        MockClient,
        SearchOptions,
        page_envelope,
    };
    use movie_paging::{MoviePageSourceFactory, PagingConfig};
    use pretty_assertions::assert_eq;

    use super::*;

    fn pager(client: &MockClient) -> Pager<Movie> {
        let factory = MoviePageSourceFactory::new(Arc::new(client.clone()), SearchOptions::default());
        Pager::new(factory, PagingConfig::default())
    }

    fn titles(results: &SearchResults) -> Vec<&str> {
        results.movies.iter().map(|movie| movie.title.as_str()).collect()
    }

    #[tokio::test]
    async fn loads_requested_number_of_pages() {
        let client = MockClient::new();
        client.push_search_response(page_envelope(&[(1, "Alien"), (2, "Aliens")], 3));
        client.push_search_response(page_envelope(
            &[(3, "Alien 3"), (4, "Alien Resurrection")],
            3,
        ));

        let results = collect_pages(&pager(&client), "alien", 2).await.unwrap();

        assert_eq!(titles(&results), vec![
            "Alien",
            "Aliens",
            "Alien 3",
            "Alien Resurrection"
        ]);
        assert!(results.append_error.is_none());
        assert_eq!(client.requests(), vec![
            ("alien".to_string(), 1),
            ("alien".to_string(), 2)
        ]);
    }

    #[tokio::test]
    async fn stops_at_the_last_page() {
        let client = MockClient::new();
        client.push_search_response(page_envelope(&[(1, "Alien")], 1));

        let results = collect_pages(&pager(&client), "alien", 5).await.unwrap();

        assert_eq!(titles(&results), vec!["Alien"]);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn no_results_is_not_an_error() {
        let client = MockClient::new();
        client.push_search_response(EMPTY_SEARCH_RESPONSE.clone());

        let results = collect_pages(&pager(&client), "zzzz", 1).await.unwrap();

        assert!(results.movies.is_empty());
        assert!(results.append_error.is_none());
    }

    #[tokio::test]
    async fn failed_first_page_fails_the_search() {
        let client = MockClient::new();
        client.push_error_response(500);

        let err = collect_pages(&pager(&client), "alien", 1)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "searching for 'alien' failed");
        let load_error = err.downcast_ref::<LoadError>().unwrap();
        assert!(matches!(
            load_error.downcast_ref::<CatalogClientError>(),
            Some(CatalogClientError::HttpStatus { code: 500, .. })
        ));
    }

    #[tokio::test]
    async fn failed_later_page_keeps_loaded_movies() {
        let client = MockClient::new();
        client.push_search_response(page_envelope(&[(1, "Alien")], 2));
        client.push_error_response(503);

        let results = collect_pages(&pager(&client), "alien", 2).await.unwrap();

        assert_eq!(titles(&results), vec!["Alien"]);
        let error = results.append_error.unwrap();
        assert_eq!(error.key().map(|key| key.get()), Some(2));
    }

    #[tokio::test]
    async fn page_of_duplicates_still_counts() {
        let client = MockClient::new();
        client.push_search_response(page_envelope(&[(1, "Alien")], 3));
        client.push_search_response(page_envelope(&[(1, "Alien")], 3));
        client.push_search_response(page_envelope(&[(2, "Aliens")], 3));

        let results = collect_pages(&pager(&client), "alien", 3).await.unwrap();

        assert_eq!(titles(&results), vec!["Alien", "Aliens"]);
        assert_eq!(client.requests().len(), 3);
    }
}
