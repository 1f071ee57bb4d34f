use movie_catalog::CatalogClientError;
use movie_paging::LoadError;

/// Join an error and all of its sources with `: `.
pub fn display_chain(mut err: &dyn std::error::Error) -> String {
    let mut fmt = err.to_string();
    while let Some(source) = err.source() {
        fmt = format!("{fmt}: {source}");
        err = source;
    }
    fmt
}

/// A suggestion how to resolve a failed load, if there is one.
fn load_error_hint(err: &LoadError) -> Option<&'static str> {
    match err.downcast_ref::<CatalogClientError>()? {
        CatalogClientError::HttpStatus { code: 401, .. } => {
            Some("Check that MOVIELIST_TMDB_API_KEY is a valid TMDB API key.")
        },
        CatalogClientError::HttpStatus { code: 429, .. } => {
            Some("TMDB is limiting requests, try again in a moment.")
        },
        CatalogClientError::Transport(_) => Some("Check your network connection."),
        _ => None,
    }
}

/// Format a failed load including its cause and a hint if there is one.
pub fn format_load_error(err: &LoadError) -> String {
    let chain = display_chain(err);
    match load_error_hint(err) {
        Some(hint) => format!("{chain}\n{hint}"),
        None => chain,
    }
}
