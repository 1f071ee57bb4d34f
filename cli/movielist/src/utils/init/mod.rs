use std::env;
use std::path::Path;

use anyhow::{Context, Result, bail};
use movie_catalog::{CatalogClient, CatalogClientConfig, Client, MockClient, RequestLogging};
use tracing::debug;

use crate::commands::Verbosity;
use crate::config::Config;

mod logger;

pub(crate) use logger::init_logger;

/// Points at a JSON file of canned catalog responses to use instead of TMDB.
pub const MOVIELIST_CATALOG_MOCK_DATA_VAR: &str = "_MOVIELIST_CATALOG_MOCK_DATA";

/// Request logging follows the verbosity unless it is configured explicitly.
fn request_logging(config: &Config, verbosity: Verbosity) -> RequestLogging {
    config.request_logging.unwrap_or(match verbosity {
        Verbosity::Verbose(1..) => RequestLogging::Basic,
        _ => RequestLogging::None,
    })
}

/// Initialize the catalog client.
///
/// If `_MOVIELIST_CATALOG_MOCK_DATA` is set, a mock client is seeded
/// from that file and no API key is required.
pub fn init_catalog_client(config: &Config, verbosity: Verbosity) -> Result<Client> {
    if let Ok(path_str) = env::var(MOVIELIST_CATALOG_MOCK_DATA_VAR) {
        let path = Path::new(&path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {path_str}");
        }
        debug!(path = path_str, "using mock catalog client");
        let client = MockClient::from_file(path)
            .with_context(|| format!("failed to load mock data from {path_str}"))?;
        return Ok(Client::Mock(client));
    }

    let client_config = CatalogClientConfig {
        tmdb_url: config.tmdb_url.clone(),
        api_key: config.api_key()?.to_string(),
        request_logging: request_logging(config, verbosity),
        user_agent: Some(format!("movielist/{}", env!("CARGO_PKG_VERSION"))),
    };
    debug!(
        tmdb_url = client_config.tmdb_url,
        request_logging = ?client_config.request_logging,
        "using TMDB catalog client"
    );
    Ok(Client::Catalog(CatalogClient::new(client_config)?))
}
