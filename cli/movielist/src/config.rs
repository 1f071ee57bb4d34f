use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use indoc::formatdoc;
use movie_catalog::types::DEFAULT_LANGUAGE;
use movie_catalog::{DEFAULT_TMDB_URL, RequestLogging, SearchOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use xdg::BaseDirectories;

/// Name of movielist managed directories
const MOVIELIST_DIR_NAME: &str = "movielist";
const MOVIELIST_CONFIG_DIR_VAR: &str = "MOVIELIST_CONFIG_DIR";
pub const MOVIELIST_CONFIG_FILE: &str = "movielist.toml";
pub const TMDB_API_KEY_VAR: &str = "MOVIELIST_TMDB_API_KEY";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the TMDB v3 API
    pub tmdb_url: String,

    /// Key to authenticate with TMDB
    ///
    /// Required for every search unless mock data is used.
    pub tmdb_api_key: Option<String>,

    /// Language of titles and overviews, e.g. `en-US`
    pub language: String,

    /// Whether adult movies are included in search results
    pub include_adult: bool,

    /// How much to log about requests to TMDB
    ///
    /// Defaults to `basic` with `-v` and `none` otherwise.
    pub request_logging: Option<RequestLogging>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_url: DEFAULT_TMDB_URL.to_string(),
            tmdb_api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            include_adult: false,
            request_logging: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}", formatdoc! {"
        No TMDB API key configured.

        Set {TMDB_API_KEY_VAR} or add 'tmdb_api_key' to {MOVIELIST_CONFIG_FILE}."})]
    MissingApiKey,
}

impl Config {
    fn read_raw_config() -> Result<HierarchicalConfig> {
        let movielist_dirs = BaseDirectories::with_prefix(MOVIELIST_DIR_NAME);

        let mut builder = HierarchicalConfig::builder()
            .set_default("tmdb_url", DEFAULT_TMDB_URL)?
            .set_default("language", DEFAULT_LANGUAGE)?
            .set_default("include_adult", false)?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(
                PathBuf::from("/etc")
                    .join(MOVIELIST_DIR_NAME)
                    .join(MOVIELIST_CONFIG_FILE),
            )
            .format(config::FileFormat::Toml)
            .required(false),
        );

        // look for files in XDG_CONFIG_DIRS locations
        for file in movielist_dirs.find_config_files(MOVIELIST_CONFIG_FILE) {
            debug!(?file, "reading config file");
            builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        // Add explicit MOVIELIST_CONFIG_DIR file last
        if let Ok(config_dir) = env::var(MOVIELIST_CONFIG_DIR_VAR) {
            debug!("`${MOVIELIST_CONFIG_DIR_VAR}` set: {config_dir}");
            builder = builder.add_source(
                config::File::from(PathBuf::from(config_dir).join(MOVIELIST_CONFIG_FILE))
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // override via env variables
        let movielist_envs = env::vars()
            .filter(|(k, _)| k != MOVIELIST_CONFIG_DIR_VAR)
            .filter_map(|(k, v)| k.strip_prefix("MOVIELIST_").map(|k| (k.to_owned(), v)))
            .collect::<HashMap<_, _>>();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(movielist_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let config = Self::read_raw_config()?
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(config)
    }

    /// The configured API key, or an error explaining how to set one.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            include_adult: self.include_adult,
            language: self.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Parse the config with all user locations pointing into `dir`.
    fn parse_in(dir: &Path, vars: &[(&str, Option<&str>)]) -> Result<Config> {
        let dir = dir.to_string_lossy().into_owned();
        let mut all_vars = vec![
            ("HOME", Some(dir.clone())),
            ("XDG_CONFIG_HOME", Some(format!("{dir}/xdg"))),
            ("XDG_CONFIG_DIRS", Some(format!("{dir}/xdg-dirs"))),
            (MOVIELIST_CONFIG_DIR_VAR, Some(dir.clone())),
            (TMDB_API_KEY_VAR, None),
            ("MOVIELIST_LANGUAGE", None),
            ("MOVIELIST_INCLUDE_ADULT", None),
            ("MOVIELIST_TMDB_URL", None),
            ("MOVIELIST_REQUEST_LOGGING", None),
        ];
        for (key, value) in vars {
            all_vars.retain(|(existing, _)| existing != key);
            all_vars.push((*key, value.map(str::to_string)));
        }
        temp_env::with_vars(all_vars, Config::parse)
    }

    #[test]
    fn defaults_without_any_source() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = parse_in(tempdir.path(), &[]).unwrap();

        assert_eq!(config.tmdb_url, DEFAULT_TMDB_URL);
        assert_eq!(config.tmdb_api_key, None);
        assert_eq!(config.search_options(), SearchOptions::default());
        assert_eq!(config.request_logging, None);
    }

    #[test]
    fn config_file_in_config_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(
            tempdir.path().join(MOVIELIST_CONFIG_FILE),
            indoc! {r#"
                tmdb_api_key = "from-file"
                language = "de-DE"
                include_adult = true
                request_logging = "basic"
            "#},
        )
        .unwrap();

        let config = parse_in(tempdir.path(), &[]).unwrap();
        assert_eq!(config.api_key().unwrap(), "from-file");
        assert_eq!(config.search_options(), SearchOptions {
            include_adult: true,
            language: "de-DE".to_string(),
        });
        assert_eq!(config.request_logging, Some(RequestLogging::Basic));
    }

    #[test]
    fn xdg_config_file_is_read() {
        let tempdir = tempfile::tempdir().unwrap();
        let xdg_dir = tempdir.path().join("xdg").join(MOVIELIST_DIR_NAME);
        fs::create_dir_all(&xdg_dir).unwrap();
        fs::write(
            xdg_dir.join(MOVIELIST_CONFIG_FILE),
            "tmdb_url = \"http://localhost:8080/3\"\n",
        )
        .unwrap();

        let config = parse_in(tempdir.path(), &[]).unwrap();
        assert_eq!(config.tmdb_url, "http://localhost:8080/3");
    }

    #[test]
    fn env_overrides_config_file() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(
            tempdir.path().join(MOVIELIST_CONFIG_FILE),
            "tmdb_api_key = \"from-file\"\n",
        )
        .unwrap();

        let config = parse_in(tempdir.path(), &[
            (TMDB_API_KEY_VAR, Some("from-env")),
            ("MOVIELIST_INCLUDE_ADULT", Some("true")),
        ])
        .unwrap();
        assert_eq!(config.api_key().unwrap(), "from-env");
        assert!(config.include_adult);
    }

    #[test]
    fn missing_api_key_names_the_variable() {
        let err = Config::default().api_key().unwrap_err();
        assert!(err.to_string().contains(TMDB_API_KEY_VAR));

        let blank = Config {
            tmdb_api_key: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(blank.api_key().is_err());
    }

    #[test]
    fn invalid_request_logging_is_an_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let result = parse_in(tempdir.path(), &[(
            "MOVIELIST_REQUEST_LOGGING",
            Some("verbose"),
        )]);
        assert!(result.is_err());
    }
}
