use std::sync::OnceLock;

use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber or update its filter for `verbosity`.
///
/// Can be called repeatedly, `RUST_LOG` takes precedence over `verbosity`.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,movielist=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,movielist=warn",
        // Show our own info logs, including request logging
        Verbosity::Verbose(1) => "off,movielist=info,movie_catalog=info,movie_paging=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => "off,movielist=debug,movie_catalog=debug,movie_paging=debug",
        Verbosity::Verbose(3) => "off,movielist=trace,movie_catalog=trace,movie_paging=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

pub fn create_registry_and_filter_reload_handle() -> (
    impl tracing_subscriber::layer::SubscriberExt,
    Handle<EnvFilter, Registry>,
) {
    debug!("Initializing logger");
    // Start permissive, the actual filter is set right after by `update_filters`.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(tracing_subscriber::fmt::format())
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_verbosity_yields_a_valid_filter() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Verbose(0),
            Verbosity::Verbose(1),
            Verbosity::Verbose(2),
            Verbosity::Verbose(3),
            Verbosity::Verbose(7),
        ] {
            let filter = log_filter(verbosity);
            assert!(EnvFilter::try_new(filter).is_ok(), "invalid filter: {filter}");
        }
    }

    #[test]
    fn default_shows_warnings_only() {
        assert_eq!(log_filter(Verbosity::default()), "off,movielist=warn");
    }
}
