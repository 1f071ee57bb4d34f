mod browse;
mod search;
mod show;

use std::sync::Arc;

use anyhow::Result;
use bpaf::Bpaf;
use movie_catalog::types::Movie;
use movie_paging::{MoviePageSourceFactory, Pager, PagingConfig};

use crate::config::Config;
use crate::utils::init::init_catalog_client;

const MOVIELIST_DESCRIPTION: &str = "Search The Movie Database and scroll through the results";

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(MOVIELIST_DESCRIPTION))]
pub struct MovielistCli(#[bpaf(external(movielist_args))] pub MovielistArgs);

/// Main movielist args parser
///
/// To parse the movielist CLI, use [`MovielistCli`] instead using [`movielist_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct MovielistArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl MovielistArgs {
    /// Build the pager shared by all commands and run the selected command
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config, self.verbosity)?;
        let factory = MoviePageSourceFactory::new(Arc::new(client), config.search_options());
        let pager: Pager<Movie> = Pager::new(factory, PagingConfig::default());

        match self.command {
            Commands::Search(args) => args.handle(pager).await,
            Commands::Browse(args) => args.handle(pager).await,
        }
    }
}

#[derive(Debug, Bpaf, Clone)]
enum Commands {
    /// Search for movies by title and print the results
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Interactively search and scroll through movies
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> MovielistArgs {
        let MovielistCli(args) = movielist_cli().run_inner(args).unwrap();
        args
    }

    #[test]
    fn verbosity_is_counted() {
        assert_eq!(parse(&["search", "alien"]).verbosity, Verbosity::Verbose(0));
        assert_eq!(
            parse(&["-vv", "search", "alien"]).verbosity,
            Verbosity::Verbose(2)
        );
        assert_eq!(parse(&["-q", "browse"]).verbosity, Verbosity::Quiet);
    }

    #[test]
    fn search_arguments() {
        let Commands::Search(search) = parse(&["search", "--pages", "3", "--show", "2", "alien"])
            .command
        else {
            panic!("expected search command");
        };
        assert_eq!(search.query, "alien");
        assert_eq!(search.pages, 3);
        assert_eq!(search.show, Some(2));
        assert!(!search.json);
    }

    #[test]
    fn browse_takes_an_optional_query() {
        let Commands::Browse(browse) = parse(&["browse"]).command else {
            panic!("expected browse command");
        };
        assert_eq!(browse.query, None);

        let Commands::Browse(browse) = parse(&["browse", "alien"]).command else {
            panic!("expected browse command");
        };
        assert_eq!(browse.query.as_deref(), Some("alien"));
    }
}
