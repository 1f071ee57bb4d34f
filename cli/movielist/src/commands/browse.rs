use std::fmt::Write;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use movie_catalog::types::Movie;
use movie_paging::{LoadState, Pager, PagingSnapshot};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use super::show::{DisplayMovieDetails, DisplayMovies, text_width};
use crate::utils::errors::format_load_error;
use crate::utils::message;

const BROWSE_HELP: &str = indoc! {"
    Type a title to search, or one of:
      :more       load more results
      :retry      retry the failed load
      :refresh    reload the results around the last viewed movie
      :list       print all loaded movies again
      :show <n>   show details of the n-th movie
      :help       print this help
      :quit       exit"};

// Interactively search and scroll through movies
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Title to start with
    #[bpaf(positional("query"))]
    pub query: Option<String>,
}

/// A line entered while browsing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Query(String),
    More,
    Retry,
    Refresh,
    List,
    /// Zero based index of the movie to show.
    Show(usize),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum InputError {
    #[error("unknown command ':{0}', type ':help' for a list of commands")]
    UnknownCommand(String),
    #[error("':show' expects the number of a movie, e.g. ':show 3'")]
    InvalidIndex,
}

impl Input {
    fn parse(line: &str) -> Result<Input, InputError> {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Ok(Input::Query(line.to_string()));
        };

        let (command, argument) = match command.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, Some(argument.trim())),
            None => (command, None),
        };
        let input = match (command, argument) {
            ("more", None) => Input::More,
            ("retry", None) => Input::Retry,
            ("refresh", None) => Input::Refresh,
            ("list", None) => Input::List,
            ("help", None) => Input::Help,
            ("quit" | "q", None) => Input::Quit,
            ("show", Some(number)) => match number.parse::<usize>() {
                Ok(number) if number > 0 => Input::Show(number - 1),
                _ => return Err(InputError::InvalidIndex),
            },
            ("show", None) => return Err(InputError::InvalidIndex),
            (command, _) => return Err(InputError::UnknownCommand(command.to_string())),
        };
        Ok(input)
    }
}

/// Tracks what was printed so far to print only what changed.
#[derive(Debug, Default)]
struct BrowseView {
    generation: u64,
    /// Id of the first printed movie of the current generation.
    head: Option<i64>,
    /// Number of movies of the current generation that were printed.
    printed: usize,
    status: String,
}

/// Output for a new snapshot.
#[derive(Debug, Default, PartialEq, Eq)]
struct ViewUpdate {
    /// Newly loaded movies.
    movies: Option<String>,
    /// Changed status line.
    status: Option<String>,
}

impl BrowseView {
    fn update(&mut self, snapshot: &PagingSnapshot<Movie>) -> ViewUpdate {
        let mut update = ViewUpdate::default();

        if snapshot.generation != self.generation {
            self.generation = snapshot.generation;
            self.head = None;
            self.printed = 0;
        }

        // During a refresh the items of the previous generation are still shown.
        if !snapshot.load_states.refresh.is_loading() {
            update.movies = self.new_movies(&snapshot.items);
        }

        let status = status_line(snapshot);
        if status != self.status {
            self.status = status.clone();
            update.status = Some(status);
        }
        update
    }

    /// Movies loaded before or after the printed ones, numbered by their position.
    ///
    /// Within a generation loads only add pages at either end,
    /// so the printed movies stay one contiguous run.
    fn new_movies(&mut self, items: &[Movie]) -> Option<String> {
        let start = match self.head {
            None => 0,
            Some(head) => match items.iter().position(|movie| movie.id == head) {
                Some(start) => start,
                None => {
                    self.printed = 0;
                    0
                },
            },
        };
        let end = (start + self.printed).min(items.len());

        let mut movies = Vec::new();
        if start > 0 {
            movies.push(DisplayMovies::new(&items[..start], 0).to_string());
        }
        if items.len() > end {
            movies.push(DisplayMovies::new(&items[end..], end).to_string());
        }

        self.head = items.first().map(|movie| movie.id);
        self.printed = items.len();
        (!movies.is_empty()).then(|| movies.join("\n"))
    }
}

fn status_line(snapshot: &PagingSnapshot<Movie>) -> String {
    if snapshot.is_idle() {
        return "Type a title to search".to_string();
    }
    let query = &snapshot.query;
    let states = &snapshot.load_states;

    match &states.refresh {
        LoadState::Loading if snapshot.items.is_empty() => {
            return format!("Searching for '{query}'…");
        },
        LoadState::Loading => return format!("Refreshing '{query}'…"),
        LoadState::Error(error) => {
            return format!(
                "Search for '{query}' failed: {}\nType ':retry' to try again",
                format_load_error(error)
            );
        },
        LoadState::NotLoading { .. } => {},
    }
    if snapshot.is_no_results() {
        return format!("No movies found for '{query}'");
    }

    let mut status = match snapshot.items.len() {
        1 => format!("1 movie for '{query}'"),
        n => format!("{n} movies for '{query}'"),
    };
    match &states.append {
        LoadState::Loading => status.push_str(", loading more…"),
        LoadState::Error(error) => {
            let _ = write!(
                status,
                ", loading more failed: {}\nType ':retry' to try again",
                format_load_error(error)
            );
        },
        LoadState::NotLoading {
            end_of_pagination: true,
        } => status.push_str(", end of results"),
        LoadState::NotLoading { .. } => status.push_str(", type ':more' for more"),
    }
    status
}

impl Browse {
    #[instrument(name = "browse", skip_all)]
    pub async fn handle(self, pager: Pager<Movie>) -> Result<()> {
        message::plain(BROWSE_HELP);

        let mut subscription = pager.subscribe();
        let mut view = BrowseView::default();
        if let Some(query) = self.query {
            pager.set_query(query);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("could not read input")? else {
                        debug!("end of input");
                        break;
                    };
                    match Input::parse(&line) {
                        Ok(Input::Quit) => break,
                        Ok(input) => handle_input(&pager, input),
                        Err(err) => message::error(err),
                    }
                },
                snapshot = subscription.changed() => {
                    let Some(snapshot) = snapshot else { break };
                    print_update(view.update(&snapshot));
                },
            }
        }

        pager.close();
        Ok(())
    }
}

fn handle_input(pager: &Pager<Movie>, input: Input) {
    match input {
        Input::Query(query) => pager.set_query(query),
        Input::More => pager.prefetch(),
        Input::Retry => pager.retry(),
        Input::Refresh => pager.refresh(),
        Input::Help => message::plain(BROWSE_HELP),
        Input::List => {
            let snapshot = pager.snapshot();
            if snapshot.items.is_empty() {
                message::plain(status_line(&snapshot));
            } else {
                println!("{}", DisplayMovies::new(&snapshot.items, 0));
            }
        },
        Input::Show(index) => {
            let snapshot = pager.snapshot();
            match snapshot.items.get(index) {
                Some(movie) => {
                    println!("{}", DisplayMovieDetails::new(movie, text_width()));
                    // Viewing a movie counts as scrolling to it.
                    pager.access_item(index);
                },
                None => message::error(format!(
                    "there is no movie {}, {} movies are loaded",
                    index + 1,
                    snapshot.items.len()
                )),
            }
        },
        Input::Quit => {},
    }
}

fn print_update(update: ViewUpdate) {
    if let Some(movies) = update.movies {
        println!("{movies}");
    }
    if let Some(status) = update.status {
        message::plain(status);
    }
}
