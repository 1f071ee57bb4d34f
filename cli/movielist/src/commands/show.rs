//! Rendering of movies for the terminal.

use std::fmt::{self, Display};

use movie_catalog::types::Movie;

/// Upper bound for the width of wrapped text.
const MAX_WIDTH: usize = 100;

/// The width to wrap text at on the current terminal.
pub(crate) fn text_width() -> usize {
    textwrap::termwidth().min(MAX_WIDTH)
}

/// Numbered list of movies, one per line.
pub(crate) struct DisplayMovies<'a> {
    movies: &'a [Movie],
    /// Index of the first movie within all results.
    offset: usize,
}

impl<'a> DisplayMovies<'a> {
    pub(crate) fn new(movies: &'a [Movie], offset: usize) -> Self {
        Self { movies, offset }
    }
}

impl Display for DisplayMovies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number_width = (self.offset + self.movies.len()).to_string().len();
        for (index, movie) in self.movies.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{number:>number_width$}. {title}  ★ {rating}",
                number = self.offset + index + 1,
                title = movie.title,
                rating = movie.rating_label(),
            )?;
        }
        Ok(())
    }
}

/// Everything known about a single movie.
pub(crate) struct DisplayMovieDetails<'a> {
    movie: &'a Movie,
    width: usize,
}

impl<'a> DisplayMovieDetails<'a> {
    pub(crate) fn new(movie: &'a Movie, width: usize) -> Self {
        Self { movie, width }
    }
}

impl Display for DisplayMovieDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let movie = self.movie;
        writeln!(f, "{}", movie.title)?;
        writeln!(f, "Rating: ★ {}", movie.rating_label())?;
        match &movie.poster_url {
            Some(url) => writeln!(f, "Poster: {url}")?,
            None => writeln!(f, "Poster: no poster")?,
        }
        writeln!(f)?;
        if movie.overview.trim().is_empty() {
            write!(f, "No overview available.")
        } else {
            let options = textwrap::Options::new(self.width)
                .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
            write!(f, "{}", textwrap::fill(&movie.overview, options))
        }
    }
}
