use std::fmt::Display;

/// Write a message to stderr.
///
/// This is a wrapper around `eprintln!` that keeps messages
/// separate from results printed to stdout.
fn print_message(v: impl Display) {
    eprintln!("{v}");
}

/// alias for [print_message]
pub(crate) fn plain(v: impl Display) {
    print_message(v);
}
pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("ERROR: {v}"));
}
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("WARNING: {v}"));
}
