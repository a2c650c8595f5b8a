//! Error taxonomy for the editing core.

use thiserror::Error;

/// Everything that can go wrong while reading a line.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("terminal does not support raw-mode line editing: {0}")]
    BadTerminal(String),

    #[error("invalid argument: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a successful call to [`crate::Editor::read_line`].
///
/// EOF and cancellation are not `Error`s: they are ordinary ways for a
/// read to end, and callers are expected to match on them rather than
/// handle them via `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadlineStatus {
    /// The user pressed enter; this is the finished line.
    Text(String),
    /// CTRL_D on an empty line, or the input stream closed.
    Eof,
    /// CTRL_C on an empty line, or an external `cancel()`.
    Cancelled,
}
