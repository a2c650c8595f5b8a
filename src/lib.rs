//! lineread is an interactive line-editing core for POSIX terminals:
//! raw-mode input, history, tab completion and incremental search.
//!
//! See [`Editor`] for the main entry point.

pub mod ansi;
pub mod completion;
pub mod config;
pub mod editor;
pub mod encoding;
pub mod error;
pub mod history;
pub mod input;
pub mod key;
pub mod refresh;
pub mod search;
pub mod signals;
pub mod term;

pub use completion::{Candidate, CompletionSet};
pub use config::Config;
pub use editor::{CompletionCallback, Editor};
pub use error::{Error, ReadlineStatus, Result};
pub use history::History;
pub use key::Key;
