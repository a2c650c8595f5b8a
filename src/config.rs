//! Tunables for an [`crate::Editor`] session.
//!
//! Mirrors the builder shape common in readline-style crates: a plain
//! data struct with `Default`, plus a `Builder` for chained construction.

use std::time::Duration;

/// TERM values known not to support the escape sequences this crate emits.
pub const UNSUPPORTED_TERMS: &[&str] = &["dumb", "cons25", "emacs"];

#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of entries kept in history. Oldest entries are
    /// dropped once this is exceeded.
    pub history_max_len: usize,
    /// Skip adding a history entry identical to the most recent one.
    pub history_dedup: bool,
    /// How long to wait after a bare ESC before deciding it really is
    /// a lone ESC rather than the start of a CSI/SS2/SS3 sequence.
    pub esc_timeout: Duration,
    /// Wrap long lines across multiple terminal rows instead of
    /// scrolling a single row horizontally.
    pub multiline: bool,
    /// Candidate counts at or above this ask "Display all N
    /// possibilities?" before printing the grid.
    pub completion_confirm_threshold: usize,
    /// Capacity of the decoded-key read-back queue.
    pub read_back_capacity: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            history_max_len: 100,
            history_dedup: true,
            esc_timeout: Duration::from_millis(50),
            multiline: false,
            completion_confirm_threshold: 100,
            read_back_capacity: 32,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Config::default(),
        }
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn history_max_len(mut self, n: usize) -> Self {
        self.config.history_max_len = n;
        self
    }

    pub fn history_dedup(mut self, dedup: bool) -> Self {
        self.config.history_dedup = dedup;
        self
    }

    pub fn esc_timeout(mut self, timeout: Duration) -> Self {
        self.config.esc_timeout = timeout;
        self
    }

    pub fn multiline(mut self, multiline: bool) -> Self {
        self.config.multiline = multiline;
        self
    }

    pub fn completion_confirm_threshold(mut self, n: usize) -> Self {
        self.config.completion_confirm_threshold = n;
        self
    }

    pub fn read_back_capacity(mut self, n: usize) -> Self {
        self.config.read_back_capacity = n;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Returns true if `term` is known to not handle the escape sequences
/// this crate relies on, and callers should fall back to a plain
/// buffered read instead of raw-mode editing.
pub fn is_unsupported_term(term: &str) -> bool {
    UNSUPPORTED_TERMS.iter().any(|&t| t == term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = Config::default();
        assert_eq!(c.history_max_len, 100);
        assert_eq!(c.esc_timeout, Duration::from_millis(50));
        assert_eq!(c.read_back_capacity, 32);
    }

    #[test]
    fn builder_overrides_defaults() {
        let c = Config::builder()
            .history_max_len(10)
            .multiline(true)
            .build();
        assert_eq!(c.history_max_len, 10);
        assert!(c.multiline);
        assert_eq!(c.history_dedup, true);
    }

    #[test]
    fn blacklist_matches_known_bad_terms() {
        assert!(is_unsupported_term("dumb"));
        assert!(is_unsupported_term("cons25"));
        assert!(!is_unsupported_term("xterm-256color"));
    }
}
