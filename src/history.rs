//! Bounded history ring, grounded on `linenoiseHistoryAdd` /
//! `linenoiseHistorySave` / `linenoiseHistoryLoad` in
//! `examples/original_source/linenoise.c`.

use std::fs;
use std::path::Path;

use log::warn;

use crate::error::Result;

/// A FIFO of previously accepted lines, newest last, capped at
/// `max_len` entries.
pub struct History {
    entries: Vec<String>,
    max_len: usize,
    dedup: bool,
}

impl History {
    pub fn new(max_len: usize, dedup: bool) -> History {
        History {
            entries: Vec::new(),
            max_len,
            dedup,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `line`, evicting the oldest entry if at capacity.
    /// Returns `false` (and does nothing) if `dedup` is on and `line`
    /// equals the most recently added entry, or if `line` is empty.
    pub fn add(&mut self, line: &str) -> bool {
        if line.is_empty() {
            return false;
        }
        if self.dedup {
            if let Some(last) = self.entries.last() {
                if last == line {
                    return false;
                }
            }
        }
        if self.max_len == 0 {
            return false;
        }
        if self.entries.len() >= self.max_len {
            self.entries.remove(0);
        }
        self.entries.push(line.to_string());
        true
    }

    /// Removes and returns the newest entry, used to discard the
    /// in-progress sentinel pushed at the start of an edit.
    pub fn remove_newest(&mut self) -> Option<String> {
        self.entries.pop()
    }

    pub fn set_max_len(&mut self, n: usize) {
        self.max_len = n;
        while self.entries.len() > self.max_len {
            self.entries.remove(0);
        }
    }

    /// `index` counts back from the newest entry: 0 is newest.
    pub fn get(&self, index: usize) -> Option<&str> {
        if index >= self.entries.len() {
            return None;
        }
        let real = self.entries.len() - 1 - index;
        self.entries.get(real).map(String::as_str)
    }

    /// Overwrites the entry at `index` (0 = newest) with `line`, used
    /// to keep the in-progress sentinel in sync while navigating.
    pub fn replace(&mut self, index: usize, line: &str) {
        if index < self.entries.len() {
            let real = self.entries.len() - 1 - index;
            self.entries[real] = line.to_string();
        }
    }

    pub fn iter_from_newest(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.entries.join("\n");
        fs::write(path, contents).map_err(|e| {
            warn!("failed to save history to {}: {}", path.display(), e);
            e.into()
        })
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                warn!("failed to load history from {}: {}", path.display(), e);
                return Err(e.into());
            }
        };
        self.entries = contents
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if self.entries.len() > self.max_len {
            let drop = self.entries.len() - self.max_len;
            self.entries.drain(0..drop);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_navigate_newest_first() {
        let mut h = History::new(100, true);
        h.add("one");
        h.add("two");
        h.add("three");
        assert_eq!(h.get(0), Some("three"));
        assert_eq!(h.get(1), Some("two"));
        assert_eq!(h.get(2), Some("one"));
        assert_eq!(h.get(3), None);
    }

    #[test]
    fn dedup_skips_repeat_of_last() {
        let mut h = History::new(100, true);
        h.add("same");
        assert!(!h.add("same"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = History::new(2, false);
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(1), Some("b"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut h = History::new(100, false);
        h.add("alpha");
        h.add("beta");
        let path = std::env::temp_dir().join("lineread-history-test.txt");
        h.save(&path).unwrap();

        let mut h2 = History::new(100, false);
        h2.load(&path).unwrap();
        assert_eq!(h2.get(0), Some("beta"));
        assert_eq!(h2.get(1), Some("alpha"));
        let _ = std::fs::remove_file(&path);
    }
}
