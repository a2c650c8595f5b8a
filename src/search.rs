//! Reverse-incremental history search (CTRL_R), grounded on
//! `linenoiseHistoryFindEntry` / `linenoiseHistorySearch` in
//! `examples/original_source/linenoise.c`.

use crate::history::History;

/// State of an in-progress `(reverse-i-search)` session.
pub struct SearchState {
    pub query: String,
    /// History index (0 = newest) of the last entry matched, if any.
    pub current_index: usize,
    pub found: bool,
}

impl SearchState {
    pub fn new() -> SearchState {
        SearchState {
            query: String::new(),
            current_index: 0,
            found: false,
        }
    }

    pub fn prompt(&self) -> String {
        format!("(reverse-i-search`{}'): ", self.query)
    }

    /// Scan from `self.current_index` toward the oldest entry for the
    /// first one containing `self.query` as a substring, matching the
    /// *last* occurrence within that entry. On success updates
    /// `current_index`/`found` and returns `(line, match_end)`.
    pub fn search(&mut self, history: &History) -> Option<(String, usize)> {
        if self.query.is_empty() {
            self.found = false;
            return None;
        }
        for idx in self.current_index..history.len() {
            if let Some(line) = history.get(idx) {
                if let Some(pos) = line.rfind(self.query.as_str()) {
                    self.current_index = idx;
                    self.found = true;
                    return Some((line.to_string(), pos + self.query.len()));
                }
            }
        }
        self.found = false;
        None
    }

    /// CTRL_R while already on a match: advance to the next older
    /// occurrence. Returns `None` (caller should beep) if nothing
    /// further back matches, or if nothing has matched yet.
    pub fn advance(&mut self, history: &History) -> Option<(String, usize)> {
        if !self.found {
            return None;
        }
        self.current_index += 1;
        self.search_from_current(history)
    }

    fn search_from_current(&mut self, history: &History) -> Option<(String, usize)> {
        let start = self.current_index;
        for idx in start..history.len() {
            if let Some(line) = history.get(idx) {
                if let Some(pos) = line.rfind(self.query.as_str()) {
                    self.current_index = idx;
                    self.found = true;
                    return Some((line.to_string(), pos + self.query.len()));
                }
            }
        }
        self.found = false;
        None
    }

    pub fn push_char(&mut self, c: char, history: &History) -> Option<(String, usize)> {
        self.query.push(c);
        self.current_index = 0;
        self.search(history)
    }

    pub fn pop_char(&mut self, history: &History) -> Option<(String, usize)> {
        self.query.pop();
        self.current_index = 0;
        if self.query.is_empty() {
            self.found = false;
            None
        } else {
            self.search(history)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> History {
        let mut h = History::new(100, false);
        for s in ["word", "awake", "none"] {
            h.add(s);
        }
        h
    }

    #[test]
    fn finds_match_in_newest_entries_first() {
        let h = sample_history();
        let mut s = SearchState::new();
        let (line, _) = s.push_char('w', &h).unwrap();
        assert_eq!(line, "awake");
    }

    #[test]
    fn ctrl_r_advances_to_older_match() {
        let h = sample_history();
        let mut s = SearchState::new();
        s.push_char('w', &h).unwrap();
        let (line, _) = s.advance(&h).unwrap();
        assert_eq!(line, "word");
    }

    #[test]
    fn ctrl_r_with_no_further_match_reports_none() {
        let h = sample_history();
        let mut s = SearchState::new();
        s.push_char('w', &h).unwrap();
        s.advance(&h).unwrap();
        assert!(s.advance(&h).is_none());
    }

    #[test]
    fn last_occurrence_within_entry_wins() {
        let mut h = History::new(100, false);
        h.add("ababab");
        let mut s = SearchState::new();
        let (_line, match_end) = s.push_char('a', &h).unwrap();
        s.query.push('b');
        let (line, match_end2) = s.search(&h).unwrap();
        assert_eq!(line, "ababab");
        assert!(match_end2 >= match_end);
        assert_eq!(match_end2, 6);
    }
}
