//! Tab-completion candidate set and the common-prefix / grid-layout
//! math, grounded on `linenoiseAddCompletion` and `completeLine` in
//! `examples/original_source/linenoise.c`.

use log::debug;

/// One suggestion offered by the completion callback.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// What's shown to the user in the candidate grid.
    pub suggestion: String,
    /// The full line text to substitute in if this candidate is chosen.
    pub completed_text: String,
    /// Cursor position within `completed_text` after substitution.
    pub caret_pos: usize,
}

/// Accumulates candidates during one invocation of the completion
/// callback.
#[derive(Debug, Default)]
pub struct CompletionSet {
    candidates: Vec<Candidate>,
    max_strlen: usize,
}

impl CompletionSet {
    pub fn new() -> CompletionSet {
        CompletionSet::default()
    }

    pub fn add(&mut self, suggestion: &str, completed_text: &str, caret_pos: usize) {
        self.max_strlen = self.max_strlen.max(suggestion.chars().count());
        self.candidates.push(Candidate {
            suggestion: suggestion.to_string(),
            completed_text: completed_text.to_string(),
            caret_pos,
        });
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn sorted(&self) -> Vec<&Candidate> {
        let mut v: Vec<&Candidate> = self.candidates.iter().collect();
        v.sort_by(|a, b| a.suggestion.cmp(&b.suggestion));
        v
    }

    pub fn get(&self, i: usize) -> Option<&Candidate> {
        self.candidates.get(i)
    }

    /// Longest string that is a prefix of every candidate's suggestion.
    pub fn common_prefix(&self) -> String {
        common_prefix(self.candidates.iter().map(|c| c.suggestion.as_str()))
    }

    /// Lay the candidates out column-major: entry `i` goes at
    /// `(i % rows, i / rows)` so a reader scans top-to-bottom then
    /// left-to-right, matching `completeLine`'s
    /// `real_index = (i % cols) * rows + i / cols` inverse mapping.
    pub fn grid(&self, term_cols: usize) -> Vec<Vec<&str>> {
        if self.candidates.is_empty() || term_cols == 0 {
            return Vec::new();
        }
        let colwidth = self.max_strlen + 2;
        let colcount = (term_cols / colwidth).max(1);
        let n = self.candidates.len();
        let rowcount = n.div_ceil(colcount);

        let mut rows: Vec<Vec<&str>> = vec![Vec::new(); rowcount];
        let sorted = self.sorted();
        for (i, cand) in sorted.iter().enumerate() {
            let col = i / rowcount;
            let row = i % rowcount;
            if col == 0 {
                debug!("completion grid row {} starting", row);
            }
            rows[row].push(&cand.suggestion);
        }
        rows
    }
}

fn common_prefix<'a>(mut items: impl Iterator<Item = &'a str>) -> String {
    let first = match items.next() {
        Some(s) => s,
        None => return String::new(),
    };
    let mut prefix_len = first.chars().count();
    for s in items {
        let shared = first
            .chars()
            .zip(s.chars())
            .take_while(|(a, b)| a == b)
            .count();
        prefix_len = prefix_len.min(shared);
    }
    first.chars().take(prefix_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_prefix_of_three_candidates() {
        let mut set = CompletionSet::new();
        set.add("print", "print", 5);
        set.add("printf", "printf", 6);
        set.add("printk", "printk", 6);
        assert_eq!(set.common_prefix(), "print");
    }

    #[test]
    fn common_prefix_empty_when_no_shared_prefix() {
        let mut set = CompletionSet::new();
        set.add("abc", "abc", 3);
        set.add("xyz", "xyz", 3);
        assert_eq!(set.common_prefix(), "");
    }

    #[test]
    fn single_candidate_is_own_prefix() {
        let mut set = CompletionSet::new();
        set.add("hello", "hello ", 6);
        assert_eq!(set.common_prefix(), "hello");
    }

    #[test]
    fn grid_is_column_major() {
        let mut set = CompletionSet::new();
        for s in ["aa", "bb", "cc", "dd", "ee"] {
            set.add(s, s, s.len());
        }
        let rows = set.grid(80);
        let total: usize = rows.iter().map(|r| r.len()).sum();
        assert_eq!(total, 5);
    }
}
