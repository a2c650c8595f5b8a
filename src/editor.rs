//! The edit-loop state machine: reads decoded keys, applies edit
//! operations or drives a sub-state (completion, reverse search), and
//! asks the refresh engine to redraw. Grounded on `linenoiseEdit` /
//! `linenoiseRaw` in `examples/original_source/linenoise.c`, with the
//! outer raw-mode bracket following
//! `examples/davazp-rile/src/term.rs`'s `with_raw_mode`.

use std::io::Write;
use std::path::Path;

use log::debug;

use crate::completion::{Candidate, CompletionSet};
use crate::config::Config;
use crate::encoding::{ByteWidth, CharWidth};
use crate::error::{Error, ReadlineStatus, Result};
use crate::history::History;
use crate::input::{DecodedKey, Decoder};
use crate::key::Key;
use crate::refresh::{refresh_multi_line, refresh_single_line, RefreshState, RenderState};
use crate::search::SearchState;
use crate::signals::SignalFlags;
use crate::term::{AppendBuffer, ByteReader};

/// Signature of the user-supplied completion callback: given the
/// current buffer and cursor position, fill `out` with candidates.
pub type CompletionCallback = Box<dyn FnMut(&str, usize, &mut CompletionSet)>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Mode {
    Read,
    Completion,
    HistorySearch,
}

/// One line-editing session: owns the buffer, history, and config,
/// and drives the edit loop against a [`crate::term::ByteReader`] /
/// writer pair.
pub struct Editor<R, W> {
    config: Config,
    history: History,
    width: Box<dyn CharWidth>,
    completion_cb: Option<CompletionCallback>,
    signals: Option<SignalFlags>,
    reader: Decoder<R>,
    writer: W,
    cols: usize,

    buf: String,
    pos: usize,
    prompt: String,
    temp_prompt: Option<String>,
    history_index: usize,
    mode: Mode,
    cancelled: bool,

    refresh: RefreshState,
    search: SearchState,
    completion_pending: Option<PendingCompletion>,
}

/// Sub-state of an in-progress TAB-completion cycle, tracking whether
/// the candidate grid/rotation has been entered yet (see
/// `drive_completion`'s match on `self.completion_pending`, grounded on
/// `completeLine`'s `!wasInitialized || len==1` re-invoke test in
/// `linenoise.c`).
enum PendingCompletion {
    /// First TAB has inserted the common prefix; a second TAB is
    /// needed to display the grid and enter rotation.
    PrefixInserted { set: CompletionSet },
    /// Grid has been shown; each further TAB rewrites the buffer to
    /// the next candidate in `candidates`, wrapping around.
    Rotating {
        candidates: Vec<Candidate>,
        next_index: usize,
    },
}

enum ConfirmOutcome {
    Show,
    Skip,
    Abort,
}

impl<R: ByteReader, W: Write> Editor<R, W> {
    pub fn new(reader: R, writer: W, cols: usize, config: Config) -> Editor<R, W> {
        let history = History::new(config.history_max_len, config.history_dedup);
        let reader = Decoder::new(reader, config.esc_timeout, config.read_back_capacity);
        Editor {
            config,
            history,
            width: Box::new(ByteWidth),
            completion_cb: None,
            signals: None,
            reader,
            writer,
            cols,
            buf: String::new(),
            pos: 0,
            prompt: String::new(),
            temp_prompt: None,
            history_index: 0,
            mode: Mode::Read,
            cancelled: false,
            refresh: RefreshState::default(),
            search: SearchState::new(),
            completion_pending: None,
        }
    }

    pub fn set_char_width(&mut self, width: Box<dyn CharWidth>) {
        self.width = width;
    }

    pub fn set_completion_callback(&mut self, cb: CompletionCallback) {
        self.completion_cb = Some(cb);
    }

    pub fn set_signals(&mut self, signals: SignalFlags) {
        self.signals = Some(signals);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn history_save(&self, path: &Path) -> Result<()> {
        self.history.save(path)
    }

    pub fn history_load(&mut self, path: &Path) -> Result<()> {
        self.history.load(path)
    }

    pub fn update_size(&mut self, cols: usize) {
        self.cols = cols;
        self.refresh.reset();
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Runs one full line edit to completion: prints `prompt`, reads
    /// and applies keys until ENTER/EOF/cancel, and returns the result.
    pub fn read_line(&mut self, prompt: &str) -> Result<ReadlineStatus> {
        self.buf.clear();
        self.pos = 0;
        self.prompt = prompt.to_string();
        self.temp_prompt = None;
        self.history_index = 0;
        self.mode = Mode::Read;
        self.cancelled = false;
        self.refresh.reset();
        self.history.add("");

        self.render()?;

        loop {
            if let Some(signals) = &self.signals {
                if signals.take_interrupted() {
                    self.cancel();
                }
                if signals.take_resized() {
                    // Caller is expected to call `update_size` with a
                    // freshly queried column count; here we only note
                    // that a redraw is owed.
                    self.render()?;
                }
            }
            if self.cancelled {
                self.history.remove_newest();
                return Ok(ReadlineStatus::Cancelled);
            }

            let key = match self.reader.next_key()? {
                DecodedKey::Key(k) => k,
                DecodedKey::Eof => {
                    self.history.remove_newest();
                    return Ok(ReadlineStatus::Eof);
                }
            };

            match self.mode {
                Mode::Read => {
                    if let Some(status) = self.handle_read_key(key)? {
                        return Ok(status);
                    }
                }
                Mode::Completion => self.handle_completion_key(key)?,
                Mode::HistorySearch => self.handle_search_key(key)?,
            }
        }
    }

    fn handle_read_key(&mut self, key: Key) -> Result<Option<ReadlineStatus>> {
        match key {
            Key::Enter => {
                self.history.remove_newest();
                self.history.add(&self.buf);
                return Ok(Some(ReadlineStatus::Text(self.buf.clone())));
            }
            Key::CtrlC => {
                if self.buf.is_empty() {
                    return Ok(Some(ReadlineStatus::Cancelled));
                }
                self.writer.write_all(b"^C\r\n")?;
                self.buf.clear();
                self.pos = 0;
                self.refresh.reset();
                self.render()?;
            }
            Key::CtrlD => {
                if self.buf.is_empty() {
                    return Ok(Some(ReadlineStatus::Eof));
                }
                self.delete();
                self.render()?;
            }
            Key::Tab if self.completion_cb.is_some() => {
                self.reader.push_front(Key::Tab);
                self.mode = Mode::Completion;
            }
            Key::CtrlR => {
                self.reader.push_front(Key::CtrlR);
                self.mode = Mode::HistorySearch;
                self.search = SearchState::new();
                self.temp_prompt = Some(self.search.prompt());
                self.render()?;
            }
            Key::Left => {
                self.move_left();
                self.render()?;
            }
            Key::Right => {
                self.move_right();
                self.render()?;
            }
            Key::Up => {
                self.history_prev();
                self.render()?;
            }
            Key::Down => {
                self.history_next();
                self.render()?;
            }
            Key::CtrlP => {
                self.history_prev();
                self.render()?;
            }
            Key::CtrlN => {
                self.history_next();
                self.render()?;
            }
            Key::Home => {
                self.pos = 0;
                self.render()?;
            }
            Key::End => {
                self.pos = self.buf.len();
                self.render()?;
            }
            Key::CtrlA => {
                self.pos = 0;
                self.render()?;
            }
            Key::CtrlE => {
                self.pos = self.buf.len();
                self.render()?;
            }
            Key::CtrlB => {
                self.move_left();
                self.render()?;
            }
            Key::CtrlF => {
                self.move_right();
                self.render()?;
            }
            Key::Backspace => {
                self.backspace();
                self.render()?;
            }
            Key::Delete => {
                self.delete();
                self.render()?;
            }
            Key::CtrlU => {
                self.buf.clear();
                self.pos = 0;
                self.render()?;
            }
            Key::CtrlK => {
                self.buf.truncate(self.pos);
                self.render()?;
            }
            Key::CtrlW => {
                self.delete_prev_word();
                self.render()?;
            }
            Key::CtrlT => {
                self.transpose();
                self.render()?;
            }
            Key::CtrlL => {
                self.writer.write_all(b"\x1b[H\x1b[2J")?;
                self.refresh.reset();
                self.render()?;
            }
            Key::Char(c) => {
                self.insert(c);
                self.render()?;
            }
            Key::Esc | Key::Unknown(_) => {
                debug!("ignoring key {:?} in READ state", key);
            }
        }
        Ok(None)
    }

    fn handle_completion_key(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Tab => self.drive_completion()?,
            other => {
                self.completion_pending = None;
                self.mode = Mode::Read;
                self.reader.push_front(other);
            }
        }
        Ok(())
    }

    fn drive_completion(&mut self) -> Result<()> {
        match self.completion_pending.take() {
            Some(PendingCompletion::Rotating {
                candidates,
                next_index,
            }) => {
                self.buf = candidates[next_index].completed_text.clone();
                self.pos = self.buf.len();
                let advanced = (next_index + 1) % candidates.len();
                self.completion_pending = Some(PendingCompletion::Rotating {
                    candidates,
                    next_index: advanced,
                });
                self.render()
            }
            Some(PendingCompletion::PrefixInserted { set }) => {
                if set.len() >= self.config.completion_confirm_threshold {
                    match self.confirm_display_all(set.len())? {
                        ConfirmOutcome::Abort => {
                            self.mode = Mode::Read;
                            return self.render();
                        }
                        ConfirmOutcome::Show => self.write_grid(&set)?,
                        ConfirmOutcome::Skip => {}
                    }
                } else {
                    self.write_grid(&set)?;
                }

                let candidates: Vec<Candidate> = set.sorted().into_iter().cloned().collect();
                self.completion_pending = Some(PendingCompletion::Rotating {
                    candidates,
                    next_index: 0,
                });
                self.render()
            }
            None => self.start_completion(),
        }
    }

    /// First TAB of a cycle: invokes the completion callback and
    /// either substitutes the single candidate, inserts the common
    /// prefix of several, or beeps on none.
    fn start_completion(&mut self) -> Result<()> {
        let mut set = CompletionSet::new();
        if let Some(cb) = &mut self.completion_cb {
            cb(&self.buf, self.pos, &mut set);
        }

        if set.is_empty() {
            self.writer.write_all(b"\x07")?;
            self.mode = Mode::Read;
            return Ok(());
        }

        if set.len() == 1 {
            let cand = set.get(0).unwrap().clone();
            self.buf = cand.completed_text.clone();
            self.pos = cand.caret_pos.min(self.buf.len());
            if !cand.completed_text.ends_with('/') && !cand.completed_text.ends_with(' ') {
                self.buf.push(' ');
                self.pos += 1;
            }
            self.mode = Mode::Read;
            return self.render();
        }

        let prefix = set.common_prefix();
        let suffix_start = longest_matching_suffix_len(&self.buf[..self.pos], &prefix);
        let insertion = &prefix[suffix_start..];
        self.buf.insert_str(self.pos, insertion);
        self.pos += insertion.len();

        self.completion_pending = Some(PendingCompletion::PrefixInserted { set });
        self.render()
    }

    /// Reads and branches on the `Display all N possibilities?` reply:
    /// `y`/`Y` shows the grid, `n`/`N` skips it, CTRL_C aborts the
    /// whole completion cycle, anything else beeps and reprompts.
    fn confirm_display_all(&mut self, count: usize) -> Result<ConfirmOutcome> {
        self.writer
            .write_all(format!("\r\nDisplay all {} possibilities? (y or n)", count).as_bytes())?;
        self.writer.flush()?;
        self.refresh.reset();
        loop {
            let key = match self.reader.next_key()? {
                DecodedKey::Key(k) => k,
                DecodedKey::Eof => return Ok(ConfirmOutcome::Abort),
            };
            match key {
                Key::Char('y') | Key::Char('Y') => return Ok(ConfirmOutcome::Show),
                Key::Char('n') | Key::Char('N') => return Ok(ConfirmOutcome::Skip),
                Key::CtrlC => return Ok(ConfirmOutcome::Abort),
                _ => self.writer.write_all(b"\x07")?,
            }
        }
    }

    /// Writes the column-major candidate grid to the terminal as one
    /// buffered write, following `linenoise.c`'s `completeLine` grid
    /// layout and `term::AppendBuffer`'s accumulate-then-flush style.
    fn write_grid(&mut self, set: &CompletionSet) -> Result<()> {
        let rows = set.grid(self.cols);
        let mut out = AppendBuffer::new();
        out.push_str("\r\n");
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                out.push_str("\r\n");
            }
            out.push_str(&row.join("  "));
        }
        out.push_str("\r\n");
        out.flush_to(&mut self.writer)?;
        self.refresh.reset();
        Ok(())
    }

    fn handle_search_key(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Char(c) => {
                if let Some((line, end)) = self.search.push_char(c, &self.history) {
                    self.buf = line;
                    self.pos = end;
                } else {
                    self.writer.write_all(b"\x07")?;
                }
                self.temp_prompt = Some(self.search.prompt());
                self.render()?;
            }
            Key::Backspace => {
                if let Some((line, end)) = self.search.pop_char(&self.history) {
                    self.buf = line;
                    self.pos = end;
                }
                self.temp_prompt = Some(self.search.prompt());
                self.render()?;
            }
            Key::CtrlR => {
                if let Some((line, end)) = self.search.advance(&self.history) {
                    self.buf = line;
                    self.pos = end;
                    self.temp_prompt = Some(self.search.prompt());
                    self.render()?;
                } else {
                    self.writer.write_all(b"\x07")?;
                }
            }
            Key::CtrlC => {
                self.mode = Mode::Read;
                self.temp_prompt = None;
                self.cancel();
            }
            other => {
                self.mode = Mode::Read;
                self.temp_prompt = None;
                self.reader.push_front(other);
                self.render()?;
            }
        }
        Ok(())
    }

    fn move_left(&mut self) {
        if self.pos > 0 {
            self.pos -= self.width.prev_char_len(self.buf.as_bytes(), self.pos).max(1);
        }
    }

    fn move_right(&mut self) {
        if self.pos < self.buf.len() {
            self.pos += self.width.next_char_len(self.buf.as_bytes(), self.pos).max(1);
        }
    }

    fn insert(&mut self, c: char) {
        self.buf.insert(self.pos, c);
        self.pos += c.len_utf8();
    }

    fn backspace(&mut self) {
        if self.pos > 0 {
            let len = self.width.prev_char_len(self.buf.as_bytes(), self.pos).max(1);
            let start = self.pos - len;
            self.buf.replace_range(start..self.pos, "");
            self.pos = start;
        }
    }

    fn delete(&mut self) {
        if self.pos < self.buf.len() {
            let len = self.width.next_char_len(self.buf.as_bytes(), self.pos).max(1);
            self.buf.replace_range(self.pos..self.pos + len, "");
        }
    }

    fn delete_prev_word(&mut self) {
        let mut end = self.pos;
        let bytes = self.buf.as_bytes();
        while end > 0 && bytes[end - 1] == b' ' {
            end -= 1;
        }
        let mut start = end;
        while start > 0 && bytes[start - 1] != b' ' {
            start -= 1;
        }
        self.buf.replace_range(start..self.pos, "");
        self.pos = start;
    }

    fn transpose(&mut self) {
        if self.pos == 0 || self.pos >= self.buf.len() {
            return;
        }
        let mut bytes: Vec<u8> = self.buf.bytes().collect();
        bytes.swap(self.pos - 1, self.pos);
        self.buf = String::from_utf8(bytes).unwrap_or_else(|_| self.buf.clone());
        if self.pos < self.buf.len() {
            self.pos += 1;
        }
    }

    fn history_prev(&mut self) {
        self.write_back_current();
        if self.history_index + 1 < self.history.len() {
            self.history_index += 1;
            self.load_history_entry();
        }
    }

    fn history_next(&mut self) {
        self.write_back_current();
        if self.history_index > 0 {
            self.history_index -= 1;
            self.load_history_entry();
        }
    }

    fn write_back_current(&mut self) {
        self.history.replace(self.history_index, &self.buf);
    }

    fn load_history_entry(&mut self) {
        if let Some(line) = self.history.get(self.history_index) {
            self.buf = line.to_string();
            self.pos = self.buf.len();
        }
    }

    fn render(&mut self) -> Result<()> {
        let mut out = AppendBuffer::new();
        let prompt = self.temp_prompt.clone().unwrap_or_else(|| self.prompt.clone());
        let state = RenderState {
            prompt: &prompt,
            buf: &self.buf,
            pos: self.pos,
            cols: self.cols,
        };
        if self.config.multiline {
            refresh_multi_line(&mut out, &state, self.width.as_ref(), &mut self.refresh);
        } else {
            refresh_single_line(&mut out, &state, self.width.as_ref());
        }
        out.flush_to(&mut self.writer)?;
        Ok(())
    }
}

fn longest_matching_suffix_len(text: &str, prefix: &str) -> usize {
    let text_bytes = text.as_bytes();
    let prefix_bytes = prefix.as_bytes();
    let max = text_bytes.len().min(prefix_bytes.len());
    for len in (0..=max).rev() {
        if text_bytes[text_bytes.len() - len..] == prefix_bytes[..len] {
            return len;
        }
    }
    0
}

/// Converts a fatal raw-mode setup failure from a known-bad TERM into
/// the taxonomy's `BadTerminal` variant.
pub fn check_term_supported(term: &str) -> Result<()> {
    if crate::config::is_unsupported_term(term) {
        return Err(Error::BadTerminal(term.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_support::{Event, ScriptedReader};

    fn editor_for(events: Vec<Event>) -> Editor<ScriptedReader, Vec<u8>> {
        Editor::new(ScriptedReader::new(events), Vec::new(), 80, Config::default())
    }

    #[test]
    fn simple_line_returns_text() {
        let mut ed = editor_for(vec![
            Event::Byte(b'h'),
            Event::Byte(b'i'),
            Event::Byte(13),
        ]);
        let status = ed.read_line("> ").unwrap();
        assert_eq!(status, ReadlineStatus::Text("hi".to_string()));
    }

    #[test]
    fn left_arrow_then_insert_splices_middle() {
        let mut ed = editor_for(vec![
            Event::Byte(b'a'),
            Event::Byte(b'b'),
            Event::Byte(b'c'),
            Event::Byte(0x1b),
            Event::Byte(b'['),
            Event::Byte(b'D'),
            Event::Byte(0x1b),
            Event::Byte(b'['),
            Event::Byte(b'D'),
            Event::Byte(b'x'),
            Event::Byte(13),
        ]);
        let status = ed.read_line("> ").unwrap();
        assert_eq!(status, ReadlineStatus::Text("axbc".to_string()));
    }

    #[test]
    fn ctrl_c_on_empty_buffer_cancels() {
        let mut ed = editor_for(vec![Event::Byte(3)]);
        let status = ed.read_line("> ").unwrap();
        assert_eq!(status, ReadlineStatus::Cancelled);
    }

    #[test]
    fn ctrl_d_on_empty_buffer_returns_eof() {
        let mut ed = editor_for(vec![Event::Byte(4)]);
        let status = ed.read_line("> ").unwrap();
        assert_eq!(status, ReadlineStatus::Eof);
    }

    #[test]
    fn tab_completion_common_prefix_then_grid_then_rotation() {
        let mut ed = editor_for(vec![
            Event::Byte(b'p'),
            Event::Byte(b'r'),
            Event::Byte(9),  // TAB 1: insert common prefix "print"
            Event::Byte(9),  // TAB 2: show grid, buffer unchanged
            Event::Byte(9),  // TAB 3: rotate to candidate 0 ("print")
            Event::Byte(9),  // TAB 4: rotate to candidate 1 ("printf")
            Event::Byte(9),  // TAB 5: rotate to candidate 2 ("printk")
            Event::Byte(9),  // TAB 6: wrap back to candidate 0 ("print")
            Event::Byte(13),
        ]);
        ed.set_completion_callback(Box::new(|buf, _pos, out| {
            for word in ["print", "printf", "printk"] {
                if word.starts_with(buf) {
                    out.add(word, word, word.len());
                }
            }
        }));
        let status = ed.read_line("> ").unwrap();
        assert_eq!(status, ReadlineStatus::Text("print".to_string()));
    }

    #[test]
    fn history_up_navigates_to_newest_entry() {
        let mut ed = editor_for(vec![Event::Byte(0x1b), Event::Byte(b'['), Event::Byte(b'A'), Event::Byte(13)]);
        ed.history_mut().add("one");
        ed.history_mut().add("two");
        let status = ed.read_line("> ").unwrap();
        assert_eq!(status, ReadlineStatus::Text("two".to_string()));
    }
}
