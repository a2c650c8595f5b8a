//! Screen-refresh engine: single-line horizontal scroll and
//! multi-line wrap rendering, grounded on `refreshSingleLine` /
//! `refreshMultiLine` in `examples/original_source/linenoise.c`.
//! Escape sequences and the append-buffer discipline follow
//! `examples/davazp-rile/src/term.rs`'s `Term`/`AppendBuffer` pattern.

use crate::ansi::visible_width;
use crate::encoding::CharWidth;
use crate::term::AppendBuffer;

/// What to draw: the current prompt, the full buffer, the cursor
/// position within it, and the screen it was last drawn at.
pub struct RenderState<'a> {
    pub prompt: &'a str,
    pub buf: &'a str,
    pub pos: usize,
    pub cols: usize,
}

/// Tracks the cursor's last-rendered grid position across refreshes,
/// needed by the multi-line renderer to know how far to move before
/// redrawing.
#[derive(Default)]
pub struct RefreshState {
    pub old_row_pos: usize,
    pub max_rows: usize,
}

impl RefreshState {
    pub fn reset(&mut self) {
        self.old_row_pos = 0;
        self.max_rows = 0;
    }
}

/// Renders `state` in single-line mode: the line scrolls horizontally
/// so the cursor is always visible, never wrapping to a second row.
pub fn refresh_single_line(out: &mut AppendBuffer, state: &RenderState, width: &dyn CharWidth) {
    let prompt_width = visible_width(state.prompt);
    let buf_bytes = state.buf.as_bytes();
    let cols = state.cols.max(1);

    let cursor_pos = state.pos.min(buf_bytes.len());
    let mut start = 0;
    let col_from = |from: usize| width.column_width(&buf_bytes[from..cursor_pos], cursor_pos - from);
    let mut pos_col = col_from(start);
    while prompt_width + pos_col >= cols && start < cursor_pos {
        start += width.next_char_len(buf_bytes, start).max(1);
        pos_col = col_from(start);
    }

    let mut end = buf_bytes.len();
    while prompt_width + width.column_width(&buf_bytes[start..end], end - start) > cols && end > start {
        end -= width.prev_char_len(buf_bytes, end).max(1);
    }

    let visible = std::str::from_utf8(&buf_bytes[start..end]).unwrap_or("");

    out.push_str("\r");
    out.push_str(state.prompt);
    out.push_str(visible);
    out.csi("0K");
    let cursor_col = prompt_width + pos_col;
    out.push_str("\r");
    if cursor_col > 0 {
        out.csi(&format!("{}C", cursor_col));
    }
}

/// Renders `state` in multi-line mode: the line wraps across rows,
/// and the cursor is repositioned to its logical row/column.
pub fn refresh_multi_line(
    out: &mut AppendBuffer,
    state: &RenderState,
    width: &dyn CharWidth,
    refresh: &mut RefreshState,
) {
    let prompt_width = visible_width(state.prompt);
    let cols = state.cols.max(1);
    let buf_bytes = state.buf.as_bytes();
    let total_width = prompt_width + width.column_width(buf_bytes, buf_bytes.len());
    let mut rows = total_width.div_ceil(cols).max(1);

    let pos_width = prompt_width + width.column_width(buf_bytes, state.pos.min(buf_bytes.len()));
    let cursor_row = (pos_width / cols).max(0);

    if refresh.old_row_pos > 0 {
        out.csi(&format!("{}B", refresh.old_row_pos));
    }
    for _ in 0..refresh.max_rows.saturating_sub(1) {
        out.push_str("\r");
        out.csi("0K");
        out.csi("1A");
    }
    out.push_str("\r");
    out.csi("0K");

    out.push_str(state.prompt);
    out.push_str(state.buf);

    if state.pos == buf_bytes.len() && pos_width % cols == 0 {
        out.push_str("\n\r");
        rows += 1;
    }

    refresh.max_rows = refresh.max_rows.max(rows);

    let rows_to_move_up = rows.saturating_sub(1).saturating_sub(cursor_row);
    if rows_to_move_up > 0 {
        out.csi(&format!("{}A", rows_to_move_up));
    }

    let target_col = pos_width % cols;
    out.push_str("\r");
    if target_col > 0 {
        out.csi(&format!("{}C", target_col));
    }

    refresh.old_row_pos = cursor_row;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ByteWidth;

    #[test]
    fn single_line_fits_without_scrolling() {
        let mut out = AppendBuffer::new();
        let state = RenderState {
            prompt: "> ",
            buf: "hello",
            pos: 5,
            cols: 80,
        };
        refresh_single_line(&mut out, &state, &ByteWidth);
    }

    #[test]
    fn multi_line_tracks_row_growth() {
        let mut out = AppendBuffer::new();
        let mut refresh = RefreshState::default();
        let state = RenderState {
            prompt: "> ",
            buf: &"x".repeat(100),
            pos: 100,
            cols: 40,
        };
        refresh_multi_line(&mut out, &state, &ByteWidth, &mut refresh);
        assert!(refresh.max_rows >= 2);
    }
}
