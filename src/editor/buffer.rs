use ropey::Rope;

use crate::sync::EditSignal;

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column, in chars.
    pub col: usize,
    /// Column to return to when moving vertically through shorter lines.
    goal_col: usize,
}

impl Cursor {
    pub const fn new() -> Self {
        Self::at(0, 0)
    }

    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            goal_col: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.goal_col = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A text buffer backed by a rope.
///
/// `revision` increases by one on every change to the text, including
/// [`set_text`](Self::set_text). Cursor-only moves leave it alone.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
    dirty: bool,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::new(),
            revision: 0,
            dirty: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the text changed since creation or the last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line ending.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Length of a line in chars, without its line ending.
    pub fn line_len(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(line_idx);
        let mut len = line.len_chars();
        while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        len
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Snapshot the current text as an edit signal for the preview.
    pub fn edit_signal(&self) -> EditSignal {
        EditSignal::new(self.revision, self.text())
    }

    /// Replace the whole text, e.g. after reloading from disk.
    ///
    /// The cursor is clamped into the new text and the buffer is clean.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        let col = self.cursor.col.min(self.line_len(line));
        self.cursor = Cursor::at(line, col);
        self.revision += 1;
        self.dirty = false;
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        } else {
            self.cursor.set_col(self.cursor.col + 1);
        }
        self.touch();
    }

    /// Insert `s` at the cursor and move the cursor past it.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, s);
        let end = idx + s.chars().count();
        self.cursor = self.cursor_for_char_idx(end);
        self.touch();
    }

    /// Break the line at the cursor (Enter).
    pub fn split_line(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the char before the cursor (Backspace).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_back(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx == 0 {
            return false;
        }
        let start = if idx >= 2 && self.rope.slice(idx - 2..idx) == "\r\n" {
            idx - 2
        } else {
            idx - 1
        };
        self.rope.remove(start..idx);
        self.cursor = self.cursor_for_char_idx(start);
        self.touch();
        true
    }

    /// Delete the char under the cursor (Delete).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        let total = self.rope.len_chars();
        if idx >= total {
            return false;
        }
        let end = if idx + 2 <= total && self.rope.slice(idx..idx + 2) == "\r\n" {
            idx + 2
        } else {
            idx + 1
        };
        self.rope.remove(idx..end);
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_vertical(-1),
            Direction::Down => self.move_vertical(1),
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    pub fn move_end(&mut self) {
        self.cursor.set_col(self.line_len(self.cursor.line));
    }

    /// Jump to the start of the previous word (Ctrl+Left).
    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.move_end();
            }
            return;
        }
        let chars: Vec<char> = self.line_chars(self.cursor.line);
        let mut col = self.cursor.col.min(chars.len());
        while col > 0 && !is_word_char(chars[col - 1]) {
            col -= 1;
        }
        while col > 0 && is_word_char(chars[col - 1]) {
            col -= 1;
        }
        self.cursor.set_col(col);
    }

    /// Jump past the current word and following separators (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let chars: Vec<char> = self.line_chars(self.cursor.line);
        if self.cursor.col >= chars.len() {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }
        let mut col = self.cursor.col;
        while col < chars.len() && is_word_char(chars[col]) {
            col += 1;
        }
        while col < chars.len() && !is_word_char(chars[col]) {
            col += 1;
        }
        self.cursor.set_col(col);
    }

    /// Place the cursor, clamped into the text.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        self.cursor.set_col(col.min(self.line_len(self.cursor.line)));
    }

    pub const fn move_to_start(&mut self) {
        self.cursor = Cursor::new();
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor.line = last;
        self.move_end();
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }

    fn line_chars(&self, line_idx: usize) -> Vec<char> {
        if line_idx >= self.rope.len_lines() {
            return Vec::new();
        }
        self.rope
            .line(line_idx)
            .chars()
            .take(self.line_len(line_idx))
            .collect()
    }

    fn cursor_char_idx(&self) -> usize {
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line) + self.cursor.col.min(self.line_len(line))
    }

    fn cursor_for_char_idx(&self, idx: usize) -> Cursor {
        let idx = idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(idx);
        Cursor::at(line, idx - self.rope.line_to_char(line))
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.set_col(self.cursor.col - 1);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.move_end();
        }
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.line) {
            self.cursor.set_col(self.cursor.col + 1);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let Some(line) = self.cursor.line.checked_add_signed(delta) else {
            return;
        };
        if line >= self.line_count() {
            return;
        }
        self.cursor.line = line;
        self.cursor.col = self.cursor.goal_col.min(self.line_len(line));
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.rope.len_lines())
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .field("dirty", &self.dirty)
            .finish()
    }
}
