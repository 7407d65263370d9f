//! Custom passage authoring: a bounded text buffer with caret, selection and scroll.
//!
//! The buffer is indexed by character. Layout (word wrap, hit testing, caret placement)
//! lives in [`EditorLayout`], which is computed once per frame and shared by input
//! mapping and drawing so both agree on where every character sits.

use crate::clipboard::Clipboard;
use crate::util::clamp_f32;
use log::debug;
use std::ops::Range;
use unicode_width::UnicodeWidthStr;

/// Upper bound on the length of a custom passage, in characters.
pub const MAX_CHARS: usize = 1000;

/// Text measurement capability supplied by the renderer.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: u16) -> f32;
}

/// Terminal cells: one unit per display column, font size is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasure;

impl TextMeasure for CellMeasure {
    fn measure(&self, text: &str, _font_size: u16) -> f32 {
        text.width() as f32
    }
}

/// Geometry of the visible editing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub font_size: u16,
    pub line_height: f32,
}

impl Viewport {
    /// A viewport measured in terminal cells.
    pub fn cells(width: u16, height: u16) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            font_size: 1,
            line_height: 1.0,
        }
    }
}

/// Greedy word wrap.
///
/// A word carries its leading separator, so joining the returned lines gives back
/// `text` unchanged. A word wider than `max_width` gets a line of its own.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: u16,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut word = String::new();

    let place = |line: &mut String, word: &str, lines: &mut Vec<String>| {
        let candidate = format!("{line}{word}");
        if measure.measure(&candidate, font_size) <= max_width {
            *line = candidate;
        } else {
            if !line.is_empty() {
                lines.push(std::mem::take(line));
            }
            *line = word.to_owned();
        }
    };

    for c in text.chars() {
        if c == ' ' || c == '\n' {
            place(&mut line, &word, &mut lines);
            word.clear();
        }
        word.push(c);
    }

    if !word.is_empty() {
        place(&mut line, &word, &mut lines);
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    /// Offset of the first character in the buffer.
    pub start: usize,
    /// Length in characters.
    pub len: usize,
    pub text: String,
}

impl WrappedLine {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Wrapped lines plus the viewport they were wrapped for.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorLayout {
    lines: Vec<WrappedLine>,
    viewport: Viewport,
    text_len: usize,
}

impl EditorLayout {
    pub fn compute(text: &str, viewport: Viewport, measure: &dyn TextMeasure) -> Self {
        let mut start = 0;
        let lines = wrap_text(text, viewport.width, viewport.font_size, measure)
            .into_iter()
            .map(|text| {
                let len = text.chars().count();
                let line = WrappedLine { start, len, text };
                start += len;
                line
            })
            .collect();

        Self {
            lines,
            viewport,
            text_len: text.chars().count(),
        }
    }

    pub fn lines(&self) -> &[WrappedLine] {
        &self.lines
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn content_height(&self) -> f32 {
        self.lines.len() as f32 * self.viewport.line_height
    }

    pub fn max_scroll(&self) -> f32 {
        (self.content_height() - self.viewport.height).max(0.0)
    }

    /// Index of the line that displays the caret at `offset`.
    ///
    /// An offset on a wrap boundary stays at the end of the earlier line; the later line
    /// starts with the separator, so both positions insert in the same place.
    pub fn line_of(&self, offset: usize) -> usize {
        self.lines
            .iter()
            .position(|line| offset <= line.end())
            .unwrap_or_else(|| self.lines.len().saturating_sub(1))
    }

    /// Top-left of the caret at `offset`, in content coordinates (unscrolled).
    pub fn caret_point(&self, offset: usize, measure: &dyn TextMeasure) -> (f32, f32) {
        let row = self.line_of(offset);
        let Some(line) = self.lines.get(row) else {
            return (0.0, 0.0);
        };
        let column = offset.saturating_sub(line.start).min(line.len);
        let prefix: String = line.text.chars().take(column).collect();
        let x = measure.measure(&prefix, self.viewport.font_size);
        (x, row as f32 * self.viewport.line_height)
    }

    /// Buffer offset under a point relative to the viewport origin.
    pub fn offset_at(&self, x: f32, y: f32, scroll: f32, measure: &dyn TextMeasure) -> usize {
        let content_y = y + scroll;
        if self.lines.is_empty() || content_y < 0.0 {
            return 0;
        }

        let row = (content_y / self.viewport.line_height).floor() as usize;
        let Some(line) = self.lines.get(row) else {
            return self.text_len;
        };

        let mut left = 0.0;
        for (column, c) in line.text.chars().enumerate() {
            let width = measure.measure(c.encode_utf8(&mut [0; 4]), self.viewport.font_size);
            if x < left + width / 2.0 {
                return line.start + column;
            }
            left += width;
        }
        line.end()
    }

    /// Lines intersecting the viewport at `scroll`, with their top edge in viewport space.
    pub fn visible_lines(&self, scroll: f32) -> impl Iterator<Item = (f32, &WrappedLine)> {
        let line_height = self.viewport.line_height;
        let height = self.viewport.height;
        self.lines.iter().enumerate().filter_map(move |(row, line)| {
            let top = row as f32 * line_height - scroll;
            (top + line_height > 0.0 && top < height).then_some((top, line))
        })
    }

    /// Columns of `line` covered by the character range `range`.
    pub fn highlight_columns(line: &WrappedLine, range: &Range<usize>) -> Option<Range<usize>> {
        let lo = range.start.max(line.start);
        let hi = range.end.min(line.end());
        (lo < hi).then(|| (lo - line.start)..(hi - line.start))
    }
}

/// Editing commands, already decoded from key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    Insert(char),
    Backspace,
    Delete,
    SelectAll,
    Copy,
    Paste,
    Left { extend: bool },
    Right { extend: bool },
}

/// The custom passage being authored.
///
/// `selection_start` is the caret; `selection_end` is the end that moves while
/// extending a selection. The two are unordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorBuffer {
    text: Vec<char>,
    selection_start: usize,
    selection_end: usize,
    scroll_offset: f32,
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer seeded from stored text, normalised the same way as a paste.
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.paste_text(text);
        buffer
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.selection_start, self.selection_end)
    }

    pub fn caret(&self) -> usize {
        self.selection_start
    }

    pub fn is_collapsed(&self) -> bool {
        self.selection_start == self.selection_end
    }

    /// Ordered selection range.
    pub fn selected_range(&self) -> Range<usize> {
        let lo = self.selection_start.min(self.selection_end);
        let hi = self.selection_start.max(self.selection_end);
        lo..hi
    }

    pub fn selected_text(&self) -> Option<String> {
        if self.is_collapsed() {
            return None;
        }
        Some(self.text[self.selected_range()].iter().collect())
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.selection_start = start.min(self.text.len());
        self.selection_end = end.min(self.text.len());
    }

    fn collapse_to(&mut self, offset: usize) {
        self.set_selection(offset, offset);
    }

    fn delete_selection(&mut self) -> bool {
        if self.is_collapsed() {
            return false;
        }
        let range = self.selected_range();
        let lo = range.start;
        self.text.drain(range);
        self.collapse_to(lo);
        true
    }

    /// Replace the selection with `c`. Control characters are ignored.
    pub fn insert_char(&mut self, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        let replaced = self.delete_selection();
        if self.text.len() >= MAX_CHARS {
            return replaced;
        }
        let caret = self.selection_start;
        self.text.insert(caret, c);
        self.collapse_to(caret + 1);
        true
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let caret = self.selection_start;
        if caret == 0 {
            return false;
        }
        self.text.remove(caret - 1);
        self.collapse_to(caret - 1);
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let caret = self.selection_start;
        if caret >= self.text.len() {
            return false;
        }
        self.text.remove(caret);
        self.collapse_to(caret);
        true
    }

    pub fn select_all(&mut self) {
        self.set_selection(0, self.text.len());
    }

    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> bool {
        match self.selected_text() {
            Some(text) => {
                clipboard.set_text(&text);
                true
            }
            None => false,
        }
    }

    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) -> usize {
        match clipboard.get_text() {
            Some(text) => self.paste_text(&text),
            None => 0,
        }
    }

    /// Insert normalised text over the selection, truncated to the remaining capacity.
    /// Returns the number of characters inserted.
    pub fn paste_text(&mut self, raw: &str) -> usize {
        let selected = self.selected_range().len();
        let available = MAX_CHARS.saturating_sub(self.text.len() - selected);
        let normalized = normalize_paste(raw);
        let incoming: Vec<char> = normalized.chars().take(available).collect();
        if incoming.len() < normalized.chars().count() {
            debug!("paste truncated to {} characters", incoming.len());
        }

        self.delete_selection();
        let caret = self.selection_start;
        let inserted = incoming.len();
        self.text.splice(caret..caret, incoming);
        self.collapse_to(caret + inserted);
        inserted
    }

    pub fn move_left(&mut self, extend: bool) {
        if extend {
            if self.selection_end > 0 {
                self.selection_end -= 1;
            }
        } else {
            self.collapse_to(self.selection_start.saturating_sub(1));
        }
    }

    pub fn move_right(&mut self, extend: bool) {
        if extend {
            if self.selection_end < self.text.len() {
                self.selection_end += 1;
            }
        } else {
            self.collapse_to((self.selection_start + 1).min(self.text.len()));
        }
    }

    /// Apply a decoded command. Returns true when the text or caret changed.
    pub fn apply(&mut self, command: EditCommand, clipboard: &mut dyn Clipboard) -> bool {
        let before = (self.text.len(), self.selection());
        match command {
            EditCommand::Insert(c) => return self.insert_char(c),
            EditCommand::Backspace => return self.delete_backward(),
            EditCommand::Delete => return self.delete_forward(),
            EditCommand::Paste => {
                self.paste(clipboard);
            }
            EditCommand::Copy => {
                self.copy(clipboard);
                return false;
            }
            EditCommand::SelectAll => self.select_all(),
            EditCommand::Left { extend } => self.move_left(extend),
            EditCommand::Right { extend } => self.move_right(extend),
        }
        before != (self.text.len(), self.selection())
    }

    pub fn layout(&self, viewport: Viewport, measure: &dyn TextMeasure) -> EditorLayout {
        EditorLayout::compute(&self.text(), viewport, measure)
    }

    /// Start a mouse selection at a viewport point.
    pub fn press_at(&mut self, x: f32, y: f32, layout: &EditorLayout, measure: &dyn TextMeasure) {
        let offset = layout.offset_at(x, y, self.scroll_offset, measure);
        self.collapse_to(offset);
    }

    /// Extend a mouse selection, scrolling when the pointer leaves the viewport vertically.
    pub fn drag_to(&mut self, x: f32, y: f32, layout: &EditorLayout, measure: &dyn TextMeasure) {
        let viewport = layout.viewport();
        if y < 0.0 {
            self.scroll_by(-viewport.line_height, layout);
        } else if y > viewport.height {
            self.scroll_by(viewport.line_height, layout);
        }
        self.selection_end = layout
            .offset_at(x, y, self.scroll_offset, measure)
            .min(self.text.len());
    }

    pub fn scroll_by(&mut self, delta: f32, layout: &EditorLayout) {
        self.scroll_offset = clamp_f32(self.scroll_offset + delta, 0.0, layout.max_scroll());
    }

    pub fn clamp_scroll(&mut self, layout: &EditorLayout) {
        self.scroll_by(0.0, layout);
    }

    /// Scroll just enough to bring the moving end of the selection into the viewport.
    pub fn follow_caret(&mut self, layout: &EditorLayout) {
        let viewport = layout.viewport();
        let top = layout.line_of(self.selection_end) as f32 * viewport.line_height;
        let bottom = top + viewport.line_height;

        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if bottom > self.scroll_offset + viewport.height {
            self.scroll_offset = bottom - viewport.height;
        }
        self.clamp_scroll(layout);
    }
}

/// Line breaks and tabs become spaces, runs of spaces collapse, other control characters go.
pub fn normalize_paste(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = match c {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_control() => continue,
            c => c,
        };
        if c == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(c);
    }
    out
}
