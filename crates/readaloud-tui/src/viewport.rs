//! Scroll geometry of the document pane

use readaloud_core::Viewport;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap `text` into display lines of at most `width` columns
///
/// Paragraph breaks are kept; runs of spaces collapse to one. Words wider
/// than the pane are split across lines. A zero width leaves lines unwrapped.
pub fn wrap_lines(text: &str, width: u16) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let width = width as usize;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        if width == 0 {
            lines.push(paragraph.trim_end().to_string());
            continue;
        }

        let mut line = String::new();
        let mut line_width = 0usize;
        for word in paragraph.split_whitespace() {
            let word_width = word.width();
            let gap = usize::from(line_width > 0);

            if line_width + gap + word_width <= width {
                if gap == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += gap + word_width;
                continue;
            }

            if line_width > 0 {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if word_width <= width {
                line.push_str(word);
                line_width = word_width;
                continue;
            }

            // Hard-break an overlong word
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line_width + ch_width > width && line_width > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width += ch_width;
            }
        }
        lines.push(line);
    }

    lines
}

/// Wrapped revealed text plus the pane's scroll position
#[derive(Debug, Clone, Default)]
pub struct DocumentViewport {
    content: String,
    lines: Vec<String>,
    width: u16,
    height: u16,
    offset: u16,
}

impl DocumentViewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Adapt to a new pane size, rewrapping the content if the width changed
    pub fn resize(&mut self, width: u16, height: u16) {
        if width != self.width {
            self.width = width;
            self.lines = wrap_lines(&self.content, width);
        }
        self.height = height;
        self.clamp();
    }

    /// Scroll by `delta` lines. Returns true when the offset moved.
    pub fn scroll_by(&mut self, delta: i32) -> bool {
        let before = self.offset;
        let target = (self.offset as i32 + delta).clamp(0, self.max_offset() as i32);
        self.offset = target as u16;
        self.offset != before
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Whether the last line is on screen
    pub fn at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }
}

impl Viewport for DocumentViewport {
    fn max_offset(&self) -> u16 {
        let overflow = self.lines.len().saturating_sub(self.height as usize);
        overflow.min(u16::MAX as usize) as u16
    }

    fn offset(&self) -> u16 {
        self.offset
    }

    fn scroll_to_max(&mut self) {
        self.offset = self.max_offset();
    }

    fn observe_content(&mut self, content: &str) {
        if content == self.content {
            return;
        }
        self.content.clear();
        self.content.push_str(content);
        self.lines = wrap_lines(content, self.width);
        self.clamp();
    }
}
