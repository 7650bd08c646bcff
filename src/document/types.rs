//! Core document types.

/// A rendered Markdown document, ready for the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source text the document was rendered from
    source: String,
    /// Rendered lines for display
    lines: Vec<RenderedLine>,
}

impl Document {
    pub fn empty() -> Self {
        Self {
            source: String::new(),
            lines: Vec::new(),
        }
    }

    pub(crate) const fn new(source: String, lines: Vec<RenderedLine>) -> Self {
        Self { source, lines }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    /// Lines visible in a viewport starting at `offset`.
    pub fn visible_lines(&self, offset: usize, count: usize) -> &[RenderedLine] {
        let start = offset.min(self.lines.len());
        let end = start.saturating_add(count).min(self.lines.len());
        &self.lines[start..end]
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    content: String,
    line_type: LineType,
    spans: Option<Vec<InlineSpan>>,
}

impl RenderedLine {
    pub fn new(content: String, line_type: LineType) -> Self {
        Self {
            content,
            line_type,
            spans: None,
        }
    }

    pub fn with_spans(content: String, line_type: LineType, spans: Vec<InlineSpan>) -> Self {
        Self {
            content,
            line_type,
            spans: Some(spans),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn line_type(&self) -> &LineType {
        &self.line_type
    }

    pub fn spans(&self) -> Option<&[InlineSpan]> {
        self.spans.as_deref()
    }
}

/// Inline style flags for a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    pub fg: Option<InlineColor>,
}

impl InlineStyle {
    pub fn code() -> Self {
        Self {
            code: true,
            ..Self::default()
        }
    }
}

/// RGB color for syntax-highlighted spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A styled span within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub fn new(text: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }
}

/// Type of rendered line, used by the view to pick a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Paragraph,
    Heading(u8),
    CodeBlock,
    BlockQuote,
    ListItem(usize),
    Table,
    HorizontalRule,
    Html,
    Empty,
}
