//! Markdown document rendering.
//!
//! This module handles:
//! - Parsing markdown with comrak
//! - Laying it out as styled, wrapped lines for the preview pane
//! - Refusing sources that are too large or too deeply nested

mod parser;
mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

pub use parser::{RenderLimits, render_markdown};
pub use types::{
    Document, InlineColor, InlineSpan, InlineStyle, LineType, RenderedLine,
};

use crate::sync::{RenderError, Renderer};

/// Wrap width used until the preview pane reports its size.
pub const DEFAULT_WRAP_WIDTH: u16 = 80;

/// The preview renderer run by the render worker.
///
/// The wrap width is shared with the UI thread so a resize can take effect
/// on the next render without restarting the worker.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    width: Arc<AtomicU16>,
    limits: RenderLimits,
}

impl MarkdownRenderer {
    pub fn new(width: u16) -> Self {
        Self {
            width: Arc::new(AtomicU16::new(width)),
            limits: RenderLimits::default(),
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: RenderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Handle for changing the wrap width from another thread.
    pub fn width_handle(&self) -> Arc<AtomicU16> {
        Arc::clone(&self.width)
    }

    pub fn width(&self) -> u16 {
        self.width.load(Ordering::Relaxed)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WRAP_WIDTH)
    }
}

impl Renderer for MarkdownRenderer {
    type View = Document;

    fn render(&mut self, source: &str) -> Result<Document, RenderError> {
        let _scope = crate::perf::scope("document.render");
        render_markdown(source, self.width(), self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_uses_shared_width() {
        let mut renderer = MarkdownRenderer::new(80);
        let source = "alpha beta gamma delta epsilon zeta eta theta";

        let wide = renderer.render(source).unwrap();
        assert_eq!(wide.line_count(), 1);

        renderer.width_handle().store(12, Ordering::Relaxed);
        let narrow = renderer.render(source).unwrap();
        assert!(narrow.line_count() > 1);
    }

    #[test]
    fn test_renderer_applies_limits() {
        let mut renderer = MarkdownRenderer::default().with_limits(RenderLimits {
            max_source_bytes: 4,
            max_nesting: 8,
        });
        assert!(matches!(
            renderer.render("too long"),
            Err(RenderError::TooLarge { size: 8, limit: 4 })
        ));
    }

    #[test]
    fn test_renderer_keeps_source() {
        let mut renderer = MarkdownRenderer::default();
        let doc = renderer.render("# hi").unwrap();
        assert_eq!(doc.source(), "# hi");
    }
}
