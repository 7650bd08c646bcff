//! Scroll state for a pane.

use std::ops::Range;

/// The visible window over a list of lines.
///
/// # Example
///
/// ```
/// use markmate::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(40, 10, 100);
/// assert_eq!(vp.visible_range(), 0..10);
///
/// vp.scroll_down(5);
/// assert_eq!(vp.visible_range(), 5..15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_lines: usize,
}

impl Viewport {
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_lines,
        }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height as usize).min(self.total_lines);
        self.offset.min(end)..end
    }

    /// Scroll position as a percentage (0-100).
    pub fn scroll_percent(&self) -> u8 {
        let max_offset = self.max_offset();
        if max_offset == 0 {
            return 100;
        }
        let percent = self.offset.min(max_offset) * 100 / max_offset;
        u8::try_from(percent).unwrap_or(100)
    }

    pub const fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.max_offset());
    }

    pub const fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    pub const fn go_to_top(&mut self) {
        self.offset = 0;
    }

    pub const fn go_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Resize the viewport, keeping the offset in bounds.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp();
    }

    /// Update the document length, keeping the offset in bounds.
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.clamp();
    }

    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scroll_stops_at_bounds() {
        let mut vp = Viewport::new(80, 10, 25);
        vp.scroll_down(100);
        assert_eq!(vp.offset(), 15);
        vp.scroll_up(100);
        assert_eq!(vp.offset(), 0);
    }

    #[test]
    fn test_short_document_does_not_scroll() {
        let mut vp = Viewport::new(80, 10, 4);
        vp.page_down();
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.visible_range(), 0..4);
        assert_eq!(vp.scroll_percent(), 100);
    }

    #[test]
    fn test_shrinking_document_clamps_offset() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.go_to_bottom();
        assert_eq!(vp.offset(), 90);
        vp.set_total_lines(12);
        assert_eq!(vp.offset(), 2);
    }

    #[test]
    fn test_scroll_percent_midway() {
        let mut vp = Viewport::new(80, 10, 30);
        vp.scroll_down(10);
        assert_eq!(vp.scroll_percent(), 50);
    }

    proptest! {
        #[test]
        fn prop_offset_never_exceeds_max(
            height in 1u16..50,
            total in 0usize..500,
            ops in proptest::collection::vec((any::<bool>(), 0usize..100), 0..30),
        ) {
            let mut vp = Viewport::new(80, height, total);
            for (down, n) in ops {
                if down { vp.scroll_down(n) } else { vp.scroll_up(n) }
                prop_assert!(vp.offset() <= total.saturating_sub(height as usize));
            }
        }
    }
}
