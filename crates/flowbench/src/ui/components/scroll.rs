//! Thin adapter between a document viewport and the toolkit scrollbar.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};

/// Viewport position within the active document's detail view, mapped onto
/// the toolkit's scrollbar state at render time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentScroll {
    position: usize,
    content_length: usize,
    page: usize,
}

impl DocumentScroll {
    pub fn new(content_length: usize, page: usize) -> Self {
        Self {
            position: 0,
            content_length,
            page,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Update the scrollable extent, clamping the position into range.
    pub fn resize(&mut self, content_length: usize, page: usize) {
        self.content_length = content_length;
        self.page = page;
        self.position = self.position.min(self.max_position());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.position = (self.position + lines).min(self.max_position());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.position = self.position.saturating_sub(lines);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page.max(1));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page.max(1));
    }

    pub fn to_top(&mut self) {
        self.position = 0;
    }

    pub fn at_bottom(&self) -> bool {
        self.position >= self.max_position()
    }

    fn max_position(&self) -> usize {
        self.content_length.saturating_sub(self.page)
    }

    /// Render a vertical scrollbar when the content overflows the page.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        if self.content_length <= self.page {
            return;
        }
        let mut state = ScrollbarState::new(self.content_length).position(self.position);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut state,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_clamps_to_content() {
        let mut scroll = DocumentScroll::new(10, 4);
        scroll.scroll_down(100);
        assert_eq!(scroll.position(), 6);
        assert!(scroll.at_bottom());

        scroll.scroll_up(100);
        assert_eq!(scroll.position(), 0);
    }

    #[test]
    fn resize_keeps_position_in_range() {
        let mut scroll = DocumentScroll::new(20, 5);
        scroll.scroll_down(15);
        assert_eq!(scroll.position(), 15);

        scroll.resize(8, 5);
        assert_eq!(scroll.position(), 3);
    }

    #[test]
    fn short_content_never_scrolls() {
        let mut scroll = DocumentScroll::new(3, 10);
        scroll.page_down();
        assert_eq!(scroll.position(), 0);
        assert!(scroll.at_bottom());
    }
}
