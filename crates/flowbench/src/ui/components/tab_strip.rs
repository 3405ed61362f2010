//! Tab strip showing the open documents.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;

/// Display data for one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel {
    pub title: String,
    pub dirty: bool,
}

/// Renders the strip of open tabs with dirty markers.
#[derive(Debug, Default)]
pub struct TabStrip;

impl TabStrip {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        labels: &[TabLabel],
        selected: Option<usize>,
    ) {
        if labels.is_empty() {
            let placeholder = Line::styled(
                " no open documents ",
                Style::default().fg(Color::DarkGray),
            );
            frame.render_widget(ratatui::widgets::Paragraph::new(placeholder), area);
            return;
        }

        let titles: Vec<Line<'_>> = labels
            .iter()
            .map(|label| {
                let mut spans = vec![Span::raw(label.title.clone())];
                if label.dirty {
                    spans.push(Span::styled("*", Style::default().fg(Color::Yellow)));
                }
                Line::from(spans)
            })
            .collect();

        let tabs = Tabs::new(titles)
            .select(selected.unwrap_or(0))
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn renders_titles_with_dirty_marker() {
        let backend = TestBackend::new(40, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        let labels = vec![
            TabLabel {
                title: "etl1.tfm".into(),
                dirty: true,
            },
            TabLabel {
                title: "nightly.job".into(),
                dirty: false,
            },
        ];

        terminal
            .draw(|frame| {
                let area = frame.size();
                TabStrip.render(frame, area, &labels, Some(0));
            })
            .unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol().to_owned())
            .collect();
        assert!(rendered.contains("etl1.tfm*"));
        assert!(rendered.contains("nightly.job"));
    }

    #[test]
    fn renders_placeholder_without_tabs() {
        let backend = TestBackend::new(40, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                TabStrip.render(frame, area, &[], None);
            })
            .unwrap();
    }
}
