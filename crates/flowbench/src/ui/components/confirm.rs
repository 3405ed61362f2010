//! Save/discard/cancel confirmation for documents with unsaved changes.

use crossterm::event::{self, Event, KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;

use crate::app::prompt::ChangedPrompt;
use crate::domain::errors::WorkbenchError;
use crate::domain::model::ChangeDecision;
use crate::infra::messages::MessageCatalog;

/// Localized dialog text, resolved once so the prompt does not hold a
/// borrow of the message catalog while the registries are being mutated.
#[derive(Debug, Clone)]
pub struct ConfirmStrings {
    pub title: String,
    pub body_template: String,
    pub buttons: [String; 3],
    pub hint: String,
    pub untitled: String,
}

impl ConfirmStrings {
    pub fn from_catalog(messages: &MessageCatalog) -> Self {
        Self {
            title: messages.text("confirm.title"),
            body_template: messages.text("confirm.body"),
            buttons: [
                messages.text("confirm.save"),
                messages.text("confirm.discard"),
                messages.text("confirm.cancel"),
            ],
            hint: messages.text("confirm.hint"),
            untitled: messages.text("tab.untitled"),
        }
    }
}

/// Button focus within the dialog; Save is preselected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmState {
    selected: usize,
}

impl ConfirmState {
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % 3;
    }

    pub fn select_previous(&mut self) {
        self.selected = (self.selected + 2) % 3;
    }

    fn decision(&self) -> ChangeDecision {
        match self.selected {
            0 => ChangeDecision::Save,
            1 => ChangeDecision::Discard,
            _ => ChangeDecision::Cancel,
        }
    }

    /// Map a key press to a terminal decision, or update the focus.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ChangeDecision> {
        match key.code {
            KeyCode::Esc => Some(ChangeDecision::Cancel),
            KeyCode::Enter => Some(self.decision()),
            KeyCode::Char('s') => Some(ChangeDecision::Save),
            KeyCode::Char('d') => Some(ChangeDecision::Discard),
            KeyCode::Char('c') => Some(ChangeDecision::Cancel),
            KeyCode::Left | KeyCode::BackTab => {
                self.select_previous();
                None
            }
            KeyCode::Right | KeyCode::Tab => {
                self.select_next();
                None
            }
            _ => None,
        }
    }
}

/// Visual component drawing the centered confirmation dialog.
#[derive(Debug, Default)]
pub struct ConfirmDialog;

impl ConfirmDialog {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        strings: &ConfirmStrings,
        body: &str,
        state: &ConfirmState,
    ) {
        let width = area.width.saturating_sub(8).min(60).max(20);
        let height = 7;
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        };

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(strings.title.clone())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        frame.render_widget(block.clone(), popup);

        let inner = block.inner(popup);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(2),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let message = Paragraph::new(body.to_owned()).wrap(Wrap { trim: true });
        frame.render_widget(message, layout[0]);

        let mut spans = Vec::new();
        for (idx, label) in strings.buttons.iter().enumerate() {
            let style = if idx == state.selected() {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!("[ {label} ]"), style));
            spans.push(Span::raw("  "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), layout[1]);

        let hint = Paragraph::new(strings.hint.clone())
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, layout[2]);
    }
}

/// Blocking modal prompt over the live terminal.
///
/// Holds the dispatch loop until the user answers; the rest of the UI is
/// intentionally frozen so the document cannot change mid-decision.
pub struct ModalConfirm<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    strings: ConfirmStrings,
}

impl<'a, B: Backend> ModalConfirm<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, strings: ConfirmStrings) -> Self {
        Self { terminal, strings }
    }
}

impl<B: Backend> ChangedPrompt for ModalConfirm<'_, B> {
    fn ask(&mut self, label: Option<&str>) -> Result<ChangeDecision, WorkbenchError> {
        let name = label.unwrap_or(&self.strings.untitled).to_owned();
        let body = self.strings.body_template.replace("{name}", &name);
        let mut state = ConfirmState::default();

        loop {
            let strings = &self.strings;
            self.terminal
                .draw(|frame| {
                    let area = frame.size();
                    ConfirmDialog.render(frame, area, strings, &body, &state);
                })
                .map_err(|_| WorkbenchError::PromptUnavailable)?;

            match event::read().map_err(|_| WorkbenchError::PromptUnavailable)? {
                Event::Key(key) => {
                    if let Some(decision) = state.handle_key(key) {
                        return Ok(decision);
                    }
                }
                _ => {}
            }
        }
    }
}
