//! Application loop for the TUI.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::context::Workbench;
use crate::domain::model::DocumentKind;
use crate::ui::components::confirm::{ConfirmStrings, ModalConfirm};
use crate::ui::components::scroll::DocumentScroll;
use crate::ui::components::tab_strip::{TabLabel, TabStrip};

const TICK_RATE: Duration = Duration::from_millis(120);

/// Primary entry point for running the interactive workbench.
pub struct WorkbenchApp {
    workbench: Workbench,
    bindings: Bindings,
    tab_strip: TabStrip,
    scroll: DocumentScroll,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl WorkbenchApp {
    pub fn new(workbench: Workbench) -> Self {
        let bindings = Bindings::from_config(&workbench.config.keybindings);
        Self {
            workbench,
            bindings,
            tab_strip: TabStrip,
            scroll: DocumentScroll::default(),
            status: None,
            should_quit: false,
        }
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                let ev = event::read()?;
                self.handle_event(ev, terminal)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(size);

        let labels: Vec<TabLabel> = self
            .workbench
            .tabs
            .entries()
            .iter()
            .map(|entry| TabLabel {
                title: entry.document().label(),
                dirty: entry.document().has_unsaved_changes(),
            })
            .collect();
        let selected = self.workbench.tabs.active_handle().and_then(|active| {
            self.workbench
                .tabs
                .entries()
                .iter()
                .position(|entry| entry.handle() == active)
        });
        self.tab_strip.render(frame, layout[0], &labels, selected);

        self.render_body(frame, layout[1]);
        self.render_status(frame, layout[2]);
    }

    fn render_body(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let title = self
            .workbench
            .perspectives
            .active()
            .map(|perspective| perspective.display_name().to_owned())
            .unwrap_or_else(|| self.workbench.messages.text("app.title"));

        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = self.document_lines();
        self.scroll.resize(lines.len(), inner.height as usize);

        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll.position() as u16, 0));
        frame.render_widget(body, inner);
        self.scroll.render(frame, inner);
    }

    fn document_lines(&self) -> Vec<Line<'static>> {
        let Some(document) = self.workbench.tabs.active_document() else {
            let hint = Line::styled(
                "ctrl+t new transformation · ctrl+j new job",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            return vec![hint];
        };

        let meta = document.backing_model();
        let kind_label = self
            .workbench
            .messages
            .text(match meta.kind() {
                DocumentKind::Transformation => "document.kind.transformation",
                DocumentKind::Job => "document.kind.job",
            });

        let mut lines = vec![
            detail_line("Name", meta.name().to_owned()),
            detail_line("Kind", kind_label),
            detail_line(
                "File",
                document
                    .file_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(not saved yet)".to_owned()),
            ),
            detail_line(
                "State",
                if document.has_unsaved_changes() {
                    "modified".to_owned()
                } else {
                    "saved".to_owned()
                },
            ),
        ];

        if !document.pending_edits().is_empty() {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                format!("{} staged edit(s)", document.pending_edits().len()),
                Style::default().fg(Color::Yellow),
            ));
        }

        if !meta.attributes().is_empty() {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Attributes",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            for (key, value) in meta.attributes() {
                lines.push(detail_line(key, value.to_string()));
            }
        }

        lines
    }

    fn render_status(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let line = match &self.status {
            Some(status) => {
                let style = match status.level {
                    StatusLevel::Info => Style::default().fg(Color::Gray),
                    StatusLevel::Success => Style::default().fg(Color::Green),
                    StatusLevel::Error => Style::default().fg(Color::Red),
                };
                Line::styled(status.text.clone(), style)
            }
            None => Line::styled(
                self.workbench.messages.text("status.ready"),
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn tick(&mut self) {
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }
    }

    fn handle_event(
        &mut self,
        event: Event,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key_event(key, terminal)?,
            Event::Resize(..) => {}
            Event::Mouse(_) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Ok(())
    }

    fn handle_key_event(
        &mut self,
        key: KeyEvent,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        if self.bindings.quit.matches(key)
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.request_quit(terminal);
            return Ok(());
        }
        if self.bindings.close_tab.matches(key) {
            self.close_active_tab(terminal);
            return Ok(());
        }
        if self.bindings.save.matches(key) {
            self.save_active();
            return Ok(());
        }
        if self.bindings.next_perspective.matches(key) {
            if let Err(err) = self.workbench.perspectives.activate_next() {
                self.set_status(StatusLevel::Error, err.to_string());
            }
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('t') => {
                    self.workbench.new_document(DocumentKind::Transformation);
                }
                KeyCode::Char('j') => {
                    self.workbench.new_document(DocumentKind::Job);
                }
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Tab => self.workbench.tabs.focus_next(),
            KeyCode::Char('j') | KeyCode::Down => self.scroll.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll.scroll_up(1),
            KeyCode::PageDown => self.scroll.page_down(),
            KeyCode::PageUp => self.scroll.page_up(),
            KeyCode::Char('g') => self.scroll.to_top(),
            _ => {}
        }
        Ok(())
    }

    fn request_quit(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
        let strings = ConfirmStrings::from_catalog(&self.workbench.messages);
        let mut prompt = ModalConfirm::new(terminal, strings);
        match self.workbench.request_shutdown(&mut prompt) {
            Ok(true) => self.should_quit = true,
            Ok(false) => {}
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn close_active_tab(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
        let Some(handle) = self.workbench.tabs.active_handle() else {
            return;
        };
        let label = self
            .workbench
            .tabs
            .lookup(handle)
            .map(|document| document.label())
            .unwrap_or_default();

        let strings = ConfirmStrings::from_catalog(&self.workbench.messages);
        let mut prompt = ModalConfirm::new(terminal, strings);
        match self.workbench.close_tab(handle, &mut prompt) {
            Ok(true) => {
                let text = self
                    .workbench
                    .messages
                    .format("status.closed", &[("name", &label)]);
                self.set_status(StatusLevel::Info, text);
            }
            Ok(false) => {}
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn save_active(&mut self) {
        match self.workbench.save_active() {
            Ok(Some(label)) => {
                let text = self
                    .workbench
                    .messages
                    .format("status.saved", &[("name", &label)]);
                self.set_status(StatusLevel::Success, text);
            }
            Ok(None) => {}
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

fn detail_line(key: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{key:>10}  "),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(value),
    ])
}

/// Resolved key bindings from the configuration.
#[derive(Debug, Clone, Copy)]
struct Bindings {
    save: Binding,
    close_tab: Binding,
    quit: Binding,
    next_perspective: Binding,
}

impl Bindings {
    fn from_config(keys: &crate::infra::config::Keybindings) -> Self {
        Self {
            save: Binding::parse(&keys.save).unwrap_or(Binding::ctrl('s')),
            close_tab: Binding::parse(&keys.close_tab).unwrap_or(Binding::ctrl('w')),
            quit: Binding::parse(&keys.quit).unwrap_or(Binding::ctrl('q')),
            next_perspective: Binding::parse(&keys.next_perspective)
                .unwrap_or(Binding::ctrl('p')),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    modifiers: KeyModifiers,
    code: KeyCode,
}

impl Binding {
    fn ctrl(ch: char) -> Self {
        Self {
            modifiers: KeyModifiers::CONTROL,
            code: KeyCode::Char(ch),
        }
    }

    /// Parse a `modifier+key` spec such as `ctrl+s` or `alt+enter`.
    fn parse(spec: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let mut code = None;
        for part in spec.split('+') {
            match part.trim().to_ascii_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "enter" => code = Some(KeyCode::Enter),
                "esc" => code = Some(KeyCode::Esc),
                "tab" => code = Some(KeyCode::Tab),
                single if single.chars().count() == 1 => {
                    code = Some(KeyCode::Char(single.chars().next()?));
                }
                _ => return None,
            }
        }
        code.map(|code| Self { modifiers, code })
    }

    fn matches(&self, key: KeyEvent) -> bool {
        key.code == self.code && key.modifiers.contains(self.modifiers)
    }
}

#[derive(Debug)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusLevel {
    Info,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_specs() {
        assert_eq!(Binding::parse("ctrl+s"), Some(Binding::ctrl('s')));
        assert_eq!(
            Binding::parse("alt+enter"),
            Some(Binding {
                modifiers: KeyModifiers::ALT,
                code: KeyCode::Enter,
            })
        );
        assert_eq!(
            Binding::parse("q"),
            Some(Binding {
                modifiers: KeyModifiers::NONE,
                code: KeyCode::Char('q'),
            })
        );
        assert_eq!(Binding::parse("ctrl+"), None);
        assert_eq!(Binding::parse("hyper+x"), None);
    }

    #[test]
    fn binding_matching_requires_modifiers() {
        let binding = Binding::ctrl('s');
        assert!(binding.matches(KeyEvent::new(
            KeyCode::Char('s'),
            KeyModifiers::CONTROL
        )));
        assert!(!binding.matches(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE)));
    }
}
