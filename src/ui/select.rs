//! Interactive multi-select
//!
//! Renders an inline ratatui viewport below the cursor and lets the operator
//! pick resources with vim-style keys:
//!
//! | key            | effect                      |
//! |----------------|-----------------------------|
//! | `j`/`k`, arrows | move                        |
//! | space          | toggle current row          |
//! | `a` / `n`      | select all / none (visible) |
//! | `/`            | filter by substring         |
//! | Enter          | confirm                     |
//! | Esc / `q`      | cancel                      |

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal, TerminalOptions, Viewport,
};
use std::io;

/// Maximum list rows shown at once
const MAX_VISIBLE_ROWS: usize = 15;

/// What a key press did to the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Continue,
    Confirm,
    Cancel,
}

/// Pure state of the multi-select
#[derive(Debug, Clone)]
pub struct SelectionState {
    rows: Vec<String>,
    selected: Vec<bool>,
    /// Cursor position within the visible rows
    cursor: usize,
    filter: String,
    filtering: bool,
}

impl SelectionState {
    pub fn new(rows: Vec<String>) -> Self {
        let selected = vec![false; rows.len()];
        Self {
            rows,
            selected,
            cursor: 0,
            filter: String::new(),
            filtering: false,
        }
    }

    /// Indices of rows matching the filter (case-insensitive substring)
    pub fn visible(&self) -> Vec<usize> {
        let needle = self.filter.to_lowercase();
        (0..self.rows.len())
            .filter(|&i| needle.is_empty() || self.rows[i].to_lowercase().contains(&needle))
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    /// Selected row indices, in row order
    pub fn selected_indices(&self) -> Vec<usize> {
        (0..self.rows.len()).filter(|&i| self.selected[i]).collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    pub fn move_down(&mut self) {
        let len = self.visible().len();
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn toggle_current(&mut self) {
        if let Some(&index) = self.visible().get(self.cursor) {
            self.selected[index] = !self.selected[index];
        }
    }

    pub fn select_all(&mut self) {
        for index in self.visible() {
            self.selected[index] = true;
        }
    }

    pub fn select_none(&mut self) {
        for index in self.visible() {
            self.selected[index] = false;
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Apply one key press
    pub fn handle_key(&mut self, key: KeyEvent) -> SelectOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return SelectOutcome::Cancel;
        }

        if self.filtering {
            match key.code {
                KeyCode::Esc => {
                    self.filtering = false;
                    self.filter.clear();
                    self.clamp_cursor();
                },
                KeyCode::Enter => self.filtering = false,
                KeyCode::Backspace => {
                    self.filter.pop();
                    self.clamp_cursor();
                },
                KeyCode::Char(c) => {
                    self.filter.push(c);
                    self.clamp_cursor();
                },
                _ => {},
            }
            return SelectOutcome::Continue;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('a') => self.select_all(),
            KeyCode::Char('n') => self.select_none(),
            KeyCode::Char('/') => self.filtering = true,
            KeyCode::Enter => return SelectOutcome::Confirm,
            KeyCode::Esc | KeyCode::Char('q') => return SelectOutcome::Cancel,
            _ => {},
        }
        SelectOutcome::Continue
    }
}

/// Run the prompt; `None` when cancelled
pub fn multi_select(title: &str, rows: Vec<String>) -> Result<Option<Vec<usize>>> {
    if rows.is_empty() {
        return Ok(Some(Vec::new()));
    }

    let height = rows.len().min(MAX_VISIBLE_ROWS) as u16 + 4;
    let mut state = SelectionState::new(rows);

    enable_raw_mode()?;
    let result = run_prompt(title, height, &mut state);
    disable_raw_mode()?;

    match result? {
        SelectOutcome::Confirm => Ok(Some(state.selected_indices())),
        _ => Ok(None),
    }
}

fn run_prompt(title: &str, height: u16, state: &mut SelectionState) -> Result<SelectOutcome> {
    let backend = CrosstermBackend::new(io::stderr());
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )?;

    let outcome = loop {
        terminal.draw(|f| render(f, title, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match state.handle_key(key) {
                SelectOutcome::Continue => {},
                done => break done,
            }
        }
    };

    terminal.clear()?;
    Ok(outcome)
}

fn render(f: &mut Frame, title: &str, state: &SelectionState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    let visible = state.visible();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|&i| {
            let mark = if state.is_selected(i) { "[x]" } else { "[ ]" };
            let style = if state.is_selected(i) {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", mark), style.add_modifier(Modifier::BOLD)),
                Span::styled(state.rows[i].clone(), style),
            ]))
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!(
            " {} ({}/{} selected) ",
            title,
            state.selected_count(),
            state.rows.len()
        ),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !visible.is_empty() {
        list_state.select(Some(state.cursor()));
    }
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    let footer = if state.is_filtering() {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(state.filter().to_string()),
        ])
    } else {
        Line::from(Span::styled(
            "space toggle · a all · n none · / filter · enter confirm · esc cancel",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(footer), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> SelectionState {
        SelectionState::new(vec![
            "web-1 (proj-a/us-central1-a)".into(),
            "web-2 (proj-a/us-central1-b)".into(),
            "db-1 (proj-b/europe-west1)".into(),
        ])
    }

    #[test]
    fn test_toggle_and_move() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char(' ')));
        s.handle_key(key(KeyCode::Char('j')));
        s.handle_key(key(KeyCode::Char('j')));
        s.handle_key(key(KeyCode::Char('j')));
        s.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(s.cursor(), 2);
        assert_eq!(s.selected_indices(), vec![0, 2]);
    }

    #[test]
    fn test_filter_limits_select_all() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('/')));
        for c in "WEB".chars() {
            s.handle_key(key(KeyCode::Char(c)));
        }
        s.handle_key(key(KeyCode::Enter));
        assert!(!s.is_filtering());
        assert_eq!(s.visible(), vec![0, 1]);

        s.handle_key(key(KeyCode::Char('a')));
        assert_eq!(s.selected_indices(), vec![0, 1]);
    }

    #[test]
    fn test_filter_keys_do_not_trigger_commands() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('/')));
        assert_eq!(s.handle_key(key(KeyCode::Char('q'))), SelectOutcome::Continue);
        assert_eq!(s.handle_key(key(KeyCode::Char('a'))), SelectOutcome::Continue);
        assert_eq!(s.selected_count(), 0);
        assert_eq!(s.filter(), "qa");
        assert!(s.visible().is_empty());
    }

    #[test]
    fn test_escape_in_filter_clears_it() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('/')));
        s.handle_key(key(KeyCode::Char('d')));
        s.handle_key(key(KeyCode::Esc));
        assert_eq!(s.filter(), "");
        assert_eq!(s.visible().len(), 3);
    }

    #[test]
    fn test_cursor_clamped_when_filter_shrinks_list() {
        let mut s = state();
        s.handle_key(key(KeyCode::Down));
        s.handle_key(key(KeyCode::Down));
        s.handle_key(key(KeyCode::Char('/')));
        s.handle_key(key(KeyCode::Char('w')));
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn test_confirm_and_cancel() {
        let mut s = state();
        assert_eq!(s.handle_key(key(KeyCode::Enter)), SelectOutcome::Confirm);
        assert_eq!(s.handle_key(key(KeyCode::Esc)), SelectOutcome::Cancel);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(s.handle_key(ctrl_c), SelectOutcome::Cancel);
    }

    #[test]
    fn test_select_none_and_up_at_top() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('a')));
        s.handle_key(key(KeyCode::Char('n')));
        s.handle_key(key(KeyCode::Up));
        assert_eq!(s.selected_count(), 0);
        assert_eq!(s.cursor(), 0);
    }
}
