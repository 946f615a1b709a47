use super::input::{InputResult, TextInput};
use super::key_result::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::table::projection::{ColumnFilter, UserColumn};

/// Events emitted by the filter panel that the parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPanelEvent {
  /// A filter value changed; the table should re-project
  Changed,
  /// Panel closed (filters persist)
  Dismissed,
}

/// Per-column filter editor, activated with `f`.
///
/// One text input per table column; the values apply as the user
/// types and persist after the panel closes.
#[derive(Debug, Clone)]
pub struct FilterPanel {
  active: bool,
  focused: usize,
  inputs: Vec<TextInput>,
}

impl Default for FilterPanel {
  fn default() -> Self {
    Self {
      active: false,
      focused: 0,
      inputs: vec![TextInput::new(); UserColumn::ALL.len()],
    }
  }
}

impl FilterPanel {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if the panel is currently open
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// The active (non-empty) column filters
  pub fn column_filters(&self) -> Vec<ColumnFilter> {
    UserColumn::ALL
      .iter()
      .zip(&self.inputs)
      .filter(|(_, input)| !input.value().trim().is_empty())
      .map(|(column, input)| ColumnFilter {
        column: *column,
        value: input.value().trim().to_string(),
      })
      .collect()
  }

  /// How many columns have an active filter
  pub fn active_count(&self) -> usize {
    self.column_filters().len()
  }

  /// Clear every column filter
  pub fn clear(&mut self) {
    for input in &mut self.inputs {
      input.clear();
    }
  }

  /// Handle a key event.
  /// Call this regardless of active state - it handles activation too.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterPanelEvent> {
    if !self.active {
      if key.code == KeyCode::Char('f') {
        self.active = true;
        self.focused = 0;
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Enter => {
        self.active = false;
        return KeyResult::Event(FilterPanelEvent::Dismissed);
      }
      KeyCode::Tab | KeyCode::Down => {
        self.focused = (self.focused + 1) % self.inputs.len();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focused = if self.focused == 0 {
          self.inputs.len() - 1
        } else {
          self.focused - 1
        };
        return KeyResult::Handled;
      }
      KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.clear();
        return KeyResult::Event(FilterPanelEvent::Changed);
      }
      _ => {}
    }

    match self.inputs[self.focused].handle_key(key) {
      InputResult::Consumed => KeyResult::Event(FilterPanelEvent::Changed),
      // Esc/Enter are intercepted above; treat anything else as consumed
      // so stray keys don't leak into table navigation
      _ => KeyResult::Handled,
    }
  }

  /// Render the filter panel overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(34, 56).min(area.width);
    let height = (UserColumn::ALL.len() as u16 + 3).min(area.height);

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Filters ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines: Vec<Line> = UserColumn::ALL
      .iter()
      .enumerate()
      .map(|(i, column)| {
        let label_style = if i == self.focused {
          Style::default().fg(Color::Yellow).bold()
        } else {
          Style::default().fg(Color::White)
        };
        let mut spans = vec![
          Span::styled(format!("{:<9}", column.label()), label_style),
          Span::raw(" "),
        ];
        if self.inputs[i].is_empty() && i != self.focused {
          spans.push(Span::styled("(any)", Style::default().fg(Color::DarkGray)));
        } else {
          spans.push(Span::raw(self.inputs[i].value().to_string()));
        }
        if i == self.focused {
          spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
      })
      .collect();

    lines.push(Line::from(Span::styled(
      "Tab:next field  C-l:clear all  Esc:close",
      Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
  }
}
