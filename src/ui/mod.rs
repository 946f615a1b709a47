pub mod components;
mod table_view;

pub use table_view::UserTableView;

use ratatui::widgets::TableState;

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Quit the application
  Quit,
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Keep the row selection inside the current row count
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  match state.selected() {
    Some(_) if len == 0 => state.select(None),
    Some(i) if i >= len => state.select(Some(len - 1)),
    None if len > 0 => state.select(Some(0)),
    _ => {}
  }
}
