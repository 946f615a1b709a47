//! The user table view: search, filters, sort, and pagination over the
//! cached user list.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::cache::{CacheResult, CacheSource};
use crate::config::Config;
use crate::query::{Query, QueryState, RetryPolicy};
use crate::table::pagination::{self, PageItem};
use crate::table::projection::{self, SortDirection, SortState, TableQuery, UserColumn};
use crate::ui::components::{
  FilterPanel, FilterPanelEvent, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::{ensure_valid_selection, truncate, ViewAction};
use crate::users::{CachedUserClient, User};

/// View for the searchable, sortable, filterable, paginated user table
pub struct UserTableView {
  client: CachedUserClient,
  query: Query<CacheResult<Vec<User>>>,
  search: SearchInput,
  filters: FilterPanel,
  sort: Option<SortState>,
  /// Current 1-based page; always clamped against the filtered total
  page: usize,
  page_size: usize,
  table_state: TableState,
  /// The error view was dismissed; show the table shell instead
  error_dismissed: bool,
}

impl UserTableView {
  pub fn new(client: CachedUserClient, config: &Config, initial_page: usize) -> Self {
    let client_for_query = client.clone();
    let mut query = Query::new(move || {
      let client = client_for_query.clone();
      async move { client.fetch_users().await.map_err(|e| e.to_string()) }
    })
    .with_stale_time(std::time::Duration::from_secs(config.stale_secs))
    .with_retry(RetryPolicy {
      attempts: config.retry.attempts,
      base_delay: std::time::Duration::from_millis(config.retry.base_delay_ms),
      max_delay: std::time::Duration::from_millis(config.retry.max_delay_ms),
    });

    // Start fetching immediately
    query.fetch();

    Self {
      client,
      query,
      search: SearchInput::new(),
      filters: FilterPanel::new(),
      sort: None,
      page: initial_page.max(1),
      page_size: config.page_size.max(1),
      table_state: TableState::default(),
      error_dismissed: false,
    }
  }

  fn users(&self) -> &[User] {
    self
      .query
      .data()
      .map(|result| result.data.as_slice())
      .unwrap_or(&[])
  }

  fn table_query(&self) -> TableQuery {
    TableQuery {
      global_filter: self.search.query().to_string(),
      column_filters: self.filters.column_filters(),
      sort: self.sort,
    }
  }

  fn has_active_filters(&self) -> bool {
    !self.search.query().trim().is_empty() || self.filters.active_count() > 0
  }

  /// Re-clamp the page after anything that can change the filtered
  /// total (data arrival, filter or search edits, page navigation).
  fn sync_page(&mut self) {
    // Keep the seed page until data arrives so `--page 3` survives the
    // initial load.
    if self.query.data().is_none() {
      return;
    }

    let filtered = projection::project(self.users(), &self.table_query()).len();
    let total = projection::page_count(filtered, self.page_size);
    let clamped = projection::clamp_page(self.page, total);
    if clamped != self.page {
      tracing::debug!(from = self.page, to = clamped, "page clamped after table change");
      self.page = clamped;
    }
  }

  /// Cycle a column's sort: none -> ascending -> descending -> none
  fn toggle_sort(&mut self, column: UserColumn) {
    self.sort = match self.sort {
      Some(SortState {
        column: current,
        direction,
      }) if current == column => match direction {
        SortDirection::Ascending => Some(SortState {
          column,
          direction: direction.toggled(),
        }),
        SortDirection::Descending => None,
      },
      _ => Some(SortState {
        column,
        direction: SortDirection::Ascending,
      }),
    };
  }

  /// Forced refresh: drop the cache entry, then supersede any fetch in
  /// flight with exactly one new one.
  fn refresh(&mut self) {
    self.error_dismissed = false;
    self.client.invalidate();
    self.query.refetch();
  }

  fn set_page(&mut self, page: usize) {
    self.page = page;
    self.table_state.select(Some(0));
    self.sync_page();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Overlays get the key first
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Changed(_)) => {
        // Searching always returns to the first page
        self.set_page(1);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.filters.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(FilterPanelEvent::Changed) => {
        self.sync_page();
        return ViewAction::None;
      }
      KeyResult::Event(FilterPanelEvent::Dismissed) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('q') => return ViewAction::Quit,
      KeyCode::Esc => {
        if self.query.is_error() {
          self.error_dismissed = true;
        }
      }
      KeyCode::Char('r') => self.refresh(),

      // Row selection within the page
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),

      // Page navigation
      KeyCode::Char('h') | KeyCode::Left => {
        if self.page > 1 {
          self.set_page(self.page - 1);
        }
      }
      KeyCode::Char('l') | KeyCode::Right => {
        let filtered = projection::project(self.users(), &self.table_query()).len();
        if self.page < projection::page_count(filtered, self.page_size) {
          self.set_page(self.page + 1);
        }
      }
      KeyCode::Char('g') => self.set_page(1),
      KeyCode::Char('G') => {
        let filtered = projection::project(self.users(), &self.table_query()).len();
        self.set_page(projection::page_count(filtered, self.page_size));
      }

      // Sort toggles, one key per column
      KeyCode::Char('1') => self.toggle_sort(UserColumn::Name),
      KeyCode::Char('2') => self.toggle_sort(UserColumn::Username),
      KeyCode::Char('3') => self.toggle_sort(UserColumn::Email),
      KeyCode::Char('4') => self.toggle_sort(UserColumn::Website),

      _ => {}
    }
    ViewAction::None
  }

  /// Called on each event-loop tick: apply async results and kick off
  /// background revalidation when the data has gone stale.
  pub fn tick(&mut self) {
    if self.query.poll() {
      self.error_dismissed = false;
      self.sync_page();
    }
    self.query.revalidate_if_stale();
  }

  pub fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Min(3),    // Table
        Constraint::Length(1), // Pagination bar
        Constraint::Length(1), // Status bar
      ])
      .split(area);

    if self.query.is_error() && !self.error_dismissed {
      self.render_error(frame, chunks[0]);
    } else {
      self.render_table(frame, chunks[0]);
    }
    self.render_pagination(frame, chunks[1]);
    self.render_status(frame, chunks[2]);

    // Overlays draw on top of the table
    self.search.render_overlay(frame, chunks[0]);
    self.filters.render_overlay(frame, chunks[0]);
  }

  fn title(&self, filtered: usize) -> String {
    match self.query.state() {
      QueryState::Loading => " Users (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Users (error: {}) ", truncate(e, 40)),
      _ => {
        let total = self.users().len();
        let mut title = if filtered == total {
          format!(" Users ({}) ", total)
        } else {
          format!(" Users ({} of {}) ", filtered, total)
        };
        if self.filters.active_count() > 0 {
          title.push_str(&format!("[{} column filters] ", self.filters.active_count()));
        }
        if self.query.is_fetching() {
          title.push_str("(refreshing...) ");
        }
        title
      }
    }
  }

  fn render_error(&self, frame: &mut Frame, area: Rect) {
    let message = self.query.error().unwrap_or("An unexpected error occurred");

    let block = Block::default()
      .title(" Error loading users ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let lines = vec![
      Line::raw(""),
      Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::Red),
      )),
      Line::raw(""),
      Line::from(Span::styled(
        "r:retry  Esc:dismiss",
        Style::default().fg(Color::DarkGray),
      )),
    ];

    let paragraph = Paragraph::new(lines)
      .block(block)
      .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    // Materialize the page rows up front; the row cells own their
    // strings so the table widget does not borrow the query data.
    let (body, filtered, page_len) = {
      let table_query = self.table_query();
      let rows = projection::project(self.users(), &table_query);
      let filtered = rows.len();
      let page_rows = projection::page_slice(&rows, self.page, self.page_size);
      let body: Vec<Row> = page_rows
        .iter()
        .map(|user| {
          Row::new(vec![
            Cell::from(user.name.clone()),
            Cell::from(user.username.clone()).style(Style::default().fg(Color::Cyan)),
            Cell::from(user.email.clone()),
            Cell::from(user.website.clone()).style(Style::default().fg(Color::Blue)),
          ])
        })
        .collect();
      (body, filtered, page_rows.len())
    };
    ensure_valid_selection(&mut self.table_state, page_len);

    let block = Block::default()
      .title(self.title(filtered))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.query.is_loading() {
      let paragraph = Paragraph::new("Loading users...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    if body.is_empty() {
      let content = if self.query.is_error() {
        "Failed to load users. Press 'r' to retry."
      } else if self.has_active_filters() {
        "No results found for the current filters."
      } else {
        "No users available."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(
      UserColumn::ALL
        .iter()
        .map(|column| {
          let indicator = match self.sort {
            Some(SortState {
              column: sorted,
              direction,
            }) if sorted == *column => match direction {
              SortDirection::Ascending => " ^",
              SortDirection::Descending => " v",
            },
            _ => "",
          };
          Cell::from(format!("{}{}", column.label(), indicator))
            .style(Style::default().fg(Color::White).bold())
        })
        .collect::<Vec<_>>(),
    )
    .height(1);

    let widths = [
      Constraint::Percentage(30),
      Constraint::Percentage(18),
      Constraint::Percentage(30),
      Constraint::Percentage(22),
    ];

    let table = Table::new(body, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn render_pagination(&self, frame: &mut Frame, area: Rect) {
    let rows = projection::project(self.users(), &self.table_query());
    let total = projection::page_count(rows.len(), self.page_size);
    let max_visible = pagination::max_visible_for_width(area.width);

    let mut spans = vec![Span::raw(" ")];

    let edge_style = |enabled: bool| {
      if enabled {
        Style::default().fg(Color::Cyan)
      } else {
        Style::default().fg(Color::DarkGray)
      }
    };
    spans.push(Span::styled("«", edge_style(self.page > 1)));
    spans.push(Span::raw(" "));

    for item in pagination::window(self.page, total, max_visible) {
      match item {
        PageItem::Page(n) if n == self.page => {
          spans.push(Span::styled(
            format!("[{}]", n),
            Style::default().fg(Color::Cyan).bold(),
          ));
        }
        PageItem::Page(n) => spans.push(Span::raw(format!(" {} ", n))),
        PageItem::Ellipsis => {
          spans.push(Span::styled(" … ", Style::default().fg(Color::DarkGray)))
        }
      }
    }

    spans.push(Span::raw(" "));
    spans.push(Span::styled("»", edge_style(self.page < total)));
    spans.push(Span::styled(
      format!("  page {}/{} · {} users", self.page, total, rows.len()),
      Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let hint = if self.search.is_active() {
      format!(" /{}", self.search.query())
    } else if self.filters.is_active() {
      " editing filters  Tab:next field  C-l:clear all  Esc:close".to_string()
    } else {
      " /:search  f:filters  1-4:sort  h/l:page  j/k:rows  r:refresh  q:quit".to_string()
    };

    let provenance = match self.query.data() {
      Some(result) => {
        let at = result
          .cached_at
          .map(|t| t.format("%H:%M:%S").to_string())
          .unwrap_or_else(|| "now".to_string());
        match result.source {
          CacheSource::Offline => Span::styled(
            format!("offline · cached {} ", at),
            Style::default().fg(Color::Red),
          ),
          CacheSource::Network => {
            Span::styled("live ".to_string(), Style::default().fg(Color::Green))
          }
          CacheSource::CacheFresh => Span::styled(
            format!("cached {} ", at),
            Style::default().fg(Color::DarkGray),
          ),
        }
      }
      None => Span::raw(String::new()),
    };

    let warn = if self.query.last_error().is_some() {
      Span::styled("refresh failed · ", Style::default().fg(Color::Yellow))
    } else {
      Span::raw("")
    };

    let right_len = (provenance.content.chars().count() + warn.content.chars().count()) as u16;
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Min(0), Constraint::Length(right_len)])
      .split(area);

    frame.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      chunks[0],
    );
    frame.render_widget(Paragraph::new(Line::from(vec![warn, provenance])), chunks[1]);
  }
}
