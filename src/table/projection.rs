//! Derived-state pipeline for the user table.
//!
//! The visible rows are a pure projection of the fetched list plus the
//! transient table state: global filter, then column filters, then
//! sort, then the page slice. Recomputing the projection from scratch
//! on every keystroke keeps the derived state impossible to get out of
//! sync with its inputs.

use std::cmp::Ordering;

use crate::users::User;

/// A column of the user table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
  Name,
  Username,
  Email,
  Website,
}

impl UserColumn {
  pub const ALL: [UserColumn; 4] = [
    UserColumn::Name,
    UserColumn::Username,
    UserColumn::Email,
    UserColumn::Website,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      UserColumn::Name => "Name",
      UserColumn::Username => "Username",
      UserColumn::Email => "Email",
      UserColumn::Website => "Website",
    }
  }

  /// Extract this column's value from a user record
  pub fn value<'a>(&self, user: &'a User) -> &'a str {
    match self {
      UserColumn::Name => &user.name,
      UserColumn::Username => &user.username,
      UserColumn::Email => &user.email,
      UserColumn::Website => &user.website,
    }
  }
}

/// Sort direction for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
  Ascending,
  Descending,
}

impl SortDirection {
  pub fn toggled(self) -> Self {
    match self {
      SortDirection::Ascending => SortDirection::Descending,
      SortDirection::Descending => SortDirection::Ascending,
    }
  }
}

/// The active sort, at most one column at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
  pub column: UserColumn,
  pub direction: SortDirection,
}

/// A per-column filter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
  pub column: UserColumn,
  pub value: String,
}

/// The transient table state the projection derives from
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
  /// Free-text filter matched against every column
  pub global_filter: String,
  /// Per-column filters, composed with logical AND
  pub column_filters: Vec<ColumnFilter>,
  /// Active sort, if any
  pub sort: Option<SortState>,
}

/// Case-insensitive substring match. Both the global and the column
/// filters use this one convention.
fn matches_insensitive(haystack: &str, needle_lower: &str) -> bool {
  haystack.to_lowercase().contains(needle_lower)
}

/// Project the user list through filters and sort.
///
/// Returns references in display order, before pagination. An empty
/// global filter and no column filters pass everything through; with
/// no active sort the original (insertion) order is kept.
pub fn project<'a>(users: &'a [User], query: &TableQuery) -> Vec<&'a User> {
  let term = query.global_filter.trim().to_lowercase();

  let mut rows: Vec<&User> = users
    .iter()
    .filter(|user| {
      term.is_empty()
        || UserColumn::ALL
          .iter()
          .any(|col| matches_insensitive(col.value(user), &term))
    })
    .filter(|user| {
      query.column_filters.iter().all(|filter| {
        let value = filter.value.trim().to_lowercase();
        value.is_empty() || matches_insensitive(filter.column.value(user), &value)
      })
    })
    .collect();

  if let Some(sort) = query.sort {
    // sort_by is stable, so ties keep insertion order
    rows.sort_by(|a, b| {
      let ordering = sort.column.value(a).cmp(sort.column.value(b));
      match sort.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
      }
    });
  }

  rows
}

/// Number of pages for a filtered row count; never less than 1 so the
/// pagination controls stay valid on an empty result.
pub fn page_count(filtered: usize, page_size: usize) -> usize {
  if page_size == 0 {
    return 1;
  }
  filtered.div_ceil(page_size).max(1)
}

/// Clamp a 1-based page index into `[1, total_pages]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
  page.clamp(1, total_pages.max(1))
}

/// The rows of one 1-based page.
pub fn page_slice<'a, 'b>(rows: &'b [&'a User], page: usize, page_size: usize) -> &'b [&'a User] {
  let start = (page.max(1) - 1).saturating_mul(page_size).min(rows.len());
  let end = start.saturating_add(page_size).min(rows.len());
  &rows[start..end]
}
