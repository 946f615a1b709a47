//! Pagination window: the compact run of page-number controls shown
//! under the table, with ellipsis markers for skipped ranges.

/// One slot in the pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
  Page(usize),
  Ellipsis,
}

/// Terminals narrower than this get the compact 3-slot window
pub const NARROW_WIDTH: u16 = 70;

/// How many page numbers fit around the current one, adapted to the
/// render area width.
pub fn max_visible_for_width(width: u16) -> usize {
  if width < NARROW_WIDTH {
    3
  } else {
    5
  }
}

/// Build the window of page controls for `current` out of `total`
/// pages.
///
/// A run of `max_visible` pages is centered on the current page and
/// shifted back into range at the edges; page 1 and the last page are
/// always present, with an ellipsis wherever a range was skipped.
pub fn window(current: usize, total: usize, max_visible: usize) -> Vec<PageItem> {
  if total == 0 || max_visible == 0 {
    return Vec::new();
  }

  // Out-of-range pages are the caller's bug to correct, but the window
  // itself must still be well-formed
  let current = current.clamp(1, total);

  let half = max_visible / 2;
  let mut start = current.saturating_sub(half).max(1);
  let end = total.min(start + max_visible - 1);
  if end + 1 - start < max_visible {
    start = (end + 1).saturating_sub(max_visible).max(1);
  }

  let mut items = Vec::new();

  if start > 1 {
    items.push(PageItem::Page(1));
    if start > 2 {
      items.push(PageItem::Ellipsis);
    }
  }

  for page in start..=end {
    items.push(PageItem::Page(page));
  }

  if end < total {
    if end < total - 1 {
      items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total));
  }

  items
}

#[cfg(test)]
mod tests {
  use super::*;
  use PageItem::{Ellipsis, Page};

  fn pages(items: &[PageItem]) -> Vec<usize> {
    items
      .iter()
      .filter_map(|item| match item {
        Page(n) => Some(*n),
        Ellipsis => None,
      })
      .collect()
  }

  #[test]
  fn test_total_fits_in_window() {
    assert_eq!(window(1, 3, 5), vec![Page(1), Page(2), Page(3)]);
    assert_eq!(window(1, 1, 5), vec![Page(1)]);
  }

  #[test]
  fn test_middle_page_has_both_ellipses() {
    let items = window(6, 12, 5);
    assert_eq!(
      items,
      vec![
        Page(1),
        Ellipsis,
        Page(4),
        Page(5),
        Page(6),
        Page(7),
        Page(8),
        Ellipsis,
        Page(12),
      ]
    );
  }

  #[test]
  fn test_near_start_has_trailing_ellipsis_only() {
    let items = window(2, 12, 5);
    assert_eq!(
      items,
      vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(12)]
    );
  }

  #[test]
  fn test_near_end_has_leading_ellipsis_only() {
    let items = window(11, 12, 5);
    assert_eq!(
      items,
      vec![Page(1), Ellipsis, Page(8), Page(9), Page(10), Page(11), Page(12)]
    );
  }

  #[test]
  fn test_no_ellipsis_for_adjacent_boundary() {
    // Window starts at page 2: page 1 is adjacent, no gap to mark
    let items = window(4, 12, 5);
    assert_eq!(
      items,
      vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(12)]
    );
  }

  #[test]
  fn test_narrow_window() {
    let items = window(6, 12, 3);
    assert_eq!(
      items,
      vec![Page(1), Ellipsis, Page(5), Page(6), Page(7), Ellipsis, Page(12)]
    );
  }

  #[test]
  fn test_first_and_last_always_present_without_duplicates() {
    for total in 1..=15 {
      for current in 1..=total {
        for max_visible in [3, 5] {
          let items = window(current, total, max_visible);
          let nums = pages(&items);

          assert_eq!(nums.first(), Some(&1), "window({current},{total},{max_visible})");
          assert_eq!(nums.last(), Some(&total), "window({current},{total},{max_visible})");

          let mut sorted = nums.clone();
          sorted.dedup();
          assert_eq!(sorted, nums, "duplicates in window({current},{total},{max_visible})");
        }
      }
    }
  }

  #[test]
  fn test_ellipsis_only_across_real_gaps() {
    for total in 1..=15 {
      for current in 1..=total {
        for max_visible in [3, 5] {
          let items = window(current, total, max_visible);
          for pair in items.windows(2) {
            if let [Page(a), Page(b)] = pair {
              assert_eq!(b - a, 1, "pages {a},{b} adjacent without ellipsis");
            }
          }
          for triple in items.windows(3) {
            if let [Page(a), Ellipsis, Page(b)] = triple {
              assert!(b - a >= 2, "ellipsis between consecutive pages {a},{b}");
            }
          }
        }
      }
    }
  }

  #[test]
  fn test_zero_total_is_empty() {
    assert!(window(1, 0, 5).is_empty());
  }

  #[test]
  fn test_out_of_range_current_is_clamped() {
    assert_eq!(window(9, 3, 5), vec![Page(1), Page(2), Page(3)]);
    assert_eq!(window(0, 3, 5), vec![Page(1), Page(2), Page(3)]);
  }

  #[test]
  fn test_width_breakpoint() {
    assert_eq!(max_visible_for_width(40), 3);
    assert_eq!(max_visible_for_width(69), 3);
    assert_eq!(max_visible_for_width(70), 5);
    assert_eq!(max_visible_for_width(120), 5);
  }
}
