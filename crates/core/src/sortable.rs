//! Single-column, tri-state sorting.
//!
//! Toggling a column cycles ascending -> descending -> unsorted. Switching
//! to another column always starts ascending. Sorting is stable and returns
//! borrowed views, so the source collection is never reordered.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collate::compare_ignore_case;
use crate::record::{display_value, present, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// The active sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

/// Header affordance for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIcon {
    Up,
    Down,
}

/// Sort controller. At most one column is sorted at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sortable {
    state: Option<SortState>,
}

impl Sortable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&SortState> {
        self.state.as_ref()
    }

    /// Advance the sort cycle for `field`.
    pub fn toggle_sort(&mut self, field: &str) {
        self.state = match self.state.take() {
            Some(SortState {
                field: current,
                direction: SortDirection::Asc,
            }) if current == field => Some(SortState {
                field: current,
                direction: SortDirection::Desc,
            }),
            Some(SortState {
                field: current,
                direction: SortDirection::Desc,
            }) if current == field => None,
            _ => Some(SortState {
                field: field.to_string(),
                direction: SortDirection::Asc,
            }),
        };
    }

    pub fn clear(&mut self) {
        self.state = None;
    }

    /// Icon for a column header: `Up` when sorted ascending on `field`,
    /// `Down` when descending, `None` otherwise.
    pub fn sort_icon(&self, field: &str) -> Option<SortIcon> {
        match &self.state {
            Some(state) if state.field == field => Some(match state.direction {
                SortDirection::Asc => SortIcon::Up,
                SortDirection::Desc => SortIcon::Down,
            }),
            _ => None,
        }
    }

    /// A sorted view of `items`. Unsorted state returns input order.
    pub fn sorted<'a, R: Record>(&self, items: &'a [R]) -> Vec<&'a R> {
        let mut view: Vec<&R> = items.iter().collect();
        let Some(state) = &self.state else {
            return view;
        };

        view.sort_by(|a, b| {
            match (present(*a, &state.field), present(*b, &state.field)) {
                (None, None) => Ordering::Equal,
                // Nulls are unknown, not low: last in both directions.
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    let ord = compare_values(x, y);
                    match state.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            }
        });
        view
    }
}

/// Compare two non-null values: numerically when both are JSON numbers,
/// otherwise as case-insensitive display strings.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    compare_ignore_case(&display_value(a), &display_value(b))
}
