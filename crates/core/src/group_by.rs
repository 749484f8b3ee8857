//! Group-by with per-group and grand totals.
//!
//! Grouping is a partition: every record lands in exactly one group, and
//! records with a null or missing group value go to [`UNASSIGNED_LABEL`].
//! Without a group field the whole collection becomes one unlabeled group,
//! so grouped and ungrouped tables render through the same path.
//!
//! Totals coerce every value with `Number(v) || 0` semantics; bad data adds
//! zero instead of failing.

use indexmap::IndexMap;

use crate::collate::compare_locale;
use crate::record::{coerce_field, display_value, present, Record};

/// Label of the bucket for records without a group value.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Label of the single group produced when no group field is selected.
///
/// An empty-string group value also renders as `""`. Only null and missing
/// values count as unassigned, so with a group field selected a `""` group
/// means records whose value is the empty string.
pub const UNGROUPED_LABEL: &str = "";

/// Sums keyed by numeric field, in the order the keys were requested.
pub type Totals = IndexMap<String, f64>;

/// A labeled partition of the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, R> {
    pub label: String,
    pub items: Vec<&'a R>,
    pub totals: Totals,
}

/// Groups in label order plus totals over the full collection.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedView<'a, R> {
    pub groups: Vec<Group<'a, R>>,
    pub grand_totals: Totals,
}

impl<R> GroupedView<'_, R> {
    /// Number of records across all groups.
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}

/// Sum each of `keys` over `items`.
pub fn sum_totals<R: Record>(items: &[&R], keys: &[&str]) -> Totals {
    keys.iter()
        .map(|key| {
            let total = items
                .iter()
                .map(|item| coerce_field(item.field(key)))
                .sum::<f64>();
            ((*key).to_string(), total)
        })
        .collect()
}

/// Partition `items` by `field` and total `sum_keys` per group.
pub fn group_by<'a, R: Record>(
    items: &'a [R],
    field: Option<&str>,
    sum_keys: &[&str],
) -> GroupedView<'a, R> {
    let all: Vec<&R> = items.iter().collect();
    let grand_totals = sum_totals(&all, sum_keys);

    let Some(field) = field else {
        let totals = grand_totals.clone();
        return GroupedView {
            groups: vec![Group {
                label: UNGROUPED_LABEL.to_string(),
                items: all,
                totals,
            }],
            grand_totals,
        };
    };

    let mut buckets: IndexMap<String, Vec<&R>> = IndexMap::new();
    for item in items {
        let label = present(item, field)
            .map(display_value)
            .unwrap_or_else(|| UNASSIGNED_LABEL.to_string());
        buckets.entry(label).or_default().push(item);
    }
    buckets.sort_by(|a, _, b, _| compare_locale(a, b));

    let groups = buckets
        .into_iter()
        .map(|(label, items)| {
            let totals = sum_totals(&items, sum_keys);
            Group {
                label,
                items,
                totals,
            }
        })
        .collect();

    GroupedView {
        groups,
        grand_totals,
    }
}
