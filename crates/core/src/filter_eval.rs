//! Client-side evaluation of report filters.
//!
//! Most report sources filter on the server, but the report builder also
//! narrows already-fetched rows locally. Filters are ANDed. A filter with no
//! field, or whose value is still unfilled, does not restrict anything, so a
//! half-edited filter row never blanks the table.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::collate::compare_ignore_case;
use crate::filter_builder::{field_type_of, FieldInfo, FieldType, Operator, ReportFilter};
use crate::record::{display_value, is_blank, parse_numeric_str, Record};

impl ReportFilter {
    /// Whether the filter has enough input to restrict rows.
    pub fn is_active(&self) -> bool {
        if self.field.is_empty() {
            return false;
        }
        match &self.operator {
            Operator::IsNull | Operator::IsNotNull => true,
            Operator::Between => self
                .value
                .as_pair()
                .is_some_and(|(low, high)| !low.is_empty() || !high.is_empty()),
            Operator::In => self.value.as_list().is_some_and(|l| !l.is_empty()),
            _ => self.value.as_scalar().is_some_and(|s| !s.is_empty()),
        }
    }

    /// Test one record. Inactive filters and operators unknown to this crate
    /// accept everything; comparisons against a null field never match.
    pub fn matches<R: Record + ?Sized>(&self, record: &R, field_type: FieldType) -> bool {
        if !self.is_active() {
            return true;
        }
        let actual = record.field(&self.field);

        match &self.operator {
            Operator::IsNull => return is_blank(actual),
            Operator::IsNotNull => return !is_blank(actual),
            Operator::Other(_) => return true,
            _ => {}
        }

        let Some(actual) = actual.filter(|v| !v.is_null()) else {
            return false;
        };
        let cmp = |expected: &str| compare_typed(actual, expected, field_type);

        match &self.operator {
            Operator::Eq => cmp(self.scalar()) == Some(Ordering::Equal),
            Operator::Ne => cmp(self.scalar()) != Some(Ordering::Equal),
            Operator::Gt => cmp(self.scalar()) == Some(Ordering::Greater),
            Operator::Gte => matches!(cmp(self.scalar()), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Lt => cmp(self.scalar()) == Some(Ordering::Less),
            Operator::Lte => matches!(cmp(self.scalar()), Some(Ordering::Less | Ordering::Equal)),
            Operator::Like => contains_ignore_case(&display_value(actual), self.scalar()),
            Operator::In => self
                .value
                .as_list()
                .unwrap_or_default()
                .iter()
                .any(|v| cmp(v.as_str()) == Some(Ordering::Equal)),
            Operator::Between => {
                let (low, high) = self.value.as_pair().unwrap_or_default();
                let above = low.is_empty()
                    || matches!(cmp(low), Some(Ordering::Greater | Ordering::Equal));
                let below =
                    high.is_empty() || matches!(cmp(high), Some(Ordering::Less | Ordering::Equal));
                above && below
            }
            Operator::IsNull | Operator::IsNotNull | Operator::Other(_) => true,
        }
    }

    fn scalar(&self) -> &str {
        self.value.as_scalar().unwrap_or_default()
    }
}

/// Keep the records that pass every filter, in input order.
pub fn apply_filters<'a, R: Record>(
    items: &'a [R],
    filters: &[ReportFilter],
    fields: &[FieldInfo],
) -> Vec<&'a R> {
    let active: Vec<(&ReportFilter, FieldType)> = filters
        .iter()
        .filter(|f| f.is_active())
        .map(|f| (f, field_type_of(fields, &f.field)))
        .collect();

    items
        .iter()
        .filter(|item| active.iter().all(|(f, ft)| f.matches(*item, *ft)))
        .collect()
}

/// Compare a record value against a filter operand as the field's type.
/// `None` when the two cannot be compared (a non-numeric operand on a
/// number field).
fn compare_typed(actual: &Value, expected: &str, field_type: FieldType) -> Option<Ordering> {
    match field_type {
        FieldType::Number => {
            let a = match actual {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if !s.trim().is_empty() => parse_numeric_str(s),
                _ => None,
            }?;
            let b = parse_numeric_str(expected).filter(|_| !expected.trim().is_empty())?;
            a.partial_cmp(&b)
        }
        FieldType::Date => {
            let a = display_value(actual);
            match (parse_date(&a), parse_date(expected)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => Some(a.as_str().cmp(expected)),
            }
        }
        FieldType::Boolean => {
            let a = match actual {
                Value::Bool(b) => Some(*b),
                Value::String(s) => parse_bool(s),
                Value::Number(n) => n.as_f64().map(|f| f != 0.0),
                _ => None,
            }?;
            Some(a.cmp(&parse_bool(expected)?))
        }
        FieldType::String | FieldType::Choice => {
            Some(compare_ignore_case(&display_value(actual), expected))
        }
    }
}

/// Parse a date from the formats the API and date inputs produce. Times
/// are dropped; date filters compare whole days.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|dt| dt.date())
        })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
