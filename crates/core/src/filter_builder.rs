//! Report filter builder (report builder, import mapping screens).
//!
//! Holds an ordered list of `(field, operator, value)` filters against a
//! declared field schema. Every update is normalized so the value always has
//! the shape its operator needs:
//!
//! 1. a field change resets the operator to the first one valid for the new
//!    field's type and clears the value,
//! 2. operators without a value (`IS_NULL`, `IS_NOT_NULL`) clear the value,
//! 3. `BETWEEN` always holds a two-element list,
//! 4. `IN` always holds a list.
//!
//! The operator set per field type is external configuration
//! ([`OperatorTable`]); a standard table ships as its `Default`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

/// Declared type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Choice,
}

impl FieldType {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "boolean" => Ok(Self::Boolean),
            "choice" => Ok(Self::Choice),
            _ => Err(CoreError::Validation(format!(
                "Invalid field type '{s}'. Must be one of: string, number, date, boolean, choice"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Choice => "choice",
        }
    }
}

/// One enumerated value of a `choice` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Schema entry for a filterable field of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Unique key, possibly dotted (`"employee.department"`).
    pub path: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl FieldInfo {
    pub fn new(path: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            field_type,
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Comparison operator, serialized as its wire string (`"="`, `"BETWEEN"`).
///
/// Operators the table introduces that this crate does not know are kept
/// verbatim in [`Operator::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
    Other(String),
}

impl Operator {
    pub fn parse(s: &str) -> Self {
        match s {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            "LIKE" => Self::Like,
            "IN" => Self::In,
            "BETWEEN" => Self::Between,
            "IS_NULL" => Self::IsNull,
            "IS_NOT_NULL" => Self::IsNotNull,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::IsNull => "IS_NULL",
            Self::IsNotNull => "IS_NOT_NULL",
            Self::Other(s) => s,
        }
    }

    /// `false` for the null checks, which take no operand.
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator as offered in the operator dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorOption {
    pub operator: Operator,
    pub label: String,
}

impl OperatorOption {
    pub fn new(operator: Operator, label: &str) -> Self {
        Self {
            operator,
            label: label.to_string(),
        }
    }
}

/// Ordered operator lists per field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorTable {
    by_type: HashMap<FieldType, Vec<OperatorOption>>,
}

impl OperatorTable {
    pub fn new(by_type: HashMap<FieldType, Vec<OperatorOption>>) -> Self {
        Self { by_type }
    }

    /// Operators valid for `field_type`, in display order.
    pub fn operators_for(&self, field_type: FieldType) -> &[OperatorOption] {
        self.by_type
            .get(&field_type)
            .map_or(&[] as &[OperatorOption], Vec::as_slice)
    }

    /// The operator a filter starts with after its field changes. Falls back
    /// to `=` when the table has no entry for the type.
    pub fn first_operator(&self, field_type: FieldType) -> Operator {
        self.operators_for(field_type)
            .first()
            .map_or(Operator::Eq, |opt| opt.operator.clone())
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        let null_checks = || {
            vec![
                OperatorOption::new(Operator::IsNull, "is empty"),
                OperatorOption::new(Operator::IsNotNull, "is not empty"),
            ]
        };
        let ordered = |between_label: &str| {
            let mut ops = vec![
                OperatorOption::new(Operator::Eq, "equals"),
                OperatorOption::new(Operator::Ne, "not equals"),
                OperatorOption::new(Operator::Gt, "greater than"),
                OperatorOption::new(Operator::Gte, "greater or equal"),
                OperatorOption::new(Operator::Lt, "less than"),
                OperatorOption::new(Operator::Lte, "less or equal"),
                OperatorOption::new(Operator::Between, between_label),
            ];
            ops.extend(null_checks());
            ops
        };

        let mut string = vec![
            OperatorOption::new(Operator::Like, "contains"),
            OperatorOption::new(Operator::Eq, "equals"),
            OperatorOption::new(Operator::Ne, "not equals"),
            OperatorOption::new(Operator::In, "in list"),
        ];
        string.extend(null_checks());

        let mut boolean = vec![OperatorOption::new(Operator::Eq, "is")];
        boolean.extend(null_checks());

        let mut choice = vec![
            OperatorOption::new(Operator::Eq, "is"),
            OperatorOption::new(Operator::Ne, "is not"),
            OperatorOption::new(Operator::In, "is any of"),
        ];
        choice.extend(null_checks());

        Self::new(HashMap::from([
            (FieldType::String, string),
            (FieldType::Number, ordered("between")),
            (FieldType::Date, ordered("between dates")),
            (FieldType::Boolean, boolean),
            (FieldType::Choice, choice),
        ]))
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Boolean fields are edited as a tri-state select over these strings.
pub const BOOL_TRUE: &str = "true";
pub const BOOL_FALSE: &str = "false";

/// The operand of a filter: nothing, one string, or a list of strings. A
/// `BETWEEN` range is a two-element list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Empty,
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn pair(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self::List(vec![low.into(), high.into()])
    }

    /// `true` for `Empty` and the empty string.
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::List(_) => false,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Self::List(items) if items.len() == 2)
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&str, &str)> {
        match self {
            Self::List(items) if items.len() == 2 => Some((items[0].as_str(), items[1].as_str())),
            _ => None,
        }
    }

    /// The single operand of a scalar comparison. A one-element list counts,
    /// so switching from `IN` to `=` keeps a single selection usable.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::List(items) if items.len() == 1 => Some(items[0].as_str()),
            _ => None,
        }
    }
}

/// A single `(field, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// A [`FieldInfo::path`], or empty until a field is picked.
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self {
            field: String::new(),
            operator: Operator::Eq,
            value: FilterValue::Text(String::new()),
        }
    }
}

/// A partial update merged into a filter by [`FilterBuilder::update_filter`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterPatch {
    pub field: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<FilterValue>,
}

impl FilterPatch {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Default::default()
        }
    }

    pub fn operator(operator: impl Into<Operator>) -> Self {
        Self {
            operator: Some(operator.into()),
            ..Default::default()
        }
    }

    pub fn value(value: FilterValue) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Value input shape
// ---------------------------------------------------------------------------

/// The editor to render for a filter's value. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput<'a> {
    /// The operator takes no value.
    None,
    /// Two linked inputs for a `BETWEEN` range.
    Range,
    /// Multi-select over the field's choices.
    MultiSelect(&'a [Choice]),
    /// Single select over the field's choices.
    ChoiceSelect(&'a [Choice]),
    /// Unset / `"true"` / `"false"`.
    TriState,
    Date,
    Number,
    Text,
}

/// Pick the value editor. Several rules can apply at once (a `choice`
/// field given `BETWEEN`), so the arms are in strict priority order.
pub fn value_input<'a>(operator: &Operator, field: Option<&'a FieldInfo>) -> ValueInput<'a> {
    let field_type = field.map_or(FieldType::String, |f| f.field_type);
    let choices = field.map_or(&[] as &[Choice], |f| f.choices.as_slice());

    match (operator, field_type, !choices.is_empty()) {
        (op, _, _) if !op.requires_value() => ValueInput::None,
        (Operator::Between, _, _) => ValueInput::Range,
        (Operator::In, _, true) => ValueInput::MultiSelect(choices),
        (Operator::Eq | Operator::Ne, FieldType::Choice, _) => ValueInput::ChoiceSelect(choices),
        (_, FieldType::Boolean, _) => ValueInput::TriState,
        (_, FieldType::Date, _) => ValueInput::Date,
        (_, FieldType::Number, _) => ValueInput::Number,
        _ => ValueInput::Text,
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Look up a field's declared type; unknown or empty paths are strings.
pub fn field_type_of(fields: &[FieldInfo], path: &str) -> FieldType {
    fields
        .iter()
        .find(|f| f.path == path)
        .map_or(FieldType::String, |f| f.field_type)
}

/// Apply rules 2-4 to a filter whose operator is already final.
pub fn normalize_value(filter: &mut ReportFilter) {
    if !filter.operator.requires_value() {
        filter.value = FilterValue::Empty;
    }
    match filter.operator {
        Operator::Between if !filter.value.is_pair() => {
            filter.value = FilterValue::pair("", "");
        }
        Operator::In if !filter.value.is_list() => {
            filter.value = FilterValue::List(Vec::new());
        }
        _ => {}
    }
}

/// Filter list editor bound to one data source's schema.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    fields: Vec<FieldInfo>,
    operators: OperatorTable,
    filters: Vec<ReportFilter>,
}

impl FilterBuilder {
    pub fn new(fields: Vec<FieldInfo>, operators: OperatorTable) -> Self {
        Self {
            fields,
            operators,
            filters: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn filters(&self) -> &[ReportFilter] {
        &self.filters
    }

    pub fn field_info(&self, path: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Operators to offer for the filter's current field.
    pub fn operators_for(&self, filter: &ReportFilter) -> &[OperatorOption] {
        self.operators
            .operators_for(field_type_of(&self.fields, &filter.field))
    }

    /// Editor for the filter's value.
    pub fn value_input(&self, filter: &ReportFilter) -> ValueInput<'_> {
        value_input(&filter.operator, self.field_info(&filter.field))
    }

    /// Append an empty filter and return its index.
    pub fn add_filter(&mut self) -> usize {
        self.filters.push(ReportFilter::default());
        self.filters.len() - 1
    }

    pub fn remove_filter(&mut self, index: usize) -> Result<ReportFilter, CoreError> {
        if index >= self.filters.len() {
            return Err(out_of_range(index, self.filters.len()));
        }
        Ok(self.filters.remove(index))
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Merge `patch` into the filter at `index`, then normalize.
    pub fn update_filter(
        &mut self,
        index: usize,
        patch: FilterPatch,
    ) -> Result<&ReportFilter, CoreError> {
        let len = self.filters.len();
        let filter = self
            .filters
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;

        let field_changed = patch.field.as_ref().is_some_and(|f| *f != filter.field);
        if let Some(field) = patch.field {
            filter.field = field;
        }
        if let Some(operator) = patch.operator {
            filter.operator = operator;
        }
        if let Some(value) = patch.value {
            filter.value = value;
        }

        if field_changed {
            let field_type = field_type_of(&self.fields, &filter.field);
            filter.operator = self.operators.first_operator(field_type);
            filter.value = FilterValue::Text(String::new());
        }
        normalize_value(filter);

        Ok(&*filter)
    }
}

fn out_of_range(index: usize, len: usize) -> CoreError {
    CoreError::Validation(format!(
        "Filter index {index} is out of range (filter count: {len})"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
