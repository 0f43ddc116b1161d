//! Filter and sort directives.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::error::{BridgeError, Result};

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    /// Equals.
    #[default]
    Eq,
    /// Not equal.
    Neq,
    /// SQL `LIKE`; `%` is the wildcard.
    Like,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Gteq,
    /// Less than or equal.
    Lteq,
    /// Value is one of a comma-separated list.
    In,
    /// Value is none of a comma-separated list.
    Nin,
    /// Field is null.
    Null,
    /// Field is not null.
    Notnull,
    /// Value is contained in a comma-separated set column.
    Finset,
    /// Range start, inclusive.
    From,
    /// Range end, inclusive.
    To,
    /// More than or equal.
    Moreq,
}

impl ConditionType {
    /// Wire name used in `condition_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Like => "like",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gteq => "gteq",
            Self::Lteq => "lteq",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Null => "null",
            Self::Notnull => "notnull",
            Self::Finset => "finset",
            Self::From => "from",
            Self::To => "to",
            Self::Moreq => "moreq",
        }
    }

    /// Whether this condition takes a list value.
    #[must_use]
    pub const fn accepts_list(self) -> bool {
        matches!(self, Self::In | Self::Nin)
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter operand.
///
/// Deserializes from a JSON string, number, boolean, or array of those.
/// Defaults to empty text, the operand `null` and `notnull` filters carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FilterValue {
    /// `true`/`false`, sent as `1`/`0`.
    Bool(bool),
    /// Integer or decimal, sent in decimal notation.
    Number(Number),
    /// Free text, sent as-is.
    Text(String),
    /// List for `in`/`nin`, sent comma-joined.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Renders the value in its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ValidationError`] for nested lists.
    pub fn to_query_value(&self) -> Result<String> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::List(_) => Err(BridgeError::ValidationError(
                        "filter value lists must not be nested".to_owned(),
                    )),
                    scalar => scalar.to_query_value(),
                })
                .collect::<Result<Vec<_>>>()
                .map(|parts| parts.join(",")),
            Self::Bool(b) => Ok(if *b { "1" } else { "0" }.to_owned()),
            Self::Number(n) => Ok(decimal_string(n)),
            Self::Text(s) => Ok(s.clone()),
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

// `Number`'s own formatting switches to exponent notation for small and
// large floats; `f64` display never does.
fn decimal_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// One `field <condition> value` restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Attribute code to filter on, e.g. `name` or `created_at`.
    pub field: String,
    /// Operand; may be omitted for `null` and `notnull`.
    #[serde(default)]
    pub value: FilterValue,
    /// Comparison; defaults to `eq`.
    #[serde(default)]
    pub condition_type: ConditionType,
}

impl Filter {
    /// Creates a filter.
    pub fn new(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
        condition_type: ConditionType,
    ) -> Self {
        Self { field: field.into(), value: value.into(), condition_type }
    }

    /// Creates an `eq` filter.
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, value, ConditionType::Eq)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            return Err(BridgeError::ValidationError("filter field must not be empty".to_owned()));
        }
        if matches!(self.value, FilterValue::List(_)) && !self.condition_type.accepts_list() {
            return Err(BridgeError::ValidationError(format!(
                "filter on {} uses a list value, which requires condition type in or nin, got {}",
                self.field, self.condition_type
            )));
        }
        Ok(())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Wire name used in `direction`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortDirection {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(BridgeError::ValidationError(format!(
                "sort direction must be ASC or DESC, got {s}"
            )))
        }
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One sort key; earlier entries take priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SortOrder {
    /// Attribute code to sort by.
    pub field: String,
    /// Direction; defaults to `ASC`.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrder {
    /// Creates a sort order.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            return Err(BridgeError::ValidationError("sort field must not be empty".to_owned()));
        }
        Ok(())
    }
}
