/// Gridview Column Implementation
///
/// A `Column` is the declaration of one named field of the dataset: its
/// type, whether it identifies rows, its initial sort and filter, and the
/// display hints the renderer consumes. Cell contents are `ColumnValue`s.
///
/// Values of `date` columns are stored as milliseconds since the Unix epoch.

use crate::expr::FilterValue;
use crate::view::SortOrder;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
    Bool,
    /// The synthetic selection column.
    Unique,
    /// No filtering; also used for unrecognised type names.
    #[serde(other)]
    None,
}

/// Cell value enum to support multiple types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnValue {
    /// Absent cell (missing key or JSON null)
    #[default]
    Null,
    String(String),
    Number(f64),
    Bool(bool),
    /// Milliseconds since the Unix epoch
    Date(i64),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date_ms(&self) -> Option<i64> {
        match self {
            ColumnValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value used by range filters and sorting.
    ///
    /// Dates convert to epoch milliseconds, booleans to 1/0 and strings are
    /// parsed as decimal numbers. Empty, non-numeric or non-finite strings
    /// (`NaN`, `inf`) and absent cells have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Number(n) => Some(*n),
            ColumnValue::Date(ms) => Some(*ms as f64),
            ColumnValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ColumnValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
                }
            }
            ColumnValue::Null => None,
        }
    }

    /// Truthiness as the filter row checkbox sees it.
    pub fn is_truthy(&self) -> bool {
        match self {
            ColumnValue::Null => false,
            ColumnValue::String(s) => !s.is_empty(),
            ColumnValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ColumnValue::Bool(b) => *b,
            ColumnValue::Date(_) => true,
        }
    }

    /// Key under which a row carrying this unique value is selected.
    ///
    /// Keys are the stringified value, so `42` and `"42"` identify the same row.
    pub fn selection_key(&self) -> String {
        self.to_string()
    }

    /// Convert a JSON cell into a value for a column of the given type.
    pub fn from_json(value: &JsonValue, column_type: ColumnType) -> ColumnValue {
        match value {
            JsonValue::Null => ColumnValue::Null,
            JsonValue::Bool(b) => ColumnValue::Bool(*b),
            JsonValue::Number(n) => match (column_type, n.as_f64()) {
                (ColumnType::Date, Some(ms)) => ColumnValue::Date(ms as i64),
                (_, Some(f)) => ColumnValue::Number(f),
                (_, None) => ColumnValue::String(n.to_string()),
            },
            JsonValue::String(s) => {
                if column_type == ColumnType::Date {
                    if let Some(ms) = parse_date_ms(s) {
                        return ColumnValue::Date(ms);
                    }
                }
                ColumnValue::String(s.clone())
            }
            other => ColumnValue::String(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            ColumnValue::Null => JsonValue::Null,
            ColumnValue::String(s) => JsonValue::String(s.clone()),
            ColumnValue::Bool(b) => JsonValue::Bool(*b),
            ColumnValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
                    JsonValue::Number((*n as i64).into())
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(JsonValue::Number)
                        .unwrap_or(JsonValue::Null)
                }
            }
            ColumnValue::Date(ms) => JsonValue::String(format_date_ms(*ms)),
        }
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => Ok(()),
            ColumnValue::String(s) => f.write_str(s),
            ColumnValue::Number(n) => f.write_str(&format_number(*n)),
            ColumnValue::Bool(b) => write!(f, "{}", b),
            ColumnValue::Date(ms) => f.write_str(&format_date_ms(*ms)),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::String(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::String(v)
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Number(v)
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Number(v as f64)
    }
}

impl From<i32> for ColumnValue {
    fn from(v: i32) -> Self {
        ColumnValue::Number(v as f64)
    }
}

impl From<bool> for ColumnValue {
    fn from(v: bool) -> Self {
        ColumnValue::Bool(v)
    }
}

/// Integral numbers print without a fractional part, like `String(n)` in a browser.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Format epoch milliseconds as an RFC 3339 UTC timestamp.
pub fn format_date_ms(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ms.to_string(),
    }
}

/// Parse an ISO 8601 / RFC 3339 date or datetime to epoch milliseconds.
///
/// Strings without an offset are read as UTC.
pub fn parse_date_ms(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// A column declaration as found under `cols` in a dataset payload.
///
/// Only `type`, `unique`, `sortOrder`, `index`, `hidden` and `filter` drive
/// grid behaviour; the remaining fields are display hints passed through to
/// the renderer untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(skip)]
    name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_sort_order",
        deserialize_with = "deserialize_sort_order"
    )]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterValue>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn serialize_sort_order<S: Serializer>(order: &Option<SortOrder>, serializer: S) -> Result<S::Ok, S::Error> {
    match order {
        Some(SortOrder::Ascending) => serializer.serialize_str("asc"),
        Some(SortOrder::Descending) => serializer.serialize_str("desc"),
        None => serializer.serialize_none(),
    }
}

/// `"asc"` sorts ascending; any other string sorts descending.
fn deserialize_sort_order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SortOrder>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| {
        if s.eq_ignore_ascii_case("asc") {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }))
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Column {
            name: name.into(),
            column_type,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// False when the declaration turns the filter input off (`filter: false`).
    pub fn filterable(&self) -> bool {
        !matches!(self.filter, Some(FilterValue::Flag(false)))
    }

    /// Initial filter expression declared with `filter: "<text>"`.
    pub fn initial_filter(&self) -> Option<&str> {
        match &self.filter {
            Some(FilterValue::Text(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn with_index(mut self, index: f64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_filter(mut self, filter: FilterValue) -> Self {
        self.filter = Some(filter);
        self
    }
}
