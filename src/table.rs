/// Gridview Schema and Row Store
///
/// A dataset arrives as `{"cols": {...}, "rows": [...]}`, optionally wrapped
/// in a `{"d": ...}` envelope. `Schema::wash` normalises the column
/// declarations; `Row::from_json` turns each row object into typed cells.
///
/// # Examples
///
/// ```
/// use gridview::{Dataset, Schema};
///
/// let dataset = Dataset::from_json(r#"{
///     "cols": {"id": {"type": "number", "unique": true}, "name": {"index": 0}},
///     "rows": [{"id": 1, "name": "Alice"}]
/// }"#).unwrap();
///
/// let schema = Schema::wash(dataset.cols.clone());
/// assert_eq!(schema.unique_column().map(|c| c.name()), Some("id"));
/// assert!(schema.contains("unique"));
///
/// let row = dataset.rows(&schema).remove(0);
/// assert_eq!(row.get("name").to_string(), "Alice");
/// ```

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{GridError, Result};
use crate::expr::Highlight;
use crate::view::SortKey;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Name of the synthetic selection column.
pub const UNIQUE_COLUMN: &str = "unique";

/// Suffix of per-row display format keys, e.g. `priceFormat`.
const FORMAT_SUFFIX: &str = "Format";

static NULL_VALUE: ColumnValue = ColumnValue::Null;

/// The washed column declarations of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    columns: IndexMap<String, Column>,
}

impl Schema {
    /// Normalise raw column declarations.
    ///
    /// - the first column declared `unique` keeps the flag, later ones lose it
    /// - columns without an `index` are numbered after the highest explicit one,
    ///   in declaration order
    /// - when a unique column exists, a hidden `unique` column of type `unique`
    ///   with index -1 is added in front; a declared column of that name is
    ///   replaced
    pub fn wash(cols: IndexMap<String, Column>) -> Self {
        let max_index = cols.values().filter_map(|c| c.index).fold(None, |acc: Option<f64>, i| {
            Some(acc.map_or(i, |m| m.max(i)))
        });
        let mut next_index = max_index.map_or(0.0, |m| m.floor() + 1.0);

        let has_selection = cols.iter().any(|(name, c)| c.unique && name != UNIQUE_COLUMN);
        let mut columns = IndexMap::with_capacity(cols.len() + 1);
        let mut has_unique = false;

        for (name, mut col) in cols {
            if name == UNIQUE_COLUMN && has_selection {
                log::debug!("Replacing declared '{}' column with the selection column", name);
                continue;
            }
            col.set_name(name.as_str());

            if col.unique {
                if has_unique {
                    log::warn!("Column '{}' is marked unique but another column already is", name);
                    col.unique = false;
                }
                has_unique = true;
            }

            if col.index.is_none() {
                col.index = Some(next_index);
                next_index += 1.0;
            }

            columns.insert(name, col);
        }

        if has_selection {
            let selection = Column::new(UNIQUE_COLUMN, ColumnType::Unique)
                .with_index(-1.0)
                .with_hidden(true);
            columns.shift_insert(0, UNIQUE_COLUMN.to_string(), selection);
        }

        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns in declaration order, the selection column first.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).map(Column::column_type)
    }

    /// The column that identifies rows, if any.
    pub fn unique_column(&self) -> Option<&Column> {
        self.columns.values().find(|c| c.is_unique())
    }

    /// Sort taken from the first column declaring a `sortOrder`.
    pub fn initial_sort(&self) -> Option<SortKey> {
        self.columns
            .values()
            .find_map(|c| c.sort_order.map(|order| SortKey::new(c.name(), order)))
    }

    /// Visible columns by ascending index; ties keep declaration order.
    pub fn display_order(&self) -> Vec<&Column> {
        let mut visible: Vec<&Column> = self.columns.values().filter(|c| !c.is_hidden()).collect();
        visible.sort_by(|a, b| {
            let a = a.index.unwrap_or(0.0);
            let b = b.index.unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
        visible
    }

    /// One past the highest column index.
    pub fn next_index(&self) -> f64 {
        self.columns
            .values()
            .filter_map(|c| c.index)
            .fold(None, |acc: Option<f64>, i| Some(acc.map_or(i, |m| m.max(i))))
            .map_or(0.0, |m| m + 1.0)
    }

    /// Flip a column's visibility and move it to the end of the display order.
    ///
    /// Returns true when the column is now visible.
    pub fn toggle_visibility(&mut self, name: &str) -> Result<bool> {
        let index = self.next_index();
        let col = self
            .columns
            .get_mut(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))?;
        col.hidden = !col.hidden;
        col.index = Some(index);
        Ok(!col.hidden)
    }

    /// Column declarations as they would be sent back to a client.
    pub fn to_declarations(&self) -> IndexMap<String, Column> {
        self.columns
            .iter()
            .filter(|(name, _)| name.as_str() != UNIQUE_COLUMN)
            .map(|(name, col)| (name.clone(), col.clone()))
            .collect()
    }
}

/// One record of the dataset.
///
/// Besides the cell values a row carries its selection flags, per-cell
/// display formats (`<column>Format` keys of the payload) and, in the
/// filtered view, the highlight of each string filter match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: IndexMap<String, ColumnValue>,
    formats: IndexMap<String, String>,
    highlights: IndexMap<String, Highlight>,
    /// Selected on load.
    pub checked: Option<bool>,
    /// `Some(false)` rows cannot be selected.
    pub checkable: Option<bool>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Builder style setter, mostly for tests and demos.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Build a row from a JSON object, typing cells by the schema.
    ///
    /// `checked`, `checkable` and `<column>Format` keys (for declared
    /// columns) are lifted out of the cell values. Keys the schema does not
    /// declare are kept as untyped cells.
    pub fn from_json(object: &JsonMap<String, JsonValue>, schema: &Schema) -> Self {
        let mut row = Row::new();

        for (key, value) in object {
            match key.as_str() {
                "checked" => row.checked = Some(json_truthy(value)),
                "checkable" => row.checkable = Some(json_truthy(value)),
                _ => {
                    if let Some(column) = format_target(key, schema) {
                        if !schema.contains(key) {
                            if let JsonValue::String(format) = value {
                                row.formats.insert(column.to_string(), format.clone());
                                continue;
                            }
                        }
                    }
                    let column_type = schema.column_type(key).unwrap_or_default();
                    row.values.insert(key.clone(), ColumnValue::from_json(value, column_type));
                }
            }
        }

        row
    }

    /// Cell value, `Null` when absent.
    pub fn get(&self, column: &str) -> &ColumnValue {
        self.values.get(column).unwrap_or(&NULL_VALUE)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<ColumnValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn values(&self) -> &IndexMap<String, ColumnValue> {
        &self.values
    }

    /// Selection key of the row's value in `column`, `None` when absent.
    pub fn value_key(&self, column: &str) -> Option<String> {
        let value = self.get(column);
        (!value.is_null()).then(|| value.selection_key())
    }

    pub fn format(&self, column: &str) -> Option<&str> {
        self.formats.get(column).map(String::as_str)
    }

    pub fn set_format(&mut self, column: impl Into<String>, format: impl Into<String>) {
        self.formats.insert(column.into(), format.into());
    }

    pub fn highlight(&self, column: &str) -> Option<&Highlight> {
        self.highlights.get(column)
    }

    pub fn highlights(&self) -> &IndexMap<String, Highlight> {
        &self.highlights
    }

    pub(crate) fn set_highlight(&mut self, column: &str, highlight: Highlight) {
        self.highlights.insert(column.to_string(), highlight);
    }

    pub fn strip_highlights(&mut self) {
        self.highlights.clear();
    }

    /// False only for rows explicitly marked `checkable: false`.
    pub fn is_checkable(&self) -> bool {
        self.checkable != Some(false)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (column, value) in &self.values {
            map.serialize_entry(column, &value.to_json())?;
        }
        if let Some(checked) = self.checked {
            map.serialize_entry("checked", &checked)?;
        }
        if let Some(checkable) = self.checkable {
            map.serialize_entry("checkable", &checkable)?;
        }
        for (column, format) in &self.formats {
            map.serialize_entry(&format!("{}{}", column, FORMAT_SUFFIX), format)?;
        }
        if !self.highlights.is_empty() {
            map.serialize_entry("_highlights", &self.highlights)?;
        }
        map.end()
    }
}

/// `priceFormat` targets `price` when `price` is a declared column.
fn format_target<'a>(key: &'a str, schema: &Schema) -> Option<&'a str> {
    key.strip_suffix(FORMAT_SUFFIX)
        .filter(|column| !column.is_empty() && schema.contains(column))
}

fn json_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// A raw dataset payload: column declarations plus row objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub cols: IndexMap<String, Column>,
    pub rows: Vec<JsonMap<String, JsonValue>>,
}

impl Dataset {
    pub fn new(cols: IndexMap<String, Column>, rows: Vec<JsonMap<String, JsonValue>>) -> Self {
        Dataset { cols, rows }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode a payload, unwrapping a `{"d": {"cols": ...}}` envelope.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let value = match value {
            JsonValue::Object(mut object)
                if object.get("d").and_then(|d| d.get("cols")).is_some() =>
            {
                object.remove("d").unwrap_or_default()
            }
            other => other,
        };

        if !value.is_object() {
            return Err(GridError::InvalidDataset("expected an object with cols and rows".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Typed rows under the given schema.
    pub fn rows(&self, schema: &Schema) -> Vec<Row> {
        self.rows.iter().map(|object| Row::from_json(object, schema)).collect()
    }
}

/// The loaded rows and the views derived from them.
///
/// `filtered` is the filter stage output in load order; `view` is that
/// output after sorting. Keeping both lets a sort change rerun the sort
/// stage alone without depending on the previous sort.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    original: Vec<Row>,
    filtered: Vec<Row>,
    view: Vec<Row>,
}

impl RowStore {
    pub fn new(rows: Vec<Row>) -> Self {
        RowStore {
            filtered: rows.clone(),
            view: rows.clone(),
            original: rows,
        }
    }

    /// Rows in load order. Never reordered or filtered.
    pub fn original(&self) -> &[Row] {
        &self.original
    }

    /// Rows that passed every filter, in load order.
    pub fn filtered(&self) -> &[Row] {
        &self.filtered
    }

    /// Rows that passed every filter, in sort order.
    pub fn view(&self) -> &[Row] {
        &self.view
    }

    pub fn set_filtered(&mut self, rows: Vec<Row>) {
        self.filtered = rows;
    }

    pub fn set_view(&mut self, view: Vec<Row>) {
        self.view = view;
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}
