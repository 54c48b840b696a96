/// Gridview filter and sort stages
///
/// The view shown to the user is always derived from the original rows:
/// every active filter is applied (they combine with AND), then the
/// survivors are sorted by the single sort column. Both stages are pure
/// functions of their inputs, so rerunning them with the same state gives
/// the same view.

use crate::column::{Column, ColumnType};
use crate::expr::{FilterValue, RangeFilter, StringFilter, StringMatch};
use crate::selection::SelectionTracker;
use crate::table::Row;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// Sort order specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (smallest first)
    Ascending,
    /// Descending order (largest first)
    Descending,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// The active sort: one column and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Column name to sort by
    pub column: String,
    /// Sort order (ascending or descending)
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey::new(column, SortOrder::Ascending)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        SortKey::new(column, SortOrder::Descending)
    }

    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        SortKey {
            column: column.into(),
            order,
        }
    }

    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Descending
    }

    /// Header click semantics: the same column flips direction, a new
    /// column starts ascending.
    pub fn toggled(current: Option<&SortKey>, column: &str) -> SortKey {
        match current {
            Some(key) if key.column == column => SortKey::new(column, key.order.reverse()),
            _ => SortKey::ascending(column),
        }
    }
}

/// A filter registered on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFilter {
    pub column: String,
    pub column_type: ColumnType,
    pub expression: FilterValue,
    /// String matches are highlighted unless the column has a display format.
    pub highlight: bool,
}

/// Active filters keyed by column, in the order they were first set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    filters: IndexMap<String, ActiveFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState::default()
    }

    /// Register or replace the filter of a column.
    pub fn set(&mut self, column: &Column, expression: FilterValue) {
        let filter = ActiveFilter {
            column: column.name().to_string(),
            column_type: column.column_type(),
            expression,
            highlight: column.format.is_none(),
        };
        self.filters.insert(filter.column.clone(), filter);
    }

    pub fn remove(&mut self, column: &str) -> Option<ActiveFilter> {
        self.filters.shift_remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&ActiveFilter> {
        self.filters.get(column)
    }

    pub fn expression(&self, column: &str) -> Option<&FilterValue> {
        self.filters.get(column).map(|f| &f.expression)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveFilter> {
        self.filters.values()
    }

    /// Drop entries whose expression is the empty sentinel.
    pub fn prune_inactive(&mut self) {
        self.filters.retain(|_, f| !f.expression.is_blank());
    }
}

/// What filters need besides the row itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Name of the column identifying rows.
    pub unique_column: Option<&'a str>,
    pub selection: &'a SelectionTracker,
    /// Start of today in epoch ms, the origin of date filter offsets.
    pub day_start_ms: f64,
}

/// A filter parsed once per run.
enum Compiled<'f> {
    Text(&'f ActiveFilter, StringFilter),
    Range(&'f ActiveFilter, RangeFilter, bool),
    Flag(&'f ActiveFilter, Option<bool>),
    Selected(Option<bool>),
    Pass,
}

impl<'f> Compiled<'f> {
    fn new(filter: &'f ActiveFilter) -> Self {
        match filter.column_type {
            ColumnType::String => {
                Compiled::Text(filter, StringFilter::parse(&filter.expression.as_text()))
            }
            ColumnType::Number => {
                Compiled::Range(filter, RangeFilter::parse(&filter.expression.as_text()), false)
            }
            ColumnType::Date => {
                Compiled::Range(filter, RangeFilter::parse(&filter.expression.as_text()), true)
            }
            ColumnType::Bool => Compiled::Flag(filter, filter.expression.as_flag()),
            ColumnType::Unique => Compiled::Selected(filter.expression.as_flag()),
            ColumnType::None => Compiled::Pass,
        }
    }

    /// Test a row, recording a string match highlight on it.
    fn accepts(&self, row: &mut Row, ctx: &FilterContext<'_>) -> bool {
        match self {
            Compiled::Text(filter, parsed) => {
                let value = row.get(&filter.column);
                let cell = (!value.is_null()).then(|| value.to_string());
                match parsed.matches(cell.as_deref()) {
                    StringMatch::Rejected => false,
                    StringMatch::Accepted => true,
                    StringMatch::Found(highlight) => {
                        if filter.highlight && row.format(&filter.column).is_none() {
                            row.set_highlight(&filter.column, highlight);
                        }
                        true
                    }
                }
            }
            Compiled::Range(filter, parsed, is_date) => {
                let day_start = is_date.then_some(ctx.day_start_ms);
                parsed.matches(row.get(&filter.column).as_f64(), day_start)
            }
            Compiled::Flag(filter, flag) => {
                let value = row.get(&filter.column);
                match flag {
                    None => true,
                    Some(wanted) => !value.is_null() && value.is_truthy() == *wanted,
                }
            }
            Compiled::Selected(flag) => {
                let selected = ctx
                    .unique_column
                    .and_then(|column| row.value_key(column))
                    .is_some_and(|key| ctx.selection.contains(&key));
                match flag {
                    None => true,
                    Some(wanted) => selected == *wanted,
                }
            }
            Compiled::Pass => true,
        }
    }
}

/// Run every active filter over `rows`, returning the survivors in order.
///
/// Returned rows carry fresh highlights; any highlight already on an input
/// row is dropped.
pub fn apply_filters(rows: &[Row], filters: &FilterState, ctx: &FilterContext<'_>) -> Vec<Row> {
    let start = Instant::now();
    let compiled: Vec<Compiled<'_>> = filters.iter().map(Compiled::new).collect();

    let view: Vec<Row> = rows
        .iter()
        .filter_map(|row| {
            let mut row = row.clone();
            row.strip_highlights();
            compiled
                .iter()
                .all(|filter| filter.accepts(&mut row, ctx))
                .then_some(row)
        })
        .collect();

    log::debug!(
        "Filtered {} rows to {} with {} filters in {:?}",
        rows.len(),
        view.len(),
        compiled.len(),
        start.elapsed()
    );
    view
}

/// Stable sort of `rows` by one column.
///
/// String columns compare case-insensitively on the displayed text, absent
/// cells reading as empty. Other columns compare numerically, absent or
/// non-numeric cells sorting below every number.
pub fn sort_rows(rows: Vec<Row>, column: &Column, order: SortOrder) -> Vec<Row> {
    let start = Instant::now();
    let name = column.name();
    let len = rows.len();

    let sorted = if column.column_type() == ColumnType::String {
        let mut keyed: Vec<(String, Row)> = rows
            .into_iter()
            .map(|row| (row.get(name).to_string().to_lowercase(), row))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| directed(a.cmp(b), order));
        keyed.into_iter().map(|(_, row)| row).collect::<Vec<_>>()
    } else {
        let mut keyed: Vec<(f64, Row)> = rows
            .into_iter()
            .map(|row| {
                let key = row.get(name).as_f64().filter(|v| !v.is_nan());
                (key.unwrap_or(f64::NEG_INFINITY), row)
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| directed(a.total_cmp(b), order));
        keyed.into_iter().map(|(_, row)| row).collect::<Vec<_>>()
    };

    log::debug!("Sorted {} rows by '{}' {:?} in {:?}", len, name, order, start.elapsed());
    sorted
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnValue;
    use crate::expr::Highlight;

    const DAY: f64 = crate::clock::DAY_MS;
    const TODAY: f64 = 19_000.0 * DAY;

    fn people() -> Vec<Row> {
        vec![
            Row::new().with("id", 1).with("name", "Ann").with("age", 30).with("active", true),
            Row::new().with("id", 2).with("name", "bob").with("age", 25).with("active", false),
            Row::new().with("id", 3).with("name", "Cara").with("age", 35),
            Row::new().with("id", 4).with("name", "dan").with("age", "n/a").with("active", true),
        ]
    }

    fn run(rows: &[Row], filters: &FilterState) -> Vec<Row> {
        let selection = SelectionTracker::new();
        let ctx = FilterContext {
            unique_column: Some("id"),
            selection: &selection,
            day_start_ms: TODAY,
        };
        apply_filters(rows, filters, &ctx)
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| r.get("id").to_string()).collect()
    }

    #[test]
    fn test_sort_key_toggle() {
        let key = SortKey::toggled(None, "age");
        assert_eq!(key, SortKey::ascending("age"));
        let key = SortKey::toggled(Some(&key), "age");
        assert_eq!(key, SortKey::descending("age"));
        let key = SortKey::toggled(Some(&key), "name");
        assert_eq!(key, SortKey::ascending("name"));
    }

    #[test]
    fn test_filter_state_prune() {
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::String), FilterValue::text("a"));
        state.set(&Column::new("age", ColumnType::Number), FilterValue::text(""));
        state.set(&Column::new("active", ColumnType::Bool), FilterValue::Flag(false));
        state.prune_inactive();
        assert_eq!(state.len(), 2);
        assert!(state.get("age").is_none());
        assert_eq!(state.expression("active"), Some(&FilterValue::Flag(false)));
    }

    #[test]
    fn test_string_filter_highlights() {
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::String), FilterValue::text("A"));
        let view = run(&people(), &state);
        assert_eq!(ids(&view), vec!["1", "3", "4"]);
        assert_eq!(
            view[1].highlight("name"),
            Some(&Highlight { pre: "C".into(), matched: "a".into(), post: "ra".into() })
        );
    }

    #[test]
    fn test_formatted_column_is_not_highlighted() {
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::String).with_format("bold"), FilterValue::text("an"));
        let view = run(&people(), &state);
        assert_eq!(ids(&view), vec!["1", "4"]);
        assert!(view[0].highlight("name").is_none());

        let mut rows = people();
        rows[0].set_format("name", "<b>{}</b>");
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::String), FilterValue::text("an"));
        let view = run(&rows, &state);
        assert!(view[0].highlight("name").is_none());
        assert!(view[1].highlight("name").is_some());
    }

    #[test]
    fn test_negated_string_filter() {
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::String), FilterValue::text("!an"));
        let view = run(&people(), &state);
        assert_eq!(ids(&view), vec!["2", "3"]);
        assert!(view.iter().all(|r| r.highlights().is_empty()));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::String), FilterValue::text("a"));
        state.set(&Column::new("age", ColumnType::Number), FilterValue::text(">=30"));
        assert_eq!(ids(&run(&people(), &state)), vec!["1", "3"]);
    }

    #[test]
    fn test_filters_rederive_from_original() {
        let rows = people();
        let mut state = FilterState::new();
        state.set(&Column::new("age", ColumnType::Number), FilterValue::text(">30"));
        assert_eq!(ids(&run(&rows, &state)), vec!["3"]);

        // Loosening a filter brings rows back
        state.set(&Column::new("age", ColumnType::Number), FilterValue::text(">20"));
        assert_eq!(ids(&run(&rows, &state)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_number_range_inclusive() {
        let mut state = FilterState::new();
        state.set(&Column::new("age", ColumnType::Number), FilterValue::text("25..30"));
        assert_eq!(ids(&run(&people(), &state)), vec!["1", "2"]);
    }

    #[test]
    fn test_date_filter_uses_day_offsets() {
        let rows = vec![
            Row::new().with("id", 1).with("at", ColumnValue::Date((TODAY - 3.0 * DAY) as i64)),
            Row::new().with("id", 2).with("at", ColumnValue::Date((TODAY + 1000.0) as i64)),
            Row::new().with("id", 3).with("at", ColumnValue::Date((TODAY - 10.0 * DAY) as i64)),
            Row::new().with("id", 4),
        ];
        let mut state = FilterState::new();
        state.set(&Column::new("at", ColumnType::Date), FilterValue::text("-7..0"));
        assert_eq!(ids(&run(&rows, &state)), vec!["1"]);

        state.set(&Column::new("at", ColumnType::Date), FilterValue::text(">=0"));
        assert_eq!(ids(&run(&rows, &state)), vec!["2"]);
    }

    #[test]
    fn test_bool_filter() {
        let mut state = FilterState::new();
        state.set(&Column::new("active", ColumnType::Bool), FilterValue::Flag(true));
        assert_eq!(ids(&run(&people(), &state)), vec!["1", "4"]);

        // Absent cells pass neither value
        state.set(&Column::new("active", ColumnType::Bool), FilterValue::Flag(false));
        assert_eq!(ids(&run(&people(), &state)), vec!["2"]);

        state.set(&Column::new("active", ColumnType::Bool), FilterValue::text(""));
        assert_eq!(run(&people(), &state).len(), 4);
    }

    #[test]
    fn test_unique_filter() {
        let rows = people();
        let mut selection = SelectionTracker::new();
        selection.insert("2".to_string(), rows[1].clone());
        let ctx = FilterContext {
            unique_column: Some("id"),
            selection: &selection,
            day_start_ms: TODAY,
        };

        let mut state = FilterState::new();
        state.set(&Column::new("unique", ColumnType::Unique), FilterValue::Flag(true));
        assert_eq!(ids(&apply_filters(&rows, &state, &ctx)), vec!["2"]);

        state.set(&Column::new("unique", ColumnType::Unique), FilterValue::Flag(false));
        assert_eq!(ids(&apply_filters(&rows, &state, &ctx)), vec!["1", "3", "4"]);
    }

    #[test]
    fn test_untyped_filter_passes() {
        let mut state = FilterState::new();
        state.set(&Column::new("name", ColumnType::None), FilterValue::text("zzz"));
        assert_eq!(run(&people(), &state).len(), 4);
    }

    #[test]
    fn test_sort_strings_case_insensitive() {
        let sorted = sort_rows(people(), &Column::new("name", ColumnType::String), SortOrder::Ascending);
        assert_eq!(ids(&sorted), vec!["1", "2", "3", "4"]);
        let sorted = sort_rows(people(), &Column::new("name", ColumnType::String), SortOrder::Descending);
        assert_eq!(ids(&sorted), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_sort_numbers_non_numeric_first() {
        let sorted = sort_rows(people(), &Column::new("age", ColumnType::Number), SortOrder::Ascending);
        assert_eq!(ids(&sorted), vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = vec![
            Row::new().with("id", 1).with("group", "b"),
            Row::new().with("id", 2).with("group", "A"),
            Row::new().with("id", 3).with("group", "B"),
            Row::new().with("id", 4).with("group", "a"),
        ];
        let column = Column::new("group", ColumnType::String);
        assert_eq!(ids(&sort_rows(rows.clone(), &column, SortOrder::Ascending)), vec!["2", "4", "1", "3"]);
        assert_eq!(ids(&sort_rows(rows, &column, SortOrder::Descending)), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn test_sort_numbers_with_nan_cells() {
        let rows: Vec<Row> = (0..60i64)
            .map(|i| {
                let row = Row::new().with("id", i);
                if i % 3 == 0 {
                    row.with("v", "NaN")
                } else {
                    row.with("v", ((i * 37) % 50) as f64)
                }
            })
            .chain(std::iter::once(Row::new().with("id", 60).with("v", f64::NAN)))
            .collect();
        let column = Column::new("v", ColumnType::Number);

        let sorted = sort_rows(rows, &column, SortOrder::Ascending);
        let keys: Vec<Option<f64>> = sorted.iter().map(|row| row.get("v").as_f64()).collect();
        let missing = keys.iter().take_while(|k| k.map_or(true, f64::is_nan)).count();
        assert_eq!(missing, 21);

        let numbers: Vec<f64> = keys[missing..].iter().map(|k| k.unwrap()).collect();
        assert_eq!(numbers.len(), 40);
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
    }
}
