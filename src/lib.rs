/// Gridview - Client-Side Tabular Data Engine
///
/// The data half of an interactive table widget: load a dataset of typed
/// columns and rows, filter it with per-column expressions, sort it,
/// paginate it and track a row selection that survives paging, filtering
/// and reloads. Rendering is left to the caller, which reads
/// `Grid::current_view()` and redraws what `Grid::drain_changes()` reports.

pub mod changeset;
pub mod clock;
pub mod column;
pub mod config;
pub mod error;
pub mod expr;
pub mod grid;
pub mod messages;
pub mod pager;
pub mod selection;
pub mod table;
pub mod view;

pub use changeset::{Changeset, GridChange, Invalidation};
pub use clock::{Clock, FixedClock, SystemClock};
pub use column::{Column, ColumnType, ColumnValue};
pub use config::TableOptions;
pub use error::{GridError, Result};
pub use expr::{FilterValue, Highlight};
pub use grid::{ExportOptions, Grid, LoadOptions};
pub use messages::{ExportedData, GridCommand, ViewPage};
pub use pager::{paginate, PageLink, PageLinks, PageSize, Paginator};
pub use selection::SelectionTracker;
pub use table::{Dataset, Row, Schema, UNIQUE_COLUMN};
pub use view::{FilterState, SortKey, SortOrder};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn grid() -> Grid {
        let _ = env_logger::builder().is_test(true).try_init();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap();
        Grid::with_clock(TableOptions::default(), FixedClock(now))
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| r.get("id").to_string()).collect()
    }

    #[test]
    fn test_complete_workflow() {
        let mut grid = grid();
        grid.load_json(
            r#"{"cols": {"id": {"type": "number", "unique": true}, "name": {"type": "string"}},
                "rows": [{"id": 1, "name": "Ann"}, {"id": 2, "name": "bob"}]}"#,
            LoadOptions::default(),
        )
        .unwrap();

        grid.set_filter("name", "an").unwrap();
        assert_eq!(ids(grid.view_rows()), vec!["1"]);

        grid.set_sort("id", SortOrder::Descending).unwrap();
        assert_eq!(ids(grid.view_rows()), vec!["1"]);

        grid.set_page_size(PageSize::Rows(1));
        assert!(grid.set_page(1));

        let page = grid.current_view();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(
            serde_json::to_value(&page.rows[0]).unwrap(),
            json!({"id": 1, "name": "Ann", "_highlights": {"name": {"pre": "", "matched": "An", "post": "n"}}})
        );
        assert_eq!(page.summary(), "Rows 1-1 of 1");

        let invalidated = Invalidation::of(&grid.drain_changes());
        assert_eq!(invalidated, Invalidation::ALL);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let mut grid = grid();
        let rows: Vec<serde_json::Value> = (0..40)
            .map(|i| json!({"id": i, "name": format!("item {}", i % 7), "score": (i * 37) % 11}))
            .collect();
        grid.load_dataset(
            Dataset::from_value(json!({
                "cols": {"id": {"type": "number", "unique": true}, "name": {}, "score": {"type": "number"}},
                "rows": rows,
            }))
            .unwrap(),
            LoadOptions::default(),
        );

        grid.set_filter("score", ">2 <9").unwrap();
        grid.set_filter("name", "!3").unwrap();
        grid.set_sort("score", SortOrder::Descending).unwrap();
        grid.set_page(2);
        let first = grid.current_view();

        // Re-applying the same state produces the same view
        grid.set_filter("score", ">2 <9").unwrap();
        grid.set_filter("name", "!3").unwrap();
        grid.set_sort("score", SortOrder::Descending).unwrap();
        grid.set_page(2);
        assert_eq!(grid.current_view(), first);
    }

    #[test]
    fn test_filter_independence() {
        let mut grid = grid();
        grid.load_dataset(
            Dataset::from_value(json!({
                "cols": {"id": {"type": "number"}, "a": {}, "b": {"type": "number"}},
                "rows": [
                    {"id": 1, "a": "x", "b": 1},
                    {"id": 2, "a": "y", "b": 2},
                    {"id": 3, "a": "x", "b": 3},
                ]
            }))
            .unwrap(),
            LoadOptions::default(),
        );

        grid.set_filter("a", "x").unwrap();
        grid.set_filter("b", ">1").unwrap();
        assert_eq!(ids(grid.view_rows()), vec!["3"]);

        // Clearing one filter leaves exactly the other one's result
        grid.clear_filter("a").unwrap();
        assert_eq!(ids(grid.view_rows()), vec!["2", "3"]);
        grid.set_filter("a", "x").unwrap();
        grid.clear_filter("b").unwrap();
        assert_eq!(ids(grid.view_rows()), vec!["1", "3"]);
    }

    #[test]
    fn test_selection_persists_across_reload_and_pages() {
        let mut grid = grid();
        let data = |n: usize| {
            let rows: Vec<serde_json::Value> = (1..=n).map(|i| json!({"id": i.to_string()})).collect();
            Dataset::from_value(json!({"cols": {"id": {"unique": true}}, "rows": rows})).unwrap()
        };

        grid.load_dataset(data(50), LoadOptions::default());
        grid.set_page(5);
        assert!(grid.toggle_selection(&ColumnValue::from("42")).unwrap());

        grid.load_dataset(data(60), LoadOptions { preserve_columns: false, reset_selection: false });
        grid.set_sort("id", SortOrder::Ascending).unwrap();
        assert!(grid.is_selected(&ColumnValue::from("42")));

        // Row 42 gone from the reload: the snapshot survives
        grid.load_dataset(data(10), LoadOptions::refresh());
        assert!(grid.is_selected(&ColumnValue::from("42")));
        let exported = grid.export_data(ExportOptions { selected_only: true, ..Default::default() });
        assert_eq!(ids(&exported.rows), vec!["42"]);
    }

    #[test]
    fn test_negation_includes_absent_cells() {
        let mut grid = grid();
        grid.load_dataset(
            Dataset::from_value(json!({
                "cols": {"id": {"type": "number"}, "name": {}},
                "rows": [{"id": 1, "name": "john"}, {"id": 2}, {"id": 3, "name": null}, {"id": 4, "name": "mary"}]
            }))
            .unwrap(),
            LoadOptions::default(),
        );
        grid.set_filter("name", "!john").unwrap();
        assert_eq!(ids(grid.view_rows()), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_export_round_trips_through_load() {
        let mut grid = grid();
        grid.load_json(
            r#"{"d": {"cols": {"id": {"type": "number", "unique": true}, "tag": {}},
                      "rows": [{"id": 1, "tag": "a", "tagFormat": "<i>a</i>"}, {"id": 2, "tag": "b"}]}}"#,
            LoadOptions::default(),
        )
        .unwrap();
        grid.set_filter("tag", "b").unwrap();

        let exported = serde_json::to_string(&grid.export_data(ExportOptions::default())).unwrap();
        let mut reloaded = self::grid();
        reloaded.load_json(&exported, LoadOptions::default()).unwrap();

        assert_eq!(ids(reloaded.view_rows()), vec!["2"]);
        assert_eq!(reloaded.original_rows()[0].format("tag"), Some("<i>a</i>"));
    }
}
