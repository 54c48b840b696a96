/// Command and snapshot types exchanged with a rendering layer
use crate::column::Column;
use crate::expr::FilterValue;
use crate::pager::{PageLinks, PageSize};
use crate::table::Row;
use crate::view::SortKey;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// UI events translated into grid operations, see `Grid::apply`.
///
/// ```
/// use gridview::GridCommand;
///
/// let cmd: GridCommand = serde_json::from_str(r#"{"type": "SetPage", "page": 2}"#).unwrap();
/// assert_eq!(cmd, GridCommand::SetPage { page: 2 });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GridCommand {
    /// Set a column filter; the empty string clears it
    SetFilter { column: String, expression: FilterValue },

    /// Remove a column filter
    ClearFilter { column: String },

    /// Sort by a column
    SetSort {
        column: String,
        #[serde(default)]
        descending: bool,
    },

    /// Header click: same column flips direction, new column sorts ascending
    ToggleSort { column: String },

    /// Back to load order
    ClearSort,

    /// Go to a 1-based page
    SetPage { page: usize },

    /// Change the page size (number or "all")
    SetPageSize { size: PageSize },

    /// Show or hide a column
    ToggleColumnVisibility { column: String },

    /// Select or deselect the row with this unique value
    ToggleSelection { unique: JsonValue },

    /// Select every checkable row of the view, or deselect everything checkable
    ToggleSelectAll { select: bool },
}

/// The current page of the view, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPage {
    /// Visible column names in display order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Parallel to `rows`: whether each row is selected
    pub selected: Vec<bool>,
    pub current_page: usize,
    pub page_size: PageSize,
    pub from_row: usize,
    pub to_row: usize,
    pub total_pages: usize,
    /// Rows in the filtered view
    pub total_rows: usize,
    pub sort: Option<SortKey>,
    pub links: PageLinks,
}

impl ViewPage {
    /// Footer text: `Rows 11-20 of 25`, or `No results` for an empty view.
    pub fn summary(&self) -> String {
        if self.total_rows == 0 {
            return "No results".to_string();
        }
        format!(
            "Rows {}-{} of {}",
            self.from_row + 1,
            self.to_row.min(self.total_rows),
            self.total_rows
        )
    }
}

/// Dataset handed back to the caller, in the same shape it was loaded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedData {
    pub cols: IndexMap<String, Column>,
    pub rows: Vec<Row>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_decoding() {
        let cmd: GridCommand =
            serde_json::from_value(json!({"type": "SetFilter", "column": "age", "expression": ">3"})).unwrap();
        assert_eq!(
            cmd,
            GridCommand::SetFilter { column: "age".to_string(), expression: FilterValue::text(">3") }
        );

        let cmd: GridCommand =
            serde_json::from_value(json!({"type": "SetFilter", "column": "ok", "expression": true})).unwrap();
        assert!(matches!(cmd, GridCommand::SetFilter { expression: FilterValue::Flag(true), .. }));

        let cmd: GridCommand = serde_json::from_value(json!({"type": "SetSort", "column": "id"})).unwrap();
        assert_eq!(cmd, GridCommand::SetSort { column: "id".to_string(), descending: false });

        let cmd: GridCommand = serde_json::from_value(json!({"type": "SetPageSize", "size": "all"})).unwrap();
        assert_eq!(cmd, GridCommand::SetPageSize { size: PageSize::All });

        let cmd: GridCommand = serde_json::from_value(json!({"type": "ClearSort"})).unwrap();
        assert_eq!(cmd, GridCommand::ClearSort);

        assert!(serde_json::from_value::<GridCommand>(json!({"type": "Explode"})).is_err());
    }

    #[test]
    fn test_view_page_summary() {
        let mut page = ViewPage {
            columns: vec![],
            rows: vec![],
            selected: vec![],
            current_page: 3,
            page_size: PageSize::Rows(10),
            from_row: 20,
            to_row: 25,
            total_pages: 3,
            total_rows: 25,
            sort: None,
            links: PageLinks { links: vec![], has_previous: true, has_next: false },
        };
        assert_eq!(page.summary(), "Rows 21-25 of 25");

        page.total_rows = 0;
        assert_eq!(page.summary(), "No results");
    }
}
