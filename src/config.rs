/// Grid configuration
///
/// `TableOptions` mirrors the options object a rendering layer hands to the
/// grid. Every field has a default, so `{}` is a valid configuration.
///
/// # Examples
///
/// ```
/// use gridview::{TableOptions, PageSize};
///
/// let options = TableOptions::from_json(r#"{"pageSize": "all", "types": {"date": {"utc": true}}}"#).unwrap();
/// assert_eq!(options.page_size, PageSize::All);
/// assert!(options.types.date.utc);
/// assert_eq!(options.filter_delay_ms, 200);
/// ```

use crate::column::ColumnType;
use crate::error::Result;
use crate::pager::PageSize;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce window for text filter inputs.
pub const DEFAULT_FILTER_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    /// Initial page size.
    pub page_size: PageSize,
    /// Page sizes offered to the user. Passthrough for the renderer.
    pub page_sizes: Vec<PageSize>,
    /// Per-type options.
    pub types: TypeOptions,
    /// How long a caller should debounce filter keystrokes before calling
    /// `Grid::set_filter`. The grid itself holds no timers.
    pub filter_delay_ms: u64,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            page_size: PageSize::Rows(10),
            page_sizes: vec![
                PageSize::Rows(10),
                PageSize::Rows(20),
                PageSize::Rows(30),
                PageSize::Rows(40),
                PageSize::Rows(50),
                PageSize::All,
            ],
            types: TypeOptions::default(),
            filter_delay_ms: DEFAULT_FILTER_DELAY_MS,
        }
    }
}

impl TableOptions {
    /// Parse options from a JSON object. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Debounce window for a filter input on a column of the given type.
    ///
    /// Checkbox style filters (`bool`, `unique`) apply immediately.
    pub fn filter_delay(&self, column_type: ColumnType) -> Duration {
        match column_type {
            ColumnType::Bool | ColumnType::Unique => Duration::ZERO,
            _ => Duration::from_millis(self.filter_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeOptions {
    pub date: DateOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateOptions {
    /// Day offsets in date filters count from the start of the UTC day
    /// instead of the local day.
    pub utc: bool,
}
