/// Gridview Grid
///
/// `Grid` owns the whole state of one table: the washed schema, the loaded
/// rows and their derived view, the active filters and sort, pagination and
/// the selection. Every mutation reruns only the stages downstream of it,
/// always in the order filter, sort, paginate.
///
/// # Examples
///
/// ```
/// use gridview::{Grid, LoadOptions, SortOrder, PageSize, TableOptions};
///
/// let mut grid = Grid::new(TableOptions::default());
/// grid.load_json(r#"{
///     "cols": {"id": {"type": "number", "unique": true}, "name": {"type": "string"}},
///     "rows": [{"id": 1, "name": "Ann"}, {"id": 2, "name": "bob"}]
/// }"#, LoadOptions::default()).unwrap();
///
/// grid.set_filter("name", "an").unwrap();
/// grid.set_sort("id", SortOrder::Descending).unwrap();
/// grid.set_page_size(PageSize::Rows(1));
///
/// let page = grid.current_view();
/// assert_eq!(page.total_pages, 1);
/// assert_eq!(page.rows[0].get("name").to_string(), "Ann");
/// ```

use crate::changeset::{Changeset, GridChange};
use crate::clock::{start_of_day_ms, Clock, SystemClock};
use crate::column::{Column, ColumnType, ColumnValue};
use crate::config::TableOptions;
use crate::error::{GridError, Result};
use crate::expr::FilterValue;
use crate::messages::{ExportedData, GridCommand, ViewPage};
use crate::pager::{PageLinks, PageSize, Paginator};
use crate::selection::SelectionTracker;
use crate::table::{Dataset, Row, RowStore, Schema};
use crate::view::{apply_filters, sort_rows, FilterContext, FilterState, SortKey, SortOrder};
use std::fmt;
use std::time::Instant;

/// How a dataset load treats existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep the current schema and filters, ignoring the payload's `cols`.
    pub preserve_columns: bool,
    /// Drop the selection instead of reconciling it with the new rows.
    pub reset_selection: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            preserve_columns: false,
            reset_selection: true,
        }
    }
}

impl LoadOptions {
    /// A background refresh: same columns, selection kept.
    pub fn refresh() -> Self {
        LoadOptions {
            preserve_columns: true,
            reset_selection: false,
        }
    }
}

/// Which rows `Grid::export_data` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// The selection snapshots; overrides `filtered_only`.
    pub selected_only: bool,
    /// The filtered and sorted view instead of the loaded rows.
    pub filtered_only: bool,
}

pub struct Grid {
    options: TableOptions,
    schema: Schema,
    rows: RowStore,
    filters: FilterState,
    sort: Option<SortKey>,
    pager: Paginator,
    selection: SelectionTracker,
    changeset: Changeset,
    clock: Box<dyn Clock>,
}

impl Grid {
    pub fn new(options: TableOptions) -> Self {
        Grid::with_clock(options, SystemClock)
    }

    /// A grid whose date filters read "today" from `clock`.
    pub fn with_clock(options: TableOptions, clock: impl Clock + 'static) -> Self {
        Grid {
            pager: Paginator::new(options.page_size),
            options,
            schema: Schema::default(),
            rows: RowStore::default(),
            filters: FilterState::new(),
            sort: None,
            selection: SelectionTracker::new(),
            changeset: Changeset::new(),
            clock: Box::new(clock),
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Parse a dataset payload and load it.
    pub fn load_json(&mut self, json: &str, options: LoadOptions) -> Result<()> {
        let dataset = Dataset::from_json(json)?;
        self.load_dataset(dataset, options);
        Ok(())
    }

    /// Replace the rows, and unless `preserve_columns` the schema too.
    ///
    /// A fresh schema clears the filters and registers the declared initial
    /// filters; the declared initial sort applies only when no sort is set.
    /// The current page is kept, clamped to the new page count.
    pub fn load_dataset(&mut self, dataset: Dataset, options: LoadOptions) {
        let start = Instant::now();
        let preserved = options.preserve_columns && !self.schema.is_empty();

        if !preserved {
            self.schema = Schema::wash(dataset.cols.clone());
            self.filters.clear();
            for column in self.schema.columns() {
                if let Some(expression) = column.initial_filter() {
                    self.filters.set(column, FilterValue::text(expression));
                }
            }
            if self.sort.is_none() {
                self.sort = self.schema.initial_sort();
            }
        }

        self.rows = RowStore::new(dataset.rows(&self.schema));
        self.load_selection(options.reset_selection);

        self.run_filter();
        self.run_sort();
        self.pager.reanchor(self.rows.view().len());

        log::debug!(
            "Loaded {} rows ({} columns, preserved: {}) in {:?}",
            self.rows.len(),
            self.schema.len(),
            preserved,
            start.elapsed()
        );
        self.changeset.push(GridChange::DatasetLoaded {
            rows: self.rows.len(),
            preserved_columns: preserved,
        });
    }

    fn load_selection(&mut self, reset: bool) {
        if reset {
            self.selection.clear();
        }
        let Some(unique) = self.unique_column_name().map(str::to_string) else {
            return;
        };
        let key_of = |row: &Row| row.value_key(&unique);

        if !reset {
            self.selection.reconcile(self.rows.original(), key_of);
        }
        for row in self.rows.original().iter().filter(|row| row.checked == Some(true)) {
            if let Some(key) = key_of(row) {
                self.selection.insert(key, row.clone());
            }
        }
    }

    // ------------------------------------------------------------------
    // Pipeline stages
    // ------------------------------------------------------------------

    fn run_filter(&mut self) {
        let ctx = FilterContext {
            unique_column: self.schema.unique_column().map(Column::name),
            selection: &self.selection,
            day_start_ms: start_of_day_ms(self.clock.now(), self.options.types.date.utc),
        };
        let filtered = apply_filters(self.rows.original(), &self.filters, &ctx);
        self.rows.set_filtered(filtered);
        self.filters.prune_inactive();
    }

    fn run_sort(&mut self) {
        let filtered = self.rows.filtered().to_vec();
        let view = match self.sort.clone() {
            None => filtered,
            Some(key) => match self.schema.get(&key.column) {
                Some(column) => sort_rows(filtered, column, key.order),
                None => {
                    log::warn!("Sort column '{}' not in schema, clearing sort", key.column);
                    self.sort = None;
                    filtered
                }
            },
        };
        self.rows.set_view(view);
    }

    /// Rerun filter and sort when a filter depends on the selection.
    fn refresh_selection_filter(&mut self) {
        if self.filters.iter().any(|f| f.column_type == ColumnType::Unique) {
            self.run_filter();
            self.run_sort();
            self.pager.reanchor(self.rows.view().len());
        }
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.schema
            .get(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))
    }

    fn unique_column_name(&self) -> Option<&str> {
        self.schema.unique_column().map(Column::name)
    }

    // ------------------------------------------------------------------
    // Filter / sort / paginate
    // ------------------------------------------------------------------

    /// Set a column filter and go back to page 1. The empty string clears it.
    pub fn set_filter(&mut self, column: &str, expression: impl Into<FilterValue>) -> Result<()> {
        let expression = expression.into();
        let col = self.column(column)?.clone();
        log::debug!("Filter {:?} on '{}' ({:?})", expression, column, col.column_type());

        self.filters.set(&col, expression);
        self.after_filter_change(column);
        Ok(())
    }

    pub fn clear_filter(&mut self, column: &str) -> Result<()> {
        self.column(column)?;
        if self.filters.remove(column).is_some() {
            log::debug!("Cleared filter on '{}'", column);
        }
        self.after_filter_change(column);
        Ok(())
    }

    fn after_filter_change(&mut self, column: &str) {
        self.run_filter();
        self.run_sort();
        self.pager.reset(self.rows.view().len());
        self.changeset.push(GridChange::FilterChanged {
            column: column.to_string(),
            view_rows: self.rows.view().len(),
        });
    }

    /// Sort by `column` and go back to page 1.
    pub fn set_sort(&mut self, column: &str, order: SortOrder) -> Result<()> {
        self.column(column)?;
        self.apply_sort(Some(SortKey::new(column, order)));
        Ok(())
    }

    /// Header click: flips the direction of the current sort column, or
    /// sorts a new column ascending.
    pub fn toggle_sort(&mut self, column: &str) -> Result<SortKey> {
        self.column(column)?;
        let key = SortKey::toggled(self.sort.as_ref(), column);
        self.apply_sort(Some(key.clone()));
        Ok(key)
    }

    /// Back to load order.
    pub fn clear_sort(&mut self) {
        self.apply_sort(None);
    }

    fn apply_sort(&mut self, sort: Option<SortKey>) {
        log::debug!("Sort {:?}", sort);
        self.sort = sort;
        self.run_sort();
        self.pager.reset(self.rows.view().len());
        self.changeset.push(GridChange::SortChanged {
            sort: self.sort.clone(),
        });
    }

    /// Go to a 1-based page. Out of range pages are ignored.
    pub fn set_page(&mut self, page: usize) -> bool {
        if !self.pager.set_page(page) {
            return false;
        }
        self.changeset.push(GridChange::PageChanged { page });
        true
    }

    /// Change the page size and go back to page 1.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.pager.set_page_size(page_size, self.rows.view().len());
        self.changeset.push(GridChange::PageSizeChanged { page_size });
    }

    /// Show or hide a column. Returns true when the column is now visible.
    pub fn toggle_column_visibility(&mut self, column: &str) -> Result<bool> {
        let visible = self.schema.toggle_visibility(column)?;
        log::debug!("Column '{}' {}", column, if visible { "shown" } else { "hidden" });
        self.changeset.push(GridChange::ColumnVisibilityChanged {
            column: column.to_string(),
            visible,
        });
        Ok(visible)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select or deselect the row whose unique column holds `value`.
    ///
    /// Returns whether the row is selected afterwards. Rows marked
    /// `checkable: false` keep their state; values matching no row and no
    /// selection are ignored.
    pub fn toggle_selection(&mut self, value: &ColumnValue) -> Result<bool> {
        let unique = self.unique_column_name().ok_or(GridError::NoUniqueColumn)?.to_string();
        let key = value.selection_key();

        let row = self
            .rows
            .original()
            .iter()
            .find(|row| row.value_key(&unique).as_deref() == Some(key.as_str()));
        let checkable = row
            .or_else(|| self.selection.get(&key))
            .map_or(true, Row::is_checkable);
        if !checkable {
            log::debug!("Row '{}' is not checkable", key);
            return Ok(self.selection.is_selected(&key));
        }

        let selected = if self.selection.remove(&key).is_some() {
            false
        } else if let Some(row) = row {
            self.selection.insert(key.clone(), row.clone());
            true
        } else {
            log::debug!("No row with {} = '{}', selection unchanged", unique, key);
            return Ok(false);
        };

        log::debug!("Row '{}' {}", key, if selected { "selected" } else { "deselected" });
        self.changeset.push(GridChange::SelectionChanged { count: 1 });
        self.refresh_selection_filter();
        Ok(selected)
    }

    /// Select every checkable row of the filtered view (all pages), or
    /// deselect every checkable selection. Returns the number of rows changed.
    pub fn toggle_select_all(&mut self, select: bool) -> Result<usize> {
        let start = Instant::now();
        let unique = self.unique_column_name().ok_or(GridError::NoUniqueColumn)?.to_string();

        let changed = self
            .selection
            .toggle_all(self.rows.view(), select, |row| row.value_key(&unique));

        log::debug!(
            "{} {} rows in {:?}",
            if select { "Selected" } else { "Deselected" },
            changed,
            start.elapsed()
        );
        self.changeset.push(GridChange::SelectionChanged { count: changed });
        self.refresh_selection_filter();
        Ok(changed)
    }

    pub fn is_selected(&self, value: &ColumnValue) -> bool {
        self.selection.is_selected(&value.selection_key())
    }

    /// Snapshots of the selected rows, in selection order.
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selection.selected_rows().collect()
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// The current page with its pagination metadata.
    pub fn current_view(&self) -> ViewPage {
        let view = self.rows.view();
        let rows = self.pager.slice(view).to_vec();
        let unique = self.unique_column_name();
        let selected = rows
            .iter()
            .map(|row| {
                unique
                    .and_then(|column| row.value_key(column))
                    .is_some_and(|key| self.selection.contains(&key))
            })
            .collect();

        ViewPage {
            columns: self
                .schema
                .display_order()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            rows,
            selected,
            current_page: self.pager.current_page(),
            page_size: self.pager.page_size(),
            from_row: self.pager.from_row(),
            to_row: self.pager.to_row(),
            total_pages: self.pager.total_pages(),
            total_rows: view.len(),
            sort: self.sort.clone(),
            links: self.pager.page_links(),
        }
    }

    /// Filtered rows in sort order, all pages.
    pub fn view_rows(&self) -> &[Row] {
        self.rows.view()
    }

    /// Rows as loaded.
    pub fn original_rows(&self) -> &[Row] {
        self.rows.original()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_key(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn pager(&self) -> &Paginator {
        &self.pager
    }

    pub fn page_links(&self) -> PageLinks {
        self.pager.page_links()
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// The dataset in its load shape, with active filters written back into
    /// the column declarations.
    pub fn export_data(&self, options: ExportOptions) -> ExportedData {
        let mut cols = self.schema.to_declarations();
        for filter in self.filters.iter() {
            if let Some(col) = cols.get_mut(&filter.column) {
                col.filter = Some(filter.expression.clone());
            }
        }

        let mut rows: Vec<Row> = if options.selected_only {
            self.selection.selected_rows().cloned().collect()
        } else if options.filtered_only {
            self.rows.view().to_vec()
        } else {
            self.rows.original().to_vec()
        };
        rows.iter_mut().for_each(Row::strip_highlights);

        ExportedData { cols, rows }
    }

    // ------------------------------------------------------------------
    // Commands and changes
    // ------------------------------------------------------------------

    /// Run a UI command.
    pub fn apply(&mut self, command: GridCommand) -> Result<()> {
        match command {
            GridCommand::SetFilter { column, expression } => self.set_filter(&column, expression),
            GridCommand::ClearFilter { column } => self.clear_filter(&column),
            GridCommand::SetSort { column, descending } => {
                let order = if descending { SortOrder::Descending } else { SortOrder::Ascending };
                self.set_sort(&column, order)
            }
            GridCommand::ToggleSort { column } => self.toggle_sort(&column).map(|_| ()),
            GridCommand::ClearSort => {
                self.clear_sort();
                Ok(())
            }
            GridCommand::SetPage { page } => {
                self.set_page(page);
                Ok(())
            }
            GridCommand::SetPageSize { size } => {
                self.set_page_size(size);
                Ok(())
            }
            GridCommand::ToggleColumnVisibility { column } => {
                self.toggle_column_visibility(&column).map(|_| ())
            }
            GridCommand::ToggleSelection { unique } => {
                let column_type = self
                    .schema
                    .unique_column()
                    .map(Column::column_type)
                    .ok_or(GridError::NoUniqueColumn)?;
                let value = ColumnValue::from_json(&unique, column_type);
                self.toggle_selection(&value).map(|_| ())
            }
            GridCommand::ToggleSelectAll { select } => self.toggle_select_all(select).map(|_| ()),
        }
    }

    pub fn changeset(&self) -> &Changeset {
        &self.changeset
    }

    /// Hand the pending changes to the renderer.
    pub fn drain_changes(&mut self) -> Vec<GridChange> {
        self.changeset.drain()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(TableOptions::default())
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("columns", &self.schema.len())
            .field("rows", &self.rows.len())
            .field("view_rows", &self.rows.view().len())
            .field("filters", &self.filters.len())
            .field("sort", &self.sort)
            .field("page", &self.pager.current_page())
            .field("selected", &self.selection.len())
            .finish()
    }
}
