/// Changeset - Mutation log for renderers
///
/// Every grid mutation records a `GridChange`. A rendering layer drains the
/// log after each batch of calls and redraws only the regions the changes
/// invalidate, instead of rebuilding the whole table.
///
/// # Usage Pattern
///
/// 1. Grid operations push `GridChange` events
/// 2. Changes accumulate in the grid's changeset buffer
/// 3. The renderer calls `Grid::drain_changes()`
/// 4. `Invalidation::of` folds the drained changes into the regions to redraw

use crate::pager::PageSize;
use crate::view::SortKey;
use serde::Serialize;

/// Represents a single mutation of a grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GridChange {
    /// A dataset was loaded (or reloaded)
    DatasetLoaded { rows: usize, preserved_columns: bool },

    /// A column filter was set or cleared; the view now holds `view_rows` rows
    FilterChanged { column: String, view_rows: usize },

    /// The sort was set or cleared
    SortChanged { sort: Option<SortKey> },

    /// The current page moved
    PageChanged { page: usize },

    /// The page size changed
    PageSizeChanged { page_size: PageSize },

    /// A column was shown or hidden
    ColumnVisibilityChanged { column: String, visible: bool },

    /// `count` rows were selected or deselected
    SelectionChanged { count: usize },
}

/// Table regions a renderer has to redraw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Invalidation {
    /// Column headers, filter inputs and sort indicators
    pub head: bool,
    /// Row cells and checkboxes
    pub body: bool,
    /// Pager and row summary
    pub foot: bool,
}

impl Invalidation {
    pub const ALL: Invalidation = Invalidation {
        head: true,
        body: true,
        foot: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.head || self.body || self.foot)
    }

    pub fn merge(self, other: Invalidation) -> Invalidation {
        Invalidation {
            head: self.head || other.head,
            body: self.body || other.body,
            foot: self.foot || other.foot,
        }
    }

    /// Regions touched by any of `changes`.
    pub fn of(changes: &[GridChange]) -> Invalidation {
        changes
            .iter()
            .map(GridChange::invalidates)
            .fold(Invalidation::default(), Invalidation::merge)
    }
}

impl GridChange {
    /// Regions a renderer must redraw after this change
    pub fn invalidates(&self) -> Invalidation {
        let (head, body, foot) = match self {
            GridChange::DatasetLoaded { .. } => (true, true, true),
            GridChange::FilterChanged { .. } => (false, true, true),
            GridChange::SortChanged { .. } => (true, true, false),
            GridChange::PageChanged { .. } => (false, true, true),
            GridChange::PageSizeChanged { .. } => (false, true, true),
            GridChange::ColumnVisibilityChanged { .. } => (true, true, false),
            GridChange::SelectionChanged { .. } => (false, true, false),
        };
        Invalidation { head, body, foot }
    }
}

/// Pending changes since the last drain
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    changes: Vec<GridChange>,
    /// Generation counter - incremented each time the changeset is drained
    generation: u64,
}

impl Changeset {
    pub fn new() -> Self {
        Changeset {
            changes: Vec::new(),
            generation: 0,
        }
    }

    /// Add a change to the changeset
    pub fn push(&mut self, change: GridChange) {
        self.changes.push(change);
    }

    /// Returns all changes since the last drain
    pub fn changes(&self) -> &[GridChange] {
        &self.changes
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Regions invalidated by the pending changes
    pub fn invalidation(&self) -> Invalidation {
        Invalidation::of(&self.changes)
    }

    /// Drain changes, returning ownership and clearing the buffer
    pub fn drain(&mut self) -> Vec<GridChange> {
        self.generation += 1;
        std::mem::take(&mut self.changes)
    }
}
