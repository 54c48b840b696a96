/// Selection Tracker
///
/// Selected rows are tracked by the stringified value of the unique column,
/// each with a snapshot of the row as it was last seen. The selection lives
/// independently of the view: changing page, filter or sort never drops
/// a selection, and a reload keeps selections whose row disappeared.
///
/// # Examples
///
/// ```
/// use gridview::{Row, SelectionTracker};
///
/// let mut selection = SelectionTracker::new();
/// let row = Row::new().with("id", 42);
///
/// assert!(selection.toggle("42".to_string(), &row));
/// assert!(selection.is_selected("42"));
/// assert!(!selection.toggle("42".to_string(), &row));
/// assert!(selection.is_empty());
/// ```

use crate::table::Row;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionTracker {
    /// Selection key -> last known row snapshot, in selection order
    selected: IndexMap<String, Row>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        SelectionTracker::default()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.selected.contains_key(key)
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.contains(key)
    }

    /// Snapshot of a selected row.
    pub fn get(&self, key: &str) -> Option<&Row> {
        self.selected.get(key)
    }

    /// Select a row, replacing any previous snapshot.
    /// Returns true if the key was not selected before.
    pub fn insert(&mut self, key: String, row: Row) -> bool {
        self.selected.insert(key, row).is_none()
    }

    pub fn remove(&mut self, key: &str) -> Option<Row> {
        self.selected.shift_remove(key)
    }

    /// Flip the selection of one row. Returns true if it is now selected.
    pub fn toggle(&mut self, key: String, row: &Row) -> bool {
        if self.selected.shift_remove(&key).is_some() {
            false
        } else {
            self.selected.insert(key, snapshot(row));
            true
        }
    }

    /// Select every checkable row of `rows`, or deselect every checkable
    /// selection. Rows marked `checkable: false` keep their state either way.
    ///
    /// `key_of` yields a row's selection key; rows without one are skipped.
    /// Returns the number of rows whose state changed.
    pub fn toggle_all<'a, I, F>(&mut self, rows: I, select: bool, key_of: F) -> usize
    where
        I: IntoIterator<Item = &'a Row>,
        F: Fn(&Row) -> Option<String>,
    {
        if !select {
            let before = self.selected.len();
            self.selected.retain(|_, row| !row.is_checkable());
            return before - self.selected.len();
        }

        let mut changed = 0;
        for row in rows.into_iter().filter(|row| row.is_checkable()) {
            if let Some(key) = key_of(row) {
                if self.insert(key, snapshot(row)) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Snapshots in selection order.
    pub fn selected_rows(&self) -> impl Iterator<Item = &Row> {
        self.selected.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.selected.keys().map(String::as_str)
    }

    /// Refresh snapshots against a freshly loaded row set.
    ///
    /// Keys found in `rows` take the new row as their snapshot; keys with no
    /// matching row keep their last snapshot. Returns how many were refreshed.
    pub fn reconcile<F>(&mut self, rows: &[Row], key_of: F) -> usize
    where
        F: Fn(&Row) -> Option<String>,
    {
        if self.selected.is_empty() {
            return 0;
        }

        let mut refreshed = 0;
        for row in rows {
            let Some(key) = key_of(row) else { continue };
            if let Some(slot) = self.selected.get_mut(&key) {
                *slot = snapshot(row);
                refreshed += 1;
            }
        }

        log::debug!(
            "Reconciled selection: {} refreshed, {} kept stale",
            refreshed,
            self.selected.len().saturating_sub(refreshed)
        );
        refreshed
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

/// Selection snapshots never carry filter highlights.
fn snapshot(row: &Row) -> Row {
    let mut row = row.clone();
    row.strip_highlights();
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(row: &Row) -> Option<String> {
        row.value_key("id")
    }

    fn rows() -> Vec<Row> {
        let mut locked = Row::new().with("id", 3).with("name", "locked");
        locked.checkable = Some(false);
        vec![
            Row::new().with("id", 1).with("name", "one"),
            Row::new().with("id", 2).with("name", "two"),
            locked,
        ]
    }

    #[test]
    fn test_toggle() {
        let rows = rows();
        let mut selection = SelectionTracker::new();
        assert!(selection.toggle("1".to_string(), &rows[0]));
        assert!(selection.is_selected("1"));
        assert_eq!(selection.len(), 1);
        assert!(!selection.toggle("1".to_string(), &rows[0]));
        assert!(!selection.is_selected("1"));
    }

    #[test]
    fn test_select_all_skips_uncheckable() {
        let rows = rows();
        let mut selection = SelectionTracker::new();
        assert_eq!(selection.toggle_all(&rows, true, key_of), 2);
        assert!(!selection.is_selected("3"));

        // Already selected rows are not counted twice
        assert_eq!(selection.toggle_all(&rows, true, key_of), 0);
    }

    #[test]
    fn test_deselect_all_keeps_uncheckable() {
        let rows = rows();
        let mut selection = SelectionTracker::new();
        selection.insert("3".to_string(), rows[2].clone());
        selection.insert("1".to_string(), rows[0].clone());
        selection.insert("99".to_string(), Row::new().with("id", 99));

        // Deselect walks the selection, not the passed rows
        assert_eq!(selection.toggle_all(&rows[..0], false, key_of), 2);
        assert_eq!(selection.keys().collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn test_reconcile_refreshes_and_keeps_stale() {
        let mut selection = SelectionTracker::new();
        selection.insert("1".to_string(), Row::new().with("id", 1).with("name", "old"));
        selection.insert("7".to_string(), Row::new().with("id", 7).with("name", "gone"));

        let refreshed = selection.reconcile(&rows(), key_of);
        assert_eq!(refreshed, 1);
        assert_eq!(selection.get("1").unwrap().get("name").to_string(), "one");
        assert_eq!(selection.get("7").unwrap().get("name").to_string(), "gone");
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_selected_rows_order() {
        let rows = rows();
        let mut selection = SelectionTracker::new();
        selection.toggle("2".to_string(), &rows[1]);
        selection.toggle("1".to_string(), &rows[0]);
        let names: Vec<String> = selection.selected_rows().map(|r| r.get("name").to_string()).collect();
        assert_eq!(names, vec!["two", "one"]);
    }
}
