/// Pagination over the filtered and sorted view.
///
/// Pages are 1-based. `from_row`/`to_row` are the 0-based half-open bounds
/// of the current page within the view, so both stay within `0..=len`.

use crate::error::{GridError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    /// A fixed number of rows, at least 1.
    Rows(usize),
    /// Everything on one page.
    All,
}

impl PageSize {
    pub fn rows(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(GridError::InvalidPageSize("page size must be at least 1".to_string()));
        }
        Ok(PageSize::Rows(n))
    }

    /// Rows per page for a view of `len` rows.
    pub fn resolve(&self, len: usize) -> usize {
        match self {
            PageSize::Rows(n) => (*n).max(1),
            PageSize::All => len.max(1),
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Rows(10)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Rows(n) => write!(f, "{}", n),
            PageSize::All => f.write_str("All"),
        }
    }
}

impl FromStr for PageSize {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PageSize::All);
        }
        let n: usize = s.parse().map_err(|_| GridError::InvalidPageSize(s.to_string()))?;
        PageSize::rows(n)
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PageSize::Rows(n) => serializer.serialize_u64(*n as u64),
            PageSize::All => serializer.serialize_str("All"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPageSize {
    Count(u64),
    Name(String),
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RawPageSize::deserialize(deserializer)? {
            RawPageSize::Count(n) => PageSize::rows(n as usize).map_err(serde::de::Error::custom),
            RawPageSize::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One page of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a, T> {
    pub rows: &'a [T],
    pub from_row: usize,
    pub to_row: usize,
    pub total_pages: usize,
}

/// Stateless pagination: the `page`th page of `rows`.
///
/// Pages outside `1..=total_pages` produce an empty slice.
pub fn paginate<T>(rows: &[T], page: usize, page_size: PageSize) -> PageSlice<'_, T> {
    let len = rows.len();
    let size = page_size.resolve(len);
    let from_row = page.saturating_sub(1).saturating_mul(size).min(len);
    let to_row = from_row.saturating_add(size).min(len);
    PageSlice {
        rows: &rows[from_row..to_row],
        from_row,
        to_row,
        total_pages: rows.len().div_ceil(size),
    }
}

/// A numbered link in the pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: usize,
    pub current: bool,
    /// The page lies past the last page.
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLinks {
    pub links: Vec<PageLink>,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Pagination state of a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: PageSize,
    current_page: usize,
    from_row: usize,
    to_row: usize,
    total_pages: usize,
    len: usize,
}

impl Paginator {
    pub fn new(page_size: PageSize) -> Self {
        Paginator {
            page_size,
            current_page: 1,
            from_row: 0,
            to_row: 0,
            total_pages: 0,
            len: 0,
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn from_row(&self) -> usize {
        self.from_row
    }

    pub fn to_row(&self) -> usize {
        self.to_row
    }

    /// Length of the view the pager was last computed against.
    pub fn view_len(&self) -> usize {
        self.len
    }

    pub fn rows_per_page(&self) -> usize {
        self.page_size.resolve(self.len)
    }

    /// Back to page 1 for a view of `len` rows.
    pub fn reset(&mut self, len: usize) {
        self.current_page = 1;
        self.recompute(len);
    }

    /// Keep the current page for a reloaded view of `len` rows, clamped to
    /// its page count.
    pub fn reanchor(&mut self, len: usize) {
        self.recompute(len);
    }

    /// Go to `page`. Requests outside `1..=total_pages` are ignored.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages {
            log::debug!("Ignoring page {} outside 1..={}", page, self.total_pages);
            return false;
        }
        self.current_page = page;
        self.update_bounds();
        true
    }

    /// Change the page size; always returns to page 1.
    pub fn set_page_size(&mut self, page_size: PageSize, len: usize) {
        self.page_size = page_size;
        self.reset(len);
    }

    fn recompute(&mut self, len: usize) {
        self.len = len;
        self.total_pages = len.div_ceil(self.rows_per_page());
        self.current_page = self.current_page.clamp(1, self.total_pages.max(1));
        self.update_bounds();
    }

    fn update_bounds(&mut self) {
        let size = self.rows_per_page();
        self.from_row = (self.current_page - 1).saturating_mul(size).min(self.len);
        self.to_row = self.from_row.saturating_add(size).min(self.len);
    }

    /// The current page of `rows`.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        &rows[self.from_row.min(rows.len())..self.to_row.min(rows.len())]
    }

    /// Five numbered links around the current page.
    pub fn page_links(&self) -> PageLinks {
        let current = self.current_page as i64;
        let total = self.total_pages as i64;

        let mut lower = current - 2;
        let mut upper = current + 2;
        if upper > total {
            lower -= upper - total;
            upper = total;
        }
        let lower = lower.max(1);
        let upper = upper.max(5);

        let links = (lower..=upper)
            .map(|page| PageLink {
                page: page as usize,
                current: page == current,
                disabled: page > total,
            })
            .collect();

        PageLinks {
            links,
            has_previous: current > 1,
            has_next: current < total,
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Paginator::new(PageSize::default())
    }
}
