//! Fixed-size paging over ordered listings.

use serde::Serialize;
use tracing::debug;

use crate::models::DatasetId;

/// Number of pages needed for `total_items` at `page_size` per page.
pub fn page_count(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Slice page `page` (1-based) out of `items`.
///
/// Pages outside `[1, page_count]` are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Current page of one listing.
///
/// The page persists across re-renders and returns to 1 whenever the
/// identity of the paged data set changes.
#[derive(Debug, Clone)]
pub struct PageState {
    current_page: usize,
    page_size: usize,
    dataset: Option<DatasetId>,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            dataset: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Record the identity of the data set about to be paged.
    /// Returns `true` when the page was reset.
    pub fn sync(&mut self, dataset: DatasetId) -> bool {
        if self.dataset.as_ref() == Some(&dataset) {
            return false;
        }
        let had_dataset = self.dataset.is_some();
        self.dataset = Some(dataset);
        if had_dataset && self.current_page != 1 {
            debug!("Data set changed, resetting from page {}", self.current_page);
        }
        self.current_page = 1;
        had_dataset
    }

    /// Move to `page` if it exists for `total_items`; otherwise ignore it.
    /// Returns whether the page changed.
    pub fn set_page(&mut self, page: usize, total_items: usize) -> bool {
        let pages = page_count(total_items, self.page_size);
        if page == 0 || page > pages {
            debug!("Ignoring request for page {} of {}", page, pages);
            return false;
        }
        let changed = self.current_page != page;
        self.current_page = page;
        changed
    }

    pub fn next(&mut self, total_items: usize) -> bool {
        self.set_page(self.current_page + 1, total_items)
    }

    pub fn prev(&mut self, total_items: usize) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.set_page(self.current_page - 1, total_items)
    }

    /// Forget the current data set and go back to page 1.
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.dataset = None;
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.current_page, self.page_size)
    }

    pub fn meta(&self, total_items: usize) -> PageMeta {
        PageMeta::new(self.current_page, self.page_size, total_items)
    }
}

/// Pagination metadata shown alongside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(page: usize, page_size: usize, total_items: usize) -> Self {
        let total_pages = page_count(total_items, page_size);
        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
