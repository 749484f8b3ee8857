//! Client-side pagination over an already filtered and sorted collection.
//!
//! The requested page is stored as-is and clamped on every read, so an
//! out-of-range request never errors; it resolves to the nearest valid page.
//! The paginator does not watch the upstream collection. Callers invoke
//! [`Pagination::reset_page`] when their filters change.

use serde::{Deserialize, Serialize};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: &[usize] = &[10, 25, 50, 100];

/// Pagination state: a requested page and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    requested_page: usize,
    page_size: usize,
}

/// One page of a collection plus the counts needed to render navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView<'a, T> {
    pub items: &'a [T],
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Start on page 1. A zero page size is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            requested_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The page last asked for, before clamping.
    pub fn requested_page(&self) -> usize {
        self.requested_page
    }

    /// Request page `n`. Out-of-range values are clamped when read.
    pub fn set_current_page(&mut self, n: usize) {
        self.requested_page = n;
    }

    /// Change the page size and go back to page 1.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.requested_page = 1;
    }

    pub fn reset_page(&mut self) {
        self.requested_page = 1;
    }

    /// Number of pages needed for `total_items` (0 for an empty collection).
    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size)
    }

    /// The page actually shown: the request clamped to
    /// `[1, max(total_pages, 1)]`.
    pub fn effective_page(&self, total_items: usize) -> usize {
        let last = self.total_pages(total_items).max(1);
        self.requested_page.clamp(1, last)
    }

    /// Move one page forward, staying on the last page.
    pub fn next_page(&mut self, total_items: usize) {
        let last = self.total_pages(total_items).max(1);
        self.requested_page = (self.effective_page(total_items) + 1).min(last);
    }

    /// Move one page back, staying on page 1.
    pub fn previous_page(&mut self, total_items: usize) {
        self.requested_page = self.effective_page(total_items).saturating_sub(1).max(1);
    }

    /// Slice `items` to the effective page.
    pub fn paginate<'a, T>(&self, items: &'a [T]) -> PageView<'a, T> {
        let total_items = items.len();
        let current_page = self.effective_page(total_items);
        let start = ((current_page - 1) * self.page_size).min(total_items);
        let end = (start + self.page_size).min(total_items);

        PageView {
            items: &items[start..end],
            current_page,
            total_pages: self.total_pages(total_items),
            total_items,
            page_size: self.page_size,
        }
    }
}

impl<T> PageView<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// 1-based position of the first item on this page, or 0 when empty.
    pub fn first_item_number(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.current_page - 1) * self.page_size + 1
        }
    }

    /// 1-based position of the last item on this page, or 0 when empty.
    pub fn last_item_number(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.current_page - 1) * self.page_size + self.items.len()
        }
    }
}
