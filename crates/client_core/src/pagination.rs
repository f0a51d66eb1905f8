use serde::Serialize;

/// Which page is showing. Out-of-range pages are corrected, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: u32,
    page_size: u32,
    total_count: u64,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total_count: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// `max(1, ceil(total_count / page_size))`
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// 1-based inclusive row range on the current page, `None` when empty.
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        if self.total_count == 0 {
            return None;
        }
        let start = u64::from(self.page - 1) * u64::from(self.page_size) + 1;
        if start > self.total_count {
            return None;
        }
        let end = (start + u64::from(self.page_size) - 1).min(self.total_count);
        Some((start, end))
    }

    /// Returns whether the page changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.page != 1;
        self.page = 1;
        changed
    }

    /// A new page size always goes back to page 1.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        let changed = page_size != self.page_size || self.page != 1;
        self.page_size = page_size;
        self.page = 1;
        changed
    }

    /// Applies a fresh total. When the current page no longer exists it
    /// falls back to page 1, not the new last page. Returns whether the
    /// page moved.
    pub fn set_total_count(&mut self, total_count: u64) -> bool {
        self.total_count = total_count;
        if self.page > self.total_pages() {
            self.page = 1;
            return true;
        }
        false
    }

    /// Explicit navigation, clamped into `[1, total_pages]` for the current
    /// total. Returns whether the page changed.
    pub fn go_to(&mut self, page: u32) -> bool {
        let target = page.clamp(1, self.total_pages());
        let changed = target != self.page;
        self.page = target;
        changed
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.page.saturating_sub(1))
    }
}
