/// One page of a list endpoint. `number` is 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn empty(size: u32) -> Self {
        Self {
            items: Vec::new(),
            number: 0,
            size,
            total_elements: 0,
            total_pages: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Position within a paginated list. Moves are bound-checked and report
/// whether the page changed, so callers reload only when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
    size: u32,
    total_elements: u64,
    total_pages: u32,
}

impl PageCursor {
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            total_elements: 0,
            total_pages: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_to(&mut self, page: u32) -> bool {
        if page < self.total_pages && page != self.page {
            self.page = page;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size.max(1);
        self.page = 0;
    }

    pub fn update_from<T>(&mut self, page: &Page<T>) {
        self.total_elements = page.total_elements;
        self.total_pages = page.total_pages;
    }

    /// Forgets totals after a failed load.
    pub fn clear_totals(&mut self) {
        self.total_elements = 0;
        self.total_pages = 0;
    }

    /// Up to `window` page indexes, starting two before the current page.
    pub fn page_numbers(&self, window: u32) -> Vec<u32> {
        if self.total_pages == 0 || window == 0 {
            return Vec::new();
        }
        if self.total_pages <= window {
            return (0..self.total_pages).collect();
        }
        let start = self.page.saturating_sub(2).min(self.total_pages - window);
        (start..start + window).collect()
    }

    /// 1-based first and last element shown on the current page.
    pub fn range(&self) -> Option<(u64, u64)> {
        if self.total_elements == 0 {
            return None;
        }
        let start = u64::from(self.page) * u64::from(self.size) + 1;
        if start > self.total_elements {
            return None;
        }
        let end = (start + u64::from(self.size) - 1).min(self.total_elements);
        Some((start, end))
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(10)
    }
}
