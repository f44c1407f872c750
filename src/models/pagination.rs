use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Page request as it arrives from the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInput {
    pub page: i64,
    pub size: i64,
}

impl PageInput {
    /// Falls back to the defaults for non-positive values or an oversized page.
    pub fn new(page: i64, size: i64) -> Self {
        PageInput {
            page: if page > 0 { page } else { DEFAULT_PAGE },
            size: if size > 0 && size <= MAX_PAGE_SIZE { size } else { DEFAULT_PAGE_SIZE },
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }
}

impl Default for PageInput {
    fn default() -> Self {
        PageInput::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

impl From<PageQuery> for PageInput {
    fn from(q: PageQuery) -> Self {
        PageInput::new(q.page.unwrap_or(DEFAULT_PAGE), q.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginate<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl<T> Paginate<T> {
    pub fn empty(total_items: i64, page: PageInput) -> Self {
        Paginate {
            items: Vec::new(),
            total_items,
            total_pages: total_pages(total_items, page.size),
            current_page: page.page,
            page_size: page.size,
        }
    }

    /// Clamps a request past the last page onto the last page.
    pub fn clamp(&self, page: PageInput) -> PageInput {
        if self.total_pages > 0 && page.page > self.total_pages {
            PageInput { page: self.total_pages, size: page.size }
        } else {
            page
        }
    }

    pub fn with_items(mut self, page: PageInput, items: Vec<T>) -> Self {
        self.current_page = page.page;
        self.items = items;
        self
    }
}

pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_input_defaults() {
        assert_eq!(PageInput::new(0, 0), PageInput { page: 1, size: 10 });
        assert_eq!(PageInput::new(3, 51), PageInput { page: 3, size: 10 });
        assert_eq!(PageInput::new(2, 50).offset(), 50);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn page_past_the_end_is_clamped() {
        let p: Paginate<i64> = Paginate::empty(25, PageInput::new(9, 10));
        assert_eq!(p.total_pages, 3);
        let clamped = p.clamp(PageInput::new(9, 10));
        assert_eq!(clamped.page, 3);
        let p = p.with_items(clamped, vec![21, 22, 23, 24, 25]);
        assert_eq!(p.current_page, 3);
        assert_eq!(p.items.len(), 5);
    }
}
