use crate::domain::todo::PageWindow;

use super::types::Meta;

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

/// Page-based paging resolved from validated query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page: current_page(page.unwrap_or(1)), per_page: per_page_or_default(per_page.unwrap_or(0)) }
    }

    pub fn window(&self) -> PageWindow { PageWindow { limit: self.per_page, offset: offset(self.page, self.per_page) } }

    pub fn meta(&self, total_count: i64) -> Meta {
        Meta { per_page: self.per_page, page: self.page, page_count: total_pages(total_count, self.per_page), total_count }
    }
}

pub fn current_page(page: i64) -> i64 { page.max(1) }

pub fn per_page_or_default(per_page: i64) -> i64 {
    if per_page > 0 { per_page.min(MAX_PER_PAGE) } else { DEFAULT_PER_PAGE }
}

pub fn offset(page: i64, per_page: i64) -> i64 { (page - 1).saturating_mul(per_page) }

pub fn total_pages(total_count: i64, per_page: i64) -> i64 {
    if total_count <= 0 || per_page <= 0 { return 0 }
    (total_count + per_page - 1) / per_page
}
