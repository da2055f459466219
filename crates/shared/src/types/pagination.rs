//! Page windows for catalog and document listings.

use serde::{Deserialize, Serialize};

/// Largest page a caller may ask for.
pub const MAX_PER_PAGE: u32 = 500;

const DEFAULT_PER_PAGE: u32 = 50;

/// One page of a listing, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn first_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl PageRequest {
    /// Builds a request with `page >= 1` and `1 <= per_page <= MAX_PER_PAGE`.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * self.limit()
    }

    /// Rows to fetch. Deserialized requests are clamped here as well.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

/// Rows of one page plus where that page sits in the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Position of a page within the full listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u64,
    /// Rows across every page.
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    /// Wraps `data` fetched for `request` out of `total` rows.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        let per_page = request.limit();
        let total_pages = total.div_ceil(per_page).max(1);
        Self {
            data,
            meta: PageMeta {
                page: request.page,
                per_page,
                total,
                total_pages,
                has_next: u64::from(request.page) < total_pages,
            },
        }
    }
}
