//! Paging for journal range queries.
//!
//! Pages are 1-indexed. The page size is clamped to `1..=MAX_PER_PAGE` so a
//! caller can never ask the store for an unbounded listing.

use serde::{Deserialize, Serialize};

/// Largest page a single query may return.
pub const MAX_PER_PAGE: u32 = 500;

const DEFAULT_PER_PAGE: u32 = 50;

/// Which slice of a listing to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    per_page: Option<u32>,
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page, raw.per_page.unwrap_or(DEFAULT_PER_PAGE))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl PageRequest {
    /// Builds a request, clamping the page to at least 1 and the size to
    /// `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// First page of the given size.
    #[must_use]
    pub fn first(per_page: u32) -> Self {
        Self::new(1, per_page)
    }

    /// The page after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.page.saturating_add(1), self.per_page)
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Rows to take.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// One page of a listing together with its position in the whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Where this page sits.
    pub meta: PageMeta,
}

/// Position of a page within a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Matching items across all pages.
    pub total: u64,
    /// Number of pages; an empty listing still has one.
    pub total_pages: u32,
}

impl PageMeta {
    /// Whether pages follow this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

impl<T> PageResponse<T> {
    /// Wraps the rows fetched for `request` out of `total` matches.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            u32::try_from(total.div_ceil(request.limit())).unwrap_or(u32::MAX)
        };

        Self {
            data,
            meta: PageMeta {
                page: request.page,
                per_page: request.per_page,
                total,
                total_pages,
            },
        }
    }

    /// Converts the items, keeping the page position.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
