//! Pagination metadata.
//!
//! Follows the `X-Total` / `X-Per-Page` / `X-Page` header convention used by
//! Grape-style APIs.

use serde::{Deserialize, Serialize};

/// Pagination information attached to a paged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageInfo {
    /// Current page number.
    pub number: u64,
    /// Items per page.
    pub size: u64,
    /// Total items across all pages.
    pub total: u64,
}

impl PageInfo {
    pub const fn new(number: u64, size: u64, total: u64) -> Self {
        Self {
            number,
            size,
            total,
        }
    }

    /// Whether items remain past this page.
    pub const fn has_more(&self) -> bool {
        self.size.saturating_mul(self.number) < self.total
    }
}

/// One page of entities plus the server's pagination headers, when sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    pub entities: Vec<E>,
    pub page_info: Option<PageInfo>,
}
