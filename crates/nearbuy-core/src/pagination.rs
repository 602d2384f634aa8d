//! Offset pagination over an already-ordered result set.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 20;

/// One page of results plus the metadata a client needs to walk the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items before slicing.
    pub total: usize,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Transform the items while keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
            has_prev: self.has_prev,
            has_next: self.has_next,
        }
    }
}

/// Slice `items` down to the 1-indexed `page` of size `per_page`.
///
/// Out-of-range pages yield an empty `items` list with valid metadata.
/// Non-positive `per_page` yields an empty page with `pages == 0`, and
/// non-positive `page` yields an empty page.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: i64, per_page: i64) -> Page<T> {
    let total = items.len();
    let total_i64 = i64::try_from(total).unwrap_or(i64::MAX);

    if per_page <= 0 {
        return Page {
            items: Vec::new(),
            total,
            page,
            per_page,
            pages: 0,
            has_prev: page > 1,
            has_next: false,
        };
    }

    let start = page.saturating_sub(1).saturating_mul(per_page);
    let end = start.saturating_add(per_page);
    let pages = total_i64.saturating_add(per_page - 1) / per_page;

    let slice = if start < 0 || start >= total_i64 {
        Vec::new()
    } else {
        // `start` is in 0..total here, so both conversions are lossless.
        let start = usize::try_from(start).unwrap_or(total);
        let end = usize::try_from(end.min(total_i64)).unwrap_or(total);
        items.into_iter().skip(start).take(end - start).collect()
    };

    Page {
        items: slice,
        total,
        page,
        per_page,
        pages,
        has_prev: page > 1,
        has_next: end < total_i64,
    }
}
