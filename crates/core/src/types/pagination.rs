//! Page/limit handling shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// Requested page and page size, as sent in the query string.
///
/// Missing values fall back to page 1 and 20 items. Out-of-range values are
/// clamped rather than rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A normalized page window ready to bind into `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;
    /// Highest page number honoured; larger requests land on this page.
    pub const MAX_PAGE: i64 = 1_000_000;

    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Number of pages needed to show `total` rows.
    #[must_use]
    pub const fn page_count(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

impl From<PageRequest> for Page {
    fn from(req: PageRequest) -> Self {
        Self {
            page: req.page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            limit: req
                .limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        PageRequest::default().into()
    }
}

/// A page of results together with paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl<T> Paginated<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
            pages: page.page_count(total),
        }
    }
}

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// SQL keyword for `ORDER BY`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = Page::default();
        assert_eq!(page, Page { page: 1, limit: 20 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let page = Page::from(PageRequest {
            page: Some(-3),
            limit: Some(10_000),
        });
        assert_eq!(page, Page { page: 1, limit: 100 });

        let page = Page::from(PageRequest {
            page: Some(3),
            limit: Some(0),
        });
        assert_eq!(page, Page { page: 3, limit: 1 });
        assert_eq!(page.offset(), 2);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let page = Page::from(PageRequest {
            page: Some(i64::MAX),
            limit: Some(100),
        });
        assert_eq!(page.page, Page::MAX_PAGE);
        assert_eq!(page.offset(), (Page::MAX_PAGE - 1) * 100);

        let unnormalized = Page {
            page: i64::MAX,
            limit: 100,
        };
        assert_eq!(unnormalized.offset(), i64::MAX);
    }

    #[test]
    fn test_page_count() {
        let page = Page { page: 1, limit: 20 };
        assert_eq!(page.page_count(0), 0);
        assert_eq!(page.page_count(20), 1);
        assert_eq!(page.page_count(21), 2);
    }
}
