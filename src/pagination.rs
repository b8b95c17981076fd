use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

/// Largest page size accepted by strict listings
pub const MAX_PER_PAGE: i64 = 100;
/// Silent cap applied by the ticket listings
pub const TICKET_PER_PAGE_CAP: i64 = 50;

/// `page` / `per_page` query parameters, both optional
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
}

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// Saturates instead of overflowing on huge page numbers
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// `ceil(total / per_page)`, zero for an empty result
    pub fn pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.per_page - 1) / self.per_page
        }
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            total,
            pages: self.pages(total),
            current_page: self.page,
        }
    }
}

/// Totals reported alongside every paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

impl PageParams {
    /// Strict validation: out-of-range values are rejected
    pub fn validate(&self, default_per_page: i64) -> Result<Page, ApiError> {
        let page = match self.page {
            Some(p) if p < 1 => {
                return Err(ApiError::BadRequest(
                    "page must be a positive number (greater than 0).".to_string(),
                ))
            }
            Some(p) => p,
            None => 1,
        };

        let per_page = match self.per_page {
            Some(n) if !(1..=MAX_PER_PAGE).contains(&n) => {
                return Err(ApiError::BadRequest(format!(
                    "per_page must be between 1 and {}.",
                    MAX_PER_PAGE
                )))
            }
            Some(n) => n,
            None => default_per_page,
        };

        Ok(Page { page, per_page })
    }

    /// Lenient variant: invalid values fall back to defaults and
    /// `per_page` is clamped to `cap`
    pub fn capped(&self, default_per_page: i64, cap: i64) -> Page {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(1);
        let per_page = self
            .per_page
            .filter(|n| *n >= 1)
            .unwrap_or(default_per_page)
            .min(cap);

        Page { page, per_page }
    }
}

/// Trims a string parameter, `None` when nothing is left
pub fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(page: Option<i64>, per_page: Option<i64>) -> PageParams {
        PageParams { page, per_page }
    }

    #[test]
    fn test_defaults() {
        let page = params(None, None).validate(5).unwrap();
        assert_eq!(page, Page { page: 1, per_page: 5 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let page = params(Some(3), Some(20)).validate(5).unwrap();
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let page = params(Some(i64::MAX), Some(20)).validate(5).unwrap();
        assert_eq!(page.offset(), i64::MAX);

        let page = params(Some(i64::MAX), Some(500)).capped(10, TICKET_PER_PAGE_CAP);
        assert_eq!(page.offset(), i64::MAX);
        assert_eq!(page.limit(), TICKET_PER_PAGE_CAP);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(params(Some(0), None).validate(5).is_err());
        assert!(params(Some(-2), None).validate(5).is_err());
        assert!(params(None, Some(0)).validate(5).is_err());
        assert!(params(None, Some(101)).validate(5).is_err());
        assert!(params(None, Some(100)).validate(5).is_ok());
    }

    #[test]
    fn test_capped_clamps_instead_of_failing() {
        assert_eq!(
            params(Some(0), Some(500)).capped(10, TICKET_PER_PAGE_CAP),
            Page { page: 1, per_page: 50 }
        );
        assert_eq!(
            params(None, Some(-1)).capped(10, TICKET_PER_PAGE_CAP),
            Page { page: 1, per_page: 10 }
        );
        assert_eq!(
            params(Some(2), Some(25)).capped(10, TICKET_PER_PAGE_CAP),
            Page { page: 2, per_page: 25 }
        );
    }

    #[test]
    fn test_pages() {
        let page = Page { page: 1, per_page: 5 };
        assert_eq!(page.pages(0), 0);
        assert_eq!(page.pages(1), 1);
        assert_eq!(page.pages(5), 1);
        assert_eq!(page.pages(6), 2);
        assert_eq!(
            page.meta(11),
            PageMeta { total: 11, pages: 3, current_page: 1 }
        );
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(normalize_string(Some("  brake ".into())), Some("brake".into()));
        assert_eq!(normalize_string(Some("   ".into())), None);
        assert_eq!(normalize_string(None), None);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_total(total in 0i64..10_000, per_page in 1i64..=100) {
            let page = Page { page: 1, per_page };
            let pages = page.pages(total);
            prop_assert!(pages * per_page >= total);
            prop_assert!(pages == 0 || (pages - 1) * per_page < total);
        }

        #[test]
        fn prop_offset_never_negative(page in 1i64.., per_page in 1i64..=100) {
            let window = params(Some(page), Some(per_page)).validate(5).unwrap();
            prop_assert!(window.offset() >= 0);
        }
    }
}
