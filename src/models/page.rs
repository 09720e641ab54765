//! Pagination window shared by the list endpoints

use crate::error::{AppError, AppResult};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 200;

/// Page number and size as actually used by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
}

impl Page {
    /// Normalize optional query parameters: pages start at 1, sizes are
    /// clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::BadRequest(format!("Page {} is out of range", page)))?;

        Ok(Self { page, per_page, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            Page::new(None, None).unwrap(),
            Page { page: 1, per_page: 20, offset: 0 }
        );
    }

    #[test]
    fn test_out_of_range_values_are_normalized() {
        assert_eq!(
            Page::new(Some(0), Some(1000)).unwrap(),
            Page { page: 1, per_page: 200, offset: 0 }
        );
        assert_eq!(
            Page::new(Some(3), Some(-5)).unwrap(),
            Page { page: 3, per_page: 1, offset: 2 }
        );
    }

    #[test]
    fn test_huge_page_is_a_bad_request() {
        assert!(matches!(
            Page::new(Some(i64::MAX), Some(200)),
            Err(AppError::BadRequest(_))
        ));
    }
}
