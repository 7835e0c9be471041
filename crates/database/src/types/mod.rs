//! Shared types and result types for the database layer

pub mod errors;

use serde::{Deserialize, Serialize};

pub use errors::DatabaseError;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Paging and free-text filter shared by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            search: None,
        }
    }
}

impl ListQuery {
    /// Build a query from optional request parameters, clamping to sane bounds.
    pub fn new(page: Option<u32>, limit: Option<u32>, search: Option<String>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
            search: search
                .map(|term| term.trim().to_string())
                .filter(|term| !term.is_empty()),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// `LIKE` pattern for the search term, `%` when no term is set.
    pub(crate) fn like_pattern(&self) -> String {
        match &self.search {
            Some(term) => {
                let escaped = term
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{escaped}%")
            }
            None => "%".to_string(),
        }
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_clamps_bounds() {
        let query = ListQuery::new(Some(0), Some(1_000), Some("   ".to_string()));
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_LIMIT);
        assert!(query.search.is_none());

        let query = ListQuery::new(None, Some(0), None);
        assert_eq!(query.limit, 1);
    }

    #[test]
    fn list_query_offset_uses_page_and_limit() {
        let query = ListQuery::new(Some(3), Some(20), None);
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let query = ListQuery::new(None, None, Some("50%_off".to_string()));
        assert_eq!(query.like_pattern(), "%50\\%\\_off%");
        assert_eq!(ListQuery::default().like_pattern(), "%");
    }
}
