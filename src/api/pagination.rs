use serde::Deserialize;

use crate::config::PaginationConfig;

/// Common `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Resolve to a concrete (page, per_page) pair, clamping the limit to
    /// the configured ceiling.
    #[must_use]
    pub fn resolve(self, config: &PaginationConfig) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .limit
            .unwrap_or(config.page_size)
            .clamp(1, config.max_page_size);
        (page, per_page)
    }
}

#[must_use]
pub const fn total_pages(count: u64, per_page: u64) -> u64 {
    count.div_ceil(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_applies_defaults() {
        let config = PaginationConfig::default();
        let (page, per_page) = PageQuery::default().resolve(&config);
        assert_eq!(page, 1);
        assert_eq!(per_page, config.page_size);
    }

    #[test]
    fn resolve_clamps_limit() {
        let config = PaginationConfig {
            page_size: 6,
            max_page_size: 100,
        };
        let query = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        let (page, per_page) = query.resolve(&config);
        assert_eq!(page, 1);
        assert_eq!(per_page, 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 6), 0);
        assert_eq!(total_pages(6, 6), 1);
        assert_eq!(total_pages(7, 6), 2);
    }
}
