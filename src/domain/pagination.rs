use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter and pagination parameters for list endpoints.
///
/// Value equality and hashing are derived so that structurally equal
/// parameter sets resolve to the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search: None,
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListParams {
    pub fn with_search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    /// Query pairs in the order the API documents them.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(3);
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query.push(("skip", self.skip.to_string()));
        query.push(("limit", self.limit.to_string()));
        query
    }
}

/// One page of a list response: `{items, total}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    /// Number of pages needed to show `total` items at `page_size` per page.
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(page_size))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;

    fn hash_of(params: &ListParams) -> u64 {
        let mut hasher = DefaultHasher::new();
        params.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn structurally_equal_params_hash_alike() {
        let a = ListParams {
            search: Some("dune".to_string()),
            skip: 0,
            limit: 12,
        };
        let b = ListParams {
            search: Some("dune".to_string()),
            skip: 0,
            limit: 12,
        };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = ListParams {
            skip: 12,
            ..a.clone()
        };
        assert_ne!(a, c);
    }

    #[test]
    fn query_pairs_skip_absent_search() {
        let params = ListParams::default();
        assert_eq!(
            params.to_query(),
            vec![("skip", "0".to_string()), ("limit", "10".to_string())]
        );

        let params = ListParams::with_search("dune");
        assert_eq!(params.to_query()[0], ("search", "dune".to_string()));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::<u8> {
            items: vec![],
            total: 2,
        };
        assert_eq!(page.total_pages(12), 1);

        let page = Page::<u8> {
            items: vec![],
            total: 25,
        };
        assert_eq!(page.total_pages(10), 3);

        let page = Page::<u8> {
            items: vec![],
            total: 0,
        };
        assert_eq!(page.total_pages(10), 0);
    }
}
