//! `searchCriteria` query compilation.
//!
//! The platform's collection endpoints take filters, sort orders, and paging
//! as nested query parameters:
//!
//! ```text
//! searchCriteria[filterGroups][0][filters][0][field]=name
//! searchCriteria[filterGroups][0][filters][0][value]=Default%20Category
//! searchCriteria[filterGroups][0][filters][0][condition_type]=eq
//! searchCriteria[sortOrders][0][field]=created_at
//! searchCriteria[sortOrders][0][direction]=DESC
//! searchCriteria[pageSize]=10
//! searchCriteria[currentPage]=1
//! ```
//!
//! Filter groups are AND'd together and filters inside a group are OR'd. Each
//! filter is compiled into its own group, so every filter must match.
//!
//! # Examples
//!
//! ```
//! use commerce_mcp_bridge::search::{Filter, SearchCriteriaRequest};
//!
//! let request = SearchCriteriaRequest {
//!     filters: vec![Filter::eq("name", "Default Category")],
//!     ..Default::default()
//! };
//!
//! let query = request.compile()?.to_query_string();
//! assert!(query.contains("searchCriteria[filterGroups][0][filters][0][value]=Default%20Category"));
//! assert!(query.ends_with("searchCriteria[pageSize]=10&searchCriteria[currentPage]=1"));
//! # Ok::<(), commerce_mcp_bridge::BridgeError>(())
//! ```

mod criteria;
mod input;

pub use criteria::{ConditionType, Filter, FilterValue, SortDirection, SortOrder};
pub use input::{SearchCriteria, SearchInput, build_search_criteria_from_input};

use crate::error::{BridgeError, Result};

/// Largest page the platform is asked for.
pub const MAX_PAGE_SIZE: u32 = 10;

/// Page size used when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

/// First page number.
pub const DEFAULT_PAGE: u32 = 1;

const PREFIX: &str = "searchCriteria";

/// Filters, sort orders, and paging for one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteriaRequest {
    /// Filters, each compiled into its own AND'd group.
    pub filters: Vec<Filter>,
    /// Sort orders in priority order.
    pub sort_orders: Vec<SortOrder>,
    /// 1-based page number.
    pub page: u32,
    /// Results per page, 1 to [`MAX_PAGE_SIZE`].
    pub page_size: u32,
}

impl Default for SearchCriteriaRequest {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort_orders: Vec::new(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchCriteriaRequest {
    /// Validates the request and compiles it into ordered query pairs.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ValidationError`] if paging is out of range or a
    /// filter or sort order is malformed.
    pub fn compile(&self) -> Result<CompiledQuery> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(BridgeError::ValidationError(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.page == 0 {
            return Err(BridgeError::ValidationError("page must be at least 1, got 0".to_owned()));
        }

        let mut pairs = Vec::with_capacity(self.filters.len() * 3 + self.sort_orders.len() * 2 + 2);

        for (group, filter) in self.filters.iter().enumerate() {
            filter.validate()?;
            let key = format!("{PREFIX}[filterGroups][{group}][filters][0]");
            pairs.push((format!("{key}[field]"), filter.field.clone()));
            pairs.push((format!("{key}[value]"), filter.value.to_query_value()?));
            pairs.push((format!("{key}[condition_type]"), filter.condition_type.to_string()));
        }

        for (index, sort) in self.sort_orders.iter().enumerate() {
            sort.validate()?;
            let key = format!("{PREFIX}[sortOrders][{index}]");
            pairs.push((format!("{key}[field]"), sort.field.clone()));
            pairs.push((format!("{key}[direction]"), sort.direction.to_string()));
        }

        pairs.push((format!("{PREFIX}[pageSize]"), self.page_size.to_string()));
        pairs.push((format!("{PREFIX}[currentPage]"), self.page.to_string()));

        Ok(CompiledQuery { pairs })
    }
}

/// Ordered `(key, value)` pairs, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pairs: Vec<(String, String)>,
}

impl CompiledQuery {
    /// Pairs in emission order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Encodes the pairs as a query string without a leading `?`.
    ///
    /// Keys are emitted as-is; they only contain ASCII letters, digits, `_`,
    /// and brackets. Values are percent-encoded, with space as `%20`. Empty
    /// values are kept.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
