//! Flat search input as tools receive it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Filter, SearchCriteriaRequest, SortOrder};
use crate::error::Result;

/// Search parameters shared by every search-style tool.
///
/// All fields are optional; paging defaults to page 1 with 10 results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchInput {
    /// Filters; every filter must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    /// Sort orders in priority order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_orders: Option<Vec<SortOrder>>,
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub page: Option<u32>,
    /// Results per page, 1 to 10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1, max = 10))]
    pub page_size: Option<u32>,
}

/// Compiled query string with the paging values that went into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Encoded `searchCriteria` query string, without a leading `?`.
    pub query_string: String,
    /// Effective page.
    pub page: u32,
    /// Effective page size.
    pub page_size: u32,
}

impl SearchCriteria {
    /// Appends the query string to `path`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{path}?{}", self.query_string)
    }
}

/// Applies defaults to `input` and compiles it.
///
/// # Errors
///
/// Returns [`crate::error::BridgeError::ValidationError`] if paging is out of
/// range or a filter or sort order is malformed.
///
/// # Examples
///
/// ```
/// use commerce_mcp_bridge::search::{SearchInput, build_search_criteria_from_input};
///
/// let criteria = build_search_criteria_from_input(&SearchInput::default())?;
/// assert_eq!(criteria.page, 1);
/// assert_eq!(criteria.page_size, 10);
/// assert_eq!(criteria.endpoint("/orders"), "/orders?searchCriteria[pageSize]=10&searchCriteria[currentPage]=1");
/// # Ok::<(), commerce_mcp_bridge::BridgeError>(())
/// ```
pub fn build_search_criteria_from_input(input: &SearchInput) -> Result<SearchCriteria> {
    let request = SearchCriteriaRequest {
        filters: input.filters.clone().unwrap_or_default(),
        sort_orders: input.sort_orders.clone().unwrap_or_default(),
        page: input.page.unwrap_or(DEFAULT_PAGE),
        page_size: input.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let query_string = request.compile()?.to_query_string();

    Ok(SearchCriteria { query_string, page: request.page, page_size: request.page_size })
}
