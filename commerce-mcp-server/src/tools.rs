//! MCP tools backed by the commerce platform client.
//!
//! Each tool performs one platform call and renders the [`ApiResult`] as text:
//! pretty-printed JSON on success, `Error calling {endpoint}: {error}` with the
//! MCP error flag on failure. Failures are tool results, not protocol errors,
//! so the model sees the upstream status and message.

use std::sync::Arc;

use commerce_mcp_bridge::{
    ApiResult, CommerceClient,
    payload::PayloadBuilder,
    search::{SearchInput, build_search_criteria_from_input},
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

/// Category lookup parameters.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIdParams {
    /// Numeric category id.
    pub category_id: u64,
}

/// Category creation parameters.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryParams {
    /// Display name.
    pub name: String,
    /// Parent category id; the platform defaults to the root category.
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Whether the category is enabled.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Sort position among siblings.
    #[serde(default)]
    pub position: Option<u32>,
    /// Whether the category appears in navigation menus.
    #[serde(default)]
    pub include_in_menu: Option<bool>,
}

impl CreateCategoryParams {
    fn to_payload(&self) -> Value {
        PayloadBuilder::new()
            .field("name", self.name.as_str())
            .optional("parent_id", self.parent_id)
            .optional("is_active", self.is_active)
            .optional("position", self.position)
            .optional("include_in_menu", self.include_in_menu)
            .wrap("category")
    }
}

/// Product lookup parameters.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductSkuParams {
    /// Product SKU, exactly as stored.
    pub sku: String,
}

/// MCP server exposing platform operations as tools.
#[derive(Clone)]
pub struct CommerceTools {
    client: Arc<CommerceClient>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for CommerceTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceTools").field("client", &self.client).finish_non_exhaustive()
    }
}

#[tool_router]
impl CommerceTools {
    /// Creates the tool set around a shared client.
    #[must_use]
    pub fn new(client: Arc<CommerceClient>) -> Self {
        Self { client, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Search product categories. Filters are AND'd; each has field, value, and conditionType (eq, neq, like, gt, lt, gteq, lteq, in, nin, null, notnull, finset, from, to, moreq). pageSize is at most 10."
    )]
    async fn search_categories(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.search("/categories/list", &input).await))
    }

    #[tool(description = "Get one product category by id, including its children.")]
    async fn get_category(
        &self,
        Parameters(params): Parameters<CategoryIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.fetch(format!("/categories/{}", params.category_id)).await))
    }

    #[tool(description = "Create a product category. Only the fields you provide are sent.")]
    async fn create_category(
        &self,
        Parameters(params): Parameters<CreateCategoryParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.create_category_result(&params).await))
    }

    #[tool(description = "Delete a product category by id. This cannot be undone.")]
    async fn delete_category(
        &self,
        Parameters(params): Parameters<CategoryIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.delete_category_result(params.category_id).await))
    }

    #[tool(
        description = "Search products by attributes such as name, sku, price, status, or type_id. pageSize is at most 10."
    )]
    async fn search_products(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.search("/products", &input).await))
    }

    #[tool(description = "Get one product by SKU.")]
    async fn get_product(
        &self,
        Parameters(params): Parameters<ProductSkuParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.fetch(product_endpoint(&params.sku)).await))
    }

    #[tool(
        description = "Search sales orders, e.g. by status, customer_email, or created_at range (from/to). pageSize is at most 10."
    )]
    async fn search_orders(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.search("/orders", &input).await))
    }

    #[tool(
        description = "Search customers, e.g. by email, firstname, lastname, or group_id. pageSize is at most 10."
    )]
    async fn search_customers(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(&self.search("/customers/search", &input).await))
    }
}

impl CommerceTools {
    #[instrument(skip(self, input))]
    async fn search(&self, path: &str, input: &SearchInput) -> ApiResult<Value> {
        match build_search_criteria_from_input(input) {
            Ok(criteria) => {
                let endpoint = criteria.endpoint(path);
                let result = self.client.get(&endpoint).await;
                ApiResult::from_result(endpoint, result)
            }
            Err(e) => ApiResult::from_result(path, Err(e)),
        }
    }

    async fn fetch(&self, endpoint: String) -> ApiResult<Value> {
        let result = self.client.get(&endpoint).await;
        ApiResult::from_result(endpoint, result)
    }

    async fn create_category_result(&self, params: &CreateCategoryParams) -> ApiResult<Value> {
        let endpoint = "/categories";
        let result = self.client.post(endpoint, &params.to_payload()).await;
        if result.is_ok() {
            info!(name = %params.name, "created category");
        }
        ApiResult::from_result(endpoint, result)
    }

    async fn delete_category_result(&self, category_id: u64) -> ApiResult<Value> {
        let endpoint = format!("/categories/{category_id}");
        let result = self.client.delete(&endpoint).await;
        if result.is_ok() {
            info!(category_id, "deleted category");
        }
        ApiResult::from_result(endpoint, result)
    }
}

#[tool_handler]
impl ServerHandler for CommerceTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Tools for a commerce platform's catalog, orders, and customers. Search tools \
                 take filters, sortOrders, page, and pageSize (max 10). Results are JSON; \
                 failures start with 'Error calling' and include the upstream status code."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn product_endpoint(sku: &str) -> String {
    format!("/products/{}", urlencoding::encode(sku))
}

/// Renders a result as tool output text and whether it is an error.
fn render_text(result: &ApiResult<Value>) -> (String, bool) {
    match result {
        ApiResult::Success { data, .. } => (
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
            false,
        ),
        ApiResult::Failure { endpoint, error } => {
            (format!("Error calling {endpoint}: {error}"), true)
        }
    }
}

fn render(result: &ApiResult<Value>) -> CallToolResult {
    let (text, is_error) = render_text(result);
    if is_error {
        CallToolResult::error(vec![Content::text(text)])
    } else {
        CallToolResult::success(vec![Content::text(text)])
    }
}

#[cfg(test)]
mod tests {
    use commerce_mcp_bridge::{
        Credentials,
        auth::SignedCredentials,
        search::{ConditionType, Filter},
    };
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    use super::*;

    fn tools(server: &ServerGuard) -> CommerceTools {
        let client = CommerceClient::new(Credentials::Signed(SignedCredentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            access_token: "at".into(),
            access_token_secret: "ats".into(),
            base_url: format!("{}/rest/V1", server.url()),
        }))
        .unwrap();
        CommerceTools::new(Arc::new(client))
    }

    #[test]
    fn test_render_success_is_pretty_json() {
        let result = ApiResult::from_result("/categories/2", Ok(json!({"id": 2})));
        let (text, is_error) = render_text(&result);
        assert!(!is_error);
        assert_eq!(text, "{\n  \"id\": 2\n}");
    }

    #[test]
    fn test_render_failure_names_endpoint() {
        let result: ApiResult<Value> = ApiResult::Failure {
            endpoint: "/categories/999999".into(),
            error: "request failed with status code 404: Not Found".into(),
        };
        let (text, is_error) = render_text(&result);
        assert!(is_error);
        assert_eq!(
            text,
            "Error calling /categories/999999: request failed with status code 404: Not Found"
        );
    }

    #[test]
    fn test_render_sets_error_flag() {
        let failed: ApiResult<Value> =
            ApiResult::Failure { endpoint: "/orders".into(), error: "boom".into() };
        assert_eq!(render(&failed).is_error, Some(true));

        let ok = ApiResult::from_result("/orders", Ok(json!([])));
        assert_ne!(render(&ok).is_error, Some(true));
    }

    #[test]
    fn test_product_endpoint_encodes_sku() {
        assert_eq!(product_endpoint("WB-1"), "/products/WB-1");
        assert_eq!(product_endpoint("24-MB01/blue xl"), "/products/24-MB01%2Fblue%20xl");
    }

    #[test]
    fn test_create_category_payload_omits_unset_fields() {
        let params: CreateCategoryParams =
            serde_json::from_value(json!({"name": "Shoes", "isActive": false})).unwrap();
        assert_eq!(params.to_payload(), json!({"category": {"name": "Shoes", "is_active": false}}));
    }

    #[test]
    fn test_server_info_enables_tools() {
        let server = mockito::Server::new();
        let info = tools(&server).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("pageSize"));
    }

    #[test]
    fn test_all_tools_registered() {
        let server = mockito::Server::new();
        let tools = tools(&server);
        let mut names: Vec<String> =
            tools.tool_router.list_all().into_iter().map(|tool| tool.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            [
                "create_category",
                "delete_category",
                "get_category",
                "get_product",
                "search_categories",
                "search_customers",
                "search_orders",
                "search_products",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_categories_compiles_criteria() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/V1/categories/list")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "searchCriteria[filterGroups][0][filters][0][value]".into(),
                    "Default Category".into(),
                ),
                Matcher::UrlEncoded("searchCriteria[pageSize]".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"items":[{"id":2}],"total_count":1}"#)
            .expect(1)
            .create_async()
            .await;

        let tools = tools(&server);
        let input = SearchInput {
            filters: Some(vec![Filter::new("name", "Default Category", ConditionType::Eq)]),
            ..Default::default()
        };
        let result = tools.search("/categories/list", &input).await;

        assert!(result.is_success());
        assert!(result.endpoint().starts_with("/categories/list?searchCriteria"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_rejects_oversized_page_before_calling() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let tools = tools(&server);
        let input = SearchInput { page_size: Some(11), ..Default::default() };
        let result = tools.search("/orders", &input).await;

        assert_eq!(result.endpoint(), "/orders");
        assert!(result.error().unwrap().contains("pageSize"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_category_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/V1/categories/999999")
            .with_status(404)
            .with_body(r#"{"message":"No such entity with %fieldName = %fieldValue","parameters":{"fieldName":"id","fieldValue":"999999"}}"#)
            .create_async()
            .await;

        let tools = tools(&server);
        let result = tools.fetch("/categories/999999".into()).await;
        let (text, is_error) = render_text(&result);

        assert!(is_error);
        assert!(text.starts_with("Error calling /categories/999999:"));
        assert!(text.contains("404"));
        assert!(text.contains("No such entity with id = 999999"));
    }

    #[tokio::test]
    async fn test_create_and_delete_category() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/rest/V1/categories")
            .match_body(Matcher::Json(json!({"category": {"name": "Shoes", "parent_id": 2}})))
            .with_status(200)
            .with_body(r#"{"id":41,"name":"Shoes","parent_id":2}"#)
            .expect(1)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/rest/V1/categories/41")
            .with_status(200)
            .with_body("true")
            .expect(1)
            .create_async()
            .await;

        let tools = tools(&server);
        let params = CreateCategoryParams {
            name: "Shoes".into(),
            parent_id: Some(2),
            is_active: None,
            position: None,
            include_in_menu: None,
        };

        let created = tools.create_category_result(&params).await;
        assert_eq!(created.data().unwrap()["id"], 41);

        let deleted = tools.delete_category_result(41).await;
        assert_eq!(deleted.data(), Some(&json!(true)));

        create.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_product_by_sku() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/V1/products/24-MB01")
            .with_status(200)
            .with_body(r#"{"sku":"24-MB01","name":"Joust Duffle Bag","price":34}"#)
            .expect(1)
            .create_async()
            .await;

        let tools = tools(&server);
        let result = tools.fetch(product_endpoint("24-MB01")).await;
        let (text, is_error) = render_text(&result);

        assert!(!is_error);
        assert!(text.contains("\"name\": \"Joust Duffle Bag\""));
        mock.assert_async().await;
    }
}
