//! MCP server handler, shared application state, and tool router.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::{
    tool::{ToolCallContext, ToolRoute, ToolRouter},
    ServerHandler,
};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ReadResourceRequestParam, ReadResourceResult, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use tracing::info_span;

use crate::bakong::BakongClient;
use crate::config::GlobalConfig;
use crate::store::TransactionStore;

/// Shared application state accessible by all MCP tool handlers.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// In-memory transaction store.
    pub store: Arc<TransactionStore>,
    /// Bakong API client (absent in offline mode).
    pub bakong: Option<Arc<BakongClient>>,
}

/// MCP server implementation that exposes the five KHQR payment tools
/// and the `khqr://transaction/{md5}` resources.
pub struct KhqrServer {
    state: Arc<AppState>,
}

impl KhqrServer {
    /// Create a new MCP server bound to shared application state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Access the shared application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    fn tool_router() -> ToolRouter<Self> {
        let mut router = ToolRouter::new();

        for tool in Self::all_tools() {
            let name = tool.name.to_string();
            match name.as_str() {
                "generate_qr_code" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::generate_qr::handle(context))
                    }));
                }
                "check_payment_status" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::check_payment::handle(context))
                    }));
                }
                "get_transaction" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::get_transaction::handle(context))
                    }));
                }
                "list_transactions" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::list_transactions::handle(context))
                    }));
                }
                "simulate_payment_callback" => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(crate::mcp::tools::simulate_callback::handle(context))
                    }));
                }
                _ => {
                    router.add_route(ToolRoute::new_dyn(tool, |_context| {
                        Box::pin(async {
                            Err(rmcp::ErrorData::internal_error(
                                "tool not implemented",
                                None,
                            ))
                        })
                    }));
                }
            }
        }

        router
    }

    /// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
    fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
        match value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::default()),
        }
    }

    #[allow(clippy::too_many_lines)] // Tool definitions are intentionally verbose for clarity.
    fn all_tools() -> Vec<Tool> {
        vec![
            Tool::new(
                "generate_qr_code",
                "Generate a KHQR payment QR code for accepting payments",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "bank_account": {
                            "type": "string",
                            "description": "The merchant's Bakong account identifier"
                        },
                        "merchant_name": {
                            "type": "string",
                            "description": "The name of the merchant"
                        },
                        "amount": {
                            "type": "number",
                            "description": "Payment amount (must be positive)"
                        },
                        "currency": {
                            "type": "string",
                            "enum": ["USD", "KHR"],
                            "description": "Currency code (USD or KHR)"
                        },
                        "merchant_city": {
                            "type": "string",
                            "description": "Merchant city (default: Phnom Penh)"
                        },
                        "store_label": { "type": "string", "description": "Store label for identification" },
                        "phone_number": { "type": "string", "description": "Merchant phone number" },
                        "bill_number": { "type": "string", "description": "Bill or invoice number" },
                        "terminal_label": { "type": "string", "description": "Terminal identifier" },
                        "static": {
                            "type": "boolean",
                            "description": "Whether to generate a static QR code",
                            "default": false
                        },
                        "callback_url": {
                            "type": "string",
                            "description": "Callback URL for payment notifications (enables deeplink generation)"
                        },
                        "app_icon_url": { "type": "string", "description": "App icon URL for the deeplink" },
                        "app_name": { "type": "string", "description": "App name for the deeplink (default: Payment)" }
                    },
                    "required": ["bank_account", "merchant_name", "amount", "currency"]
                })),
            ),
            Tool::new(
                "check_payment_status",
                "Check the payment status of a transaction by MD5 hash",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "md5": {
                            "type": "string",
                            "description": "The MD5 hash of the transaction to check"
                        }
                    },
                    "required": ["md5"]
                })),
            ),
            Tool::new(
                "get_transaction",
                "Get detailed information about a transaction",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "md5": {
                            "type": "string",
                            "description": "The MD5 hash of the transaction"
                        }
                    },
                    "required": ["md5"]
                })),
            ),
            Tool::new(
                "list_transactions",
                "List all transactions with optional filtering",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "status": {
                            "type": "string",
                            "enum": ["pending", "paid", "all"],
                            "description": "Filter by transaction status (default: all)"
                        }
                    }
                })),
            ),
            Tool::new(
                "simulate_payment_callback",
                "Simulate a payment callback (for testing purposes)",
                Self::schema(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "md5": {
                            "type": "string",
                            "description": "The MD5 hash of the transaction"
                        },
                        "status": {
                            "type": "string",
                            "enum": ["success", "0"],
                            "description": "Payment status (success or 0)"
                        }
                    },
                    "required": ["md5"]
                })),
            ),
        ]
    }
}

impl ServerHandler for KhqrServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "KHQR payment server: generate payment QR codes, track their \
                 payment state via Bakong, and read stored transactions as \
                 khqr://transaction/{md5} resources."
                    .into(),
            ),
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_ {
        let router = Self::tool_router();
        let _span = info_span!("call_tool", tool = %request.name).entered();

        async move {
            router
                .call(ToolCallContext::new(self, request, context))
                .await
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_ {
        let tools = Self::all_tools();

        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, rmcp::ErrorData>> + Send + '_ {
        let state = Arc::clone(&self.state);

        async move {
            let transactions = state
                .store
                .list(crate::models::transaction::StatusFilter::All)
                .await;
            Ok(crate::mcp::resources::transaction::list_resources(
                &transactions,
            ))
        }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, rmcp::ErrorData>> + Send + '_
    {
        std::future::ready(Ok(
            crate::mcp::resources::transaction::resource_templates(),
        ))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, rmcp::ErrorData>> + Send + '_ {
        let state = Arc::clone(&self.state);

        async move {
            crate::mcp::resources::transaction::read_resource(&request, &state)
                .await
                .map_err(|err| rmcp::ErrorData::resource_not_found(err.to_string(), None))
        }
    }
}
