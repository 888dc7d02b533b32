//! HTTP bridge exposing the plugin hooks to a host.

// Allow clippy lint triggered by utoipa's OpenApi derive macro
#![allow(clippy::needless_for_each)]

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::build_info::BuildInfo;
use crate::core::PluginHooks;
use crate::core::plugin::{HostEvent, ToolDefinition, ToolResult};

/// Environment variable holding the optional bearer token.
pub const TOKEN_ENV: &str = "CLINE_MODE_API_TOKEN";

/// Shared application state.
pub struct AppState {
    /// Plugin serving the hooks.
    pub plugin: Arc<dyn PluginHooks>,

    /// API token for authentication (if configured).
    pub token: Option<String>,
}

impl AppState {
    /// State for `plugin`, reading the token from the environment.
    #[must_use]
    pub fn new(plugin: Arc<dyn PluginHooks>) -> Self {
        let token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self { plugin, token }
    }
}

pub type SharedState = Arc<RwLock<AppState>>;

/// `OpenAPI` documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "cline-mode API",
        description = "HTTP bridge for the cline-mode plan/act plugin",
        version = "0.4.0",
        license(name = "MIT")
    ),
    paths(
        health,
        config_hook,
        messages_hook,
        system_hook,
        chat_message_hook,
        list_tools,
        execute_tool,
        execute_command
    ),
    components(schemas(
        HealthResponse,
        BuildInfo,
        JsonObject,
        MessagesResponse,
        SystemRequest,
        SystemResponse,
        ChatMessageRequest,
        ToolDefinition,
        ToolResult,
        HostEvent,
        CommandRequest,
        CommandResponse
    ))
)]
struct ApiDoc;

/// Authentication middleware.
///
/// Validates the `Authorization: Bearer <token>` header if a token is configured.
async fn auth_middleware(
    State(state): State<SharedState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let state = state.read().await;

    // If no token configured, allow all requests (localhost-only mode)
    let Some(ref expected_token) = state.token else {
        drop(state);
        return next.run(request).await;
    };

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match auth_header {
        Some(token) if token == expected_token => {
            drop(state);
            next.run(request).await
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "Missing or invalid Authorization header. Use: Bearer <token>"
            })),
        )
            .into_response(),
    }
}

/// Build the router over shared state.
pub fn router(state: SharedState) -> Router {
    let protected_routes = Router::new()
        .route("/hooks/config", post(config_hook))
        .route("/hooks/messages", post(messages_hook))
        .route("/hooks/system", post(system_hook))
        .route("/hooks/chat-message", post(chat_message_hook))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(execute_tool))
        .route("/commands/{name}", post(execute_command))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP bridge.
///
/// # Errors
///
/// Returns an error if the server fails to bind or start.
pub async fn serve(host: &str, port: u16, plugin: Arc<dyn PluginHooks>) -> anyhow::Result<()> {
    plugin.on_load().await?;

    let state: SharedState = Arc::new(RwLock::new(AppState::new(plugin)));
    let auth_enabled = state.read().await.token.is_some();
    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if auth_enabled {
        tracing::info!(addr = %addr, "starting HTTP bridge (auth enabled)");
    } else {
        tracing::warn!(addr = %addr, "starting HTTP bridge (NO AUTH - localhost only recommended)");
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Any JSON object passed through unchanged in shape.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct JsonObject(pub Value);

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub plugin: String,
    pub build: BuildInfo,
}

/// Transformed payload plus events for the host to publish.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessagesResponse {
    pub output: JsonObject,
    pub events: Vec<HostEvent>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SystemRequest {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub system: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SystemResponse {
    pub system: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default, rename = "sessionID")]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommandRequest {
    /// Whitespace-separated arguments.
    #[serde(default)]
    pub args: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommandResponse {
    pub output: String,
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service healthy", body = HealthResponse))
)]
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        plugin: state.plugin.name().to_string(),
        build: BuildInfo::current(),
    })
}

/// Install the mode agents into a host configuration.
#[utoipa::path(
    post,
    path = "/hooks/config",
    request_body = JsonObject,
    responses((status = 200, description = "Updated configuration", body = JsonObject))
)]
async fn config_hook(
    State(state): State<SharedState>,
    Json(JsonObject(mut config)): Json<JsonObject>,
) -> Result<Json<JsonObject>, (StatusCode, String)> {
    let plugin = state.read().await.plugin.clone();
    plugin
        .on_config(&mut config)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(JsonObject(config)))
}

/// Run the messages transform over a transcript payload.
#[utoipa::path(
    post,
    path = "/hooks/messages",
    request_body = JsonObject,
    responses((status = 200, description = "Transformed payload", body = MessagesResponse))
)]
async fn messages_hook(
    State(state): State<SharedState>,
    Json(JsonObject(mut output)): Json<JsonObject>,
) -> Json<MessagesResponse> {
    let plugin = state.read().await.plugin.clone();
    let events = plugin.on_messages_transform(&mut output).await;
    Json(MessagesResponse {
        output: JsonObject(output),
        events,
    })
}

/// Add the mode prompt to a system prompt list.
#[utoipa::path(
    post,
    path = "/hooks/system",
    request_body = SystemRequest,
    responses((status = 200, description = "Updated system prompts", body = SystemResponse))
)]
async fn system_hook(
    State(state): State<SharedState>,
    Json(req): Json<SystemRequest>,
) -> Json<SystemResponse> {
    let plugin = state.read().await.plugin.clone();
    let mut system = req.system;
    plugin.on_system(req.agent.as_deref(), &mut system).await;
    Json(SystemResponse { system })
}

/// Notify the plugin of a chat message.
#[utoipa::path(
    post,
    path = "/hooks/chat-message",
    request_body = ChatMessageRequest,
    responses((status = 204, description = "Recorded"))
)]
async fn chat_message_hook(
    State(state): State<SharedState>,
    Json(req): Json<ChatMessageRequest>,
) -> StatusCode {
    let plugin = state.read().await.plugin.clone();
    plugin
        .on_chat_message(req.agent.as_deref(), req.session_id.as_deref())
        .await;
    StatusCode::NO_CONTENT
}

/// List the plugin's tools.
#[utoipa::path(
    get,
    path = "/tools",
    responses((status = 200, description = "Tool definitions", body = Vec<ToolDefinition>))
)]
async fn list_tools(State(state): State<SharedState>) -> Json<Vec<ToolDefinition>> {
    Json(state.read().await.plugin.tools())
}

/// Execute a tool.
#[utoipa::path(
    post,
    path = "/tools/{name}",
    params(("name" = String, Path, description = "Tool name")),
    request_body = JsonObject,
    responses(
        (status = 200, description = "Tool executed", body = ToolResult),
        (status = 404, description = "Unknown tool")
    )
)]
async fn execute_tool(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    args: Option<Json<JsonObject>>,
) -> Result<Json<ToolResult>, (StatusCode, String)> {
    let plugin = state.read().await.plugin.clone();
    let args = args.map_or_else(|| Value::Object(serde_json::Map::new()), |Json(a)| a.0);

    if !plugin.tools().iter().any(|t| t.name == name) {
        return Err((StatusCode::NOT_FOUND, format!("tool not found: {name}")));
    }

    match plugin.execute_tool(&name, args).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!(tool = %name, error = %e, "tool failed");
            Ok(Json(ToolResult {
                output: format!("❌ {e}"),
                is_error: true,
                events: Vec::new(),
            }))
        }
    }
}

/// Run a slash command.
#[utoipa::path(
    post,
    path = "/commands/{name}",
    params(("name" = String, Path, description = "Command name")),
    request_body = CommandRequest,
    responses((status = 200, description = "Command output", body = CommandResponse))
)]
async fn execute_command(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    req: Option<Json<CommandRequest>>,
) -> Json<CommandResponse> {
    let plugin = state.read().await.plugin.clone();
    let args = req.map(|Json(r)| r.args).unwrap_or_default();
    let output = plugin.execute_command(&name, &args).await;
    Json(CommandResponse { output })
}
