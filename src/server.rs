//! HTTP surface of the bridge
//!
//! Routes follow the MCP-style layout: the catalog under `/mcp/tools`,
//! envelope dispatch under `/mcp/execute`, per-tool invocation under
//! `/mcp/tools/{name}`, and trivial health and version endpoints. The transport
//! maps error kinds onto HTTP status codes; the envelope itself is produced
//! by the registry, so both invocation routes return identical bodies for
//! identical calls.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::Context;
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::ErrorKind;
use crate::tools::{Arguments, InvocationResult, ToolRegistry};

/// Protocol version advertised at /mcp/version
const PROTOCOL_VERSION: &str = "0.1";

/// Shared read-only state behind every handler
pub struct ServerState {
    pub registry: ToolRegistry,
}

impl ServerState {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }
}

/// Envelope body accepted by /mcp/execute
#[derive(Debug, Deserialize)]
pub struct InvocationRequest {
    pub tool: String,
    #[serde(default)]
    pub arguments: Arguments,
}

/// Build the bridge router with all routes attached
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(root).post(root))
        .route("/health", get(health))
        .route("/mcp/health", get(health))
        .route("/mcp/version", get(version))
        .route("/mcp/resources", get(list_resources))
        .route("/mcp/tools", get(list_tools))
        .route("/mcp/tools/{name}", post(invoke_named))
        .route("/mcp/execute", post(execute))
        .with_state(state)
}

/// Bind and run the bridge until interrupted
pub async fn serve(config: &ServerConfig, registry: ToolRegistry) -> eyre::Result<()> {
    let state = Arc::new(ServerState::new(registry));
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .context(format!("Failed to bind {}", config.bind_addr()))?;
    let addr = listener.local_addr().context("Failed to read local address")?;
    info!("bridge listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("bridge shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "MCP Bridge API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn version() -> Json<Value> {
    Json(json!({ "version": PROTOCOL_VERSION }))
}

// The bridge serves no MCP resources, only tools.
async fn list_resources() -> Json<Value> {
    Json(json!({ "resources": [] }))
}

async fn list_tools(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let tools: Vec<Value> = state
        .registry
        .descriptors()
        .iter()
        .map(|d| d.to_wire())
        .collect();
    Json(json!({ "tools": tools }))
}

/// POST /mcp/tools/{name} - invoke one tool, body is the bare argument object
async fn invoke_named(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let args = match parse_arguments(payload) {
        Ok(args) => args,
        Err(response) => return response,
    };

    let outcome = state.registry.invoke(&name, &args).await;
    respond(outcome, None)
}

/// POST /mcp/execute - invoke via the invocation envelope, tagging the
/// response with a fresh execution id
async fn execute(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<InvocationRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let execution_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let (status, Json(body)) =
                bad_request(format!("malformed invocation request: {}", rejection));
            return (status, Json(with_execution_id(body, execution_id)));
        }
    };

    info!("execution {}: tool '{}'", execution_id, request.tool);
    let outcome = state.registry.invoke(&request.tool, &request.arguments).await;
    respond(outcome, Some(execution_id))
}

/// Accept a JSON body as an argument map. `null` and an absent object are
/// treated as no arguments; anything else non-object is rejected.
fn parse_arguments(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Arguments, (StatusCode, Json<Value>)> {
    let Json(value) = payload.map_err(|e| bad_request(format!("malformed JSON body: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Arguments::new()),
        other => Err(bad_request(format!(
            "arguments must be a JSON object, got {}",
            crate::tools::ParamKind::value_type_name(&other)
        ))),
    }
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "kind": ErrorKind::ValidationError,
                "message": message
            }
        })),
    )
}

fn with_execution_id(mut body: Value, execution_id: Uuid) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert("execution_id".to_string(), json!(execution_id.to_string()));
    }
    body
}

/// Convert an invocation outcome into HTTP status plus JSON body
fn respond(outcome: InvocationResult, execution_id: Option<Uuid>) -> (StatusCode, Json<Value>) {
    let status = match outcome.kind() {
        None => StatusCode::OK,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::ValidationError) | Some(ErrorKind::InvalidArgument) => {
            StatusCode::BAD_REQUEST
        }
        Some(ErrorKind::UpstreamError) => StatusCode::BAD_GATEWAY,
        Some(ErrorKind::UpstreamTimeout) => StatusCode::GATEWAY_TIMEOUT,
        Some(ErrorKind::InternalError) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = serde_json::to_value(&outcome).unwrap_or_else(|_| {
        json!({
            "error": {
                "kind": ErrorKind::InternalError,
                "message": "unexpected internal error"
            }
        })
    });

    let body = match execution_id {
        Some(id) => with_execution_id(body, id),
        None => body,
    };

    (status, Json(body))
}
