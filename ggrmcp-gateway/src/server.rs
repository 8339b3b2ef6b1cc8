// SPDX-License-Identifier: AGPL-3.0-or-later
// ggRMCP - gRPC to MCP Gateway
// Copyright (C) 2026 ggRMCP contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP dispatcher and HTTP surface
//!
//! A single endpoint carries the protocol: `GET /` answers capability
//! discovery, `POST /` takes JSON-RPC 2.0 bodies. Responses are always
//! HTTP 200 with any JSON-RPC error in the body, and always carry the
//! `Mcp-Session-Id` header. `/health` and `/metrics` sit beside it.
//!
//! Per request the path is: parse, validate, resolve session, route,
//! execute, respond. Upstream failures during `tools/call` are *successful*
//! JSON-RPC responses carrying `isError: true` - only framing, validation
//! and routing failures become JSON-RPC errors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use ggrmcp_core::headers::HeaderFilter;
use ggrmcp_core::mcp::{
    sanitize_error, InitializeResult, JsonRpcRequest, JsonRpcResponse, ListChangedCapability,
    RequestId, ServerCapabilities, ServerInfo, ToolCallResult, ToolsListResult, Validator,
};
use ggrmcp_core::tools::ToolBuilder;

use crate::discovery::ServiceDiscoverer;
use crate::error::GatewayError;
use crate::session::{Session, SessionManager};

/// Fixed identity reported by `initialize`.
const SERVER_NAME: &str = "ggRMCP";
const SERVER_VERSION: &str = "1.0.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Session correlation header, lowercase as it appears on the wire.
pub const SESSION_HEADER: &str = "mcp-session-id";

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The MCP request handler shared by all routes.
pub struct GatewayHandler {
    discoverer: Arc<dyn ServiceDiscoverer>,
    sessions: Arc<SessionManager>,
    validator: Validator,
    tool_builder: ToolBuilder,
    header_filter: HeaderFilter,
}

impl GatewayHandler {
    pub fn new(
        discoverer: Arc<dyn ServiceDiscoverer>,
        sessions: Arc<SessionManager>,
        validator: Validator,
        header_filter: HeaderFilter,
    ) -> Arc<Self> {
        Arc::new(Self {
            discoverer,
            sessions,
            validator,
            tool_builder: ToolBuilder::new(),
            header_filter,
        })
    }

    /// The fixed `initialize` result.
    pub fn initialize_result() -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListChangedCapability { list_changed: false },
                prompts: ListChangedCapability { list_changed: false },
                resources: ListChangedCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        }
    }

    /// Capability discovery for `GET /`: the initialize result framed as a
    /// JSON-RPC response with id 1.
    pub fn process_get(&self, headers: HashMap<String, String>) -> (String, JsonRpcResponse) {
        let session = self.resolve_session(headers);
        let response = respond_with(RequestId::from(1), &Self::initialize_result());
        (session.id.clone(), response)
    }

    /// Full JSON-RPC lifecycle for one `POST /` body. Returns the session
    /// id for the response header and the response body; notifications
    /// produce no body.
    pub async fn process_post(
        &self,
        headers: HashMap<String, String>,
        body: &[u8],
    ) -> (String, Option<JsonRpcResponse>) {
        let session = self.resolve_session(headers);

        let request: JsonRpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("failed to parse JSON-RPC request: {}", e);
                return (session.id.clone(), Some(JsonRpcResponse::parse_error()));
            }
        };

        if let Err(e) = self.validator.validate_request(&request) {
            warn!("request validation failed: {}", e);
            let id = request.id.clone().unwrap_or(RequestId::Null);
            return (
                session.id.clone(),
                Some(JsonRpcResponse::invalid_request(
                    id,
                    sanitize_error(&e.to_string()),
                )),
            );
        }

        if request.is_notification() {
            debug!("notification received: {}", request.method);
            return (session.id.clone(), None);
        }

        let id = request.id.clone().unwrap_or(RequestId::Null);

        if session.is_blocked() {
            warn!("refusing request from blocked session {}", session.id);
            let e = GatewayError::SessionBlocked(session.id.clone());
            return (
                session.id.clone(),
                Some(JsonRpcResponse::error(
                    id,
                    e.jsonrpc_code(),
                    sanitize_error(&e.to_string()),
                )),
            );
        }

        info!(
            "processing MCP request method={} session={}",
            request.method, session.id
        );

        let response = self.dispatch(id, &request, &session).await;
        (session.id.clone(), Some(response))
    }

    fn resolve_session(&self, headers: HashMap<String, String>) -> Arc<Session> {
        let session_id = headers.get(SESSION_HEADER).cloned();
        self.sessions.get_or_create(session_id.as_deref(), headers)
    }

    async fn dispatch(
        &self,
        id: RequestId,
        request: &JsonRpcRequest,
        session: &Arc<Session>,
    ) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => respond_with(id, &Self::initialize_result()),
            "notifications/initialized" | "initialized" => {
                JsonRpcResponse::success(id, json!({}))
            }
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request, session).await,
            "prompts/list" => JsonRpcResponse::success(id, json!({ "prompts": [] })),
            "resources/list" => JsonRpcResponse::success(id, json!({ "resources": [] })),
            other => {
                warn!("unknown method: {}", other);
                JsonRpcResponse::method_not_found(id, other)
            }
        }
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let methods = self.discoverer.methods();
        let tools = self.tool_builder.build_tools(&methods);
        debug!(
            "tools/list produced {} tools from {} methods",
            tools.len(),
            methods.len()
        );
        respond_with(id, &ToolsListResult { tools })
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        request: &JsonRpcRequest,
        session: &Arc<Session>,
    ) -> JsonRpcResponse {
        let Some(params) = &request.params else {
            return JsonRpcResponse::invalid_params(id, "params are required");
        };

        let call = match self.validator.validate_tool_call_params(params) {
            Ok(call) => call,
            Err(e) => {
                return JsonRpcResponse::invalid_params(id, sanitize_error(&e.to_string()))
            }
        };

        if !self.sessions.check_rate_limit(session) {
            let e = GatewayError::RateLimited(session.id.clone());
            return JsonRpcResponse::error(id, e.jsonrpc_code(), sanitize_error(&e.to_string()));
        }

        let arguments_json = match &call.arguments {
            Some(value) => match serde_json::to_string(value) {
                Ok(text) => text,
                Err(e) => {
                    return JsonRpcResponse::invalid_params(
                        id,
                        sanitize_error(&format!("failed to encode arguments: {}", e)),
                    )
                }
            },
            None => String::new(),
        };

        let forwarded = self.header_filter.filter(&session.headers);
        debug!(
            "invoking tool {} with {} forwarded headers",
            call.name,
            forwarded.len()
        );

        match self
            .discoverer
            .invoke_by_tool(&forwarded, &call.name, &arguments_json)
            .await
        {
            Ok(output) => {
                session.increment_call_count();
                session.touch();
                respond_with(id, &ToolCallResult::text(output))
            }
            Err(e) if e.is_tool_call_failure() => {
                error!("tool call {} failed: {}", call.name, e);
                respond_with(
                    id,
                    &ToolCallResult::error(format!(
                        "Error invoking method: {}",
                        sanitize_error(&e.to_string())
                    )),
                )
            }
            Err(e) => {
                error!("tool call {} rejected: {}", call.name, e);
                JsonRpcResponse::error(id, e.jsonrpc_code(), sanitize_error(&e.to_string()))
            }
        }
    }

    /// Health body when the upstream probe passes and tools exist.
    async fn health_body(&self) -> Result<Value, StatusCode> {
        let probe = tokio::time::timeout(HEALTH_PROBE_TIMEOUT, self.discoverer.health_check());
        match probe.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("health check failed: {}", e);
                return Err(StatusCode::SERVICE_UNAVAILABLE);
            }
            Err(_) => {
                error!("health check timed out");
                return Err(StatusCode::SERVICE_UNAVAILABLE);
            }
        }

        let method_count = self.discoverer.method_count();
        if method_count == 0 {
            warn!("no methods discovered");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }

        let stats = self.discoverer.service_stats();
        Ok(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "serviceCount": stats.service_count,
            "methodCount": method_count,
        }))
    }

    fn metrics_body(&self) -> Value {
        let stats = self.discoverer.service_stats();
        let mut body = match serde_json::to_value(&stats) {
            Ok(body) => body,
            Err(_) => json!({}),
        };
        body["sessions"] = self.sessions.stats();
        body
    }
}

/// Builds the gateway router: the MCP endpoint plus health and metrics.
pub fn router(handler: Arc<GatewayHandler>) -> Router {
    Router::new()
        .route("/", get(handle_get).post(handle_post))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .with_state(handler)
}

async fn handle_get(
    State(handler): State<Arc<GatewayHandler>>,
    headers: HeaderMap,
) -> Response {
    let (session_id, response) = handler.process_get(flatten_headers(&headers));
    json_with_session(StatusCode::OK, &session_id, &response)
}

async fn handle_post(
    State(handler): State<Arc<GatewayHandler>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (session_id, response) = handler.process_post(flatten_headers(&headers), &body).await;
    match response {
        Some(response) => json_with_session(StatusCode::OK, &session_id, &response),
        // Notifications get an empty accepted response.
        None => {
            let mut response = StatusCode::ACCEPTED.into_response();
            set_session_header(&mut response, &session_id);
            response
        }
    }
}

async fn handle_health(State(handler): State<Arc<GatewayHandler>>) -> Response {
    match handler.health_body().await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(status) => (status, "Service unhealthy").into_response(),
    }
}

async fn handle_metrics(State(handler): State<Arc<GatewayHandler>>) -> Response {
    (StatusCode::OK, Json(handler.metrics_body())).into_response()
}

/// First value per header name, names lowercase as axum stores them.
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flattened = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            flattened
                .entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    flattened
}

fn json_with_session(status: StatusCode, session_id: &str, body: &impl Serialize) -> Response {
    let mut response = (status, Json(serde_json::to_value(body).unwrap_or(Value::Null)))
        .into_response();
    set_session_header(&mut response, session_id);
    response
}

fn set_session_header(response: &mut Response, session_id: &str) {
    // Session ids are hex, always a valid header value.
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
}

/// Wraps a serialisable result into a success response.
fn respond_with<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::internal_error(id, sanitize_error(&e.to_string())),
    }
}
