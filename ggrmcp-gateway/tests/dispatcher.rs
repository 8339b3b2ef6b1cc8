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

//! Dispatcher behaviour over the JSON-RPC lifecycle

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use ggrmcp_core::config::SessionConfig;
use ggrmcp_gateway::session::SessionManager;

use common::MockDiscoverer;

async fn post(handler: &ggrmcp_gateway::server::GatewayHandler, body: Value) -> Value {
    post_with_headers(handler, HashMap::new(), body)
        .await
        .expect("expected a response body")
}

async fn post_with_headers(
    handler: &ggrmcp_gateway::server::GatewayHandler,
    headers: HashMap<String, String>,
    body: Value,
) -> Option<Value> {
    let (_, response) = handler
        .process_post(headers, body.to_string().as_bytes())
        .await;
    response.map(|r| serde_json::to_value(r).unwrap())
}

#[tokio::test]
async fn initialize_reports_fixed_capabilities() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let body = post(
        &handler,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
    )
    .await;

    let result = &body["result"];
    assert_eq!(result["protocolVersion"], json!("2024-11-05"));
    assert_eq!(result["serverInfo"]["name"], json!("ggRMCP"));
    assert_eq!(result["serverInfo"]["version"], json!("1.0.0"));
    for capability in ["tools", "prompts", "resources"] {
        assert_eq!(
            result["capabilities"][capability]["listChanged"],
            json!(false)
        );
    }
}

#[tokio::test]
async fn get_returns_initialize_with_id_one() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let (session_id, response) = handler.process_get(HashMap::new());
    let body = serde_json::to_value(response).unwrap();

    assert!(!session_id.is_empty());
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["result"]["serverInfo"]["name"], json!("ggRMCP"));
}

#[tokio::test]
async fn tools_list_exposes_the_hello_tool() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let body = post(
        &handler,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;

    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);

    let tool = &tools[0];
    assert_eq!(tool["name"], json!("hello_helloservice_sayhello"));
    assert!(!tool["description"].as_str().unwrap().is_empty());

    let input = &tool["inputSchema"];
    assert_eq!(input["type"], json!("object"));
    assert_eq!(input["properties"]["name"]["type"], json!("string"));
    assert_eq!(input["properties"]["email"]["type"], json!("string"));
    let required: Vec<&str> = input["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(required.contains(&"name") && required.contains(&"email"));

    assert_eq!(
        tool["outputSchema"]["properties"]["message"]["type"],
        json!("string")
    );
}

#[tokio::test]
async fn tools_call_wraps_backend_reply_in_content() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let body = post(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {
                "name": "hello_helloservice_sayhello",
                "arguments": {"name": "Ada", "email": "a@x"},
            },
        }),
    )
    .await;

    let result = &body["result"];
    assert_eq!(result["isError"], json!(false));
    assert_eq!(result["content"][0]["type"], json!("text"));

    let reply: Value =
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(reply["message"], json!("Hello Ada! Your email is a@x"));
}

#[tokio::test]
async fn unknown_tool_is_a_tool_call_error_result() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));

    // The mapping must be consistent across calls.
    for id in [3, 4] {
        let body = post(
            &handler,
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": {"name": "no_such_tool"},
            }),
        )
        .await;

        assert!(body.get("error").is_none());
        let result = &body["result"];
        assert_eq!(result["isError"], json!(true));
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("not found"));
    }
}

#[tokio::test]
async fn upstream_failure_is_an_error_result_not_a_jsonrpc_error() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::failing_upstream()));
    let body = post(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "hello_helloservice_sayhello", "arguments": {}},
        }),
    )
    .await;

    assert!(body.get("error").is_none());
    let result = &body["result"];
    assert_eq!(result["isError"], json!(true));
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Error invoking method:"));
}

#[tokio::test]
async fn prompts_and_resources_are_empty_arrays() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));

    let body = post(
        &handler,
        json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/list"}),
    )
    .await;
    assert_eq!(body["result"]["prompts"], json!([]));

    let body = post(
        &handler,
        json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}),
    )
    .await;
    assert_eq!(body["result"]["resources"], json!([]));
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let body = post(
        &handler,
        json!({"jsonrpc": "2.0", "id": 1, "method": "bogus/method"}),
    )
    .await;
    assert_eq!(body["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn wrong_version_is_invalid_request() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let body = post(
        &handler,
        json!({"jsonrpc": "1.0", "id": 1, "method": "tools/list"}),
    )
    .await;
    assert_eq!(body["error"]["code"], json!(-32600));
}

#[tokio::test]
async fn bad_tool_name_is_invalid_params() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let body = post(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "not a valid name!"},
        }),
    )
    .await;
    assert_eq!(body["error"]["code"], json!(-32602));
}

#[tokio::test]
async fn unparseable_body_is_parse_error_with_null_id() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let (session_id, response) = handler
        .process_post(HashMap::new(), b"{this is not json")
        .await;
    let body = serde_json::to_value(response.unwrap()).unwrap();

    assert!(!session_id.is_empty());
    assert_eq!(body["error"]["code"], json!(-32700));
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn notifications_produce_no_response_body() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));
    let response = post_with_headers(
        &handler,
        HashMap::new(),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert!(response.is_none());
}

#[tokio::test]
async fn header_forwarding_passes_exactly_the_allowed_headers() {
    let discoverer = Arc::new(MockDiscoverer::new());
    let handler = common::handler_with(discoverer.clone());

    let mut headers = HashMap::new();
    headers.insert("authorization".to_string(), "Bearer x".to_string());
    headers.insert("x-trace-id".to_string(), "t".to_string());
    headers.insert("cookie".to_string(), "c=1".to_string());
    headers.insert("x-other".to_string(), "o".to_string());

    let body = post_with_headers(
        &handler,
        headers,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "hello_helloservice_sayhello", "arguments": {"name": "Ada", "email": "a@x"}},
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["result"]["isError"], json!(false));

    let calls = discoverer.calls.lock();
    assert_eq!(calls.len(), 1);
    let forwarded = &calls[0].headers;
    assert_eq!(forwarded.len(), 2);
    assert_eq!(forwarded.get("authorization").map(String::as_str), Some("Bearer x"));
    assert_eq!(forwarded.get("x-trace-id").map(String::as_str), Some("t"));
    assert!(!forwarded.contains_key("cookie"));
    assert!(!forwarded.contains_key("x-other"));
}

#[tokio::test]
async fn session_id_round_trips_within_ttl() {
    let handler = common::handler_with(Arc::new(MockDiscoverer::new()));

    let (first_id, _) = handler
        .process_post(
            HashMap::new(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})
                .to_string()
                .as_bytes(),
        )
        .await;

    let mut headers = HashMap::new();
    headers.insert("mcp-session-id".to_string(), first_id.clone());
    let (second_id, _) = handler
        .process_post(
            headers,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})
                .to_string()
                .as_bytes(),
        )
        .await;

    assert_eq!(first_id, second_id);
}

#[tokio::test]
async fn rate_limited_sessions_get_internal_error_without_invocation() {
    let discoverer = Arc::new(MockDiscoverer::new());
    let sessions = SessionManager::new(SessionConfig {
        requests_per_minute: 1,
        ..common::session_config()
    });
    let handler = common::handler_with_sessions(discoverer.clone(), sessions);

    let call = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "hello_helloservice_sayhello", "arguments": {}},
    });

    let (session_id, first) = handler
        .process_post(HashMap::new(), call.to_string().as_bytes())
        .await;
    let first = serde_json::to_value(first.unwrap()).unwrap();
    assert!(first.get("error").is_none());

    let mut headers = HashMap::new();
    headers.insert("mcp-session-id".to_string(), session_id);
    let (_, second) = handler
        .process_post(headers, call.to_string().as_bytes())
        .await;
    let second = serde_json::to_value(second.unwrap()).unwrap();
    assert_eq!(second["error"]["code"], json!(-32603));

    // The upstream saw exactly one invocation.
    assert_eq!(discoverer.calls.lock().len(), 1);
}

#[tokio::test]
async fn blocked_sessions_are_refused_before_dispatch() {
    let discoverer = Arc::new(MockDiscoverer::new());
    let sessions = SessionManager::new(common::session_config());
    let handler = common::handler_with_sessions(discoverer.clone(), sessions.clone());

    let (session_id, _) = handler
        .process_post(
            HashMap::new(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})
                .to_string()
                .as_bytes(),
        )
        .await;

    sessions.block(&session_id);

    let mut headers = HashMap::new();
    headers.insert("mcp-session-id".to_string(), session_id);
    let (_, response) = handler
        .process_post(
            headers,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})
                .to_string()
                .as_bytes(),
        )
        .await;
    let body = serde_json::to_value(response.unwrap()).unwrap();
    assert_eq!(body["error"]["code"], json!(-32603));
    assert!(body["error"]["message"].as_str().unwrap().contains("blocked"));
}

#[tokio::test]
async fn empty_arguments_are_forwarded_as_empty_string() {
    let discoverer = Arc::new(MockDiscoverer::new());
    let handler = common::handler_with(discoverer.clone());

    post(
        &handler,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "hello_helloservice_sayhello"},
        }),
    )
    .await;

    let calls = discoverer.calls.lock();
    assert_eq!(calls[0].arguments_json, "");
}
