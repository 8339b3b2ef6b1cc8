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

//! Test doubles for the dispatcher
//!
//! A mock discoverer that serves a small greeting service and emulates the
//! example backend, recording every invocation so tests can assert on the
//! forwarded headers and arguments.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    ServiceDescriptorProto,
};
use serde_json::json;

use ggrmcp_core::config::{HeaderForwardingConfig, SessionConfig};
use ggrmcp_core::descriptors::{extract_methods, DescriptorRegistry, ExtractOptions};
use ggrmcp_core::headers::HeaderFilter;
use ggrmcp_core::mcp::Validator;
use ggrmcp_core::types::{MethodInfo, ServiceStats};

use ggrmcp_gateway::error::GatewayError;
use ggrmcp_gateway::server::GatewayHandler;
use ggrmcp_gateway::session::SessionManager;
use ggrmcp_gateway::ServiceDiscoverer;

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

/// `hello.HelloService.SayHello(HelloRequest{name,email}) -> HelloReply{message}`.
pub fn hello_methods() -> Vec<MethodInfo> {
    let file = FileDescriptorProto {
        name: Some("hello.proto".to_string()),
        package: Some("hello".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            DescriptorProto {
                name: Some("HelloRequest".to_string()),
                field: vec![string_field("name", 1), string_field("email", 2)],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("HelloReply".to_string()),
                field: vec![string_field("message", 1)],
                ..Default::default()
            },
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("HelloService".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("SayHello".to_string()),
                input_type: Some(".hello.HelloRequest".to_string()),
                output_type: Some(".hello.HelloReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    let mut registry = DescriptorRegistry::new();
    registry.add_files(vec![file]).unwrap();
    extract_methods(&registry, &ExtractOptions::default())
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub headers: HashMap<String, String>,
    pub tool_name: String,
    pub arguments_json: String,
}

/// Discoverer double emulating the greeting backend.
pub struct MockDiscoverer {
    methods: HashMap<String, MethodInfo>,
    pub calls: Mutex<Vec<RecordedCall>>,
    pub healthy: bool,
    pub fail_upstream: bool,
}

impl MockDiscoverer {
    pub fn new() -> Self {
        let methods = hello_methods()
            .into_iter()
            .map(|m| (m.tool_name.clone(), m))
            .collect();
        Self {
            methods,
            calls: Mutex::new(Vec::new()),
            healthy: true,
            fail_upstream: false,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    pub fn failing_upstream() -> Self {
        Self {
            fail_upstream: true,
            ..Self::new()
        }
    }
}

#[tonic::async_trait]
impl ServiceDiscoverer for MockDiscoverer {
    fn methods(&self) -> Vec<MethodInfo> {
        self.methods.values().cloned().collect()
    }

    fn method_by_tool(&self, tool_name: &str) -> Option<MethodInfo> {
        self.methods.get(tool_name).cloned()
    }

    fn method_count(&self) -> usize {
        self.methods.len()
    }

    fn service_stats(&self) -> ServiceStats {
        let mut services: Vec<String> = self
            .methods
            .values()
            .map(|m| m.service_name.clone())
            .collect();
        services.sort();
        services.dedup();
        ServiceStats {
            service_count: services.len(),
            method_count: self.methods.len(),
            is_connected: self.healthy,
            services,
        }
    }

    async fn invoke_by_tool(
        &self,
        headers: &HashMap<String, String>,
        tool_name: &str,
        arguments_json: &str,
    ) -> Result<String, GatewayError> {
        let method = self
            .methods
            .get(tool_name)
            .ok_or_else(|| GatewayError::ToolNotFound(tool_name.to_string()))?;
        assert!(!method.is_streaming());

        self.calls.lock().push(RecordedCall {
            headers: headers.clone(),
            tool_name: tool_name.to_string(),
            arguments_json: arguments_json.to_string(),
        });

        if self.fail_upstream {
            return Err(GatewayError::UpstreamFailure(
                "Unavailable: connection refused".to_string(),
            ));
        }

        // Emulates the example backend's reply.
        let arguments: serde_json::Value = if arguments_json.is_empty() {
            json!({})
        } else {
            serde_json::from_str(arguments_json)
                .map_err(|e| GatewayError::InvalidArguments(e.to_string()))?
        };
        let name = arguments["name"].as_str().unwrap_or("stranger");
        let email = arguments["email"].as_str().unwrap_or("unknown");
        Ok(json!({ "message": format!("Hello {}! Your email is {}", name, email) }).to_string())
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        if self.healthy {
            Ok(())
        } else {
            Err(GatewayError::UpstreamFailure("probe failed".to_string()))
        }
    }
}

pub fn forwarding_policy() -> HeaderForwardingConfig {
    HeaderForwardingConfig {
        enabled: true,
        allowed_headers: vec!["authorization".to_string(), "x-trace-id".to_string()],
        blocked_headers: vec!["cookie".to_string(), "mcp-session-id".to_string()],
        forward_all: false,
        case_sensitive: false,
    }
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        ttl: std::time::Duration::from_secs(1800),
        cleanup_interval: std::time::Duration::from_secs(300),
        max_sessions: 100,
        requests_per_minute: 100,
        window: std::time::Duration::from_secs(60),
    }
}

pub fn handler_with(discoverer: Arc<MockDiscoverer>) -> Arc<GatewayHandler> {
    handler_with_sessions(discoverer, SessionManager::new(session_config()))
}

pub fn handler_with_sessions(
    discoverer: Arc<MockDiscoverer>,
    sessions: Arc<SessionManager>,
) -> Arc<GatewayHandler> {
    GatewayHandler::new(
        discoverer as Arc<dyn ServiceDiscoverer>,
        sessions,
        Validator::new(),
        HeaderFilter::new(forwarding_policy()),
    )
}
