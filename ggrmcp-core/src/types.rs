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

//! Shared records for service discovery
//!
//! [`MethodInfo`] is the central record of the gateway: one per discovered
//! unary method, created during discovery, immutable afterwards, and shared
//! by reference with the tool builder and the invocation engine.

use prost_reflect::MessageDescriptor;
use serde::Serialize;

/// Everything the gateway knows about one discovered gRPC method.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method simple name, e.g. `SayHello`.
    pub name: String,
    /// Fully-qualified method name, e.g. `hello.HelloService.SayHello`.
    pub full_name: String,
    /// Generated MCP tool name, e.g. `hello_helloservice_sayhello`.
    pub tool_name: String,
    /// Service the method belongs to, e.g. `hello.HelloService`.
    pub service_name: String,
    /// Service description from proto comments; empty if unavailable.
    pub service_description: String,
    /// Method description from proto comments; empty if unavailable.
    pub description: String,
    /// Fully-qualified input message type name.
    pub input_type: String,
    /// Fully-qualified output message type name.
    pub output_type: String,
    /// Resolved input message descriptor, used for schema generation and
    /// dynamic request construction.
    pub input_descriptor: MessageDescriptor,
    /// Resolved output message descriptor.
    pub output_descriptor: MessageDescriptor,
    pub is_client_streaming: bool,
    pub is_server_streaming: bool,
}

impl MethodInfo {
    /// True if the method streams in either direction. Streaming methods must
    /// never appear in the exposed tool map.
    pub fn is_streaming(&self) -> bool {
        self.is_client_streaming || self.is_server_streaming
    }

    /// Derives the stable MCP tool name for this method.
    pub fn generate_tool_name(&self) -> String {
        tool_name(&self.service_name, &self.name)
    }

    /// The gRPC wire path for the method: `/<package.Service>/<Method>`,
    /// split off the full name at its last dot.
    pub fn grpc_path(&self) -> String {
        match self.full_name.rfind('.') {
            Some(idx) => format!("/{}/{}", &self.full_name[..idx], &self.full_name[idx + 1..]),
            None => format!("/{}", self.full_name),
        }
    }
}

/// Builds the deterministic tool name for a service/method pair: the service
/// name lowercased with dots replaced by underscores, then an underscore and
/// the lowercased method name.
///
/// Examples:
/// - `hello.HelloService` / `SayHello` -> `hello_helloservice_sayhello`
/// - `com.example.UserService` / `GetUser` -> `com_example_userservice_getuser`
pub fn tool_name(service_name: &str, method_name: &str) -> String {
    let service_part = service_name.to_lowercase().replace('.', "_");
    let method_part = method_name.to_lowercase();
    format!("{}_{}", service_part, method_part)
}

/// Aggregated discovery statistics, served on the metrics endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub service_count: usize,
    pub method_count: usize,
    pub is_connected: bool,
    pub services: Vec<String>,
}
