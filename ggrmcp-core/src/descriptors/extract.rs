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

//! Method extraction
//!
//! Walks every service in a linked registry and emits one [`MethodInfo`] per
//! method, descriptors resolved. Both discovery paths share this code: the
//! reflection client passes the set of service names the server advertised,
//! the descriptor-set path takes everything. Streaming flags are recorded
//! here; filtering streaming methods out of the tool map happens downstream
//! in the tool builder.

use std::collections::HashSet;

use tracing::debug;

use super::comments::{method_comments, service_comments};
use super::registry::DescriptorRegistry;
use crate::types::{tool_name, MethodInfo};

/// Options controlling method extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Restrict extraction to these full service names (reflection discovery
    /// passes the advertised list). `None` extracts every service.
    pub only_services: Option<HashSet<String>>,
    /// Keep only the last two dot segments of service names with more than
    /// two segments, matching the shape the reflection protocol returns.
    pub compat_service_names: bool,
}

/// Extracts a flat method list from every service in the registry.
pub fn extract_methods(registry: &DescriptorRegistry, options: &ExtractOptions) -> Vec<MethodInfo> {
    let mut methods = Vec::new();

    for service in registry.services() {
        let full_service_name = service.full_name().to_string();

        if let Some(only) = &options.only_services {
            if !only.contains(&full_service_name) {
                continue;
            }
        }

        let service_name = if options.compat_service_names {
            compat_service_name(&full_service_name)
        } else {
            full_service_name.clone()
        };
        let service_description = service_comments(&service);

        debug!(
            "extracting methods from service {} ({} methods)",
            service_name,
            service.methods().len()
        );

        for method in service.methods() {
            let name = method.name().to_string();
            let info = MethodInfo {
                tool_name: tool_name(&service_name, &name),
                full_name: method.full_name().to_string(),
                service_name: service_name.clone(),
                service_description: service_description.clone(),
                description: method_comments(&method),
                input_type: method.input().full_name().to_string(),
                output_type: method.output().full_name().to_string(),
                input_descriptor: method.input(),
                output_descriptor: method.output(),
                is_client_streaming: method.is_client_streaming(),
                is_server_streaming: method.is_server_streaming(),
                name,
            };
            methods.push(info);
        }
    }

    methods
}

/// Shortens `com.example.hello.HelloService` to `hello.HelloService` so that
/// descriptor-set discovery lines up with what reflection returns. Names
/// with two or fewer segments pass through unchanged.
fn compat_service_name(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split('.').collect();
    if parts.len() <= 2 {
        return full_name.to_string();
    }
    format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
}
