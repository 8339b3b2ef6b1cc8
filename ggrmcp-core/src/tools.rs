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

//! Tool building
//!
//! Materialises `{name, description, inputSchema, outputSchema}` for every
//! discovered unary method. Streaming methods are filtered out here - the
//! exposed tool map must never contain one.

use tracing::{debug, warn};

use crate::error::ToolError;
use crate::mcp::Tool;
use crate::schema::message_schema;
use crate::types::MethodInfo;

/// Builds MCP tool definitions from discovered methods.
#[derive(Debug, Clone, Default)]
pub struct ToolBuilder;

impl ToolBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds one tool from a method. Fails for streaming methods and for
    /// tools that would not pass MCP naming rules.
    pub fn build_tool(&self, method: &MethodInfo) -> Result<Tool, ToolError> {
        if method.is_streaming() {
            return Err(ToolError::Streaming(method.full_name.clone()));
        }

        let tool = Tool {
            name: method.tool_name.clone(),
            description: description_for(method),
            input_schema: message_schema(&method.input_descriptor),
            output_schema: message_schema(&method.output_descriptor),
        };

        validate_tool(&tool)?;

        debug!(
            "built tool {} for {}.{}",
            tool.name, method.service_name, method.name
        );
        Ok(tool)
    }

    /// Builds tools for every non-streaming method, skipping and logging any
    /// that fail validation.
    pub fn build_tools(&self, methods: &[MethodInfo]) -> Vec<Tool> {
        let mut tools = Vec::with_capacity(methods.len());

        for method in methods {
            if method.is_streaming() {
                debug!(
                    "skipping streaming method {}.{}",
                    method.service_name, method.name
                );
                continue;
            }

            match self.build_tool(method) {
                Ok(tool) => tools.push(tool),
                Err(e) => {
                    warn!(
                        "failed to build tool for {}.{}: {}",
                        method.service_name, method.name, e
                    );
                }
            }
        }

        tools
    }
}

/// The method's own comment when present, otherwise a generic description.
fn description_for(method: &MethodInfo) -> String {
    if !method.description.is_empty() {
        return method.description.clone();
    }
    format!(
        "Calls the {} method of the {} service",
        method.name, method.service_name
    )
}

fn validate_tool(tool: &Tool) -> Result<(), ToolError> {
    if tool.name.is_empty() {
        return Err(ToolError::EmptyName);
    }
    if tool.description.is_empty() {
        return Err(ToolError::EmptyDescription);
    }
    if !tool.input_schema.is_object() {
        return Err(ToolError::MissingInputSchema);
    }
    if !tool.name.contains('_') {
        return Err(ToolError::MissingSeparator(tool.name.clone()));
    }
    Ok(())
}
