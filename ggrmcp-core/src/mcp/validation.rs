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

//! Request validation and error sanitisation
//!
//! Every JSON-RPC request passes through [`Validator`] before routing:
//! protocol version, method charset and length, id shape, params nesting
//! depth and total size. Tool-call params get a second pass for the tool
//! name and arguments. All outgoing error text goes through
//! [`sanitize_error`], which redacts credential-looking substrings and
//! truncates to 1 KiB.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::ValidationConfig;
use crate::mcp::types::JsonRpcRequest;

/// A field-level validation failure.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// Validated `tools/call` parameters.
#[derive(Debug, Clone)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<Value>,
}

/// Validates JSON-RPC requests against the configured caps.
#[derive(Debug, Clone)]
pub struct Validator {
    max_field_length: usize,
    max_tool_name_length: usize,
    max_depth: usize,
    max_params_bytes: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::from_config(&ValidationConfig {
            max_field_length: 1024,
            max_tool_name_length: 128,
            max_params_depth: 10,
            max_params_bytes: 1024 * 1024,
        })
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            max_field_length: config.max_field_length,
            max_tool_name_length: config.max_tool_name_length,
            max_depth: config.max_params_depth,
            max_params_bytes: config.max_params_bytes,
        }
    }

    /// Validates framing: version, method, id and params caps.
    pub fn validate_request(&self, req: &JsonRpcRequest) -> Result<(), ValidationError> {
        if req.jsonrpc != "2.0" {
            return Err(ValidationError::new("jsonrpc", "must be '2.0'"));
        }

        if req.method.is_empty() {
            return Err(ValidationError::new("method", "is required"));
        }
        if req.method.len() > self.max_field_length {
            return Err(ValidationError::new(
                "method",
                format!("must be at most {} characters", self.max_field_length),
            ));
        }
        if !method_name_pattern().is_match(&req.method) {
            return Err(ValidationError::new("method", "contains invalid characters"));
        }

        // Notifications are the only requests allowed to omit the id.
        let is_notification_method =
            req.method.starts_with("notifications/") || req.method == "initialized";
        match &req.id {
            Some(id) if id.is_valid() => {}
            Some(_) => return Err(ValidationError::new("id", "must be a string or finite number")),
            None if is_notification_method => {}
            None => return Err(ValidationError::new("id", "is required")),
        }

        if let Some(params) = &req.params {
            self.validate_params(params)?;
        }

        Ok(())
    }

    /// Validates `tools/call` params and pulls out the tool name and
    /// arguments.
    pub fn validate_tool_call_params(
        &self,
        params: &Map<String, Value>,
    ) -> Result<ToolCallParams, ValidationError> {
        let name = match params.get("name") {
            None => return Err(ValidationError::new("name", "is required")),
            Some(Value::String(name)) => name,
            Some(_) => return Err(ValidationError::new("name", "must be a string")),
        };

        if name.is_empty() {
            return Err(ValidationError::new("name", "cannot be empty"));
        }
        if name.len() > self.max_tool_name_length {
            return Err(ValidationError::new(
                "name",
                format!("must be at most {} characters", self.max_tool_name_length),
            ));
        }
        if !tool_name_pattern().is_match(name) {
            return Err(ValidationError::new("name", "contains invalid characters"));
        }

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => None,
            Some(value) => {
                self.validate_depth(value, 0)
                    .map_err(|e| ValidationError::new("arguments", e.message))?;
                self.validate_size(value)
                    .map_err(|e| ValidationError::new("arguments", e.message))?;
                Some(value.clone())
            }
        };

        Ok(ToolCallParams {
            name: name.clone(),
            arguments,
        })
    }

    fn validate_params(&self, params: &Map<String, Value>) -> Result<(), ValidationError> {
        for value in params.values() {
            self.validate_depth(value, 1)?;
        }
        self.validate_size(&Value::Object(params.clone()))
    }

    fn validate_depth(&self, value: &Value, depth: usize) -> Result<(), ValidationError> {
        if depth > self.max_depth {
            return Err(ValidationError::new(
                "params",
                format!("object nesting too deep (max {})", self.max_depth),
            ));
        }

        match value {
            Value::Object(map) => {
                for nested in map.values() {
                    self.validate_depth(nested, depth + 1)?;
                }
            }
            Value::Array(values) => {
                for nested in values {
                    self.validate_depth(nested, depth + 1)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn validate_size(&self, value: &Value) -> Result<(), ValidationError> {
        let size = approximate_size(value);
        if size > self.max_params_bytes {
            return Err(ValidationError::new(
                "params",
                format!("object too large (max {} bytes)", self.max_params_bytes),
            ));
        }
        Ok(())
    }
}

/// Cheap size estimate: string bytes plus key bytes, eight bytes for
/// scalars. Avoids re-serialising just to enforce the cap.
fn approximate_size(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        Value::Object(map) => map
            .iter()
            .map(|(key, nested)| key.len() + approximate_size(nested))
            .sum(),
        Value::Array(values) => values.iter().map(approximate_size).sum(),
        _ => 8,
    }
}

fn method_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_/]+$").expect("valid method pattern"))
}

fn tool_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.]+$").expect("valid tool-name pattern"))
}

fn sensitive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(password|token|key|secret|credential|auth)\S*")
            .expect("valid redaction pattern")
    })
}

fn control_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid control pattern"))
}

/// Strips control characters and truncates to 1 KiB.
pub fn sanitize_string(s: &str) -> String {
    let cleaned = control_pattern().replace_all(s, "");
    let mut cleaned = cleaned.into_owned();
    if cleaned.len() > 1024 {
        let mut cut = 1024;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    cleaned.trim().to_string()
}

/// Redacts credential-looking substrings from an error message, then applies
/// [`sanitize_string`]. Every outgoing error message passes through here.
pub fn sanitize_error(message: &str) -> String {
    let redacted = sensitive_pattern().replace_all(message, "[REDACTED]");
    sanitize_string(&redacted)
}
