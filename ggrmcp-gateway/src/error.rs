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

//! Gateway error taxonomy
//!
//! Framing, validation and routing failures become JSON-RPC errors.
//! Invocation failures never do - they surface as tool-call results with
//! `isError` set, so [`GatewayError::is_tool_call_failure`] drives that
//! split in the dispatcher.

use thiserror::Error;

use ggrmcp_core::mcp::{
    ERROR_CODE_INTERNAL_ERROR, ERROR_CODE_INVALID_PARAMS, ERROR_CODE_METHOD_NOT_FOUND,
};
use ggrmcp_core::DescriptorError;

/// Errors that can occur while serving the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("tool {0} not found")]
    ToolNotFound(String),

    #[error("streaming methods are not supported")]
    StreamingUnsupported,

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("upstream call failed: {0}")]
    UpstreamFailure(String),

    #[error("upstream call cancelled: {0}")]
    UpstreamCancelled(String),

    #[error("not connected to upstream server")]
    NotConnected,

    #[error("duplicate tool name {tool}: {first} and {second}")]
    DuplicateTool {
        tool: String,
        first: String,
        second: String,
    },

    #[error("discovery failed: {0}")]
    DiscoveryFailure(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("rate limit exceeded for session {0}")]
    RateLimited(String),

    #[error("session {0} is blocked")]
    SessionBlocked(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl GatewayError {
    /// JSON-RPC error code for failures that surface as JSON-RPC errors.
    pub fn jsonrpc_code(&self) -> i32 {
        match self {
            GatewayError::ToolNotFound(_) => ERROR_CODE_METHOD_NOT_FOUND,
            GatewayError::InvalidArguments(_) => ERROR_CODE_INVALID_PARAMS,
            _ => ERROR_CODE_INTERNAL_ERROR,
        }
    }

    /// Invocation-path failures belong in the tool-call result body, not in
    /// the JSON-RPC error slot. Argument-validation failures are excluded:
    /// those are JSON-RPC `InvalidParams`.
    pub fn is_tool_call_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::ToolNotFound(_)
                | GatewayError::StreamingUnsupported
                | GatewayError::UpstreamFailure(_)
                | GatewayError::UpstreamCancelled(_)
                | GatewayError::NotConnected
        )
    }
}
