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

//! ggRMCP core - descriptor handling and MCP protocol machinery
//!
//! This crate holds everything the gateway needs that does not touch the
//! network:
//!
//! - **Descriptor registry** - linking `FileDescriptorProto`s (from server
//!   reflection or a compiled `FileDescriptorSet`) into a coherent
//!   [`prost_reflect::DescriptorPool`] that can resolve any message by its
//!   fully-qualified name.
//! - **Schema projection** - turning a message descriptor into a JSON Schema,
//!   including oneofs, maps, enums, well-known types and recursive message
//!   graphs.
//! - **Tool building** - materialising MCP tool definitions from discovered
//!   gRPC methods.
//! - **MCP wire types** - JSON-RPC 2.0 framing, request validation and error
//!   sanitisation.
//! - **Header filtering** - the allow/block policy applied before request
//!   headers are forwarded upstream.

pub mod config;
pub mod descriptors;
pub mod error;
pub mod headers;
pub mod mcp;
pub mod schema;
pub mod tools;
pub mod types;

pub use error::{DescriptorError, ToolError};
pub use types::MethodInfo;
