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

//! ggRMCP gateway - the network half of the gRPC to MCP bridge
//!
//! ```text
//! MCP client (Claude, Cursor, ...)
//!      |
//!      | HTTP / JSON-RPC 2.0
//!      v
//! +--------------------------------+
//! |  ggrmcp-gateway (this crate)   |
//! |  - JSON-RPC dispatch           |
//! |  - session table               |
//! |  - discovery orchestrator      |
//! |  - dynamic invocation engine   |
//! +--------------------------------+
//!      |
//!      | gRPC (reflection + dynamic unary calls)
//!      v
//! upstream gRPC server
//! ```
//!
//! Discovery introspects the upstream (server reflection, or a compiled
//! `FileDescriptorSet` with reflection fallback), publishes an immutable
//! tool snapshot, and every `tools/call` becomes one dynamic unary call on
//! the shared channel.

pub mod codec;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod invoke;
pub mod reflection;
pub mod server;
pub mod session;

pub use discovery::{GrpcServiceDiscoverer, ServiceDiscoverer};
pub use error::GatewayError;
pub use server::GatewayHandler;
pub use session::SessionManager;
