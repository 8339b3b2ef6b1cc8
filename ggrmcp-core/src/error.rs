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

//! Error types for descriptor linking and tool building

use thiserror::Error;

/// Errors raised while acquiring or linking protobuf descriptors.
///
/// All of these are fatal to the discovery source that produced them; the
/// orchestrator falls back to the other source when one is configured.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// A file names a dependency that is neither in the incoming set nor in
    /// the ambient registry of well-known types.
    #[error("unresolved import {import} required by {file}")]
    UnresolvedImport { file: String, import: String },

    /// Descriptor bytes could not be parsed or linked.
    #[error("malformed descriptor {file}: {reason}")]
    MalformedDescriptor { file: String, reason: String },

    /// Two distinct definitions were registered under the same file path.
    #[error("conflicting definitions for {0}")]
    DuplicateConflict(String),

    /// The descriptor-set file could not be read.
    #[error("failed to read descriptor set {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while materialising an MCP tool from a discovered method.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool name cannot be empty")]
    EmptyName,

    #[error("tool description cannot be empty")]
    EmptyDescription,

    #[error("tool input schema must be an object")]
    MissingInputSchema,

    #[error("tool name {0} must contain an underscore separator")]
    MissingSeparator(String),

    #[error("streaming method {0} cannot be exposed as a tool")]
    Streaming(String),
}

/// Errors raised while validating the gateway configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
