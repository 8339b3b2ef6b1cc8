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

//! Descriptor acquisition and linking
//!
//! Raw `FileDescriptorProto`s arrive from two sources - the server
//! reflection protocol or a compiled `FileDescriptorSet` on disk - and are
//! linked here into a [`DescriptorRegistry`] closed under the import
//! relation. Missing imports are resolved against the ambient registry of
//! well-known types. Source-code comments are extracted from the raw file
//! protos by descriptor path.

mod comments;
mod extract;
mod loader;
mod registry;

pub use comments::{
    enum_comments, enum_value_comments, field_comments, location_comments, message_comments,
    method_comments, oneof_comments, service_comments,
};
pub use extract::{extract_methods, ExtractOptions};
pub use loader::load_descriptor_set;
pub use registry::DescriptorRegistry;
