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

//! Source-comment extraction
//!
//! Comments live in the `SourceCodeInfo` table of the raw
//! `FileDescriptorProto`, keyed by descriptor path. For any descriptor the
//! comment text is the leading comment followed by the trailing comment,
//! newline-joined and trimmed. A file without source info simply yields
//! empty strings; that is not an error.

use prost_reflect::{
    EnumDescriptor, EnumValueDescriptor, FieldDescriptor, MessageDescriptor, MethodDescriptor,
    OneofDescriptor, ServiceDescriptor,
};
use prost_types::FileDescriptorProto;

/// Looks up the comment text recorded for `path` in a file's source info.
pub fn location_comments(file: &FileDescriptorProto, path: &[i32]) -> String {
    let Some(info) = &file.source_code_info else {
        return String::new();
    };

    let Some(location) = info.location.iter().find(|loc| loc.path == path) else {
        return String::new();
    };

    let leading = location.leading_comments();
    let trailing = location.trailing_comments();

    let joined = if leading.is_empty() {
        trailing.to_string()
    } else if trailing.is_empty() {
        leading.to_string()
    } else {
        format!("{}\n{}", leading, trailing)
    };

    joined.trim().to_string()
}

pub fn message_comments(desc: &MessageDescriptor) -> String {
    location_comments(desc.parent_file().file_descriptor_proto(), desc.path())
}

pub fn field_comments(desc: &FieldDescriptor) -> String {
    location_comments(
        desc.parent_message().parent_file().file_descriptor_proto(),
        desc.path(),
    )
}

pub fn oneof_comments(desc: &OneofDescriptor) -> String {
    location_comments(
        desc.parent_message().parent_file().file_descriptor_proto(),
        desc.path(),
    )
}

pub fn enum_comments(desc: &EnumDescriptor) -> String {
    location_comments(desc.parent_file().file_descriptor_proto(), desc.path())
}

pub fn enum_value_comments(desc: &EnumValueDescriptor) -> String {
    location_comments(
        desc.parent_enum().parent_file().file_descriptor_proto(),
        desc.path(),
    )
}

pub fn service_comments(desc: &ServiceDescriptor) -> String {
    location_comments(desc.parent_file().file_descriptor_proto(), desc.path())
}

pub fn method_comments(desc: &MethodDescriptor) -> String {
    location_comments(
        desc.parent_service().parent_file().file_descriptor_proto(),
        desc.path(),
    )
}
