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

//! Schema projection
//!
//! Converts a message descriptor into a JSON Schema object: scalar kinds map
//! per the proto-JSON table, enums become string enums with per-value
//! descriptions, repeated fields become arrays, maps become objects with
//! `patternProperties` (keys are always strings on the wire), oneofs become
//! a single `oneOf` property, and the well-known wrapper types collapse to
//! their JSON representations.
//!
//! Recursive message graphs are broken with a *path-scoped* visited set:
//! when a message reappears on the current recursion path a
//! `{"$ref": "#/definitions/<FQN>"}` node is emitted instead of recursing.
//! The set is unwound on return, so sibling occurrences of the same type
//! still expand in full - consumers of these schemas do not necessarily
//! resolve refs.
//!
//! Output is deterministic: `serde_json`'s default map keeps keys sorted, so
//! projecting the same descriptor twice yields byte-equal JSON.

use std::collections::HashSet;

use prost_reflect::{
    EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor, OneofDescriptor,
};
use serde_json::{json, Map, Value};

use crate::descriptors::{
    enum_comments, enum_value_comments, field_comments, message_comments, oneof_comments,
};

/// Projects a message descriptor into a JSON Schema object.
pub fn message_schema(desc: &MessageDescriptor) -> Value {
    let mut visited = HashSet::new();
    project_message(desc, &mut visited)
}

fn project_message(desc: &MessageDescriptor, visited: &mut HashSet<String>) -> Value {
    let full_name = desc.full_name().to_string();
    if visited.contains(&full_name) {
        return json!({ "$ref": format!("#/definitions/{}", full_name) });
    }
    visited.insert(full_name.clone());

    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for field in desc.fields() {
        if let Some(oneof) = field.containing_oneof() {
            // Real oneof members surface inside the oneof property only.
            // Synthetic oneofs are just proto3 `optional` fields.
            if !is_synthetic_oneof(&oneof) {
                continue;
            }
        }

        let field_name = field.name().to_string();
        properties.insert(field_name.clone(), project_field(&field, visited));

        // Required iff the field has neither the explicit `optional` keyword
        // nor presence tracking.
        if !field.supports_presence() {
            required.push(Value::String(field_name));
        }
    }

    for oneof in desc.oneofs() {
        if is_synthetic_oneof(&oneof) {
            continue;
        }
        properties.insert(oneof.name().to_string(), project_oneof(&oneof, visited));
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    let description = message_comments(desc);
    if !description.is_empty() {
        schema.insert("description".to_string(), json!(description));
    }
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }

    visited.remove(&full_name);
    Value::Object(schema)
}

fn project_field(field: &FieldDescriptor, visited: &mut HashSet<String>) -> Value {
    let mut schema = if field.is_list() {
        let mut s = Map::new();
        s.insert("type".to_string(), json!("array"));
        s.insert("items".to_string(), project_kind(field, visited));
        Value::Object(s)
    } else if field.is_map() {
        let value_schema = match field.kind() {
            Kind::Message(entry) => project_kind(&entry.map_entry_value_field(), visited),
            _ => json!({}),
        };
        json!({
            "type": "object",
            "patternProperties": { ".*": value_schema },
            "additionalProperties": false,
        })
    } else {
        project_kind(field, visited)
    };

    let comment = field_comments(field);
    if !comment.is_empty() {
        if let Value::Object(map) = &mut schema {
            map.insert("description".to_string(), json!(comment));
        }
    }
    schema
}

fn project_kind(field: &FieldDescriptor, visited: &mut HashSet<String>) -> Value {
    match field.kind() {
        Kind::Bool => json!({ "type": "boolean" }),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            json!({ "type": "integer", "format": "int32" })
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            json!({ "type": "integer", "format": "int64" })
        }
        Kind::Uint32 | Kind::Fixed32 => {
            json!({ "type": "integer", "format": "uint32", "minimum": 0 })
        }
        Kind::Uint64 | Kind::Fixed64 => {
            json!({ "type": "integer", "format": "uint64", "minimum": 0 })
        }
        Kind::Float => json!({ "type": "number", "format": "float" }),
        Kind::Double => json!({ "type": "number", "format": "double" }),
        Kind::String => json!({ "type": "string" }),
        Kind::Bytes => json!({ "type": "string", "format": "byte" }),
        Kind::Enum(enum_desc) => project_enum(&enum_desc),
        Kind::Message(message_desc) => project_message_type(&message_desc, visited),
    }
}

fn project_message_type(desc: &MessageDescriptor, visited: &mut HashSet<String>) -> Value {
    match desc.full_name() {
        "google.protobuf.Any" => json!({
            "type": "object",
            "description": "Any contains an arbitrary serialized protocol buffer message",
        }),
        "google.protobuf.Timestamp" => json!({
            "type": "string",
            "format": "date-time",
            "description": "RFC 3339 formatted timestamp",
        }),
        "google.protobuf.Duration" => json!({
            "type": "string",
            "format": "duration",
            "description": "Duration in seconds with up to 9 fractional digits",
        }),
        "google.protobuf.Struct" => json!({
            "type": "object",
            "description": "Arbitrary JSON-like structure",
        }),
        // Intentionally untyped: any JSON value is acceptable.
        "google.protobuf.Value" => json!({
            "description": "Any JSON value",
        }),
        "google.protobuf.ListValue" => json!({
            "type": "array",
            "description": "Array of JSON values",
        }),
        "google.protobuf.StringValue" | "google.protobuf.BytesValue" => {
            json!({ "type": "string" })
        }
        "google.protobuf.BoolValue" => json!({ "type": "boolean" }),
        "google.protobuf.Int32Value"
        | "google.protobuf.UInt32Value"
        | "google.protobuf.Int64Value"
        | "google.protobuf.UInt64Value" => json!({ "type": "integer" }),
        "google.protobuf.FloatValue" | "google.protobuf.DoubleValue" => {
            json!({ "type": "number" })
        }
        _ => project_message(desc, visited),
    }
}

fn project_enum(desc: &EnumDescriptor) -> Value {
    let mut values = Vec::new();
    let mut value_descriptions = Map::new();

    for value in desc.values() {
        values.push(json!(value.name()));
        let comment = enum_value_comments(&value);
        if !comment.is_empty() {
            value_descriptions.insert(value.name().to_string(), json!(comment));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("string"));
    schema.insert("enum".to_string(), Value::Array(values));
    let comment = enum_comments(desc);
    if !comment.is_empty() {
        schema.insert("description".to_string(), json!(comment));
    }
    if !value_descriptions.is_empty() {
        schema.insert(
            "enumDescriptions".to_string(),
            Value::Object(value_descriptions),
        );
    }
    Value::Object(schema)
}

fn project_oneof(oneof: &OneofDescriptor, visited: &mut HashSet<String>) -> Value {
    let mut options: Vec<Value> = Vec::new();

    for field in oneof.fields() {
        let mut member = Map::new();
        member.insert(field.name().to_string(), project_field(&field, visited));
        options.push(json!({
            "type": "object",
            "properties": member,
            "required": [field.name()],
        }));
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    let comment = oneof_comments(oneof);
    if !comment.is_empty() {
        schema.insert("description".to_string(), json!(comment));
    }
    schema.insert("oneOf".to_string(), Value::Array(options));
    Value::Object(schema)
}

/// A synthetic oneof is the compiler's encoding of a proto3 `optional`
/// field: exactly one member, flagged `proto3_optional`.
fn is_synthetic_oneof(oneof: &OneofDescriptor) -> bool {
    let mut fields = oneof.fields();
    match (fields.next(), fields.next()) {
        (Some(field), None) => field.field_descriptor_proto().proto3_optional(),
        _ => false,
    }
}
