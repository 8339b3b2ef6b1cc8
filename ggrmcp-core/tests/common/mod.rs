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

//! Shared descriptor fixtures
//!
//! Test descriptors are built programmatically as `FileDescriptorProto`
//! values so the suite needs no protoc invocation. The shapes mirror the
//! services the gateway is expected to front: a plain greeting service, a
//! recursive node type, oneofs, maps, enums and well-known types.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, MethodDescriptorProto, OneofDescriptorProto,
    ServiceDescriptorProto, SourceCodeInfo,
};

pub fn scalar_field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

pub fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_string()),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

pub fn repeated_message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..message_field(name, number, type_name)
    }
}

pub fn enum_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Enum as i32),
        type_name: Some(type_name.to_string()),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn location(path: Vec<i32>, leading: &str) -> Location {
    Location {
        path,
        leading_comments: Some(leading.to_string()),
        ..Default::default()
    }
}

/// `hello.proto`: a greeting service with commented methods and fields.
pub fn hello_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("hello.proto".to_string()),
        package: Some("hello".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            DescriptorProto {
                name: Some("HelloRequest".to_string()),
                field: vec![
                    scalar_field("name", 1, Type::String),
                    scalar_field("email", 2, Type::String),
                ],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("HelloReply".to_string()),
                field: vec![scalar_field("message", 1, Type::String)],
                ..Default::default()
            },
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("HelloService".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("SayHello".to_string()),
                input_type: Some(".hello.HelloRequest".to_string()),
                output_type: Some(".hello.HelloReply".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        source_code_info: Some(SourceCodeInfo {
            location: vec![
                location(vec![6, 0], " A friendly greeting service.\n"),
                location(vec![6, 0, 2, 0], " Says hello to the caller.\n"),
                location(vec![4, 0, 2, 0], " Name of the person to greet.\n"),
            ],
        }),
        ..Default::default()
    }
}

/// `complex.proto`: recursive nodes, oneofs, maps, enums, well-known types
/// and a streaming method, under a three-segment package.
pub fn complex_file() -> FileDescriptorProto {
    let node = DescriptorProto {
        name: Some("Node".to_string()),
        field: vec![
            scalar_field("id", 1, Type::String),
            scalar_field("value", 2, Type::String),
            repeated_message_field("children", 3, ".com.example.complex.Node"),
        ],
        ..Default::default()
    };

    let node_count = DescriptorProto {
        name: Some("NodeCount".to_string()),
        field: vec![scalar_field("total_nodes", 1, Type::Int32)],
        ..Default::default()
    };

    let two_nodes = DescriptorProto {
        name: Some("TwoNodes".to_string()),
        field: vec![
            message_field("left", 1, ".com.example.complex.Node"),
            message_field("right", 2, ".com.example.complex.Node"),
        ],
        ..Default::default()
    };

    let wrapper = DescriptorProto {
        name: Some("Wrapper".to_string()),
        field: vec![scalar_field("data", 1, Type::String)],
        ..Default::default()
    };

    let metadata_request = DescriptorProto {
        name: Some("MetadataRequest".to_string()),
        field: vec![
            FieldDescriptorProto {
                oneof_index: Some(0),
                ..scalar_field("simple_summary", 1, Type::String)
            },
            FieldDescriptorProto {
                oneof_index: Some(0),
                ..message_field("structured", 2, ".com.example.complex.Wrapper")
            },
        ],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("metadata".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    let labels_entry = DescriptorProto {
        name: Some("LabelsEntry".to_string()),
        field: vec![
            scalar_field("key", 1, Type::String),
            scalar_field("value", 2, Type::String),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let everything = DescriptorProto {
        name: Some("Everything".to_string()),
        field: vec![
            scalar_field("flag", 1, Type::Bool),
            scalar_field("count", 2, Type::Int32),
            scalar_field("big_count", 3, Type::Int64),
            scalar_field("unsigned_count", 4, Type::Uint32),
            scalar_field("big_unsigned", 5, Type::Uint64),
            scalar_field("ratio", 6, Type::Float),
            scalar_field("precise_ratio", 7, Type::Double),
            scalar_field("label", 8, Type::String),
            scalar_field("payload", 9, Type::Bytes),
            enum_field("status", 10, ".com.example.complex.Status"),
            FieldDescriptorProto {
                label: Some(Label::Repeated as i32),
                ..message_field("labels", 11, ".com.example.complex.Everything.LabelsEntry")
            },
            message_field("created_at", 12, ".google.protobuf.Timestamp"),
            message_field("note", 13, ".google.protobuf.StringValue"),
            message_field("settings", 14, ".google.protobuf.Struct"),
            message_field("anything", 15, ".google.protobuf.Value"),
            FieldDescriptorProto {
                proto3_optional: Some(true),
                oneof_index: Some(0),
                ..scalar_field("nickname", 16, Type::String)
            },
        ],
        nested_type: vec![labels_entry],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("_nickname".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    let status = EnumDescriptorProto {
        name: Some("Status".to_string()),
        value: vec![
            EnumValueDescriptorProto {
                name: Some("STATUS_UNKNOWN".to_string()),
                number: Some(0),
                ..Default::default()
            },
            EnumValueDescriptorProto {
                name: Some("STATUS_ACTIVE".to_string()),
                number: Some(1),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("complex.proto".to_string()),
        package: Some("com.example.complex".to_string()),
        syntax: Some("proto3".to_string()),
        dependency: vec![
            "google/protobuf/timestamp.proto".to_string(),
            "google/protobuf/wrappers.proto".to_string(),
            "google/protobuf/struct.proto".to_string(),
        ],
        message_type: vec![
            node,
            node_count,
            two_nodes,
            wrapper,
            metadata_request,
            everything,
        ],
        enum_type: vec![status],
        service: vec![
            ServiceDescriptorProto {
                name: Some("NodeService".to_string()),
                method: vec![
                    MethodDescriptorProto {
                        name: Some("ProcessNode".to_string()),
                        input_type: Some(".com.example.complex.Node".to_string()),
                        output_type: Some(".com.example.complex.NodeCount".to_string()),
                        ..Default::default()
                    },
                    MethodDescriptorProto {
                        name: Some("StreamNodes".to_string()),
                        input_type: Some(".com.example.complex.Node".to_string()),
                        output_type: Some(".com.example.complex.Node".to_string()),
                        server_streaming: Some(true),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            ServiceDescriptorProto {
                name: Some("DocumentService".to_string()),
                method: vec![MethodDescriptorProto {
                    name: Some("CreateMetadata".to_string()),
                    input_type: Some(".com.example.complex.MetadataRequest".to_string()),
                    output_type: Some(".com.example.complex.Wrapper".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ],
        source_code_info: Some(SourceCodeInfo {
            location: vec![
                location(vec![5, 0], " Lifecycle states.\n"),
                location(vec![5, 0, 2, 1], " The record is live.\n"),
                location(vec![4, 0], " A node in a recursive tree.\n"),
            ],
        }),
        ..Default::default()
    }
}

/// Two files where `dependent.proto` imports `base.proto`; returned in
/// reverse dependency order on purpose.
pub fn dependency_files() -> Vec<FileDescriptorProto> {
    let base = FileDescriptorProto {
        name: Some("base.proto".to_string()),
        package: Some("depbase".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Base".to_string()),
            field: vec![scalar_field("id", 1, Type::String)],
            ..Default::default()
        }],
        ..Default::default()
    };

    let dependent = FileDescriptorProto {
        name: Some("dependent.proto".to_string()),
        package: Some("depuser".to_string()),
        syntax: Some("proto3".to_string()),
        dependency: vec!["base.proto".to_string()],
        message_type: vec![DescriptorProto {
            name: Some("Holder".to_string()),
            field: vec![message_field("base", 1, ".depbase.Base")],
            ..Default::default()
        }],
        ..Default::default()
    };

    vec![dependent, base]
}
