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

//! Dynamic invocation engine
//!
//! One uniform contract replaces per-method generated stubs: caller JSON is
//! parsed into a dynamic message bound to the input descriptor, the unary
//! call goes out on the shared channel under the wire path derived from the
//! method's full name, and the reply serialises back to proto-JSON
//! (camelCase). Filtered headers ride along as ASCII metadata. The whole
//! exchange runs under the request deadline; an elapsed deadline or a
//! cancelled upstream maps to [`GatewayError::UpstreamCancelled`].

use std::collections::HashMap;
use std::time::Duration;

use http::uri::PathAndQuery;
use prost_reflect::{DeserializeOptions, DynamicMessage};
use tonic::client::Grpc;
use tonic::metadata::{MetadataKey, MetadataValue};
use tonic::transport::Channel;
use tonic::{Code, Request, Status};
use tracing::{debug, warn};

use ggrmcp_core::types::MethodInfo;

use crate::codec::DynamicCodec;
use crate::error::GatewayError;

/// Performs one dynamic unary call.
pub async fn invoke_method(
    channel: Channel,
    max_message_size: usize,
    deadline: Duration,
    headers: &HashMap<String, String>,
    method: &MethodInfo,
    arguments_json: &str,
) -> Result<String, GatewayError> {
    if method.is_streaming() {
        return Err(GatewayError::StreamingUnsupported);
    }

    let input = build_input_message(method, arguments_json)?;

    let path = method.grpc_path();
    let path = PathAndQuery::try_from(path.as_str())
        .map_err(|e| GatewayError::InternalInvariant(format!("invalid method path {}: {}", path, e)))?;

    let mut request = Request::new(input);
    attach_headers(&mut request, headers);

    debug!(
        "invoking {} with {} forwarded headers",
        method.full_name,
        headers.len()
    );

    let mut grpc = Grpc::new(channel)
        .max_decoding_message_size(max_message_size)
        .max_encoding_message_size(max_message_size);

    let call = async {
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("channel not ready: {}", e)))?;
        grpc.unary(request, path, DynamicCodec::new(method.output_descriptor.clone()))
            .await
    };

    let response = tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| GatewayError::UpstreamCancelled("deadline exceeded".to_string()))?
        .map_err(map_status)?;

    let reply = response.into_inner();
    let json = serde_json::to_string(&reply).map_err(|e| {
        GatewayError::InternalInvariant(format!("failed to serialise reply: {}", e))
    })?;

    debug!("{} returned {} bytes of JSON", method.full_name, json.len());
    Ok(json)
}

/// Parses caller JSON into a dynamic message bound to the input descriptor.
/// Absent, empty or `{}` arguments yield an empty message without parsing.
fn build_input_message(method: &MethodInfo, arguments_json: &str) -> Result<DynamicMessage, GatewayError> {
    let trimmed = arguments_json.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return Ok(DynamicMessage::new(method.input_descriptor.clone()));
    }

    // Standard proto-JSON: camelCase and original field names both parse,
    // unknown fields are rejected.
    let mut deserializer = serde_json::Deserializer::from_str(trimmed);
    let message = DynamicMessage::deserialize_with_options(
        method.input_descriptor.clone(),
        &mut deserializer,
        &DeserializeOptions::new().deny_unknown_fields(true),
    )
    .map_err(|e| GatewayError::InvalidArguments(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| GatewayError::InvalidArguments(e.to_string()))?;

    Ok(message)
}

/// Attaches filtered headers to the outgoing metadata. gRPC metadata keys
/// are lowercase on the wire; values must be ASCII. Anything that does not
/// fit is dropped with a warning rather than failing the call.
fn attach_headers(request: &mut Request<DynamicMessage>, headers: &HashMap<String, String>) {
    for (name, value) in headers {
        let key = match MetadataKey::from_bytes(name.to_ascii_lowercase().as_bytes()) {
            Ok(key) => key,
            Err(_) => {
                warn!("dropping header with invalid metadata name: {}", name);
                continue;
            }
        };
        let value = match MetadataValue::try_from(value.as_str()) {
            Ok(value) => value,
            Err(_) => {
                warn!("dropping header {} with non-ASCII value", name);
                continue;
            }
        };
        request.metadata_mut().append(key, value);
    }
}

fn map_status(status: Status) -> GatewayError {
    match status.code() {
        Code::Cancelled | Code::DeadlineExceeded => {
            GatewayError::UpstreamCancelled(status.message().to_string())
        }
        code => GatewayError::UpstreamFailure(format!("{:?}: {}", code, status.message())),
    }
}
