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

//! gRPC server reflection client (v1alpha)
//!
//! Each operation opens a fresh bidirectional stream, sends one request and
//! reads one response; the stream closes when it drops. Fetched file
//! descriptors are cached under both the queried symbol and every returned
//! file name, so services sharing a file cost one round trip. A failed
//! stream never writes to the cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use prost::Message;
use prost_types::FileDescriptorProto;
use tonic::transport::Channel;
use tonic_reflection::pb::v1alpha::server_reflection_client::ServerReflectionClient;
use tonic_reflection::pb::v1alpha::server_reflection_request::MessageRequest;
use tonic_reflection::pb::v1alpha::server_reflection_response::MessageResponse;
use tonic_reflection::pb::v1alpha::{ServerReflectionRequest, ServerReflectionResponse};
use tracing::{debug, info, warn};

use ggrmcp_core::descriptors::{extract_methods, DescriptorRegistry, ExtractOptions};
use ggrmcp_core::types::MethodInfo;
use ggrmcp_core::DescriptorError;

use crate::error::GatewayError;

/// Service-name prefixes that belong to gRPC infrastructure, never exposed
/// as tools.
const INTERNAL_SERVICE_PREFIXES: [&str; 4] = [
    "grpc.reflection.",
    "grpc.health.",
    "grpc.channelz.",
    "grpc.testing.",
];

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the `grpc.reflection.v1alpha.ServerReflection` service.
pub struct ReflectionClient {
    channel: Channel,
    max_message_size: usize,
    // Fetched descriptor files, keyed by queried symbol and by file name.
    fd_cache: DashMap<String, Arc<Vec<FileDescriptorProto>>>,
}

impl ReflectionClient {
    pub fn new(channel: Channel, max_message_size: usize) -> Self {
        Self {
            channel,
            max_message_size,
            fd_cache: DashMap::new(),
        }
    }

    /// One round trip on a fresh stream.
    async fn round_trip(
        &self,
        request: MessageRequest,
    ) -> Result<ServerReflectionResponse, GatewayError> {
        let mut client = ServerReflectionClient::new(self.channel.clone())
            .max_decoding_message_size(self.max_message_size);

        let request = ServerReflectionRequest {
            host: String::new(),
            message_request: Some(request),
        };

        let response = client
            .server_reflection_info(tokio_stream::once(request))
            .await
            .map_err(|status| {
                GatewayError::UpstreamFailure(format!("reflection stream failed: {}", status))
            })?;

        let mut stream = response.into_inner();
        let message = stream
            .message()
            .await
            .map_err(|status| {
                GatewayError::UpstreamFailure(format!("reflection receive failed: {}", status))
            })?
            .ok_or_else(|| {
                GatewayError::UpstreamFailure("reflection stream closed without response".into())
            })?;

        Ok(message)
    }

    /// Lists the full names of all services registered on the upstream.
    pub async fn list_services(&self) -> Result<Vec<String>, GatewayError> {
        let response = self.round_trip(MessageRequest::ListServices(String::new())).await?;

        match response.message_response {
            Some(MessageResponse::ListServicesResponse(list)) => {
                Ok(list.service.into_iter().map(|s| s.name).collect())
            }
            Some(MessageResponse::ErrorResponse(err)) => Err(GatewayError::UpstreamFailure(
                format!("reflection error {}: {}", err.error_code, err.error_message),
            )),
            _ => Err(GatewayError::UpstreamFailure(
                "unexpected reflection response to ListServices".into(),
            )),
        }
    }

    /// Fetches the file descriptors containing `symbol`, including whatever
    /// dependency closure the server chooses to send.
    pub async fn file_containing_symbol(
        &self,
        symbol: &str,
    ) -> Result<Arc<Vec<FileDescriptorProto>>, GatewayError> {
        if let Some(cached) = self.fd_cache.get(symbol) {
            debug!("descriptor cache hit for {}", symbol);
            return Ok(cached.clone());
        }

        let response = self
            .round_trip(MessageRequest::FileContainingSymbol(symbol.to_string()))
            .await?;

        let descriptor_bytes = match response.message_response {
            Some(MessageResponse::FileDescriptorResponse(fd)) => fd.file_descriptor_proto,
            Some(MessageResponse::ErrorResponse(err)) => {
                return Err(GatewayError::UpstreamFailure(format!(
                    "reflection error {} for {}: {}",
                    err.error_code, symbol, err.error_message
                )))
            }
            _ => {
                return Err(GatewayError::UpstreamFailure(format!(
                    "unexpected reflection response for symbol {}",
                    symbol
                )))
            }
        };

        if descriptor_bytes.is_empty() {
            return Err(GatewayError::UpstreamFailure(format!(
                "no file descriptor found for symbol {}",
                symbol
            )));
        }

        let mut files = Vec::with_capacity(descriptor_bytes.len());
        for bytes in &descriptor_bytes {
            let file = FileDescriptorProto::decode(bytes.as_slice()).map_err(|e| {
                GatewayError::Descriptor(DescriptorError::MalformedDescriptor {
                    file: symbol.to_string(),
                    reason: e.to_string(),
                })
            })?;
            files.push(file);
        }

        let files = Arc::new(files);
        self.fd_cache.insert(symbol.to_string(), files.clone());
        for file in files.iter() {
            if !file.name().is_empty() {
                self.fd_cache.insert(file.name().to_string(), files.clone());
            }
        }

        Ok(files)
    }

    /// Full discovery pass: list services, fetch their files, link them into
    /// a registry and extract every method.
    pub async fn discover_methods(&self) -> Result<Vec<MethodInfo>, GatewayError> {
        info!("starting method discovery via server reflection");

        let services = self.list_services().await?;
        let services = filter_internal_services(services);
        info!("upstream advertises {} services", services.len());

        // Services already present in a fetched file need no further round
        // trips of their own.
        let mut covered: HashMap<String, Arc<Vec<FileDescriptorProto>>> = HashMap::new();
        let mut files_by_name: HashMap<String, FileDescriptorProto> = HashMap::new();

        for service in &services {
            let files = match covered.get(service.as_str()) {
                Some(files) => files.clone(),
                None => match self.file_containing_symbol(service).await {
                    Ok(files) => files,
                    Err(e) => {
                        warn!("failed to fetch descriptors for {}: {}", service, e);
                        continue;
                    }
                },
            };

            for file in files.iter() {
                files_by_name
                    .entry(file.name().to_string())
                    .or_insert_with(|| file.clone());
                for svc in &file.service {
                    let full_name = match file.package() {
                        "" => svc.name().to_string(),
                        package => format!("{}.{}", package, svc.name()),
                    };
                    covered.entry(full_name).or_insert_with(|| files.clone());
                }
            }
        }

        let mut registry = DescriptorRegistry::new();
        registry.add_files(files_by_name.into_values().collect())?;

        let advertised: HashSet<String> = services.into_iter().collect();
        let methods = extract_methods(
            &registry,
            &ExtractOptions {
                only_services: Some(advertised),
                compat_service_names: false,
            },
        );

        info!("reflection discovery found {} methods", methods.len());
        Ok(methods)
    }

    /// Probes the upstream with a bounded `ListServices` round trip.
    pub async fn health_check(&self) -> Result<(), GatewayError> {
        tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.list_services())
            .await
            .map_err(|_| GatewayError::UpstreamFailure("reflection health check timed out".into()))?
            .map(|_| ())
    }
}

fn filter_internal_services(services: Vec<String>) -> Vec<String> {
    services
        .into_iter()
        .filter(|service| {
            !INTERNAL_SERVICE_PREFIXES
                .iter()
                .any(|prefix| service.starts_with(prefix))
        })
        .collect()
}
