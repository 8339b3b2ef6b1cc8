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

//! Discovery orchestrator
//!
//! Owns the upstream channel and the current tool snapshot. Discovery
//! prefers the configured `FileDescriptorSet` and falls back to server
//! reflection on any failure; either way the result is an immutable
//! `toolName -> MethodInfo` map swapped in atomically, so readers always
//! observe one consistent snapshot. A tool-name collision aborts the whole
//! discovery pass - publishing half a snapshot or silently overwriting a
//! tool would both be worse than failing loudly.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::{info, warn};

use ggrmcp_core::config::GrpcConfig;
use ggrmcp_core::descriptors::{
    extract_methods, load_descriptor_set, DescriptorRegistry, ExtractOptions,
};
use ggrmcp_core::types::{MethodInfo, ServiceStats};

use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::GatewayError;
use crate::invoke::invoke_method;
use crate::reflection::ReflectionClient;

type ToolSnapshot = Arc<HashMap<String, MethodInfo>>;

/// The discovery surface the dispatcher programs against.
#[tonic::async_trait]
pub trait ServiceDiscoverer: Send + Sync {
    /// All discovered methods, unordered.
    fn methods(&self) -> Vec<MethodInfo>;

    /// Looks up one method by its generated tool name.
    fn method_by_tool(&self, tool_name: &str) -> Option<MethodInfo>;

    fn method_count(&self) -> usize;

    fn service_stats(&self) -> ServiceStats;

    /// Invokes a method by tool name with pre-filtered headers.
    async fn invoke_by_tool(
        &self,
        headers: &HashMap<String, String>,
        tool_name: &str,
        arguments_json: &str,
    ) -> Result<String, GatewayError>;

    async fn health_check(&self) -> Result<(), GatewayError>;
}

/// Production discoverer backed by the shared gRPC channel.
pub struct GrpcServiceDiscoverer {
    config: GrpcConfig,
    request_timeout: std::time::Duration,
    connection: ConnectionManager,
    reflection: AsyncRwLock<Option<Arc<ReflectionClient>>>,
    snapshot: RwLock<ToolSnapshot>,
}

impl GrpcServiceDiscoverer {
    pub fn new(config: GrpcConfig, request_timeout: std::time::Duration) -> Self {
        Self {
            connection: ConnectionManager::new(config.clone()),
            reflection: AsyncRwLock::new(None),
            snapshot: RwLock::new(Arc::new(HashMap::new())),
            config,
            request_timeout,
        }
    }

    /// Dials the upstream and verifies it answers reflection probes.
    pub async fn connect(&self) -> Result<(), GatewayError> {
        let channel = self.connection.connect().await?;
        let client = Arc::new(ReflectionClient::new(
            channel,
            self.config.max_message_size,
        ));

        match client.health_check().await {
            Ok(()) => self.connection.mark_ready().await,
            Err(e) => {
                self.connection.mark_failed().await;
                return Err(e);
            }
        }

        *self.reflection.write().await = Some(client);
        info!("connected to upstream gRPC server");
        Ok(())
    }

    /// Runs one discovery pass and publishes the resulting snapshot.
    pub async fn discover(&self) -> Result<(), GatewayError> {
        let methods = if self.config.descriptor_set.enabled {
            match self.discover_from_descriptor_set() {
                Ok(methods) => {
                    info!("discovered {} methods from descriptor set", methods.len());
                    methods
                }
                Err(e) => {
                    warn!(
                        "descriptor-set discovery failed, falling back to reflection: {}",
                        e
                    );
                    self.discover_from_reflection().await?
                }
            }
        } else {
            self.discover_from_reflection().await?
        };

        let snapshot = build_snapshot(methods)?;
        info!("publishing tool snapshot with {} tools", snapshot.len());
        *self.snapshot.write() = snapshot;
        Ok(())
    }

    fn discover_from_descriptor_set(&self) -> Result<Vec<MethodInfo>, GatewayError> {
        let path = self
            .config
            .descriptor_set
            .path
            .as_ref()
            .ok_or_else(|| GatewayError::DiscoveryFailure("descriptor set path not set".into()))?;

        let set = load_descriptor_set(path)?;
        let registry = DescriptorRegistry::from_file_descriptor_set(set)?;
        Ok(extract_methods(
            &registry,
            &ExtractOptions {
                only_services: None,
                compat_service_names: self.config.descriptor_set.compat_service_names,
            },
        ))
    }

    async fn discover_from_reflection(&self) -> Result<Vec<MethodInfo>, GatewayError> {
        let client = self.reflection_client().await?;
        client.discover_methods().await
    }

    async fn reflection_client(&self) -> Result<Arc<ReflectionClient>, GatewayError> {
        self.reflection
            .read()
            .await
            .clone()
            .ok_or(GatewayError::NotConnected)
    }

    /// Bounded re-dial loop. Each successful dial re-runs discovery so the
    /// snapshot reflects whatever the upstream looks like now.
    pub async fn reconnect(&self) -> Result<(), GatewayError> {
        let mut last_error = GatewayError::NotConnected;

        for attempt in 1..=self.config.reconnect.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.reconnect.interval).await;
            }
            info!(
                "reconnect attempt {}/{}",
                attempt, self.config.reconnect.max_attempts
            );

            if let Err(e) = self.connect().await {
                warn!("reconnect attempt {} failed: {}", attempt, e);
                last_error = e;
                continue;
            }
            if let Err(e) = self.discover().await {
                warn!("rediscovery after reconnect failed: {}", e);
                last_error = e;
                continue;
            }

            info!("reconnected to upstream gRPC server");
            return Ok(());
        }

        Err(GatewayError::DiscoveryFailure(format!(
            "failed to reconnect after {} attempts: {}",
            self.config.reconnect.max_attempts, last_error
        )))
    }

    /// Closes the channel and resets the snapshot to empty.
    pub async fn close(&self) {
        *self.reflection.write().await = None;
        self.connection.close().await;
        *self.snapshot.write() = Arc::new(HashMap::new());
        info!("service discoverer closed");
    }

    fn snapshot(&self) -> ToolSnapshot {
        self.snapshot.read().clone()
    }
}

#[tonic::async_trait]
impl ServiceDiscoverer for GrpcServiceDiscoverer {
    fn methods(&self) -> Vec<MethodInfo> {
        self.snapshot().values().cloned().collect()
    }

    fn method_by_tool(&self, tool_name: &str) -> Option<MethodInfo> {
        self.snapshot().get(tool_name).cloned()
    }

    fn method_count(&self) -> usize {
        self.snapshot().len()
    }

    fn service_stats(&self) -> ServiceStats {
        let snapshot = self.snapshot();
        let mut services: Vec<String> = snapshot
            .values()
            .map(|m| m.service_name.clone())
            .collect();
        services.sort();
        services.dedup();

        ServiceStats {
            service_count: services.len(),
            method_count: snapshot.len(),
            is_connected: self.connection.state_snapshot() == ConnectionState::Ready,
            services,
        }
    }

    async fn invoke_by_tool(
        &self,
        headers: &HashMap<String, String>,
        tool_name: &str,
        arguments_json: &str,
    ) -> Result<String, GatewayError> {
        let method = self
            .method_by_tool(tool_name)
            .ok_or_else(|| GatewayError::ToolNotFound(tool_name.to_string()))?;

        if method.is_streaming() {
            return Err(GatewayError::StreamingUnsupported);
        }

        let channel = self.connection.channel().await?;
        invoke_method(
            channel,
            self.config.max_message_size,
            self.request_timeout,
            headers,
            &method,
            arguments_json,
        )
        .await
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.connection.health_check().await?;

        let client = self.reflection_client().await?;
        match client.health_check().await {
            Ok(()) => {
                self.connection.mark_ready().await;
                Ok(())
            }
            Err(e) => {
                self.connection.mark_failed().await;
                Err(e)
            }
        }
    }
}

/// Builds the immutable `toolName -> MethodInfo` map, rejecting collisions.
fn build_snapshot(methods: Vec<MethodInfo>) -> Result<ToolSnapshot, GatewayError> {
    let mut tools: HashMap<String, MethodInfo> = HashMap::with_capacity(methods.len());

    for method in methods {
        if let Some(existing) = tools.get(&method.tool_name) {
            return Err(GatewayError::DuplicateTool {
                tool: method.tool_name.clone(),
                first: existing.full_name.clone(),
                second: method.full_name.clone(),
            });
        }
        tools.insert(method.tool_name.clone(), method);
    }

    Ok(Arc::new(tools))
}
