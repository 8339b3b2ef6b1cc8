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

//! Upstream channel lifecycle
//!
//! One multiplexed channel shared by every concurrent invocation. The
//! channel state machine (`Idle -> Connecting -> Ready -> TransientFailure
//! -> Shutdown`) lives behind a read/write lock: readers take the shared
//! side, (re)connect takes it exclusively so new invocations wait while a
//! re-dial is in flight. Probe outcomes feed back via [`ConnectionManager::mark_ready`]
//! and [`ConnectionManager::mark_failed`].

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::RwLock;
use tonic::transport::{Channel, Endpoint};
use tracing::{error, info};

use ggrmcp_core::config::GrpcConfig;

use crate::error::GatewayError;

/// Connectivity state of the upstream channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Ready,
    TransientFailure,
    Shutdown,
}

impl ConnectionState {
    /// A health probe accepts Ready or Idle.
    pub fn is_healthy(self) -> bool {
        matches!(self, ConnectionState::Ready | ConnectionState::Idle)
    }

    fn encode(self) -> u8 {
        match self {
            ConnectionState::Idle => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Ready => 2,
            ConnectionState::TransientFailure => 3,
            ConnectionState::Shutdown => 4,
        }
    }

    fn decode(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Ready,
            3 => ConnectionState::TransientFailure,
            4 => ConnectionState::Shutdown,
            _ => ConnectionState::Idle,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Ready => "ready",
            ConnectionState::TransientFailure => "transient-failure",
            ConnectionState::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

struct Inner {
    channel: Option<Channel>,
    state: ConnectionState,
}

/// Manages the single upstream gRPC channel.
pub struct ConnectionManager {
    config: GrpcConfig,
    inner: RwLock<Inner>,
    // Lock-free mirror of the state for synchronous readers (metrics).
    state_cell: AtomicU8,
}

impl ConnectionManager {
    pub fn new(config: GrpcConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                channel: None,
                state: ConnectionState::Idle,
            }),
            state_cell: AtomicU8::new(ConnectionState::Idle.encode()),
        }
    }

    fn set_state(&self, inner: &mut Inner, state: ConnectionState) {
        inner.state = state;
        self.state_cell.store(state.encode(), Ordering::Release);
    }

    /// Synchronous view of the current state.
    pub fn state_snapshot(&self) -> ConnectionState {
        ConnectionState::decode(self.state_cell.load(Ordering::Acquire))
    }

    pub fn target(&self) -> String {
        format!("http://{}:{}", self.config.host, self.config.port)
    }

    /// Dials the upstream. Idempotent: an existing channel is dropped and
    /// replaced. Holds the write lock for the whole dial so concurrent
    /// readers never observe a half-swapped channel.
    pub async fn connect(&self) -> Result<Channel, GatewayError> {
        let mut inner = self.inner.write().await;
        if inner.state == ConnectionState::Shutdown {
            return Err(GatewayError::NotConnected);
        }
        self.set_state(&mut inner, ConnectionState::Connecting);
        inner.channel = None;

        let target = self.target();
        info!("connecting to upstream gRPC server at {}", target);

        // Transport security stays off: the gateway speaks plain HTTP/2 to
        // the upstream, exactly like a sidecar deployment expects.
        let endpoint = Endpoint::from_shared(target.clone())
            .map_err(|e| GatewayError::UpstreamFailure(format!("invalid target {}: {}", target, e)))?
            .connect_timeout(self.config.connect_timeout)
            .http2_keep_alive_interval(self.config.keep_alive.time)
            .keep_alive_timeout(self.config.keep_alive.timeout)
            .keep_alive_while_idle(self.config.keep_alive.permit_without_stream);

        match endpoint.connect().await {
            Ok(channel) => {
                inner.channel = Some(channel.clone());
                self.set_state(&mut inner, ConnectionState::Ready);
                info!("connected to upstream gRPC server at {}", target);
                Ok(channel)
            }
            Err(e) => {
                self.set_state(&mut inner, ConnectionState::TransientFailure);
                error!("failed to connect to {}: {}", target, e);
                Err(GatewayError::UpstreamFailure(format!(
                    "failed to connect to {}: {}",
                    target, e
                )))
            }
        }
    }

    /// Returns the shared channel for a new call. Fails unless the state is
    /// Ready or Idle.
    pub async fn channel(&self) -> Result<Channel, GatewayError> {
        let inner = self.inner.read().await;
        if !inner.state.is_healthy() {
            return Err(GatewayError::NotConnected);
        }
        inner.channel.clone().ok_or(GatewayError::NotConnected)
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    pub async fn is_connected(&self) -> bool {
        let inner = self.inner.read().await;
        inner.channel.is_some() && inner.state.is_healthy()
    }

    /// State-level health check: fails after TransientFailure or Shutdown,
    /// or when no channel exists at all.
    pub async fn health_check(&self) -> Result<(), GatewayError> {
        let inner = self.inner.read().await;
        if inner.channel.is_none() {
            return Err(GatewayError::NotConnected);
        }
        if !inner.state.is_healthy() {
            return Err(GatewayError::UpstreamFailure(format!(
                "connection is in unhealthy state: {}",
                inner.state
            )));
        }
        Ok(())
    }

    /// Records a successful probe round trip.
    pub async fn mark_ready(&self) {
        let mut inner = self.inner.write().await;
        if inner.state != ConnectionState::Shutdown && inner.channel.is_some() {
            self.set_state(&mut inner, ConnectionState::Ready);
        }
    }

    /// Records a failed probe round trip.
    pub async fn mark_failed(&self) {
        let mut inner = self.inner.write().await;
        if inner.state != ConnectionState::Shutdown {
            self.set_state(&mut inner, ConnectionState::TransientFailure);
        }
    }

    /// Closes the channel and pins the state at Shutdown.
    pub async fn close(&self) {
        let mut inner = self.inner.write().await;
        inner.channel = None;
        self.set_state(&mut inner, ConnectionState::Shutdown);
        info!("upstream gRPC connection closed");
    }

    pub fn max_message_size(&self) -> usize {
        self.config.max_message_size
    }
}
