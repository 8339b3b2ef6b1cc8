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

//! ggRMCP - gRPC to MCP gateway
//!
//! Connects to one upstream gRPC server, discovers its unary methods
//! (server reflection, or a compiled descriptor set with reflection
//! fallback) and serves them as MCP tools over HTTP/JSON-RPC 2.0.
//!
//! ## Usage
//!
//! ```bash
//! # Bridge a local gRPC server on the default ports
//! ggrmcp
//!
//! # Explicit upstream and listener ports
//! ggrmcp --grpc-host localhost --grpc-port 50051 --http-port 50053
//!
//! # Prefer a compiled FileDescriptorSet (falls back to reflection)
//! ggrmcp --descriptor-set ./descriptors.binpb
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ggrmcp_core::config::Config;
use ggrmcp_core::headers::HeaderFilter;
use ggrmcp_core::mcp::Validator;

use ggrmcp_gateway::discovery::GrpcServiceDiscoverer;
use ggrmcp_gateway::server::{router, GatewayHandler};
use ggrmcp_gateway::session::SessionManager;
use ggrmcp_gateway::ServiceDiscoverer;

/// gRPC to MCP gateway
#[derive(Parser, Debug)]
#[command(name = "ggrmcp")]
#[command(about = "Expose gRPC unary methods as MCP tools over HTTP/JSON-RPC")]
#[command(version)]
struct Args {
    /// Upstream gRPC host
    #[arg(long, default_value = "localhost")]
    grpc_host: String,

    /// Upstream gRPC port
    #[arg(long, default_value = "50051")]
    grpc_port: u16,

    /// HTTP listener port
    #[arg(long, default_value = "50053")]
    http_port: u16,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Development mode: debug logging and relaxed rate limits
    #[arg(long)]
    dev: bool,

    /// Path to a compiled FileDescriptorSet (.binpb)
    #[arg(long)]
    descriptor_set: Option<PathBuf>,

    /// Shorten descriptor-set service names to the last two dot segments,
    /// matching reflection-style names
    #[arg(long)]
    compat_service_names: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = if self.dev {
            Config::development()
        } else {
            Config::default()
        };

        config.grpc.host = self.grpc_host;
        config.grpc.port = self.grpc_port;
        config.server.port = self.http_port;
        if !self.dev {
            config.logging.level = self.log_level;
        }
        config.grpc.descriptor_set.enabled = self.descriptor_set.is_some();
        config.grpc.descriptor_set.path = self.descriptor_set;
        config.grpc.descriptor_set.compat_service_names = self.compat_service_names;
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "starting ggRMCP gateway: upstream {}:{}, listener :{}",
        config.grpc.host, config.grpc.port, config.server.port
    );

    // Upstream connection and initial discovery. Failing discovery is not
    // fatal: the gateway serves an empty snapshot and /health reports it.
    let discoverer = Arc::new(GrpcServiceDiscoverer::new(
        config.grpc.clone(),
        config.server.request_timeout,
    ));

    if let Err(e) = discoverer.connect().await {
        error!("failed to connect to upstream: {}", e);
    } else if let Err(e) = discoverer.discover().await {
        error!("service discovery failed: {}", e);
    }

    let stats = discoverer.service_stats();
    info!(
        "discovery complete: {} services, {} methods",
        stats.service_count, stats.method_count
    );

    let sessions = SessionManager::new(config.session.clone());
    let sweeper = sessions.spawn_sweeper();

    let handler = GatewayHandler::new(
        discoverer.clone() as Arc<dyn ServiceDiscoverer>,
        sessions,
        Validator::from_config(&config.validation),
        HeaderFilter::new(config.grpc.header_forwarding.clone()),
    );

    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    info!("HTTP listener bound on port {}", config.server.port);

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    sweeper.abort();
    discoverer.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutdown signal received");
}
