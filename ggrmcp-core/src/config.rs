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

//! Gateway configuration
//!
//! The configuration tree covers the HTTP listener, the upstream gRPC
//! channel, header forwarding, descriptor-set discovery, sessions and
//! JSON-RPC validation caps. Defaults match a production deployment;
//! [`Config::development`] loosens them for local work. Values are filled in
//! from CLI flags by the gateway binary.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Top-level gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub grpc: GrpcConfig,
    pub session: SessionConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the JSON-RPC endpoint listens on.
    pub port: u16,
    /// Per-request deadline applied to tool invocations.
    pub request_timeout: Duration,
}

/// Upstream gRPC client settings.
#[derive(Debug, Clone)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub keep_alive: KeepAliveConfig,
    pub reconnect: ReconnectConfig,
    /// Cap on encoded request and reply sizes.
    pub max_message_size: usize,
    pub header_forwarding: HeaderForwardingConfig,
    pub descriptor_set: DescriptorSetConfig,
}

/// HTTP/2 keep-alive settings for the upstream channel.
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    pub time: Duration,
    pub timeout: Duration,
    pub permit_without_stream: bool,
}

/// Bounded reconnect loop settings.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Header forwarding policy.
///
/// Blocked names take precedence over allowed ones. When `case_sensitive` is
/// false all comparisons happen on lowercase folds; the caller's original
/// spelling is preserved in the forwarded map either way.
#[derive(Debug, Clone, Default)]
pub struct HeaderForwardingConfig {
    pub enabled: bool,
    pub allowed_headers: Vec<String>,
    pub blocked_headers: Vec<String>,
    /// Forward every header that is not blocked. Not recommended.
    pub forward_all: bool,
    pub case_sensitive: bool,
}

/// FileDescriptorSet discovery settings.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetConfig {
    pub enabled: bool,
    /// Path to the compiled `FileDescriptorSet` (.binpb).
    pub path: Option<PathBuf>,
    /// Shorten service names to the last two dot segments so they match what
    /// reflection-based discovery produces. Off by default: new deployments
    /// get full-path service names.
    pub compat_service_names: bool,
}

/// Session table and per-session rate limiting.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle TTL after which a session is evicted.
    pub ttl: Duration,
    pub cleanup_interval: Duration,
    pub max_sessions: usize,
    pub requests_per_minute: u32,
    pub window: Duration,
}

/// JSON-RPC validation caps.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_field_length: usize,
    pub max_tool_name_length: usize,
    pub max_params_depth: usize,
    pub max_params_bytes: usize,
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub development: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 50053,
                request_timeout: Duration::from_secs(30),
            },
            grpc: GrpcConfig {
                host: "localhost".to_string(),
                port: 50051,
                connect_timeout: Duration::from_secs(5),
                keep_alive: KeepAliveConfig {
                    time: Duration::from_secs(10),
                    timeout: Duration::from_secs(5),
                    permit_without_stream: true,
                },
                reconnect: ReconnectConfig {
                    interval: Duration::from_secs(5),
                    max_attempts: 5,
                },
                max_message_size: 4 * 1024 * 1024,
                header_forwarding: HeaderForwardingConfig {
                    enabled: true,
                    allowed_headers: vec![
                        "authorization".to_string(),
                        "x-trace-id".to_string(),
                        "x-user-id".to_string(),
                        "x-request-id".to_string(),
                        "user-agent".to_string(),
                        "x-forwarded-for".to_string(),
                        "x-real-ip".to_string(),
                    ],
                    blocked_headers: vec![
                        "cookie".to_string(),
                        "set-cookie".to_string(),
                        "host".to_string(),
                        "content-length".to_string(),
                        "content-type".to_string(),
                        "connection".to_string(),
                        "upgrade".to_string(),
                        "mcp-session-id".to_string(),
                    ],
                    forward_all: false,
                    case_sensitive: false,
                },
                descriptor_set: DescriptorSetConfig::default(),
            },
            session: SessionConfig {
                ttl: Duration::from_secs(30 * 60),
                cleanup_interval: Duration::from_secs(5 * 60),
                max_sessions: 10_000,
                requests_per_minute: 100,
                window: Duration::from_secs(60),
            },
            validation: ValidationConfig {
                max_field_length: 1024,
                max_tool_name_length: 128,
                max_params_depth: 10,
                max_params_bytes: 1024 * 1024,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                development: false,
            },
        }
    }
}

impl Config {
    /// Configuration suitable for local development: debug logging and a
    /// loose per-session rate limit.
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.development = true;
        config.session.requests_per_minute = 1000;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.grpc.port == 0 {
            return Err(ConfigError::Invalid {
                field: "grpc.port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.grpc.host.is_empty() {
            return Err(ConfigError::Invalid {
                field: "grpc.host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.grpc.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "grpc.connect_timeout",
                reason: "must be positive".to_string(),
            });
        }
        if self.server.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "server.request_timeout",
                reason: "must be positive".to_string(),
            });
        }
        if self.session.max_sessions == 0 {
            return Err(ConfigError::Invalid {
                field: "session.max_sessions",
                reason: "must be positive".to_string(),
            });
        }
        if self.grpc.descriptor_set.enabled && self.grpc.descriptor_set.path.is_none() {
            return Err(ConfigError::Invalid {
                field: "grpc.descriptor_set.path",
                reason: "must be set when descriptor-set discovery is enabled".to_string(),
            });
        }
        Ok(())
    }
}
