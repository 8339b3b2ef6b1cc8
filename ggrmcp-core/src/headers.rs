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

//! Header forwarding filter
//!
//! Decides which caller headers accompany the upstream gRPC call. Blocked
//! names take precedence over allowed ones; `forward_all` keeps everything
//! that is not blocked. Matching folds to lowercase unless the policy is
//! case sensitive, but the caller's original header spelling is preserved in
//! the output map.

use std::collections::HashMap;

use crate::config::HeaderForwardingConfig;

/// Applies a [`HeaderForwardingConfig`] to caller header maps.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    config: HeaderForwardingConfig,
}

impl HeaderFilter {
    pub fn new(config: HeaderForwardingConfig) -> Self {
        Self { config }
    }

    /// True if a header with this name should be forwarded upstream.
    pub fn should_forward(&self, header_name: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        let name = self.fold(header_name);

        // Blocked names win over everything else.
        if self
            .config
            .blocked_headers
            .iter()
            .any(|blocked| self.fold(blocked) == name)
        {
            return false;
        }

        if self.config.forward_all {
            return true;
        }

        self.config
            .allowed_headers
            .iter()
            .any(|allowed| self.fold(allowed) == name)
    }

    /// Filters a header map down to the forwardable subset, preserving the
    /// original name spelling.
    pub fn filter(&self, headers: &HashMap<String, String>) -> HashMap<String, String> {
        if !self.config.enabled {
            return HashMap::new();
        }

        headers
            .iter()
            .filter(|(name, _)| self.should_forward(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn fold(&self, name: &str) -> String {
        if self.config.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}
