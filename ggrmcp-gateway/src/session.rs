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

//! Session table
//!
//! In-memory only: sessions correlate MCP calls, capture the caller's
//! headers and carry the per-session rate-limit window. Ids are 128 random
//! bits, hex encoded. Eviction is TTL-based with an oldest-accessed sweep
//! when the cap is hit; everything is gone on restart by design.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::RngCore;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use ggrmcp_core::config::SessionConfig;

/// One caller session.
pub struct Session {
    pub id: String,
    pub headers: HashMap<String, String>,
    pub user_agent: String,
    pub remote_addr: String,
    created_at: Instant,
    last_accessed: Mutex<Instant>,
    call_count: AtomicU64,
    blocked: AtomicBool,
    rate_window: Mutex<RateWindow>,
}

struct RateWindow {
    started_at: Instant,
    count: u32,
}

impl Session {
    fn new(id: String, headers: HashMap<String, String>) -> Self {
        let user_agent = headers.get("user-agent").cloned().unwrap_or_default();
        let remote_addr = headers
            .get("x-real-ip")
            .or_else(|| headers.get("x-forwarded-for"))
            .cloned()
            .unwrap_or_default();
        let now = Instant::now();

        Self {
            id,
            headers,
            user_agent,
            remote_addr,
            created_at: now,
            last_accessed: Mutex::new(now),
            call_count: AtomicU64::new(0),
            blocked: AtomicBool::new(false),
            rate_window: Mutex::new(RateWindow {
                started_at: now,
                count: 0,
            }),
        }
    }

    /// Refreshes the idle clock.
    pub fn touch(&self) {
        *self.last_accessed.lock() = Instant::now();
    }

    pub fn increment_call_count(&self) -> u64 {
        self.call_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Relaxed)
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.last_accessed.lock().elapsed() > ttl
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    fn idle_for(&self) -> Duration {
        self.last_accessed.lock().elapsed()
    }

    /// Sliding-window admission check. Returns false once the window is
    /// exhausted; the window resets `window` after it was opened.
    fn admit(&self, limit: u32, window: Duration) -> bool {
        let mut state = self.rate_window.lock();
        if state.started_at.elapsed() > window {
            state.started_at = Instant::now();
            state.count = 0;
        }
        if state.count >= limit {
            return false;
        }
        state.count += 1;
        true
    }
}

/// Concurrent session table with TTL and capacity eviction.
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            config,
        })
    }

    /// Returns the session for `id`, or a fresh one when the id is absent,
    /// unknown or expired. Known sessions get their idle clock refreshed.
    pub fn get_or_create(
        &self,
        id: Option<&str>,
        headers: HashMap<String, String>,
    ) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(session) = self.get(id) {
                session.touch();
                return session;
            }
        }
        self.create(headers)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        if session.is_expired(self.config.ttl) {
            self.sessions.remove(id);
            return None;
        }
        Some(session)
    }

    fn create(&self, headers: HashMap<String, String>) -> Arc<Session> {
        if self.sessions.len() >= self.config.max_sessions {
            warn!(
                "session cap reached ({} of {}), evicting",
                self.sessions.len(),
                self.config.max_sessions
            );
            self.sweep();
            if self.sessions.len() >= self.config.max_sessions {
                self.evict_oldest();
            }
        }

        let session = Arc::new(Session::new(generate_session_id(), headers));
        self.sessions.insert(session.id.clone(), session.clone());
        debug!("created session {}", session.id);
        session
    }

    /// Admission check against the per-session rate limit.
    pub fn check_rate_limit(&self, session: &Session) -> bool {
        let admitted = session.admit(self.config.requests_per_minute, self.config.window);
        if !admitted {
            warn!(
                "rate limit exceeded for session {} ({} per window)",
                session.id, self.config.requests_per_minute
            );
        }
        admitted
    }

    pub fn block(&self, id: &str) {
        if let Some(session) = self.sessions.get(id) {
            session.blocked.store(true, Ordering::Relaxed);
            warn!("blocked session {}", id);
        }
    }

    pub fn unblock(&self, id: &str) {
        if let Some(session) = self.sessions.get(id) {
            session.blocked.store(false, Ordering::Relaxed);
            info!("unblocked session {}", id);
        }
    }

    /// Removes expired sessions.
    pub fn sweep(&self) {
        let ttl = self.config.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(ttl));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!("swept {} expired sessions", removed);
        }
    }

    /// Drops the least recently accessed session. Called only under
    /// capacity pressure after the expiry sweep failed to free a slot.
    fn evict_oldest(&self) {
        let oldest = self
            .sessions
            .iter()
            .max_by_key(|entry| entry.value().idle_for())
            .map(|entry| entry.key().clone());

        if let Some(id) = oldest {
            self.sessions.remove(&id);
            debug!("evicted least-recently-used session {}", id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stats mapping merged into the metrics endpoint.
    pub fn stats(&self) -> Value {
        json!({
            "totalSessions": self.sessions.len(),
            "maxSessions": self.config.max_sessions,
            "ttlSeconds": self.config.ttl.as_secs(),
            "requestsPerMinute": self.config.requests_per_minute,
        })
    }

    /// Periodic sweep task; aborts when the manager is dropped elsewhere.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let interval = self.config.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match manager.upgrade() {
                    Some(manager) => manager.sweep(),
                    None => break,
                }
            }
        })
    }
}

/// 128 random bits, hex encoded.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
