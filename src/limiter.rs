// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by client identifier.
//!
//! Each client gets a counter that lives for one window. The first request
//! (or the first one after the window expired) opens a fresh window with a
//! count of 1; further requests increment the count until the maximum is
//! reached, after which requests are denied until the window resets.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Longest window a client can be held to. Larger configured windows are
/// clamped so the reset instant stays representable.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Counter state for a single client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests accepted in the current window
    pub count: u32,
    /// When the current window stops applying
    pub window_reset_at: Instant,
}

/// Thread-safe fixed-window rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-client windows
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Whether a request from `client_id` may proceed right now.
    pub async fn allow(&self, client_id: &str) -> bool {
        self.check(client_id).await.is_allowed()
    }

    /// Check and record a request from `client_id` at the current time.
    pub async fn check(&self, client_id: &str) -> RateLimitResult {
        self.check_at(client_id, Instant::now()).await
    }

    /// Check and record a request from `client_id` as if it arrived at `now`.
    pub async fn check_at(&self, client_id: &str, now: Instant) -> RateLimitResult {
        let window = self.config.window_duration().min(MAX_WINDOW);
        let max = self.config.max_requests;

        if max == 0 {
            debug!(client_id, "Rate limit allows no requests");
            return RateLimitResult::Limited {
                retry_after: window,
            };
        }

        // Read, check and write under one lock so concurrent requests from the
        // same client can never push the count past `max`.
        let mut entries = self.entries.write().await;

        let entry = entries
            .entry(client_id.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_reset_at: now,
            });

        // New client, or the stored window has expired: open a fresh one
        if entry.count == 0 || now > entry.window_reset_at {
            *entry = RateLimitEntry {
                count: 1,
                window_reset_at: now.checked_add(window).unwrap_or(now),
            };
            return RateLimitResult::Allowed {
                remaining: max.saturating_sub(1),
            };
        }

        if entry.count >= max {
            let retry_after = entry.window_reset_at.saturating_duration_since(now);
            debug!(client_id, count = entry.count, ?retry_after, "Client rate limit exceeded");
            return RateLimitResult::Limited { retry_after };
        }

        entry.count += 1;
        RateLimitResult::Allowed {
            remaining: max - entry.count,
        }
    }

    /// Current entry for a client, if one exists.
    pub async fn entry(&self, client_id: &str) -> Option<RateLimitEntry> {
        self.entries.read().await.get(client_id).copied()
    }

    /// Number of tracked clients.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop entries whose window has already expired.
    pub async fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now()).await
    }

    /// Drop entries whose window expired before `now`, returning how many went.
    pub async fn prune_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.window_reset_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Pruned expired rate limit entries");
        }
        removed
    }
}
