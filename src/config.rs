// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the move-car notifier.
//!
//! Everything is read once from the environment at startup and then handed
//! to handlers as immutable values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default WxPusher message endpoint.
pub const DEFAULT_PUSH_API_URL: &str = "https://wxpusher.zjiecode.com/api/send/message";

/// Configuration for the notifier service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origin this service is reachable at, e.g. `https://car.example.com`.
    /// When unset the origin is derived from the request's Host header.
    #[serde(default)]
    pub public_origin: Option<String>,

    /// Header set by the trusted proxy with the real client IP.
    #[serde(default = "default_client_ip_header")]
    pub client_ip_header: String,

    /// Owner and push credentials
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Push gateway client settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Owner contact details and push credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// WxPusher application token
    #[serde(default)]
    pub app_token: String,

    /// WxPusher recipient UIDs, in order
    #[serde(default)]
    pub recipient_ids: Vec<String>,

    /// Owner phone number shown behind the call button
    #[serde(default)]
    pub owner_phone: String,
}

/// Outbound push gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_push_api_url")]
    pub api_url: String,

    /// Request timeout in milliseconds (default: 10000)
    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per client per window (default: 3)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between sweeps of expired entries in seconds, 0 disables (default: 300)
    #[serde(default = "default_prune_secs")]
    pub prune_interval_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_client_ip_header() -> String {
    "CF-Connecting-IP".to_string()
}

fn default_push_api_url() -> String {
    DEFAULT_PUSH_API_URL.to_string()
}

fn default_push_timeout_ms() -> u64 {
    10_000
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    60
}

fn default_prune_secs() -> u64 {
    300
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_origin: None,
            client_ip_header: default_client_ip_header(),
            notification: NotificationConfig::default(),
            gateway: GatewayConfig::default(),
            rate_limit: RateLimitConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: default_push_api_url(),
            timeout_ms: default_push_timeout_ms(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            prune_interval_secs: default_prune_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_origin: lookup("PUBLIC_ORIGIN").filter(|v| !v.trim().is_empty()),
            client_ip_header: lookup("CLIENT_IP_HEADER")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.client_ip_header),
            notification: NotificationConfig {
                app_token: lookup("WXAPPTOKEN").unwrap_or_default().trim().to_string(),
                recipient_ids: parse_recipient_ids(&lookup("WXPUSHER_UIDS").unwrap_or_default()),
                owner_phone: lookup("PHONE_NUMBER").unwrap_or_default().trim().to_string(),
            },
            gateway: GatewayConfig {
                api_url: lookup("PUSH_API_URL").unwrap_or(defaults.gateway.api_url),
                timeout_ms: parsed(&lookup, "PUSH_TIMEOUT_MS").unwrap_or(defaults.gateway.timeout_ms),
            },
            rate_limit: RateLimitConfig {
                max_requests: parsed(&lookup, "RATE_LIMIT_MAX").unwrap_or(defaults.rate_limit.max_requests),
                window_secs: parsed(&lookup, "RATE_LIMIT_WINDOW_SECS")
                    .unwrap_or(defaults.rate_limit.window_secs),
                prune_interval_secs: parsed(&lookup, "RATE_LIMIT_PRUNE_SECS")
                    .unwrap_or(defaults.rate_limit.prune_interval_secs),
            },
            metrics: MetricsConfig {
                enabled: lookup("METRICS_ENABLED")
                    .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(defaults.metrics.enabled),
                path: lookup("METRICS_PATH").unwrap_or(defaults.metrics.path),
            },
        }
    }
}

impl NotificationConfig {
    /// Whether both the app token and at least one recipient are present.
    pub fn is_configured(&self) -> bool {
        !self.app_token.is_empty() && !self.recipient_ids.is_empty()
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Sweep interval, `None` when sweeping is disabled.
    pub fn prune_interval(&self) -> Option<Duration> {
        (self.prune_interval_secs > 0).then(|| Duration::from_secs(self.prune_interval_secs))
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Split a comma-separated UID list, trimming entries and dropping blanks.
pub fn parse_recipient_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
        .collect()
}
