// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Move-Car Notifier Service
//!
//! Serves the informational page and relays move-car notifications to the
//! owner through WxPusher.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `PHONE_NUMBER`: Owner phone number for the call button
//! - `WXAPPTOKEN`: WxPusher application token
//! - `WXPUSHER_UIDS`: Comma-separated WxPusher recipient UIDs
//! - `PUBLIC_ORIGIN`: Origin the page is served from (default: derived from Host)
//! - `CLIENT_IP_HEADER`: Trusted client IP header (default: CF-Connecting-IP)
//! - `PUSH_API_URL` / `PUSH_TIMEOUT_MS`: Push gateway endpoint and timeout
//! - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: Requests per window (default: 3 per 60s)
//! - `RATE_LIMIT_PRUNE_SECS`: Expired entry sweep interval, 0 disables (default: 300)
//! - `METRICS_ENABLED` / `METRICS_PATH`: Prometheus endpoint (default: off, /metrics)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use move_car_notifier::{
    config::Config,
    gateway::WxPusherClient,
    handlers::{router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        push_api_url = %config.gateway.api_url,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        recipients = config.notification.recipient_ids.len(),
        metrics = config.metrics.enabled,
        "Starting move-car notifier"
    );
    if !config.notification.is_configured() {
        warn!("WXAPPTOKEN or WXPUSHER_UIDS missing, notifications will be refused");
    }

    let gateway = Arc::new(WxPusherClient::new(&config.gateway)?);
    let state = Arc::new(AppState::new(&config, gateway)?);

    // Sweep expired rate limit windows
    if let Some(every) = config.rate_limit.prune_interval() {
        let prune_state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                prune_state.relay.limiter().prune_expired().await;
            }
        });
    }

    let app = router(state, &config);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
