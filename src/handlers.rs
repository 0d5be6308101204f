// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers and routing for the move-car notifier.
//!
//! `/sendNotification` goes to the notification relay; every other path
//! serves the informational page.

use crate::config::{Config, NotificationConfig};
use crate::gateway::PushGateway;
use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use crate::page;
use crate::relay::NotificationRelay;
use crate::validator::RequestValidator;
use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, warn};

/// Path served by the notification relay.
pub const NOTIFY_PATH: &str = "/sendNotification";

/// Shared application state.
pub struct AppState {
    pub relay: NotificationRelay,
    /// Read-only owner and credential values handed to each request
    pub notification: Arc<NotificationConfig>,
    pub metrics: Option<Metrics>,
}

impl AppState {
    /// Wire the relay, limiter and validator from configuration.
    pub fn new(config: &Config, gateway: Arc<dyn PushGateway>) -> anyhow::Result<Self> {
        let relay = NotificationRelay::new(
            RateLimiter::new(config.rate_limit.clone()),
            RequestValidator::new(config.public_origin.as_deref(), &config.client_ip_header),
            gateway,
        );
        let metrics = if config.metrics.enabled {
            Some(Metrics::new()?)
        } else {
            None
        };

        Ok(Self {
            relay,
            notification: Arc::new(config.notification.clone()),
            metrics,
        })
    }
}

/// Build the router. The metrics route only exists when metrics are enabled.
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    let mut app = Router::new().route(NOTIFY_PATH, any(send_notification));

    if state.metrics.is_some() {
        let path = config.metrics.path.as_str();
        if path.starts_with('/') && path != NOTIFY_PATH {
            app = app.route(path, get(metrics));
        } else {
            warn!(path, "Ignoring unusable metrics path");
        }
    }

    app.fallback(page_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Relay a move-car notification.
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let config = Arc::clone(&state.notification);
    let outcome = state.relay.handle(&method, &uri, &headers, &config).await;

    if let Some(metrics) = &state.metrics {
        metrics.record(match &outcome {
            Ok(_) => "sent",
            Err(err) => err.kind(),
        });
    }

    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Informational page with the owner's phone number.
pub async fn page_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html;charset=UTF-8")],
        page::render(&state.notification.owner_phone),
    )
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Turn a handler panic into an opaque 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    error!(panic = %detail, "Request handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
