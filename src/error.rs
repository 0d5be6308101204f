// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error and result types for the notification endpoint

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Fallback when the provider rejects a message without saying why.
pub const FALLBACK_FAILURE_MESSAGE: &str = "notification failed";

/// Body returned by `/sendNotification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NotificationResult {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Reasons a notification request does not end in a delivered message.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("illegal origin")]
    IllegalOrigin,

    #[error("too many requests")]
    TooManyRequests { retry_after: Duration },

    #[error("notification not configured")]
    NotConfigured,

    /// Provider answered but did not accept the message
    #[error("{}", .0.as_deref().unwrap_or(FALLBACK_FAILURE_MESSAGE))]
    Upstream(Option<String>),

    #[error("network error, try again later")]
    Network,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::IllegalOrigin => StatusCode::FORBIDDEN,
            RelayError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            RelayError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            // Provider and transport failures are reported in the body; the
            // page script reads `success` rather than the status.
            RelayError::Upstream(_) | RelayError::Network => StatusCode::OK,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::IllegalOrigin => "illegal_origin",
            RelayError::TooManyRequests { .. } => "rate_limited",
            RelayError::NotConfigured => "not_configured",
            RelayError::Upstream(_) => "upstream",
            RelayError::Network => "network",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            RelayError::MethodNotAllowed => (
                status,
                [(header::ALLOW, HeaderValue::from_static("POST"))],
                self.to_string(),
            )
                .into_response(),
            RelayError::TooManyRequests { retry_after } => {
                // Round up so clients never retry before the window resets
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (
                    status,
                    [(header::RETRY_AFTER, secs.to_string())],
                    Json(NotificationResult::failed(self.to_string())),
                )
                    .into_response()
            }
            _ => (status, Json(NotificationResult::failed(self.to_string()))).into_response(),
        }
    }
}
