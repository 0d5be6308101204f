// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Push gateway client.
//!
//! Sends the move-car message through WxPusher. The provider is reached over
//! HTTPS and answers with a JSON body carrying a numeric `code`; only
//! [`SUCCESS_CODE`] means the message was accepted.

use crate::config::{GatewayConfig, NotificationConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Provider code signalling the message was accepted.
pub const SUCCESS_CODE: i64 = 1000;

/// Provider content type for plain text messages.
pub const CONTENT_TYPE_TEXT: u8 = 1;

/// Text delivered to the car owner.
pub const MOVE_CAR_MESSAGE: &str = "please move your car";

/// Request body for the provider's send endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub app_token: String,
    pub content: String,
    pub content_type: u8,
    pub uids: Vec<String>,
}

impl PushMessage {
    /// The fixed move-car message addressed to every configured recipient.
    pub fn move_car(config: &NotificationConfig) -> Self {
        Self {
            app_token: config.app_token.clone(),
            content: MOVE_CAR_MESSAGE.to_string(),
            content_type: CONTENT_TYPE_TEXT,
            uids: config.recipient_ids.clone(),
        }
    }
}

/// Provider reply. Each field is read on its own; a missing or mistyped
/// field is `None` without affecting the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayReply {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        self.code == Some(SUCCESS_CODE)
    }

    /// Parse a reply body, falling back to an empty reply on malformed JSON.
    pub fn parse_lenient(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(error = %e, "Failed to parse push gateway response");
                Self::default()
            }
        }
    }

    /// Read `code`, then `message` falling back to WxPusher's `msg`.
    fn from_value(value: &Value) -> Self {
        let message = ["message", "msg"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string);

        Self {
            code: value.get("code").and_then(Value::as_i64),
            message,
        }
    }
}

/// Failures reaching the provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("push gateway timed out")]
    Timeout,

    #[error("push gateway transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Outbound push delivery.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<GatewayReply, GatewayError>;
}

/// WxPusher HTTP client.
pub struct WxPusherClient {
    api_url: String,
    client: reqwest::Client,
}

impl WxPusherClient {
    /// Create a client with the configured endpoint and timeout.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            api_url: config.api_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl PushGateway for WxPusherClient {
    async fn send(&self, message: &PushMessage) -> Result<GatewayReply, GatewayError> {
        debug!(
            url = %self.api_url,
            recipients = message.uids.len(),
            "Sending push notification"
        );

        let response = self.client.post(&self.api_url).json(message).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(status = %status, bytes = body.len(), "Push gateway responded");
        Ok(GatewayReply::parse_lenient(&body))
    }
}
