// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification relay.
//!
//! Checks, in order: method, origin, per-client rate limit and
//! configuration. A request that passes all four is forwarded to the push
//! gateway exactly once and the provider's answer is mapped to a
//! [`NotificationResult`].

use crate::config::NotificationConfig;
use crate::error::{NotificationResult, RelayError};
use crate::gateway::{GatewayError, PushGateway, PushMessage};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::validator::{RequestValidator, ValidationResult};
use axum::http::{HeaderMap, Method, Uri};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct NotificationRelay {
    limiter: RateLimiter,
    validator: RequestValidator,
    gateway: Arc<dyn PushGateway>,
}

impl NotificationRelay {
    pub fn new(
        limiter: RateLimiter,
        validator: RequestValidator,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            limiter,
            validator,
            gateway,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run one notification request through the checks and, if it passes,
    /// the push gateway.
    pub async fn handle(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        config: &NotificationConfig,
    ) -> Result<NotificationResult, RelayError> {
        if *method != Method::POST {
            debug!(%method, "Rejecting non-POST notification request");
            return Err(RelayError::MethodNotAllowed);
        }

        if let ValidationResult::Invalid(err) = self.validator.validate_origin(uri, headers) {
            info!(error = %err, "Origin check failed");
            return Err(RelayError::IllegalOrigin);
        }

        match self.validator.client_identifier(headers) {
            Some(client_id) => {
                if let RateLimitResult::Limited { retry_after } = self.limiter.check(&client_id).await {
                    info!(
                        client_id = %client_id,
                        retry_after_secs = retry_after.as_secs(),
                        "Notification request rate limited"
                    );
                    return Err(RelayError::TooManyRequests { retry_after });
                }
            }
            None => debug!("No client identifier, skipping rate limit"),
        }

        if !config.is_configured() {
            error!(
                has_token = !config.app_token.is_empty(),
                recipients = config.recipient_ids.len(),
                "Push notification credentials are not configured"
            );
            return Err(RelayError::NotConfigured);
        }

        let message = PushMessage::move_car(config);
        let reply = match self.gateway.send(&message).await {
            Ok(reply) => reply,
            Err(err) => {
                match &err {
                    GatewayError::Timeout => warn!(error = %err, "Push gateway timed out"),
                    GatewayError::Transport(_) => warn!(error = %err, "Push gateway unreachable"),
                }
                return Err(RelayError::Network);
            }
        };

        if reply.is_success() {
            info!(recipients = message.uids.len(), "Move-car notification sent");
            Ok(NotificationResult::sent())
        } else {
            warn!(
                code = ?reply.code,
                provider_message = ?reply.message,
                "Push gateway rejected notification"
            );
            Err(RelayError::Upstream(reply.message.filter(|m| !m.is_empty())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::gateway::GatewayReply;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::sync::Mutex;

    /// Gateway returning a canned answer and remembering what it was sent.
    struct CannedGateway {
        answer: fn() -> Result<GatewayReply, GatewayError>,
        sent: Mutex<Vec<PushMessage>>,
    }

    #[async_trait]
    impl PushGateway for CannedGateway {
        async fn send(&self, message: &PushMessage) -> Result<GatewayReply, GatewayError> {
            self.sent.lock().unwrap().push(message.clone());
            (self.answer)()
        }
    }

    fn relay(answer: fn() -> Result<GatewayReply, GatewayError>) -> (NotificationRelay, Arc<CannedGateway>) {
        let gateway = Arc::new(CannedGateway {
            answer,
            sent: Mutex::new(Vec::new()),
        });
        let relay = NotificationRelay::new(
            RateLimiter::new(RateLimitConfig::default()),
            RequestValidator::new(None, "CF-Connecting-IP"),
            gateway.clone(),
        );
        (relay, gateway)
    }

    fn configured() -> NotificationConfig {
        NotificationConfig {
            app_token: "AT_token".to_string(),
            recipient_ids: vec!["UID_owner".to_string()],
            owner_phone: "13800000000".to_string(),
        }
    }

    fn accepted() -> Result<GatewayReply, GatewayError> {
        Ok(GatewayReply {
            code: Some(1000),
            message: Some("ok".to_string()),
        })
    }

    fn path() -> Uri {
        Uri::from_static("/sendNotification")
    }

    fn client(ip: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static(ip));
        headers
    }

    #[tokio::test]
    async fn test_success_forwards_fixed_message() {
        let (relay, gateway) = relay(accepted);
        let result = relay
            .handle(&Method::POST, &path(), &client("203.0.113.1"), &configured())
            .await
            .unwrap();

        assert_eq!(result, NotificationResult::sent());
        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], PushMessage::move_car(&configured()));
    }

    #[tokio::test]
    async fn test_rejection_carries_provider_message() {
        let (relay, _) = relay(|| {
            Ok(GatewayReply {
                code: Some(1001),
                message: Some("bad token".to_string()),
            })
        });
        let err = relay
            .handle(&Method::POST, &path(), &HeaderMap::new(), &configured())
            .await
            .unwrap_err();

        assert!(matches!(&err, RelayError::Upstream(Some(m)) if m == "bad token"));
        assert_eq!(err.to_string(), "bad token");
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback_message() {
        let (relay, _) = relay(|| Ok(GatewayReply::default()));
        let err = relay
            .handle(&Method::POST, &path(), &HeaderMap::new(), &configured())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "notification failed");
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let (relay, _) = relay(|| Err(GatewayError::Transport("connection refused".to_string())));
        let err = relay
            .handle(&Method::POST, &path(), &HeaderMap::new(), &configured())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Network));
        assert_eq!(err.to_string(), "network error, try again later");
    }

    #[tokio::test]
    async fn test_unconfigured_never_reaches_gateway() {
        let (relay, gateway) = relay(accepted);
        let config = NotificationConfig {
            recipient_ids: Vec::new(),
            ..configured()
        };

        let err = relay
            .handle(&Method::POST, &path(), &HeaderMap::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::NotConfigured));
        assert!(gateway.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_method_checked_before_everything_else() {
        let (relay, gateway) = relay(accepted);
        let mut headers = client("203.0.113.1");
        headers.insert("origin", HeaderValue::from_static("https://evil.example.net"));

        let err = relay
            .handle(&Method::GET, &path(), &headers, &NotificationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MethodNotAllowed));
        assert!(relay.limiter().is_empty().await);
        assert!(gateway.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fourth_request_from_client_is_limited() {
        let (relay, gateway) = relay(accepted);
        let headers = client("198.51.100.4");

        for _ in 0..3 {
            assert!(relay.handle(&Method::POST, &path(), &headers, &configured()).await.is_ok());
        }
        let err = relay
            .handle(&Method::POST, &path(), &headers, &configured())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::TooManyRequests { .. }));
        assert_eq!(gateway.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unidentified_clients_are_not_limited() {
        let (relay, _) = relay(accepted);
        for _ in 0..10 {
            assert!(relay
                .handle(&Method::POST, &path(), &HeaderMap::new(), &configured())
                .await
                .is_ok());
        }
        assert!(relay.limiter().is_empty().await);
    }
}
