// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared helpers for driving the notifier in tests.

#![allow(dead_code)]

pub mod provider;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use move_car_notifier::{
    config::{Config, NotificationConfig},
    gateway::{GatewayError, GatewayReply, PushGateway, PushMessage},
    handlers::{router, AppState},
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// What the scripted gateway does when called.
#[derive(Clone)]
pub enum Script {
    Reply(GatewayReply),
    Fail(&'static str),
    Panic,
}

/// In-process gateway that records every message it is asked to send.
pub struct ScriptedGateway {
    script: Script,
    pub sent: Mutex<Vec<PushMessage>>,
}

impl ScriptedGateway {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(Script::Reply(GatewayReply {
            code: Some(1000),
            message: Some("处理成功".to_string()),
        }))
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushGateway for ScriptedGateway {
    async fn send(&self, message: &PushMessage) -> Result<GatewayReply, GatewayError> {
        self.sent.lock().unwrap().push(message.clone());
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail(reason) => Err(GatewayError::Transport(reason.to_string())),
            Script::Panic => panic!("scripted gateway panic"),
        }
    }
}

/// Configuration with credentials and a known phone number.
pub fn configured() -> Config {
    Config {
        notification: NotificationConfig {
            app_token: "AT_test_token".to_string(),
            recipient_ids: vec!["UID_owner".to_string(), "UID_partner".to_string()],
            owner_phone: "13800000000".to_string(),
        },
        ..Default::default()
    }
}

pub fn app(config: &Config, gateway: Arc<dyn PushGateway>) -> Router {
    let state = Arc::new(AppState::new(config, gateway).unwrap());
    router(state, config)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A same-origin notification POST from the given client IP.
pub fn notify_from(ip: &str) -> Request<Body> {
    Request::post("/sendNotification")
        .header("host", "car.example.com")
        .header("x-forwarded-proto", "https")
        .header("origin", "https://car.example.com")
        .header("cf-connecting-ip", ip)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap()
}
