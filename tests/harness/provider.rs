// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Local stand-in for the WxPusher send endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use move_car_notifier::gateway::PushMessage;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// How the mock provider answers.
#[derive(Clone)]
pub enum Behavior {
    /// Respond with this status and raw body
    Respond(StatusCode, &'static str),
    /// Sleep before answering with success
    Stall(Duration),
}

#[derive(Clone)]
struct ProviderState {
    behavior: Behavior,
    received: Arc<Mutex<Vec<PushMessage>>>,
}

pub struct MockProvider {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Vec<PushMessage>>>,
}

impl MockProvider {
    /// Start the mock on an ephemeral port.
    pub async fn start(behavior: Behavior) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = ProviderState {
            behavior,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/api/send/message", post(send_message))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, received }
    }

    pub fn url(&self) -> String {
        format!("http://{}/api/send/message", self.addr)
    }
}

async fn send_message(
    State(state): State<ProviderState>,
    Json(message): Json<PushMessage>,
) -> Response {
    state.received.lock().unwrap().push(message);
    match state.behavior {
        Behavior::Respond(status, body) => (
            status,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        Behavior::Stall(delay) => {
            tokio::time::sleep(delay).await;
            Json(serde_json::json!({"code": 1000, "msg": "处理成功"})).into_response()
        }
    }
}

/// A URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/send/message", addr)
}
