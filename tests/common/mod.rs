//! Shared mock servers for integration testing.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::Query;
use axum::http::{HeaderMap, Response, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use consul_chat_bridge::config::{ConsulConfig, RetryConfig, TimeoutConfig};

/// A blocking query as seen by the mock agent.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ConsulQuery {
    pub index: u64,
    pub datacenter: String,
    pub wait: String,
    pub token: Option<String>,
}

/// What the mock agent answers.
#[derive(Debug, Clone)]
pub struct ConsulReply {
    pub status: u16,
    pub index: Option<u64>,
    pub body: String,
}

impl ConsulReply {
    pub fn checks(index: u64, checks: Value) -> Self {
        Self {
            status: 200,
            index: Some(index),
            body: checks.to_string(),
        }
    }

    #[allow(dead_code)]
    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status,
            index: None,
            body: body.to_string(),
        }
    }
}

/// One check entry in Consul's wire format.
pub fn check(node: &str, service_id: &str, status: &str, notes: &str, output: &str) -> Value {
    json!({
        "Node": node,
        "CheckID": format!("service:{service_id}"),
        "Name": format!("Service '{service_id}' check"),
        "Status": status,
        "Notes": notes,
        "Output": output,
        "ServiceID": service_id,
        "ServiceName": service_id,
        "ServiceTags": [],
        "CreateIndex": 1,
        "ModifyIndex": 1
    })
}

/// Start a programmable Consul agent serving `/v1/health/state/any`.
pub async fn start_mock_consul<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn(ConsulQuery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConsulReply> + Send + 'static,
{
    let f = Arc::new(f);
    let handler = move |Query(params): Query<HashMap<String, String>>, headers: HeaderMap| {
        let f = f.clone();
        async move {
            let query = ConsulQuery {
                index: params.get("index").and_then(|v| v.parse().ok()).unwrap_or(0),
                datacenter: params.get("dc").cloned().unwrap_or_default(),
                wait: params.get("wait").cloned().unwrap_or_default(),
                token: headers
                    .get("X-Consul-Token")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            };
            let reply = f(query).await;

            let mut builder = Response::builder()
                .status(reply.status)
                .header("content-type", "application/json");
            if let Some(index) = reply.index {
                builder = builder.header("X-Consul-Index", index.to_string());
            }
            builder.body(Body::from(reply.body)).unwrap()
        }
    };

    let app = Router::new().route("/v1/health/state/any", get(handler));
    serve(addr, app).await;
}

pub type Received = Arc<Mutex<Vec<Value>>>;

/// Start a webhook receiver that records every JSON body and answers `status`.
pub async fn start_webhook_receiver(addr: SocketAddr, status: u16) -> Received {
    let received: Received = Arc::default();
    let store = received.clone();

    let handler = move |Json(body): Json<Value>| {
        let store = store.clone();
        async move {
            store.lock().unwrap().push(body);
            StatusCode::from_u16(status).unwrap()
        }
    };

    let app = Router::new().route("/hook", post(handler));
    serve(addr, app).await;
    received
}

async fn serve(addr: SocketAddr, app: Router) {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

pub fn consul_config(addr: SocketAddr) -> ConsulConfig {
    ConsulConfig {
        address: addr.to_string(),
        wait_secs: 30,
        ..ConsulConfig::default()
    }
}

pub fn fast_retries(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay_ms: 10,
        max_delay_ms: 50,
    }
}

pub fn timeouts() -> TimeoutConfig {
    TimeoutConfig {
        webhook_secs: 5,
        watch_grace_secs: 5,
    }
}
