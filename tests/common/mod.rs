//! A scriptable stand-in for the organization-management API.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Decides the response for `GET /api/v1/{resource}?{params}`.
pub type Responder =
    Arc<dyn Fn(&str, &HashMap<String, String>, &HeaderMap) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct ApiState {
    responder: Responder,
    requests: Arc<AtomicUsize>,
}

/// A running fake API.
pub struct FakeApi {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
}

impl FakeApi {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn handle(
    State(state): State<ApiState>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let (status, body) = (state.responder)(&resource, &params, &headers);
    (status, Json(body))
}

/// Start the fake API on a free local port.
pub async fn spawn_api<F>(responder: F) -> FakeApi
where
    F: Fn(&str, &HashMap<String, String>, &HeaderMap) -> (StatusCode, Value)
        + Send
        + Sync
        + 'static,
{
    let requests = Arc::new(AtomicUsize::new(0));
    let state = ApiState {
        responder: Arc::new(responder),
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/api/v1/{resource}", get(handle))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    FakeApi {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// A port with nothing listening on it.
pub fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
