//! HTTP API for the worker node
//!
//! All request bodies are the fixed-width binary layouts from
//! `common::record`; responses are short text bodies. Status contract:
//! 200 success, 400 duplicate or malformed body, 507 durable-write failure.

use crate::common::{Error, ResolveRequest, VoteRecord};
use crate::worker::store::ShardStore;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared worker state for HTTP handlers.
#[derive(Clone)]
pub struct WorkerState {
    pub store: Arc<ShardStore>,
    /// Ordered worker address list, for forwarding repair batches.
    pub peers: Arc<Vec<String>>,
    pub client: reqwest::Client,
}

/// Creates the HTTP router with all worker endpoints.
pub fn create_router(state: WorkerState) -> Router {
    Router::new()
        .route("/store", axum::routing::post(store_record))
        .route("/results", axum::routing::post(shard_results))
        .route("/alive", axum::routing::get(alive).post(alive))
        .route("/resolve", axum::routing::post(resolve_window))
        .route("/batch", axum::routing::post(batch_store))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(e: Error) -> Response {
    (e.to_http_status(), e.to_string()).into_response()
}

/// Store one vote record (22-byte body).
async fn store_record(State(state): State<WorkerState>, body: Bytes) -> Response {
    let record = match VoteRecord::decode(&body) {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };
    match state.store.store(record) {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => error_response(e),
    }
}

/// Tally query for one shard (2-byte body). Responds with the candidate
/// counts as comma-separated decimals in index order.
async fn shard_results(State(state): State<WorkerState>, body: Bytes) -> Response {
    if body.len() != 2 {
        return error_response(Error::Corrupted(format!(
            "results query must be 2 bytes, got {}",
            body.len()
        )));
    }
    let shard = u16::from_be_bytes([body[0], body[1]]);
    match state.store.tally(shard) {
        Ok(counts) => {
            let line = counts
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            (StatusCode::OK, line).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Trivial liveness acknowledgment.
async fn alive() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Anti-entropy pull (20-byte body): scan the requested shard window and
/// forward the matching rows as one batch directly to the recovered worker.
/// Succeeds only if the forward succeeds.
async fn resolve_window(State(state): State<WorkerState>, body: Bytes) -> Response {
    let req = match ResolveRequest::decode(&body) {
        Ok(req) => req,
        Err(e) => return error_response(e),
    };
    let Some(target) = state.peers.get(req.target as usize) else {
        return error_response(Error::Corrupted(format!(
            "unknown target worker {}",
            req.target
        )));
    };
    let records = match state.store.resolve(req.shard, req.start, req.end) {
        Ok(records) => records,
        Err(e) => return error_response(e),
    };
    if records.is_empty() {
        return (StatusCode::OK, "0").into_response();
    }

    let count = records.len();
    let forward = state
        .client
        .post(format!("http://{}/batch", target))
        .body(VoteRecord::encode_batch(&records))
        .send()
        .await;
    match forward {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!(
                shard = req.shard,
                target = req.target,
                records = count,
                "forwarded missed records"
            );
            (StatusCode::OK, count.to_string()).into_response()
        }
        Ok(resp) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("forward rejected with {}", resp.status()),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("forward failed: {}", e),
        )
            .into_response(),
    }
}

/// Batch store (k×22-byte body), used by repair forwarding. Duplicates are
/// skipped, not errors.
async fn batch_store(State(state): State<WorkerState>, body: Bytes) -> Response {
    let records = match VoteRecord::decode_batch(&body) {
        Ok(records) => records,
        Err(e) => return error_response(e),
    };
    match state.store.batch_store(&records) {
        Ok(applied) => (StatusCode::OK, applied.to_string()).into_response(),
        Err(e) => error_response(e),
    }
}
