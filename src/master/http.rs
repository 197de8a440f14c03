//! HTTP API for the master node
//!
//! Status contract for `/vote`: 200 submitted, 400 parameters missing,
//! 403 already voted, 503 no live replica accepted the write. `/results`
//! answers 200 with the full tally or 503 when any shard has no reachable
//! replica.

use crate::master::cluster::ClusterView;
use crate::master::coordinator::Coordinator;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::common::Error;

/// Shared master state for HTTP handlers.
#[derive(Clone)]
pub struct MasterState {
    pub coordinator: Arc<Coordinator>,
    pub cluster: Arc<ClusterView>,
}

/// Creates the HTTP router with all public endpoints.
pub fn create_router(state: MasterState) -> Router {
    Router::new()
        .route("/vote", axum::routing::post(submit_vote))
        .route("/results", axum::routing::get(results))
        .route("/health", axum::routing::get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Submission body; both fields must be present and numeric.
#[derive(Debug, Deserialize)]
struct VoteForm {
    voter: Option<String>,
    candidate: Option<String>,
}

async fn submit_vote(State(state): State<MasterState>, Form(form): Form<VoteForm>) -> Response {
    let parsed = match (
        form.voter.as_deref().map(str::parse::<u64>),
        form.candidate.as_deref().map(str::parse::<u32>),
    ) {
        (Some(Ok(voter)), Some(Ok(candidate))) => Some((voter, candidate)),
        _ => None,
    };
    let Some((voter, candidate)) = parsed else {
        return (StatusCode::BAD_REQUEST, "Parameters missing").into_response();
    };

    match state.coordinator.submit_vote(voter, candidate).await {
        Ok(()) => (StatusCode::OK, "Vote Submitted").into_response(),
        Err(e @ Error::AlreadyVoted(_)) => (e.to_http_status(), "Already voted").into_response(),
        Err(e @ Error::Unavailable) => (
            e.to_http_status(),
            "Service currently unavailable, try again later",
        )
            .into_response(),
        Err(e) => (e.to_http_status(), e.to_string()).into_response(),
    }
}

async fn results(State(state): State<MasterState>) -> Response {
    match state.coordinator.aggregate().await {
        Ok(tally) => axum::Json(json!({ "tally": tally })).into_response(),
        Err(e) => (e.to_http_status(), e.to_string()).into_response(),
    }
}

/// Liveness snapshot of the worker ring.
async fn health(State(state): State<MasterState>) -> Response {
    let live = state.cluster.live_snapshot();
    let live_count = live.iter().filter(|l| **l).count();
    axum::Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "workers": live,
        "live_workers": live_count,
    }))
    .into_response()
}
