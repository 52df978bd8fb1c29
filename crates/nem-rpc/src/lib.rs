// Copyright 2024 Nemos Contributors.
// SPDX-License-Identifier: GPL-3.0

//! The plain REST surface: one handler per endpoint, a shared
//! `Arc<Node>` extension, permissive CORS on read endpoints. Mirrors
//! the original node's `routes.go` contract; see spec §6.

mod error;
mod handlers;

pub use error::NodeApiError;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use nem_node::Node;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full router against a shared node handle. Read endpoints
/// get permissive CORS; `/tx/add` does not need it, since it's never
/// called from a browser context in this design.
pub fn build_router(node: Arc<Node>) -> Router {
    let read_only = Router::new()
        .route("/balances/list", get(handlers::balances_list))
        .route("/node/status", get(handlers::node_status))
        .route("/node/sync", get(handlers::node_sync))
        .route("/block/:id", get(handlers::block_by_id))
        .route("/mempool", get(handlers::mempool_view))
        .layer(CorsLayer::permissive());

    Router::new()
        .merge(read_only)
        .route("/tx/add", axum::routing::post(handlers::tx_add))
        .route("/node/peer", get(handlers::node_peer))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}
