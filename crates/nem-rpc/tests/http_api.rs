use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use nem_core::Address;
use nem_node::{Node, PeerNode};
use tower::ServiceExt;

fn test_node() -> (Arc<Node>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = PeerNode::new(
        nem_node::DEFAULT_BOOTSTRAP_IP,
        nem_node::HTTPS_PORT,
        true,
        Address::ZERO,
        false,
        "v0",
    );
    let node = Node::new(dir.path(), "127.0.0.1", 8080, Address::ZERO, bootstrap, "v0", 0).unwrap();
    (node, dir)
}

#[tokio::test]
async fn balances_list_returns_genesis_balances_with_cors() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(Request::builder().uri("/balances/list").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("access-control-allow-origin").map(|v| v.to_str().unwrap()),
        Some("*")
    );
}

#[tokio::test]
async fn node_status_reports_self_account() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(Request::builder().uri("/node/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn node_sync_rejects_malformed_hash() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/node/sync?fromblock=not-a-hash")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn node_sync_with_no_param_returns_full_log() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(Request::builder().uri("/node/sync").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn block_lookup_missing_height_returns_404() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(Request::builder().uri("/block/99").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_peer_registers_caller() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node.clone());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/node/peer?ip=10.0.0.5&port=8080&miner=0x0000000000000000000000000000000000000001&version=v0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(node.known_peers().len(), 2);
}

#[tokio::test]
async fn add_peer_with_bad_port_reports_failure_not_http_error() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/node/peer?ip=10.0.0.5&port=not-a-port&miner=0x0000000000000000000000000000000000000001&version=v0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tx_add_rejects_missing_password() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let body = serde_json::json!({
        "from": "0x0000000000000000000000000000000000000001",
        "from_pwd": "",
        "to": "0x0000000000000000000000000000000000000002",
        "value": 10,
    });

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tx/add")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mempool_view_starts_empty() {
    let (node, _dir) = test_node();
    let app = nem_rpc::build_router(node);

    let res = app
        .oneshot(Request::builder().uri("/mempool").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}
