use std::net::SocketAddr;
use std::sync::Arc;

use nem_core::Address;
use nem_node::{Node, PeerNode};
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;

pub async fn run(args: RunArgs) -> eyre::Result<()> {
    let datadir = nem_utils::expand_path(&args.datadir);
    let miner = Address::from_hex(&args.miner)?;
    let bootstrap_account = Address::from_hex(&args.bootstrap_account)?;

    let port = if args.disable_ssl { args.port } else { nem_node::HTTPS_PORT };

    tracing::info!(ip = %args.ip, port, "launching the nemos node and its HTTP API");

    let bootstrap = PeerNode::new(args.bootstrap_ip, args.bootstrap_port, true, bootstrap_account, false, "");

    let node_version = super::version::version_string();
    let node = Node::new(&datadir, args.ip.clone(), port, miner, bootstrap, node_version, nem_node::DEFAULT_MINING_DIFFICULTY)?;

    tracing::info!(
        height = node.latest_block_number(),
        hash = %node.latest_block_hash(),
        "blockchain state loaded"
    );

    let cancel = CancellationToken::new();

    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt, shutting down");
            ctrlc_cancel.cancel();
        }
    });

    let sync_node = node.clone();
    let sync_cancel = cancel.child_token();
    let sync_task = tokio::spawn(async move { nem_sync::run(sync_node, sync_cancel).await });

    let mining_node = node.clone();
    let mining_cancel = cancel.child_token();
    let mining_task = tokio::spawn(async move { nem_node::run_mining_supervisor(mining_node, mining_cancel).await });

    let addr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), port as u16);
    let router = nem_rpc::build_router(Arc::clone(&node));

    let serve_result = if args.disable_ssl {
        serve_plain(addr, router, cancel.clone()).await
    } else {
        serve_tls(addr, router, &datadir, &args.ssl_email, cancel.clone()).await
    };

    cancel.cancel();
    let _ = sync_task.await;
    let _ = mining_task.await;

    serve_result
}

async fn serve_plain(addr: SocketAddr, router: axum::Router, cancel: CancellationToken) -> eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

/// SSL termination expects a certificate/key pair already on disk at
/// `<datadir>/certs/{cert,key}.pem` — automatic provisioning (the
/// original relies on `certmagic`'s ACME client) is out of scope here,
/// see DESIGN.md.
async fn serve_tls(addr: SocketAddr, router: axum::Router, datadir: &str, ssl_email: &str, cancel: CancellationToken) -> eyre::Result<()> {
    let certs_dir = std::path::Path::new(datadir).join("certs");
    let cert_path = certs_dir.join("cert.pem");
    let key_path = certs_dir.join("key.pem");

    if !ssl_email.is_empty() {
        tracing::info!(ssl_email, "SSL certificate contact email recorded");
    }

    let config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
        .await
        .map_err(|e| eyre::eyre!("failed to load TLS material from {}: {e}", certs_dir.display()))?;

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        cancel.cancelled().await;
        shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(5)));
    });

    axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
