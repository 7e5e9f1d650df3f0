// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::{routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{reflector, watcher, Controller},
    Api, Client,
};
use pdns_operator::{
    constants::{
        METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, METRICS_SERVER_PORT,
        TOKIO_WORKER_THREADS,
    },
    context::{Context, Stores},
    crd::{ClusterRRset, ClusterZone, RRset, Zone},
    metrics,
    pdns::client::PdnsClient,
    reconcilers::{error_policy, rrset, zone},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// PowerDNS operator command line options.
///
/// Every backend option falls back to its environment variable, so the
/// operator runs unconfigured inside a pod with only PDNS_* set.
#[derive(Parser, Debug)]
#[command(name = "pdns-operator", about = "PowerDNS Operator for Kubernetes")]
struct Args {
    /// Base URL of the PowerDNS management API (overrides PDNS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// API key for the PowerDNS management API (overrides PDNS_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Virtual host to address on the backend (overrides PDNS_API_VHOST)
    #[arg(long)]
    api_vhost: Option<String>,

    /// Bind address for the metrics and health endpoints
    #[arg(long)]
    metrics_bind_address: Option<String>,
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("pdns-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting PowerDNS Operator");
}

/// Resolve backend configuration from CLI flags and PDNS_* environment
/// variables, CLI taking precedence.
fn backend_config(args: &Args) -> Result<(String, String, String)> {
    let api_url = args
        .api_url
        .clone()
        .or_else(|| std::env::var("PDNS_API_URL").ok())
        .context("PowerDNS API URL not configured (set PDNS_API_URL or pass --api-url)")?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("PDNS_API_KEY").ok())
        .context("PowerDNS API key not configured (set PDNS_API_KEY or pass --api-key)")?;

    let api_vhost = args
        .api_vhost
        .clone()
        .or_else(|| std::env::var("PDNS_API_VHOST").ok())
        .unwrap_or_else(|| "localhost".to_string());

    Ok((api_url, api_key, api_vhost))
}

/// Initialize reflectors for the four resource kinds and create the shared
/// context.
///
/// Each reflector spawns a background task that watches its resource kind
/// and updates the corresponding store. The stores double as the secondary
/// indexes used for cross-resource duplicate detection.
fn initialize_shared_context(client: Client, pdns: Arc<PdnsClient>) -> Arc<Context> {
    info!("Initializing reflectors for all resource kinds");

    let zones_api = Api::<Zone>::all(client.clone());
    let cluster_zones_api = Api::<ClusterZone>::all(client.clone());
    let rrsets_api = Api::<RRset>::all(client.clone());
    let cluster_rrsets_api = Api::<ClusterRRset>::all(client.clone());

    let (zones_store, zones_writer) = reflector::store();
    let (cluster_zones_store, cluster_zones_writer) = reflector::store();
    let (rrsets_store, rrsets_writer) = reflector::store();
    let (cluster_rrsets_store, cluster_rrsets_writer) = reflector::store();

    tokio::spawn(async move {
        let stream = watcher(zones_api, watcher::Config::default());
        reflector(zones_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("Zone reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(cluster_zones_api, watcher::Config::default());
        reflector(cluster_zones_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterZone reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(rrsets_api, watcher::Config::default());
        reflector(rrsets_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("RRset reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(cluster_rrsets_api, watcher::Config::default());
        reflector(cluster_rrsets_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterRRset reflector stream ended");
    });

    Arc::new(Context {
        client,
        stores: Stores {
            zones: zones_store,
            cluster_zones: cluster_zones_store,
            rrsets: rrsets_store,
            cluster_rrsets: cluster_rrsets_store,
        },
        zones_api: pdns.clone(),
        records_api: pdns,
    })
}

/// Serve `/metrics`, `/healthz` and `/readyz`.
async fn run_metrics_server(bind_address: String) -> Result<()> {
    async fn metrics_handler() -> (axum::http::StatusCode, String) {
        match metrics::gather_metrics() {
            Ok(body) => (axum::http::StatusCode::OK, body),
            Err(e) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to gather metrics: {e}"),
            ),
        }
    }

    async fn probe_handler() -> &'static str {
        "ok"
    }

    let app = Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route("/healthz", get(probe_handler))
        .route("/readyz", get(probe_handler));

    info!(address = %bind_address, "Serving metrics and health endpoints");
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind metrics server on {bind_address}"))?;
    axum::serve(listener, app)
        .await
        .context("metrics server failed")?;
    Ok(())
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let args = Args::parse();
    let (api_url, api_key, api_vhost) = backend_config(&args)?;
    info!(url = %api_url, vhost = %api_vhost, "PowerDNS backend configured");
    let pdns = Arc::new(PdnsClient::new(&api_url, &api_vhost, &api_key)?);

    debug!("Initializing Kubernetes client");
    let config = kube::Config::infer().await?;
    let client = Client::try_from(config)?;

    let ctx = initialize_shared_context(client.clone(), pdns);

    let bind_address = args.metrics_bind_address.clone().unwrap_or_else(|| {
        format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}")
    });
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(bind_address).await {
            warn!(error = %e, "metrics server exited");
        }
    });

    // One controller per kind. Zone controllers own their record sets, so a
    // child status bump requeues the parent and refreshes the mirrored
    // serial; the store's ownership mechanism also cascades deletion.
    let zone_controller = Controller::new(Api::<Zone>::all(client.clone()), watcher::Config::default())
        .owns(Api::<RRset>::all(client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(zone::reconcile::<Zone>, error_policy, ctx.clone())
        .for_each(|_| futures::future::ready(()));

    let cluster_zone_controller = Controller::new(
        Api::<ClusterZone>::all(client.clone()),
        watcher::Config::default(),
    )
    .owns(Api::<RRset>::all(client.clone()), watcher::Config::default())
    .owns(
        Api::<ClusterRRset>::all(client.clone()),
        watcher::Config::default(),
    )
    .shutdown_on_signal()
    .run(zone::reconcile::<ClusterZone>, error_policy, ctx.clone())
    .for_each(|_| futures::future::ready(()));

    let rrset_controller = Controller::new(Api::<RRset>::all(client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(rrset::reconcile::<RRset>, error_policy, ctx.clone())
        .for_each(|_| futures::future::ready(()));

    let cluster_rrset_controller = Controller::new(
        Api::<ClusterRRset>::all(client.clone()),
        watcher::Config::default(),
    )
    .shutdown_on_signal()
    .run(rrset::reconcile::<ClusterRRset>, error_policy, ctx.clone())
    .for_each(|_| futures::future::ready(()));

    info!("Starting controllers");
    tokio::join!(
        zone_controller,
        cluster_zone_controller,
        rrset_controller,
        cluster_rrset_controller
    );

    info!("Controllers stopped, shutting down");
    Ok(())
}
