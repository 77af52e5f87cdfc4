//! CLI entry point for the rush-buy tool.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rushbuy_core::{
    Authenticator, Endpoints, ExpectedProduct, FileSessionStore, HttpSettings, OrderClient,
    OrderFinalizer, RushBuyEngine, RushConfig, SessionStore, Shop, Transport, WatchPolicy,
    parse_product_list,
};
use tracing::{debug, error, info, warn};

mod cli;
mod viewer;

use cli::Args;
use viewer::SystemViewer;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let products = parse_product_list(&args.goods).context("invalid --goods list")?;
    let config = args.rush_config();
    info!(
        products = products.len(),
        area = %config.ship_area,
        period_ms = args.period,
        rush = config.rush,
        auto_submit = config.auto_submit,
        "rushbuy starting"
    );

    let endpoints = args
        .storefront_url
        .as_deref()
        .map_or_else(Endpoints::default, Endpoints::rooted_at);

    let store = Arc::new(FileSessionStore::new(&args.session_file));
    if let Err(e) = store.load() {
        warn!(error = %e, "could not load stored session, starting fresh");
        store.clean();
    }
    let transport = Transport::new(store.jar(), &HttpSettings::default())?;
    let session: Arc<dyn SessionStore> = store.clone();

    tokio::select! {
        () = run(transport, session, endpoints, config, &products) => {}
        () = shutdown_signal() => info!("interrupted, releasing session"),
    }

    if let Err(e) = store.persist() {
        warn!(error = %e, "could not save session");
    }
    Ok(())
}

async fn run(
    transport: Transport,
    session: Arc<dyn SessionStore>,
    endpoints: Endpoints,
    config: RushConfig,
    products: &[ExpectedProduct],
) {
    let authenticator = Authenticator::new(
        transport.clone(),
        Arc::clone(&session),
        endpoints.clone(),
        Arc::new(SystemViewer::default()),
    );
    match authenticator.ensure_logged_in().await {
        Ok(state) => info!(%state, "logged in"),
        Err(e) => {
            error!(error = %e, "login failed, nothing was purchased");
            return;
        }
    }

    let shop = Shop::new(&transport, &endpoints, &config);
    if let Err(e) = shop.cart().cart_overview().await {
        warn!(error = %e, "could not read the cart");
    }

    let desk = OrderClient::new(transport, endpoints, session);
    let engine = RushBuyEngine::new(
        Arc::new(shop),
        Arc::new(desk),
        WatchPolicy::from(&config),
        OrderFinalizer::new(config.auto_submit),
    );
    let report = engine.run(products).await;

    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            error!(product_id = %outcome.product_id, phase = e.phase(), error = %e, "not purchased");
        }
    }
    info!(
        committed = report.committed(),
        failed = report.failed(),
        order_id = report.finalize.order_id().unwrap_or(""),
        "rush finished"
    );
}

/// Resolves on SIGINT or SIGTERM (Ctrl-C where Unix signals are unavailable).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
