//! # Region Server
//!
//! The HTTP status/metrics/failover surface for one region. On startup the
//! region announces itself in the state store (`active`, version, startup
//! time); on shutdown it marks itself `inactive`.

use std::net::SocketAddr;

use anyhow::Result;
use tokio::signal;

use lib_region::loggers::setup_logging;
use lib_region::region::{RegionStatusService, RegionTopology};
use lib_region::{Config, RedisStore};

mod region_api;
use region_api::{router, ApiContext};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    setup_logging("server_region", &config.log_dir, &config.log_level)?;

    let version = config.app_version();
    log::info!("Starting backend for {} ({})", config.region, version);

    let store = RedisStore::connect(&config.redis_url()).await?;

    let status = RegionStatusService::new(store.clone());
    status.mark_started(&config.region, &version).await?;

    let ctx = ApiContext {
        store: store.clone(),
        region: config.region.clone(),
        version,
        topology: RegionTopology::two_region("region1", "region2"),
    };
    let app = router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    log::info!("Region server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Shutdown lifecycle write; the store may already be gone, so a failure
    // here is only logged.
    log::info!("Shutting down {}", config.region);
    if let Err(e) = status.mark_stopped(&config.region).await {
        log::error!("Failed to mark region inactive: {}", e);
    }
    log::info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut term_signal = signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("failed to install SIGTERM handler");
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }
}
