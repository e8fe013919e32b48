//! # Activity Consumer Binary
//!
//! Consumes user-activity snapshots from the durable queue and keeps the
//! latest one in the state store. Runs until the process is terminated or
//! the broker stays unreachable past the retry budget.

use anyhow::Result;

use lib_region::consumers::activity;
use lib_region::loggers::setup_logging;
use lib_region::{Config, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    setup_logging("consumer_activity", &config.log_dir, &config.log_level)?;

    log::info!(
        "Starting activity consumer for {} (ack: {:?})",
        config.region,
        config.ack_mode
    );

    let store = RedisStore::connect(&config.redis_url()).await?;
    activity::run(store, &config).await?;
    Ok(())
}
