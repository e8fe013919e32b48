//! # Telemetry Consumer Binary
//!
//! Subscribes to the device telemetry topic and maintains the device
//! counter in the state store. Runs until the process is terminated or the
//! broker stays unreachable past the retry budget.

use anyhow::Result;

use lib_region::consumers::telemetry;
use lib_region::loggers::setup_logging;
use lib_region::{Config, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    setup_logging("consumer_telemetry", &config.log_dir, &config.log_level)?;

    log::info!(
        "Starting telemetry consumer for {} (counting: {:?})",
        config.region,
        config.device_counting
    );

    let store = RedisStore::connect(&config.redis_url()).await?;
    telemetry::run(store, &config).await?;
    Ok(())
}
