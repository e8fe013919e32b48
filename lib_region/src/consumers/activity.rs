//! # Activity Consumer
//!
//! Consumes periodic user-activity snapshots from the durable
//! `webapp_active_users` queue and tracks only the most recent one. Four
//! independent store writes per snapshot; a partial failure leaves a mix of
//! old and new keys with no rollback.

use std::time::Duration;

use futures_util::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use serde_json::Value;

use crate::config::{AckMode, Config};
use crate::keys;
use crate::models::ActivitySnapshot;
use crate::store::StateStore;

use super::ConsumerError;

/// Handles one raw payload. Returns `true` when the snapshot decoded and
/// the writes were attempted; `false` when the message was dropped.
pub async fn handle_payload<S: StateStore>(store: &S, payload: &[u8]) -> bool {
    let snapshot: ActivitySnapshot = match serde_json::from_slice(payload) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!("Dropping undecodable activity message: {}", e);
            return false;
        }
    };

    // Four independent writes; each failure is logged and the rest still
    // attempted, so readers may observe a mix of old and new values.
    let mut writes: Vec<(&str, Value)> = vec![
        (keys::ACTIVE_USERS, Value::from(snapshot.metrics.active_users)),
        (
            keys::ACTIVE_CONNECTIONS,
            Value::from(snapshot.metrics.active_connections),
        ),
    ];
    match serde_json::to_value(&snapshot.metrics) {
        Ok(metrics) => writes.push((keys::LATEST_USER_ACTIVITY, metrics)),
        Err(e) => log::error!("Failed to encode activity metrics: {}", e),
    }
    match serde_json::to_value(&snapshot) {
        Ok(full) => writes.push((keys::LATEST_USER_ACTIVITY_FULL, full)),
        Err(e) => log::error!("Failed to encode activity snapshot: {}", e),
    }
    for (key, value) in &writes {
        if let Err(e) = store.set_state(key, value, None).await {
            log::error!("Failed to store {}: {}", key, e);
        }
    }

    log::info!(
        "Updated user stats: {} users, {} connections",
        snapshot.metrics.active_users,
        snapshot.metrics.active_connections
    );
    true
}

/// One connection's worth of consumption: declare the queue, stream
/// deliveries until the stream ends or errors.
async fn consume_once<S: StateStore>(store: &S, config: &Config) -> Result<(), lapin::Error> {
    let connection =
        Connection::connect(&config.amqp_url(), ConnectionProperties::default()).await?;
    let channel = connection.create_channel().await?;

    channel
        .queue_declare(
            &config.activity_queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    let auto_ack = config.ack_mode == AckMode::Before;
    let mut consumer = channel
        .basic_consume(
            &config.activity_queue,
            &format!("backend_consumer_{}", config.region),
            BasicConsumeOptions {
                no_ack: auto_ack,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    log::info!(
        "Started consuming from {} queue (ack {})",
        config.activity_queue,
        if auto_ack { "before" } else { "after" }
    );

    while let Some(delivery) = consumer.next().await {
        let delivery = delivery?;
        handle_payload(store, &delivery.data).await;
        if !auto_ack {
            // Decode failures are acknowledged too: at-most-once either way.
            delivery.ack(BasicAckOptions::default()).await?;
        }
    }

    Ok(())
}

/// The consumer loop: bounded connect retries with fixed backoff around
/// [`consume_once`].
pub async fn run<S: StateStore>(store: S, config: &Config) -> Result<(), ConsumerError> {
    let mut attempts: u32 = 0;

    loop {
        log::info!(
            "Connecting to RabbitMQ at {}:{}",
            config.rabbitmq_host,
            config.rabbitmq_port
        );
        match consume_once(&store, config).await {
            Ok(()) => {
                attempts = 0;
                log::warn!(
                    "Activity delivery stream ended, reconnecting in {}s",
                    config.broker_retry_delay_secs
                );
            }
            Err(e) => {
                log::error!("AMQP connection error: {}", e);
                attempts += 1;
                if attempts >= config.broker_retry_limit {
                    return Err(ConsumerError::RetriesExhausted { attempts });
                }
                log::info!(
                    "Retrying RabbitMQ connection in {}s ({}/{})",
                    config.broker_retry_delay_secs,
                    attempts,
                    config.broker_retry_limit
                );
            }
        }
        tokio::time::sleep(Duration::from_secs(config.broker_retry_delay_secs)).await;
    }
}
