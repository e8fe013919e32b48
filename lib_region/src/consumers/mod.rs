//! # Inbound Consumers
//!
//! Two independent long-lived loops: device telemetry over MQTT and user
//! activity over an AMQP work queue. Both follow the same discipline: a
//! decode failure is logged and the message dropped; a store failure is
//! logged and swallowed (the message still counts as processed); broker
//! connection failures are retried a bounded number of times with a fixed
//! backoff before the loop gives up.

use thiserror::Error;

pub mod activity;
pub mod telemetry;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("broker unavailable after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}
