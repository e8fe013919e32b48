//! # Telemetry Consumer
//!
//! Subscribes to the hierarchical device topic (`og/field/#` by default)
//! and folds every decoded event into the device counter. Delivery is
//! at-most-once: malformed messages are dropped without retry or
//! dead-lettering, and store failures do not stop the loop.

use std::collections::HashSet;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::Value;

use crate::config::{Config, DeviceCounting};
use crate::keys;
use crate::models::DeviceEvent;
use crate::store::StateStore;

use super::ConsumerError;

/// Process-lifetime device counter with the configured counting policy.
/// Never decremented: a device that stops publishing stays counted until
/// the process restarts.
pub struct DeviceCounter {
    mode: DeviceCounting,
    messages: u64,
    seen: HashSet<String>,
}

impl DeviceCounter {
    pub fn new(mode: DeviceCounting) -> Self {
        Self {
            mode,
            messages: 0,
            seen: HashSet::new(),
        }
    }

    /// Records one decoded event and returns the value to publish.
    pub fn observe(&mut self, device_id: &str) -> u64 {
        self.messages += 1;
        match self.mode {
            DeviceCounting::Messages => self.messages,
            DeviceCounting::Unique => {
                self.seen.insert(device_id.to_string());
                self.seen.len() as u64
            }
        }
    }

    pub fn messages_processed(&self) -> u64 {
        self.messages
    }
}

/// Handles one raw payload. Returns `true` when the message decoded and was
/// folded into the counter; `false` when it was dropped.
pub async fn handle_payload<S: StateStore>(
    store: &S,
    counter: &mut DeviceCounter,
    payload: &[u8],
) -> bool {
    let event: DeviceEvent = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Dropping undecodable telemetry message: {}", e);
            return false;
        }
    };

    let count = counter.observe(&event.device_id);

    // The event is considered processed even if the store is unavailable.
    if let Err(e) = store
        .set_state(keys::ACTIVE_DEVICES, &Value::from(count), None)
        .await
    {
        log::error!("Failed to store device count: {}", e);
    }

    // Best-effort latest-event record for the device status endpoint.
    match serde_json::to_value(&event) {
        Ok(record) => {
            if let Err(e) = store
                .set_state(&keys::device(&event.device_id), &record, None)
                .await
            {
                log::debug!("Failed to store device record {}: {}", event.device_id, e);
            }
        }
        Err(e) => log::debug!("Failed to serialize device record: {}", e),
    }

    if counter.messages_processed() % 10_000 == 0 {
        log::info!(
            "Processed {} device messages, stored count in state store",
            counter.messages_processed()
        );
    }

    true
}

/// The consumer loop: connect, subscribe, fold messages until the process
/// terminates. Connection failures retry with a fixed backoff up to the
/// configured limit.
pub async fn run<S: StateStore>(store: S, config: &Config) -> Result<(), ConsumerError> {
    let mut counter = DeviceCounter::new(config.device_counting);
    let mut attempts: u32 = 0;

    loop {
        let mut options = MqttOptions::new(
            format!("backend_consumer_{}", config.region),
            &config.mqtt_broker,
            config.mqtt_port,
        );
        options.set_keep_alive(Duration::from_secs(60));

        log::info!(
            "Connecting to MQTT broker at {}:{}",
            config.mqtt_broker,
            config.mqtt_port
        );
        let (client, mut eventloop) = AsyncClient::new(options, 64);
        client
            .subscribe(&config.mqtt_topic, QoS::AtMostOnce)
            .await?;

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    attempts = 0;
                    log::info!("Connected, subscribed to {}", config.mqtt_topic);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    handle_payload(&store, &mut counter, &publish.payload).await;
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("MQTT connection error: {}", e);
                    break;
                }
            }
        }

        attempts += 1;
        if attempts >= config.broker_retry_limit {
            return Err(ConsumerError::RetriesExhausted { attempts });
        }
        log::info!(
            "Retrying MQTT connection in {}s ({}/{})",
            config.broker_retry_delay_secs,
            attempts,
            config.broker_retry_limit
        );
        tokio::time::sleep(Duration::from_secs(config.broker_retry_delay_secs)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn event_json(device_id: &str) -> Vec<u8> {
        serde_json::json!({
            "device_id": device_id,
            "device_type": "turbine",
            "site_id": "WY-ALPHA",
            "timestamp_utc": "2025-06-01T12:00:00Z",
            "metrics": { "rpm": 3400 },
            "status": { "state": "OK", "code": "TURB-OK", "message": "Nominal" }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn malformed_then_wellformed_yields_one_update() {
        let store = MemoryStore::new();
        let mut counter = DeviceCounter::new(DeviceCounting::Messages);

        assert!(!handle_payload(&store, &mut counter, b"{not json").await);
        assert!(handle_payload(&store, &mut counter, &event_json("TURB-00001")).await);

        assert_eq!(store.get_counter(keys::ACTIVE_DEVICES).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn message_counting_counts_repeats() {
        let store = MemoryStore::new();
        let mut counter = DeviceCounter::new(DeviceCounting::Messages);

        for _ in 0..3 {
            handle_payload(&store, &mut counter, &event_json("TURB-00001")).await;
        }
        assert_eq!(store.get_counter(keys::ACTIVE_DEVICES).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unique_counting_deduplicates_by_device_id() {
        let store = MemoryStore::new();
        let mut counter = DeviceCounter::new(DeviceCounting::Unique);

        handle_payload(&store, &mut counter, &event_json("TURB-00001")).await;
        handle_payload(&store, &mut counter, &event_json("TURB-00001")).await;
        handle_payload(&store, &mut counter, &event_json("TURB-00002")).await;

        assert_eq!(store.get_counter(keys::ACTIVE_DEVICES).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stores_latest_event_per_device() {
        let store = MemoryStore::new();
        let mut counter = DeviceCounter::new(DeviceCounting::Messages);

        handle_payload(&store, &mut counter, &event_json("TURB-00042")).await;

        let record = store
            .get_state(&keys::device("TURB-00042"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["site_id"], "WY-ALPHA");
    }
}
