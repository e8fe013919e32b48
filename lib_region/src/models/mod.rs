//! # Wire & State Models
//!
//! The payloads carried by the two inbound buses and the structured records
//! persisted in the state store. Everything here is plain serde data; the
//! consumers decode these once per message and only their effect on the
//! store survives.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health classification carried by every telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    Ok,
    Warn,
    Alert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub state: DeviceState,
    pub code: String,
    pub message: String,
}

/// One telemetry sample from a field device. Ephemeral: consumed once,
/// never persisted in full (the latest event per device is kept under
/// `device:{device_id}` as a best-effort convenience).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub device_id: String,
    pub device_type: String,
    pub site_id: String,
    #[serde(default)]
    pub firmware: Option<String>,
    pub timestamp_utc: DateTime<Utc>,
    pub metrics: BTreeMap<String, f64>,
    pub status: DeviceStatus,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Aggregate metrics inside an activity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    pub active_users: u64,
    pub active_connections: u64,
    pub server_cpu_pct: f64,
    pub server_memory_gb: f64,
    pub average_latency_ms: f64,
}

impl Default for ActivityMetrics {
    fn default() -> Self {
        Self {
            active_users: 0,
            active_connections: 0,
            server_cpu_pct: 0.0,
            server_memory_gb: 0.0,
            average_latency_ms: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub username: String,
    pub session_id: String,
    pub login_time: DateTime<Utc>,
    pub ip_address: String,
    pub region: String,
    pub connection_status: String,
}

/// One periodic user-activity sample from the work queue. Latest wins: the
/// store retains at most one current snapshot and one current full-detail
/// snapshot, older ones are overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub message_id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub site_id: String,
    pub metrics: ActivityMetrics,
    #[serde(default)]
    pub active_users_list: Vec<UserSession>,
    #[serde(default)]
    pub queue_metadata: Option<Value>,
}

/// Operational status of a region.
///
/// `active` and `failed_over` are both serving states; `failed_over`
/// additionally means the region's traffic has moved elsewhere. There is no
/// automatic transition out of `failover_in_progress`: a crash mid-sequence
/// leaves the region stuck there until an operator restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionStatus {
    Active,
    FailoverInProgress,
    FailedOver,
    Inactive,
}

impl RegionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionStatus::Active => "active",
            RegionStatus::FailoverInProgress => "failover_in_progress",
            RegionStatus::FailedOver => "failed_over",
            RegionStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RegionStatus::Active),
            "failover_in_progress" => Ok(RegionStatus::FailoverInProgress),
            "failed_over" => Ok(RegionStatus::FailedOver),
            "inactive" => Ok(RegionStatus::Inactive),
            other => Err(format!("unknown region status: {other}")),
        }
    }
}

/// Best-effort state snapshot replicated to the target region during a
/// failover. Counters reflect independent reads and are not guaranteed to
/// be from a single point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverState {
    pub active_users: i64,
    pub active_devices: i64,
    pub source_region: String,
    pub failover_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simulator_shaped_device_event() {
        let raw = serde_json::json!({
            "device_id": "TURB-00042",
            "device_type": "turbine",
            "site_id": "WY-ALPHA",
            "firmware": "3.2.1",
            "timestamp_utc": "2025-06-01T12:00:00+00:00",
            "metrics": {
                "rpm": 3400,
                "inlet_temp_c": 412.5,
                "vibration_mm_s": 1.2
            },
            "status": { "state": "WARN", "code": "TURB-WARN", "message": "High vibration" },
            "tags": { "vendor": "HanTech", "loop": "A1" },
            "location": { "lat": 43.4, "lon": -106.3 }
        })
        .to_string();

        let event: DeviceEvent = serde_json::from_str(&raw).unwrap();
        assert_eq!(event.device_id, "TURB-00042");
        assert_eq!(event.status.state, DeviceState::Warn);
        assert_eq!(event.metrics["rpm"], 3400.0);
    }

    #[test]
    fn device_event_tolerates_missing_optionals() {
        let raw = serde_json::json!({
            "device_id": "OGD-00001",
            "device_type": "connected_device",
            "site_id": "TX-EAGLE",
            "timestamp_utc": "2025-06-01T12:00:00Z",
            "metrics": {},
            "status": { "state": "OK", "code": "OGD-OK", "message": "Nominal" }
        })
        .to_string();

        let event: DeviceEvent = serde_json::from_str(&raw).unwrap();
        assert!(event.firmware.is_none());
        assert!(event.tags.is_empty());
    }

    #[test]
    fn decodes_simulator_shaped_activity_snapshot() {
        let raw = serde_json::json!({
            "message_id": "MSG-20250601-00007",
            "timestamp_utc": "2025-06-01T12:00:00+00:00",
            "site_id": "SFO-WEB-01",
            "metrics": {
                "active_users": 342,
                "active_connections": 210,
                "server_cpu_pct": 55.1,
                "server_memory_gb": 18.2,
                "average_latency_ms": 42.0
            },
            "active_users_list": [{
                "user_id": "USR-10001",
                "username": "maria_g",
                "session_id": "SESS-0A12F3",
                "login_time": "2025-06-01T11:30:00+00:00",
                "ip_address": "10.1.2.3",
                "region": "US-WEST",
                "connection_status": "active"
            }],
            "queue_metadata": { "topic": "webapp/active_users", "producer": "UserSimEngine" }
        })
        .to_string();

        let snapshot: ActivitySnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot.metrics.active_users, 342);
        assert_eq!(snapshot.active_users_list.len(), 1);
    }

    #[test]
    fn region_status_round_trips_as_snake_case() {
        for status in [
            RegionStatus::Active,
            RegionStatus::FailoverInProgress,
            RegionStatus::FailedOver,
            RegionStatus::Inactive,
        ] {
            let parsed: RegionStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("promoted".parse::<RegionStatus>().is_err());
    }
}
