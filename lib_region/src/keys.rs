//! # Persisted Key Layout
//!
//! The stable Redis key names shared by the consumers, the failover
//! coordinator and the HTTP surface. External tooling depends on these
//! names; change them only together with that tooling.

/// Process-lifetime device counter written by the telemetry consumer.
pub const ACTIVE_DEVICES: &str = "stats:active_devices";
/// Latest active-user count written by the activity consumer.
pub const ACTIVE_USERS: &str = "stats:active_users";
/// Latest active-connection count written by the activity consumer.
pub const ACTIVE_CONNECTIONS: &str = "stats:active_connections";
/// Latest aggregate activity metrics record (JSON object).
pub const LATEST_USER_ACTIVITY: &str = "latest:user_activity";
/// Latest full activity snapshot, session list included (JSON object).
pub const LATEST_USER_ACTIVITY_FULL: &str = "latest:user_activity_full";
/// Pattern matching per-device alert records.
pub const DEVICE_ALERT_PATTERN: &str = "device:*:alert";

pub fn status(region: &str) -> String {
    format!("{region}:status")
}

pub fn version(region: &str) -> String {
    format!("{region}:version")
}

pub fn startup_time(region: &str) -> String {
    format!("{region}:startup_time")
}

pub fn failover_state(region: &str) -> String {
    format!("{region}:failover_state")
}

pub fn traffic_simulation_count(region: &str) -> String {
    format!("{region}:traffic_simulation_count")
}

pub fn total_requests(region: &str) -> String {
    format!("{region}:total_requests")
}

pub fn error_count(region: &str) -> String {
    format!("{region}:error_count")
}

/// Latest full telemetry event per device, written best-effort.
pub fn device(device_id: &str) -> String {
    format!("device:{device_id}")
}

/// Per-site device counter; sites are numbered 1 through 10.
pub fn site_devices(site: u32) -> String {
    format!("stats:site_{site}_devices")
}

/// Aggregated per-site metrics hash.
pub fn site_metrics(site_id: &str) -> String {
    format!("site:{site_id}:metrics")
}
