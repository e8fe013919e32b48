//! Device telemetry read endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use lib_region::keys;
use lib_region::utils::utc_timestamp;
use lib_region::StateStore;

use super::{ApiContext, ApiError};

pub async fn active<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let count = ctx.store.get_counter(keys::ACTIVE_DEVICES).await?;

    let mut devices_by_site = serde_json::Map::new();
    for site in 1..=10u32 {
        let site_count = ctx.store.get_counter(&keys::site_devices(site)).await?;
        devices_by_site.insert(format!("site_{site}"), Value::from(site_count));
    }

    Ok(Json(json!({
        "total_active_devices": count,
        "devices_by_site": devices_by_site,
        "timestamp": utc_timestamp(),
    })))
}

/// The latest stored event for a device, or 404 when it has never reported.
pub async fn device_status<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
    Path(device_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match ctx.store.get_state(&keys::device(&device_id)).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound("Device not found".to_string())),
    }
}

/// Devices currently in alert state. The response carries at most ten
/// records but `alert_count` reports the full number of alert keys.
pub async fn alerts<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let alert_keys = ctx.store.list_keys(keys::DEVICE_ALERT_PATTERN).await?;

    let mut alerts = Vec::new();
    for key in alert_keys.iter().take(10) {
        if let Some(alert) = ctx.store.get_state(key).await? {
            alerts.push(alert);
        }
    }

    Ok(Json(json!({
        "alert_count": alert_keys.len(),
        "alerts": alerts,
        "timestamp": utc_timestamp(),
    })))
}

/// Aggregated metrics hash for a site, or a zeroed default when the site
/// has never reported.
pub async fn site_metrics<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
    Path(site_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match ctx.store.get_hash(&keys::site_metrics(&site_id)).await? {
        Some(fields) => {
            let mut body = serde_json::Map::new();
            for (field, value) in fields {
                body.insert(field, Value::String(value));
            }
            Ok(Json(Value::Object(body)))
        }
        None => Ok(Json(json!({
            "site_id": site_id,
            "device_count": 0,
            "alert_count": 0,
            "average_health": 0,
            "timestamp": utc_timestamp(),
        }))),
    }
}
