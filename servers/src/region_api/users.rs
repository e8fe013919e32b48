//! User activity read endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use lib_region::keys;
use lib_region::utils::utc_timestamp;
use lib_region::StateStore;

use super::{ApiContext, ApiError};

pub async fn active<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let count = ctx.store.get_counter(keys::ACTIVE_USERS).await?;
    let connections = ctx.store.get_counter(keys::ACTIVE_CONNECTIONS).await?;

    let metrics = match ctx.store.get_state(keys::LATEST_USER_ACTIVITY).await? {
        Some(metrics) => metrics,
        None => json!({
            "active_users": count,
            "active_connections": connections,
            "server_cpu_pct": 0,
            "server_memory_gb": 0,
            "average_latency_ms": 0,
        }),
    };

    Ok(Json(json!({
        "metrics": metrics,
        "timestamp": utc_timestamp(),
    })))
}

pub async fn activity<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    match ctx.store.get_state(keys::LATEST_USER_ACTIVITY_FULL).await? {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Ok(Json(json!({
            "message": "No user activity data available",
            "timestamp": utc_timestamp(),
        }))),
    }
}

pub async fn connections<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let connections = ctx.store.get_counter(keys::ACTIVE_CONNECTIONS).await?;

    Ok(Json(json!({
        "active_connections": connections,
        "region": ctx.region,
        "timestamp": utc_timestamp(),
    })))
}
