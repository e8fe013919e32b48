//! Banner, health, status, metrics, version and traffic-simulation
//! handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use lib_region::keys;
use lib_region::region::RegionStatusService;
use lib_region::utils::utc_timestamp;
use lib_region::StateStore;

use super::{ApiContext, ApiError};

pub async fn root<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Json<Value> {
    Json(json!({
        "service": "Regional State & Failover Coordination",
        "region": ctx.region,
        "version": ctx.version,
        "status": "operational",
        "timestamp": utc_timestamp(),
    }))
}

pub async fn health<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Json<Value> {
    let store_healthy = ctx.store.health_check().await;
    Json(json!({
        "status": if store_healthy { "healthy" } else { "degraded" },
        "region": ctx.region,
        "version": ctx.version,
        "redis": if store_healthy { "connected" } else { "disconnected" },
        "timestamp": utc_timestamp(),
    }))
}

pub async fn status<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let service = RegionStatusService::new(ctx.store.clone());
    let status = service.get_status(&ctx.region).await?;
    let startup_time = service.get_startup_time(&ctx.region).await?;

    let active_devices = ctx.store.get_counter(keys::ACTIVE_DEVICES).await?;
    let active_users = ctx.store.get_counter(keys::ACTIVE_USERS).await?;

    Ok(Json(json!({
        "region": ctx.region,
        "status": status.as_str(),
        "version": ctx.version,
        "startup_time": startup_time,
        "active_devices": active_devices,
        "active_users": active_users,
        "timestamp": utc_timestamp(),
    })))
}

pub async fn metrics<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({
        "region": ctx.region,
        "active_devices": ctx.store.get_counter(keys::ACTIVE_DEVICES).await?,
        "active_users": ctx.store.get_counter(keys::ACTIVE_USERS).await?,
        "total_requests": ctx.store.get_counter(&keys::total_requests(&ctx.region)).await?,
        "error_count": ctx.store.get_counter(&keys::error_count(&ctx.region)).await?,
        "timestamp": utc_timestamp(),
    })))
}

/// Own region answers directly; other regions are looked up in the store
/// (cross-region queries work because every region writes its version at
/// startup).
pub async fn version<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
    Path(region): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if region == ctx.region {
        return Ok(Json(json!({ "version": ctx.version, "region": region })));
    }

    match RegionStatusService::new(ctx.store.clone())
        .get_version(&region)
        .await?
    {
        Some(version) => Ok(Json(json!({ "version": version, "region": region }))),
        None => Err(ApiError::NotFound(format!("Region {region} not found"))),
    }
}

pub async fn simulate_high_traffic<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    log::info!("Simulating high traffic on {}", ctx.region);
    let count = ctx
        .store
        .increment(&keys::traffic_simulation_count(&ctx.region), 1)
        .await?;

    Ok(Json(json!({
        "status": "simulating",
        "region": ctx.region,
        "simulation_count": count,
        "message": "High traffic simulation initiated",
        "timestamp": utc_timestamp(),
    })))
}
