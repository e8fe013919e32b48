//! Failover operator endpoints: simulate, status, restore.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use lib_region::region::{FailoverCoordinator, RegionStatusService};
use lib_region::utils::utc_timestamp;
use lib_region::StateStore;

use super::{ApiContext, ApiError};

pub async fn simulate<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let coordinator = FailoverCoordinator::new(ctx.store.clone(), ctx.topology.clone());
    let report = coordinator.simulate(&ctx.region).await?;

    Ok(Json(json!({
        "status": "success",
        "source_region": report.source_region,
        "target_region": report.target_region,
        "failover_latency_seconds": report.failover_latency_seconds,
        "message": report.message,
        "timestamp": utc_timestamp(),
    })))
}

pub async fn status<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    let service = RegionStatusService::new(ctx.store.clone());
    let status = service.get_status(&ctx.region).await?;
    let failover_state = service.get_failover_state(&ctx.region).await?;

    Ok(Json(json!({
        "region": ctx.region,
        "status": status.as_str(),
        "failover_state": failover_state,
        "timestamp": utc_timestamp(),
    })))
}

pub async fn restore<S: StateStore + Clone + 'static>(
    State(ctx): State<ApiContext<S>>,
) -> Result<Json<Value>, ApiError> {
    FailoverCoordinator::new(ctx.store.clone(), ctx.topology.clone())
        .restore(&ctx.region)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "region": ctx.region,
        "message": format!("{} restored to active status", ctx.region),
        "timestamp": utc_timestamp(),
    })))
}
