//! # Region HTTP Surface
//!
//! Read-only projections of the state store plus the failover operator
//! endpoints. Every handler re-reads the store directly (no caching layer)
//! and every response carries a UTC ISO-8601 `timestamp`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use lib_region::region::{FailoverError, RegionTopology};
use lib_region::store::StoreError;
use lib_region::utils::utc_timestamp;
use lib_region::StateStore;

mod devices;
mod failover;
mod system;
mod users;

/// Shared handler state: the store handle plus this region's identity.
#[derive(Clone)]
pub struct ApiContext<S> {
    pub store: S,
    pub region: String,
    pub version: String,
    pub topology: RegionTopology,
}

/// Error responder: 404 for unknown regions/devices, 500 for store
/// failures, always with a `detail` body.
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };
        (
            status,
            Json(json!({ "detail": detail, "timestamp": utc_timestamp() })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<FailoverError> for ApiError {
    fn from(e: FailoverError) -> Self {
        match e {
            FailoverError::UnknownRegion(region) => {
                ApiError::NotFound(format!("Region {region} not found"))
            }
            FailoverError::Encode(e) => ApiError::Internal(e.to_string()),
            FailoverError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

pub fn router<S: StateStore + Clone + 'static>(ctx: ApiContext<S>) -> Router {
    Router::new()
        .route("/", get(system::root::<S>))
        .route("/health", get(system::health::<S>))
        .route("/api/status", get(system::status::<S>))
        .route("/api/metrics", get(system::metrics::<S>))
        .route("/api/version/{region}", get(system::version::<S>))
        .route(
            "/api/simulate/high-traffic",
            post(system::simulate_high_traffic::<S>),
        )
        .route("/api/failover/simulate", post(failover::simulate::<S>))
        .route("/api/failover/status", get(failover::status::<S>))
        .route("/api/failover/restore", post(failover::restore::<S>))
        .route("/api/devices/active", get(devices::active::<S>))
        .route(
            "/api/devices/status/{device_id}",
            get(devices::device_status::<S>),
        )
        .route("/api/devices/alerts", get(devices::alerts::<S>))
        .route(
            "/api/devices/metrics/site/{site_id}",
            get(devices::site_metrics::<S>),
        )
        .route("/api/users/active", get(users::active::<S>))
        .route("/api/users/activity", get(users::activity::<S>))
        .route("/api/users/connections", get(users::connections::<S>))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use lib_region::models::RegionStatus;
    use lib_region::region::RegionStatusService;
    use lib_region::{keys, MemoryStore};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_router(store: MemoryStore) -> Router {
        router(ApiContext {
            store,
            region: "region1".to_string(),
            version: "v0.1.0_region1".to_string(),
            topology: RegionTopology::two_region("region1", "region2"),
        })
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn status_defaults_on_an_empty_store() {
        let (status, body) = get_json(test_router(MemoryStore::new()), "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["active_devices"], 0);
        assert_eq!(body["active_users"], 0);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn health_reports_connected_store() {
        let (status, body) = get_json(test_router(MemoryStore::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["redis"], "connected");
    }

    #[tokio::test]
    async fn metrics_default_to_zero() {
        let (status, body) = get_json(test_router(MemoryStore::new()), "/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_requests"], 0);
        assert_eq!(body["error_count"], 0);
    }

    #[tokio::test]
    async fn failover_simulate_and_status() {
        let store = MemoryStore::new();
        store
            .set_state(keys::ACTIVE_USERS, &Value::from(12), None)
            .await
            .unwrap();

        let (status, body) = post_json(test_router(store.clone()), "/api/failover/simulate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["source_region"], "region1");
        assert_eq!(body["target_region"], "region2");

        let service = RegionStatusService::new(store.clone());
        assert_eq!(
            service.get_status("region1").await.unwrap(),
            RegionStatus::FailedOver
        );
        assert_eq!(
            service.get_status("region2").await.unwrap(),
            RegionStatus::Active
        );

        let (status, body) = get_json(test_router(store), "/api/failover/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["region"], "region1");
        assert_eq!(body["status"], "failed_over");
    }

    #[tokio::test]
    async fn restore_returns_region_to_active() {
        let store = MemoryStore::new();
        let (status, body) = post_json(test_router(store.clone()), "/api/failover/restore").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(
            RegionStatusService::new(store)
                .get_status("region1")
                .await
                .unwrap(),
            RegionStatus::Active
        );
    }

    #[tokio::test]
    async fn unknown_device_is_a_404() {
        let (status, body) =
            get_json(test_router(MemoryStore::new()), "/api/devices/status/NOPE-1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn unknown_region_version_is_a_404() {
        let (status, _) = get_json(test_router(MemoryStore::new()), "/api/version/region9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn own_region_version_is_served_directly() {
        let (status, body) = get_json(test_router(MemoryStore::new()), "/api/version/region1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "v0.1.0_region1");
    }

    #[tokio::test]
    async fn active_devices_includes_per_site_breakdown() {
        let store = MemoryStore::new();
        store
            .set_state(keys::ACTIVE_DEVICES, &Value::from(57), None)
            .await
            .unwrap();
        store
            .set_state(&keys::site_devices(3), &Value::from(12), None)
            .await
            .unwrap();

        let (status, body) = get_json(test_router(store), "/api/devices/active").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_active_devices"], 57);
        assert_eq!(body["devices_by_site"]["site_3"], 12);
        assert_eq!(body["devices_by_site"]["site_1"], 0);
        assert_eq!(body["devices_by_site"].as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn device_alerts_report_count_and_records() {
        let store = MemoryStore::new();
        let (status, body) = get_json(test_router(store.clone()), "/api/devices/alerts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alert_count"], 0);
        assert_eq!(body["alerts"], serde_json::json!([]));

        for device_id in ["TURB-00007", "TURB-00009"] {
            store
                .set_state(
                    &format!("device:{device_id}:alert"),
                    &serde_json::json!({ "device_id": device_id, "state": "ALERT" }),
                    None,
                )
                .await
                .unwrap();
        }

        let (status, body) = get_json(test_router(store), "/api/devices/alerts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alert_count"], 2);
        assert_eq!(body["alerts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn site_metrics_default_for_an_unreported_site() {
        let (status, body) = get_json(
            test_router(MemoryStore::new()),
            "/api/devices/metrics/site/WY-ALPHA",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["site_id"], "WY-ALPHA");
        assert_eq!(body["device_count"], 0);
        assert_eq!(body["alert_count"], 0);
    }

    #[tokio::test]
    async fn site_metrics_serve_the_stored_hash() {
        let store = MemoryStore::new();
        store
            .set_hash(
                &keys::site_metrics("WY-ALPHA"),
                &[
                    ("device_count".to_string(), "14".to_string()),
                    ("average_health".to_string(), "0.97".to_string()),
                ],
            )
            .await
            .unwrap();

        let (status, body) = get_json(test_router(store), "/api/devices/metrics/site/WY-ALPHA").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["device_count"], "14");
        assert_eq!(body["average_health"], "0.97");
    }

    #[tokio::test]
    async fn users_active_reflects_latest_snapshot() {
        let store = MemoryStore::new();
        store
            .set_state(keys::ACTIVE_USERS, &Value::from(342), None)
            .await
            .unwrap();
        store
            .set_state(keys::ACTIVE_CONNECTIONS, &Value::from(210), None)
            .await
            .unwrap();
        store
            .set_state(
                keys::LATEST_USER_ACTIVITY,
                &serde_json::json!({
                    "active_users": 342,
                    "active_connections": 210,
                    "server_cpu_pct": 50.0,
                    "server_memory_gb": 12.0,
                    "average_latency_ms": 30.0
                }),
                None,
            )
            .await
            .unwrap();

        let (status, body) = get_json(test_router(store), "/api/users/active").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metrics"]["active_users"], 342);
    }

    #[tokio::test]
    async fn high_traffic_simulation_increments_counter() {
        let store = MemoryStore::new();
        let (_, first) = post_json(test_router(store.clone()), "/api/simulate/high-traffic").await;
        let (_, second) = post_json(test_router(store), "/api/simulate/high-traffic").await;
        assert_eq!(first["simulation_count"], 1);
        assert_eq!(second["simulation_count"], 2);
    }
}
