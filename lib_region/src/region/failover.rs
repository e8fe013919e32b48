//! # Failover Coordinator
//!
//! Orchestrates moving "active" status from a source region to a target
//! region with a best-effort snapshot copy of the aggregate counters.
//!
//! The sequence is strictly sequential and runs no compensating action: any
//! store error aborts mid-sequence and the source region may be left in
//! `failover_in_progress` until an operator calls [`FailoverCoordinator::restore`].
//! The counter snapshot is read with independent gets and is not
//! linearizable with respect to the live ingestion consumers.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::keys;
use crate::models::{FailoverState, RegionStatus};
use crate::store::{StateStore, StoreError};
use crate::utils::utc_timestamp;

use super::status::RegionStatusService;

#[derive(Debug, Error)]
pub enum FailoverError {
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("failed to encode failover state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configured source-to-target mapping. Target selection is a table lookup,
/// never health- or load-based.
#[derive(Debug, Clone)]
pub struct RegionTopology {
    targets: HashMap<String, String>,
}

impl RegionTopology {
    pub fn new(targets: HashMap<String, String>) -> Self {
        Self { targets }
    }

    /// The fixed two-region toggle: each region fails over to the other.
    pub fn two_region(a: &str, b: &str) -> Self {
        let mut targets = HashMap::new();
        targets.insert(a.to_string(), b.to_string());
        targets.insert(b.to_string(), a.to_string());
        Self { targets }
    }

    pub fn target_for(&self, source: &str) -> Option<&str> {
        self.targets.get(source).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailoverReport {
    pub source_region: String,
    pub target_region: String,
    pub failover_latency_seconds: f64,
    pub message: String,
}

pub struct FailoverCoordinator<S> {
    store: S,
    topology: RegionTopology,
}

impl<S: StateStore + Clone> FailoverCoordinator<S> {
    pub fn new(store: S, topology: RegionTopology) -> Self {
        Self { store, topology }
    }

    /// Runs the failover sequence from `source`:
    ///
    /// 1. source status -> `failover_in_progress`
    /// 2. resolve target from the topology
    /// 3. snapshot-read the aggregate counters
    /// 4. write the failover state under the target's namespace
    /// 5. source -> `failed_over`, target -> `active`
    ///
    /// Returns the elapsed wall-clock time as the reported latency. Errors
    /// abort without rollback.
    pub async fn simulate(&self, source: &str) -> Result<FailoverReport, FailoverError> {
        let started = Instant::now();
        let status = RegionStatusService::new(self.store.clone());

        status
            .set_status(source, RegionStatus::FailoverInProgress)
            .await?;

        let target = self
            .topology
            .target_for(source)
            .ok_or_else(|| FailoverError::UnknownRegion(source.to_string()))?
            .to_string();

        // Independent reads; the values may reflect any point between the
        // start of the sequence and here.
        let active_users = self.store.get_counter(keys::ACTIVE_USERS).await?;
        let active_devices = self.store.get_counter(keys::ACTIVE_DEVICES).await?;

        let state = FailoverState {
            active_users,
            active_devices,
            source_region: source.to_string(),
            failover_time: utc_timestamp(),
        };
        let payload = serde_json::to_value(&state)?;
        self.store
            .set_state(&keys::failover_state(&target), &payload, None)
            .await?;

        status.set_status(source, RegionStatus::FailedOver).await?;
        status.set_status(&target, RegionStatus::Active).await?;

        let latency = started.elapsed().as_secs_f64();
        log::info!(
            "Failover completed from {} to {} in {:.6}s",
            source,
            target,
            latency
        );

        Ok(FailoverReport {
            source_region: source.to_string(),
            target_region: target.clone(),
            failover_latency_seconds: latency,
            message: format!("Failover completed from {source} to {target}"),
        })
    }

    /// Unconditionally sets the region back to `active`. Not guarded
    /// against restoring a region that never failed over.
    pub async fn restore(&self, region: &str) -> Result<(), FailoverError> {
        RegionStatusService::new(self.store.clone())
            .set_status(region, RegionStatus::Active)
            .await?;
        log::info!("{} restored to active status", region);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::Value;

    fn coordinator(store: MemoryStore) -> FailoverCoordinator<MemoryStore> {
        FailoverCoordinator::new(store, RegionTopology::two_region("region1", "region2"))
    }

    #[tokio::test]
    async fn failover_moves_active_status_and_snapshots_counters() {
        let store = MemoryStore::new();
        store
            .set_state(keys::ACTIVE_USERS, &Value::from(342), None)
            .await
            .unwrap();
        store
            .set_state(keys::ACTIVE_DEVICES, &Value::from(57), None)
            .await
            .unwrap();

        let report = coordinator(store.clone()).simulate("region1").await.unwrap();
        assert_eq!(report.source_region, "region1");
        assert_eq!(report.target_region, "region2");
        assert!(report.failover_latency_seconds >= 0.0);

        let status = RegionStatusService::new(store.clone());
        assert_eq!(
            status.get_status("region1").await.unwrap(),
            RegionStatus::FailedOver
        );
        assert_eq!(
            status.get_status("region2").await.unwrap(),
            RegionStatus::Active
        );

        let state = status.get_failover_state("region2").await.unwrap().unwrap();
        assert_eq!(state.source_region, "region1");
        assert_eq!(state.active_users, 342);
        assert_eq!(state.active_devices, 57);
    }

    #[tokio::test]
    async fn round_trip_returns_to_the_original_region() {
        let store = MemoryStore::new();
        let coordinator = coordinator(store.clone());

        let first = coordinator.simulate("region1").await.unwrap();
        assert_eq!(first.target_region, "region2");

        // Fail over from the newly active region: the first region is the
        // target again, and both statuses return to their pre-failover
        // values.
        let second = coordinator.simulate("region2").await.unwrap();
        assert_eq!(second.target_region, "region1");

        let status = RegionStatusService::new(store);
        assert_eq!(
            status.get_status("region1").await.unwrap(),
            RegionStatus::Active
        );
        // region2 ends the cycle failed over; restoring completes the
        // active/active round trip.
        coordinator.restore("region2").await.unwrap();
        assert_eq!(
            status.get_status("region2").await.unwrap(),
            RegionStatus::Active
        );
    }

    #[tokio::test]
    async fn absent_counters_snapshot_as_zero() {
        let store = MemoryStore::new();
        coordinator(store.clone()).simulate("region1").await.unwrap();

        let state = RegionStatusService::new(store)
            .get_failover_state("region2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.active_users, 0);
        assert_eq!(state.active_devices, 0);
    }

    #[tokio::test]
    async fn restore_is_idempotent_on_an_active_region() {
        let store = MemoryStore::new();
        let coordinator = coordinator(store.clone());
        let status = RegionStatusService::new(store);

        coordinator.restore("region1").await.unwrap();
        coordinator.restore("region1").await.unwrap();
        assert_eq!(
            status.get_status("region1").await.unwrap(),
            RegionStatus::Active
        );
    }

    #[tokio::test]
    async fn unknown_source_region_aborts_after_marking() {
        let store = MemoryStore::new();
        let err = coordinator(store.clone()).simulate("region9").await.unwrap_err();
        assert!(matches!(err, FailoverError::UnknownRegion(_)));

        // Mid-sequence abort: the source stays in failover_in_progress
        // until an operator restore.
        let status = RegionStatusService::new(store);
        assert_eq!(
            status.get_status("region9").await.unwrap(),
            RegionStatus::FailoverInProgress
        );
    }
}
