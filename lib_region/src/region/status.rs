//! # Region Status Service
//!
//! Read/write API over the state store for a single region's operational
//! status and startup metadata. Absent status reads as `active`: a region
//! that has never written anything is assumed to be serving.

use serde_json::Value;

use crate::keys;
use crate::models::{FailoverState, RegionStatus};
use crate::store::{StateStore, StoreError};
use crate::utils::utc_timestamp;

pub struct RegionStatusService<S> {
    store: S,
}

impl<S: StateStore> RegionStatusService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn set_status(&self, region: &str, status: RegionStatus) -> Result<(), StoreError> {
        self.store
            .set_state(&keys::status(region), &Value::String(status.as_str().into()), None)
            .await
    }

    /// Absent or unparsable status defaults to `active`.
    pub async fn get_status(&self, region: &str) -> Result<RegionStatus, StoreError> {
        let raw = self.store.get_string(&keys::status(region)).await?;
        Ok(raw
            .and_then(|s| s.parse().ok())
            .unwrap_or(RegionStatus::Active))
    }

    pub async fn set_version(&self, region: &str, version: &str) -> Result<(), StoreError> {
        self.store
            .set_state(&keys::version(region), &Value::String(version.into()), None)
            .await
    }

    pub async fn get_version(&self, region: &str) -> Result<Option<String>, StoreError> {
        self.store.get_string(&keys::version(region)).await
    }

    pub async fn set_startup_time(&self, region: &str, startup_time: &str) -> Result<(), StoreError> {
        self.store
            .set_state(
                &keys::startup_time(region),
                &Value::String(startup_time.into()),
                None,
            )
            .await
    }

    pub async fn get_startup_time(&self, region: &str) -> Result<Option<String>, StoreError> {
        self.store.get_string(&keys::startup_time(region)).await
    }

    pub async fn get_failover_state(&self, region: &str) -> Result<Option<FailoverState>, StoreError> {
        Ok(self
            .store
            .get_state(&keys::failover_state(region))
            .await?
            .and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Startup lifecycle write: status `active`, version, UTC startup time.
    pub async fn mark_started(&self, region: &str, version: &str) -> Result<(), StoreError> {
        self.set_status(region, RegionStatus::Active).await?;
        self.set_version(region, version).await?;
        self.set_startup_time(region, &utc_timestamp()).await
    }

    /// Shutdown lifecycle write: status `inactive`.
    pub async fn mark_stopped(&self, region: &str) -> Result<(), StoreError> {
        self.set_status(region, RegionStatus::Inactive).await
    }
}
