//! # State Store
//!
//! The shared key/value, counter and hash store every component talks to.
//! The store owns no business logic, only atomic single-key primitives; no
//! multi-key transactions are provided, so callers must not assume
//! cross-key atomicity.
//!
//! Structured values (JSON objects and arrays) are written as canonical
//! JSON text and parsed back on read. A stored value that fails to parse as
//! JSON is returned as a raw string scalar, so callers must accept either
//! shape.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("value for key {key} is not valid JSON: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Atomic single-key operations over the shared store.
///
/// Every method is individually atomic against the store; `increment` in
/// particular is safe under concurrent writers. Nothing here provides
/// ordering across keys.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Writes a value, optionally with a TTL in seconds. Objects and arrays
    /// are serialized to JSON text; strings are written raw; numbers and
    /// booleans as their display form.
    async fn set_state(&self, key: &str, value: &Value, ttl: Option<u64>) -> Result<(), StoreError>;

    /// Reads a value back. `None` when the key is absent; otherwise the
    /// stored text parsed as JSON, or a raw string scalar when parsing
    /// fails.
    async fn get_state(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Atomically adds `amount` to the counter at `key` and returns the new
    /// value. An absent key counts as zero.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64, StoreError>;

    /// Sets the given fields on a hash.
    async fn set_hash(&self, name: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Reads all fields of a hash. `None` when the hash is absent or empty.
    async fn get_hash(&self, name: &str) -> Result<Option<HashMap<String, String>>, StoreError>;

    /// Lists keys matching a glob-style pattern. Cursor-based single pass,
    /// finite even while other writers are active.
    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Deletes a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// `true` when the store answers a ping.
    async fn health_check(&self) -> bool;

    /// Reads a counter, defaulting to zero when the key is absent or the
    /// stored value is not numeric.
    async fn get_counter(&self, key: &str) -> Result<i64, StoreError> {
        Ok(match self.get_state(key).await? {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        })
    }

    /// Reads a value as a plain string, whatever shape it was stored in.
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_state(key).await?.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }
}

/// Canonical text encoding used by every implementation.
pub(crate) fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a stored string back into a structured value, falling back to a
/// raw scalar when it is not JSON.
pub(crate) fn decode_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
