//! In-memory [`StateStore`] with the same per-key atomicity guarantees as
//! the Redis implementation. Used by unit tests and for running the stack
//! without a broker-and-store deployment. TTLs are accepted but not
//! expired.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{decode_value, encode_value, StateStore, StoreError};

#[derive(Default)]
struct Inner {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn set_state(&self, key: &str, value: &Value, _ttl: Option<u64>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner.strings.insert(key.to_string(), encode_value(value));
        Ok(())
    }

    async fn get_state(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.strings.get(key).cloned().map(decode_value))
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let current: i64 = inner
            .strings
            .get(key)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        let next = current + amount;
        inner.strings.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn set_hash(&self, name: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let hash = inner.hashes.entry(name.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn get_hash(&self, name: &str) -> Result<Option<HashMap<String, String>>, StoreError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.hashes.get(name).filter(|h| !h.is_empty()).cloned())
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner
            .strings
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner.strings.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Minimal glob matcher covering the `*` and `?` forms Redis patterns use.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    fn matches(p: &[char], t: &[char]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                matches(&p[1..], t) || (!t.is_empty() && matches(p, &t[1..]))
            }
            (Some('?'), Some(_)) => matches(&p[1..], &t[1..]),
            (Some(pc), Some(tc)) if pc == tc => matches(&p[1..], &t[1..]),
            _ => false,
        }
    }

    matches(&p, &t)
}
