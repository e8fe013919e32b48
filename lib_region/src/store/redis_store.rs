//! Redis-backed [`StateStore`] over a shared connection manager.
//!
//! One `RedisStore` is constructed at process start and cloned into every
//! component that needs it; the underlying `ConnectionManager` multiplexes
//! and reconnects on its own.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

use super::{decode_value, encode_value, StateStore, StoreError};

#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Opens the client and verifies the connection with a ping.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        log::info!("Connected to Redis at {}", url);

        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn set_state(&self, key: &str, value: &Value, ttl: Option<u64>) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let encoded = encode_value(value);
        match ttl {
            Some(seconds) => {
                let _: () = conn.set_ex(key, encoded, seconds).await?;
            }
            None => {
                let _: () = conn.set(key, encoded).await?;
            }
        }
        Ok(())
    }

    async fn get_state(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.conn();
        let raw: Option<String> = conn.get(key).await?;
        Ok(raw.map(decode_value))
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64, StoreError> {
        let mut conn = self.conn();
        let value: i64 = conn.incr(key, amount).await?;
        Ok(value)
    }

    async fn set_hash(&self, name: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let _: () = conn.hset_multiple(name, fields).await?;
        Ok(())
    }

    async fn get_hash(&self, name: &str) -> Result<Option<HashMap<String, String>>, StoreError> {
        let mut conn = self.conn();
        let map: HashMap<String, String> = conn.hgetall(name).await?;
        Ok(if map.is_empty() { None } else { Some(map) })
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        // Cursor-based SCAN: a finite single pass, never the blocking KEYS.
        let mut conn = self.conn();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn();
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}
