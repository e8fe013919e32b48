// Declare the modules to re-export
pub mod config;
pub mod consumers;
pub mod keys;
pub mod loggers;
pub mod models;
pub mod region;
pub mod store;
pub mod utils;

// Re-export the pieces every binary needs
pub use config::{AckMode, Config, DeviceCounting};
pub use store::{MemoryStore, RedisStore, StateStore, StoreError};
