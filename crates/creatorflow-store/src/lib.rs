//! Domain model and key-value persistence for CreatorFlow.

pub mod collections;
pub mod config;
pub mod models;
pub mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
