//! Storage abstraction layer
//!
//! This module provides a trait-based abstraction over the durable store,
//! allowing the registry to work against PostgreSQL or an in-memory backend.

pub mod factory;
pub mod traits;

pub use factory::create_history_storage;
pub use traits::{HistoryStorage, StoredChain};
