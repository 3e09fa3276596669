//! # Adapters
//!
//! Document store implementations for the mirror.
//!
//! - `memory`: `InMemoryDocumentStore` (tests, development)
//! - `rocksdb`: `RocksDbDocumentStore` (feature `rocksdb`)

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;

pub use memory::InMemoryDocumentStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbDocumentConfig, RocksDbDocumentStore};
