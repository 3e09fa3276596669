//! # RocksDB Document Store
//!
//! Durable mirror backend. One key per account (the 24 address bytes), one
//! JSON document per key, all in a dedicated column family.
//!
//! RocksDB calls block, so every operation runs on tokio's blocking pool.

use crate::mirror::document::RestrictionDocument;
use crate::ports::outbound::{DocumentOperation, RestrictionDocumentStore, StoreError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use shared_types::Address;
use std::sync::Arc;

/// Column family holding restriction documents.
pub const CF_RESTRICTIONS: &str = "account_restrictions";

/// RocksDB configuration for the document store.
#[derive(Debug, Clone)]
pub struct RocksDbDocumentConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbDocumentConfig {
    fn default() -> Self {
        Self {
            path: "./data/account-restrictions".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbDocumentConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 1024 * 1024,
            sync_writes: false,
        }
    }
}

pub struct RocksDbDocumentStore {
    db: Arc<DB>,
    sync_writes: bool,
}

fn backend(context: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("RocksDB {context} failed: {err}"))
}

impl RocksDbDocumentStore {
    pub fn open(config: RocksDbDocumentConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        let descriptors = vec![ColumnFamilyDescriptor::new(CF_RESTRICTIONS, cf_opts)];

        let db = DB::open_cf_descriptors(&opts, &config.path, descriptors)
            .map_err(|e| StoreError::Unavailable(format!("Failed to open RocksDB: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            sync_writes: config.sync_writes,
        })
    }

    async fn blocking<T, F>(&self, task: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&DB, bool) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let sync_writes = self.sync_writes;
        tokio::task::spawn_blocking(move || task(db.as_ref(), sync_writes))
            .await
            .map_err(|e| backend("task", e))?
    }
}

fn write_options(sync_writes: bool) -> WriteOptions {
    let mut opts = WriteOptions::default();
    opts.set_sync(sync_writes);
    opts
}

fn encode(document: &RestrictionDocument) -> Result<(Address, Vec<u8>), StoreError> {
    let address = document
        .address()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let bytes = document
        .to_json()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok((address, bytes))
}

#[async_trait]
impl RestrictionDocumentStore for RocksDbDocumentStore {
    async fn upsert(&self, document: RestrictionDocument) -> Result<(), StoreError> {
        let (address, bytes) = encode(&document)?;
        self.blocking(move |db, sync| {
            let cf = db
                .cf_handle(CF_RESTRICTIONS)
                .ok_or_else(|| backend("column family lookup", CF_RESTRICTIONS))?;
            db.put_cf_opt(&cf, address, bytes, &write_options(sync))
                .map_err(|e| backend("put", e))
        })
        .await
    }

    async fn delete(&self, address: &Address) -> Result<bool, StoreError> {
        let address = *address;
        self.blocking(move |db, sync| {
            let cf = db
                .cf_handle(CF_RESTRICTIONS)
                .ok_or_else(|| backend("column family lookup", CF_RESTRICTIONS))?;
            let existed = db
                .get_pinned_cf(&cf, address)
                .map_err(|e| backend("get", e))?
                .is_some();
            db.delete_cf_opt(&cf, address, &write_options(sync))
                .map_err(|e| backend("delete", e))?;
            Ok(existed)
        })
        .await
    }

    async fn load_all(&self) -> Result<Vec<RestrictionDocument>, StoreError> {
        self.blocking(|db, _| {
            let cf = db
                .cf_handle(CF_RESTRICTIONS)
                .ok_or_else(|| backend("column family lookup", CF_RESTRICTIONS))?;
            let mut documents = Vec::new();
            for item in db.iterator_cf(&cf, IteratorMode::Start) {
                let (_, value) = item.map_err(|e| backend("scan", e))?;
                let document = RestrictionDocument::from_json(&value)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                documents.push(document);
            }
            Ok(documents)
        })
        .await
    }

    /// Single atomic `WriteBatch`.
    async fn apply_batch(&self, operations: Vec<DocumentOperation>) -> Result<(), StoreError> {
        let mut encoded = Vec::with_capacity(operations.len());
        for operation in &operations {
            encoded.push(match operation {
                DocumentOperation::Upsert(document) => {
                    let (address, bytes) = encode(document)?;
                    (address, Some(bytes))
                }
                DocumentOperation::Delete(address) => (*address, None),
            });
        }

        self.blocking(move |db, sync| {
            let cf = db
                .cf_handle(CF_RESTRICTIONS)
                .ok_or_else(|| backend("column family lookup", CF_RESTRICTIONS))?;
            let mut batch = WriteBatch::default();
            for (address, bytes) in encoded {
                match bytes {
                    Some(bytes) => batch.put_cf(&cf, address, bytes),
                    None => batch.delete_cf(&cf, address),
                }
            }
            db.write_opt(batch, &write_options(sync))
                .map_err(|e| backend("batch write", e))
        })
        .await
    }
}
