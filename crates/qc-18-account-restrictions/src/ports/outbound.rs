//! # Outbound Ports (Driven Ports)
//!
//! The external document store that mirrors committed restriction state.
//!
//! Production: `RocksDbDocumentStore` (feature `rocksdb`)
//! Testing: `InMemoryDocumentStore`
//!
//! Every operation is idempotent: upserting the same document twice or
//! deleting an absent one is not an error. The mirror worker relies on this
//! to replay a batch after a partial failure.

use crate::mirror::document::RestrictionDocument;
use async_trait::async_trait;
use shared_types::Address;
use thiserror::Error;

/// Errors reported by a document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Document serialization error: {0}")]
    Serialization(String),
}

/// One write against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOperation {
    /// Replace the account's document.
    Upsert(RestrictionDocument),
    /// Remove the account's document, if any.
    Delete(Address),
}

impl DocumentOperation {
    pub fn address(&self) -> Result<Address, StoreError> {
        match self {
            DocumentOperation::Upsert(document) => document
                .address()
                .map_err(|err| StoreError::Serialization(err.to_string())),
            DocumentOperation::Delete(address) => Ok(*address),
        }
    }
}

/// Per-account document store.
#[async_trait]
pub trait RestrictionDocumentStore: Send + Sync {
    /// Inserts or replaces the document keyed by its account.
    async fn upsert(&self, document: RestrictionDocument) -> Result<(), StoreError>;

    /// Deletes the account's document. Returns whether one existed.
    async fn delete(&self, address: &Address) -> Result<bool, StoreError>;

    /// Reads every stored document.
    async fn load_all(&self) -> Result<Vec<RestrictionDocument>, StoreError>;

    /// Applies operations in order, stopping at the first failure.
    ///
    /// Stores with native batch writes should override this.
    async fn apply_batch(&self, operations: Vec<DocumentOperation>) -> Result<(), StoreError> {
        for operation in operations {
            match operation {
                DocumentOperation::Upsert(document) => self.upsert(document).await?,
                DocumentOperation::Delete(address) => {
                    self.delete(&address).await?;
                }
            }
        }
        Ok(())
    }
}
