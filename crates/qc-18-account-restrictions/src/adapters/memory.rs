//! In-memory document store.
//!
//! Keeps documents in a `BTreeMap` keyed by account. Supports injected
//! failures and write latency so mirror retry and ordering behavior can be
//! exercised without a real backend.

use crate::mirror::document::RestrictionDocument;
use crate::ports::outbound::{DocumentOperation, RestrictionDocumentStore, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Address;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<Address, RestrictionDocument>>,
    /// Every applied operation, in application order.
    log: RwLock<Vec<DocumentOperation>>,
    fail_remaining: AtomicU32,
    failures: AtomicU64,
    latency: RwLock<Option<Duration>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `documents`.
    pub fn with_documents(documents: impl IntoIterator<Item = RestrictionDocument>) -> Self {
        let store = Self::new();
        {
            let mut map = store.documents.write();
            for document in documents {
                if let Ok(address) = document.address() {
                    map.insert(address, document);
                }
            }
        }
        store
    }

    /// Makes the next `count` writes fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, count: u32) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    /// Delays every write by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = Some(latency);
    }

    pub fn get(&self, address: &Address) -> Option<RestrictionDocument> {
        self.documents.read().get(address).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn documents(&self) -> Vec<RestrictionDocument> {
        self.documents.read().values().cloned().collect()
    }

    pub fn operation_log(&self) -> Vec<DocumentOperation> {
        self.log.read().clone()
    }

    /// Writes rejected by injected failures.
    pub fn failed_writes(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Inserts a document directly, bypassing the log and failure injection.
    pub fn insert_raw(&self, address: Address, document: RestrictionDocument) {
        self.documents.write().insert(address, document);
    }

    async fn before_write(&self) -> Result<(), StoreError> {
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let injected = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn write(&self, operation: DocumentOperation) -> Result<bool, StoreError> {
        let existed = match &operation {
            DocumentOperation::Upsert(document) => {
                let address = operation.address()?;
                self.documents.write().insert(address, document.clone()).is_some()
            }
            DocumentOperation::Delete(address) => self.documents.write().remove(address).is_some(),
        };
        self.log.write().push(operation);
        Ok(existed)
    }
}

#[async_trait]
impl RestrictionDocumentStore for InMemoryDocumentStore {
    async fn upsert(&self, document: RestrictionDocument) -> Result<(), StoreError> {
        self.before_write().await?;
        self.write(DocumentOperation::Upsert(document)).map(|_| ())
    }

    async fn delete(&self, address: &Address) -> Result<bool, StoreError> {
        self.before_write().await?;
        self.write(DocumentOperation::Delete(*address))
    }

    async fn load_all(&self) -> Result<Vec<RestrictionDocument>, StoreError> {
        Ok(self.documents())
    }

    /// All-or-nothing: an injected failure rejects the whole batch.
    async fn apply_batch(&self, operations: Vec<DocumentOperation>) -> Result<(), StoreError> {
        self.before_write().await?;
        for operation in &operations {
            operation.address()?;
        }
        for operation in operations {
            self.write(operation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::document::RestrictionSetDocument;
    use crate::domain::{Direction, Polarity, RestrictionValueKind};
    use shared_types::address_to_hex;

    fn document(byte: u8) -> RestrictionDocument {
        RestrictionDocument {
            account: address_to_hex(&[byte; 24]),
            restrictions: vec![RestrictionSetDocument {
                kind: RestrictionValueKind::Operation,
                polarity: Polarity::Allow,
                direction: Direction::Outgoing,
                values: vec!["4154".into()],
            }],
        }
    }

    #[tokio::test]
    async fn test_upsert_and_delete_are_idempotent() {
        let store = InMemoryDocumentStore::new();
        store.upsert(document(1)).await.unwrap();
        store.upsert(document(1)).await.unwrap();
        assert_eq!(store.len(), 1);

        assert!(store.delete(&[1; 24]).await.unwrap());
        assert!(!store.delete(&[1; 24]).await.unwrap());
        assert!(store.is_empty());
        assert_eq!(store.operation_log().len(), 4);
    }

    #[tokio::test]
    async fn test_injected_failure_rejects_whole_batch() {
        let store = InMemoryDocumentStore::new();
        store.fail_next(1);
        let batch = vec![
            DocumentOperation::Upsert(document(1)),
            DocumentOperation::Upsert(document(2)),
        ];
        assert!(matches!(
            store.apply_batch(batch.clone()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.is_empty());

        store.apply_batch(batch).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.failed_writes(), 1);
    }
}
