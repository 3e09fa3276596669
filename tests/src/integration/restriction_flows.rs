//! # Account Restriction Flows
//!
//! Drives the restriction engine the way the block pipeline does:
//! typed transactions in, block execution, reorganization, mirror sync.
//!
//! ## Flows Tested
//!
//! 1. **Lifecycle**: first add creates the account, undo removes it again
//! 2. **Rejections**: duplicate, self, redundant, over-capacity, empty
//! 3. **Polarity switch**: block list emptied, then an allow list installed
//! 4. **Snapshot isolation**: a pre-block snapshot never sees the block
//! 5. **Reorg + mirror**: rolled-back blocks disappear from the store too

#[cfg(test)]
mod tests {
    use qc_18_account_restrictions::{
        AccountAddressRestrictionTransaction, AccountMosaicRestrictionTransaction,
        AccountRestrictionApi, AccountRestrictionService, Direction, InMemoryDocumentStore,
        Polarity, RestrictionConfig, RestrictionDocumentStore, RestrictionFlags,
        RestrictionLimits, RestrictionModification, RestrictionStateView, RestrictionValue,
        ValidationFailure,
    };
    use shared_types::{networks, Address, MosaicId};
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn account(byte: u8) -> Address {
        let mut address = [byte; 24];
        address[0] = networks::TESTNET;
        address
    }

    const A: u8 = 0x0A;
    const B: u8 = 0x0B;
    const C: u8 = 0x0C;
    const D: u8 = 0x0D;

    fn block_outgoing() -> RestrictionFlags {
        RestrictionFlags::address(Polarity::Block, Direction::Outgoing)
    }

    fn address_tx(owner: u8, flags: RestrictionFlags, adds: &[u8], removes: &[u8]) -> RestrictionModification {
        AccountAddressRestrictionTransaction::new(account(owner), flags)
            .with_additions(adds.iter().map(|b| account(*b)))
            .with_deletions(removes.iter().map(|b| account(*b)))
            .into()
    }

    fn service(max_values: usize) -> AccountRestrictionService {
        AccountRestrictionService::new(
            RestrictionConfig::default().with_limits(RestrictionLimits::uniform(max_values)),
        )
    }

    fn single_rejection(
        service: &AccountRestrictionService,
        height: u64,
        modification: RestrictionModification,
    ) -> ValidationFailure {
        let outcome = service.execute_block(height, &[modification]).unwrap();
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        outcome.rejected[0].failure.clone()
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[test]
    fn test_first_add_creates_account_and_undo_removes_it() {
        let service = service(8);
        assert!(service.find(&account(A)).is_none());

        let outcome = service
            .execute_block(1, &[address_tx(A, block_outgoing(), &[B], &[])])
            .unwrap();

        let restrictions = service.find(&account(A)).unwrap();
        assert_eq!(restrictions.len(), 1);
        let set = restrictions.set(&block_outgoing()).unwrap();
        assert_eq!(set.flags(), block_outgoing());
        assert_eq!(
            set.iter().copied().collect::<Vec<_>>(),
            vec![RestrictionValue::Address(account(B))]
        );

        service.rollback_block(1, &outcome.applied).unwrap();
        assert!(service.find(&account(A)).is_none());
        assert_eq!(service.cache().committed_len(), 0);
    }

    #[test]
    fn test_swap_within_capacity_in_one_transaction() {
        let service = service(2);
        service
            .execute_block(1, &[address_tx(A, block_outgoing(), &[B, C], &[])])
            .unwrap();

        let outcome = service
            .execute_block(2, &[address_tx(A, block_outgoing(), &[D], &[B])])
            .unwrap();
        assert_eq!(outcome.applied.len(), 1);

        let set_values: Vec<_> = service
            .find(&account(A))
            .unwrap()
            .set(&block_outgoing())
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(
            set_values,
            vec![
                RestrictionValue::Address(account(C)),
                RestrictionValue::Address(account(D))
            ]
        );
    }

    // =============================================================================
    // REJECTIONS
    // =============================================================================

    #[test]
    fn test_capacity_rejection_leaves_set_unchanged() {
        let service = service(2);
        service
            .execute_block(1, &[address_tx(A, block_outgoing(), &[B, C], &[])])
            .unwrap();
        let before = service.find(&account(A));

        let failure = single_rejection(&service, 2, address_tx(A, block_outgoing(), &[D], &[]));
        assert_eq!(
            failure,
            ValidationFailure::ModificationCountExceeded {
                resulting: 3,
                max_size: 2
            }
        );
        assert_eq!(service.find(&account(A)), before);
    }

    #[test]
    fn test_add_and_remove_same_value_is_duplicate() {
        let service = service(8);
        let failure = single_rejection(&service, 1, address_tx(A, block_outgoing(), &[B], &[B]));
        assert_eq!(
            failure,
            ValidationFailure::DuplicateModification {
                value: RestrictionValue::Address(account(B))
            }
        );
    }

    #[test]
    fn test_account_cannot_restrict_itself() {
        let service = service(8);
        let failure = single_rejection(&service, 1, address_tx(A, block_outgoing(), &[A], &[]));
        assert!(matches!(
            failure,
            ValidationFailure::InvalidModificationValue { .. }
        ));
        assert!(service.find(&account(A)).is_none());
    }

    #[test]
    fn test_redundant_add_and_remove() {
        let service = service(8);
        service
            .execute_block(1, &[address_tx(A, block_outgoing(), &[B], &[])])
            .unwrap();

        assert!(matches!(
            single_rejection(&service, 2, address_tx(A, block_outgoing(), &[B], &[])),
            ValidationFailure::RedundantModification { .. }
        ));
        assert!(matches!(
            single_rejection(&service, 3, address_tx(A, block_outgoing(), &[], &[C])),
            ValidationFailure::RedundantModification { .. }
        ));
    }

    #[test]
    fn test_empty_and_oversized_transactions() {
        let service = AccountRestrictionService::new(
            RestrictionConfig::default().with_max_modifications(3),
        );
        assert!(matches!(
            single_rejection(&service, 1, address_tx(A, block_outgoing(), &[], &[])),
            ValidationFailure::InvalidModificationsCount { count: 0, .. }
        ));
        assert!(matches!(
            single_rejection(&service, 2, address_tx(A, block_outgoing(), &[B, C, D, 0x0E], &[])),
            ValidationFailure::InvalidModificationsCount { count: 4, max: 3 }
        ));
    }

    // =============================================================================
    // POLARITY SWITCH
    // =============================================================================

    #[test]
    fn test_switching_from_block_list_to_allow_list() {
        let service = service(8);
        let allow = RestrictionFlags::mosaic(Polarity::Allow);
        let block = RestrictionFlags::mosaic(Polarity::Block);
        let mosaic_tx = |flags, adds: &[u64], removes: &[u64]| -> RestrictionModification {
            AccountMosaicRestrictionTransaction::new(account(A), flags)
                .with_additions(adds.iter().map(|id| MosaicId(*id)))
                .with_deletions(removes.iter().map(|id| MosaicId(*id)))
                .into()
        };

        service.execute_block(1, &[mosaic_tx(block, &[5], &[])]).unwrap();
        assert!(matches!(
            single_rejection(&service, 2, mosaic_tx(allow, &[6], &[])),
            ValidationFailure::ConflictingPolarity { .. }
        ));

        // Emptying the block list in the same block unlocks the allow list.
        let outcome = service
            .execute_block(3, &[mosaic_tx(block, &[], &[5]), mosaic_tx(allow, &[6], &[])])
            .unwrap();
        assert_eq!(outcome.applied.len(), 2);

        assert!(service.check_mosaic_transfer(&account(A), MosaicId(6)).is_ok());
        assert!(service.check_mosaic_transfer(&account(A), MosaicId(5)).is_err());
    }

    // =============================================================================
    // SNAPSHOT ISOLATION
    // =============================================================================

    #[test]
    fn test_snapshot_does_not_observe_later_blocks() {
        let service = service(8);
        service
            .execute_block(1, &[address_tx(A, block_outgoing(), &[B], &[])])
            .unwrap();
        let snapshot = service.snapshot();

        service
            .execute_block(2, &[address_tx(A, block_outgoing(), &[C], &[B])])
            .unwrap();

        // Against the snapshot, removing B is still valid and C is still absent.
        let speculative = address_tx(A, block_outgoing(), &[D], &[B]);
        assert!(service.validator().validate(&speculative, &snapshot).is_ok());
        assert!(service.validate(&speculative).is_err());

        assert_eq!(snapshot.version(), 1);
        let old = snapshot.find(&account(A)).unwrap();
        assert!(old
            .set(&block_outgoing())
            .unwrap()
            .contains(&RestrictionValue::Address(account(B))));
    }

    // =============================================================================
    // REORG + MIRROR
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reorg_propagates_to_mirror() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.set_latency(Duration::from_millis(5));
        let dyn_store: Arc<dyn RestrictionDocumentStore> = store.clone();
        let service = AccountRestrictionService::start(RestrictionConfig::default(), dyn_store)
            .await
            .unwrap();

        let first = service
            .execute_block(1, &[address_tx(A, block_outgoing(), &[B], &[])])
            .unwrap();
        let second = service
            .execute_block(2, &[address_tx(C, block_outgoing(), &[D], &[]), address_tx(A, block_outgoing(), &[C], &[])])
            .unwrap();
        assert_eq!(second.version, 2);

        let undone = service.rollback_block(2, &second.applied).unwrap();
        let mirror = service.mirror().unwrap();
        mirror.wait_for_version(undone.version).await.unwrap();

        assert!(store.get(&account(C)).is_none());
        let document = store.get(&account(A)).unwrap();
        assert_eq!(document.restrictions.len(), 1);
        assert_eq!(document.restrictions[0].values.len(), 1);
        assert_eq!(first.version, 1);

        let progress = service.shutdown().await.unwrap().unwrap();
        assert_eq!(progress.synced_version, 3);
        assert!(!progress.dirty);
    }
}
