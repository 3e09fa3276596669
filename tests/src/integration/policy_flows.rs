//! # Policy Flows
//!
//! Restrictions only matter when other transactions consult them. These
//! tests play the role of a transfer validator sitting in front of the
//! restriction engine.
//!
//! ## Checks per transfer
//!
//! | Check | Account | Restriction consulted |
//! |-------|---------|-----------------------|
//! | operation | sender | Operation, Outgoing |
//! | address | sender | Address, Outgoing |
//! | address | recipient | Address, Incoming |
//! | mosaic | sender | Mosaic, Outgoing |

#[cfg(test)]
mod tests {
    use qc_18_account_restrictions::{
        AccountAddressRestrictionTransaction, AccountMosaicRestrictionTransaction,
        AccountOperationRestrictionTransaction, AccountRestrictionApi, AccountRestrictionService,
        Direction, PolicyFailure, Polarity, RestrictionConfig, RestrictionFlags,
        RestrictionModification, ValidationFailure,
    };
    use shared_types::{entity_types, networks, Address, EntityType, MosaicId};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn account(byte: u8) -> Address {
        let mut address = [byte; 24];
        address[0] = networks::TESTNET;
        address
    }

    const ALICE: u8 = 0xA1;
    const BOB: u8 = 0xB0;
    const CAROL: u8 = 0xC0;

    /// Minimal transfer gate built on the restriction API.
    fn validate_transfer(
        engine: &impl AccountRestrictionApi,
        sender: &Address,
        recipient: &Address,
        mosaic: MosaicId,
    ) -> Result<(), PolicyFailure> {
        engine.check_operation(sender, entity_types::TRANSFER)?;
        engine.check_address_interaction(sender, recipient)?;
        engine.check_mosaic_transfer(sender, mosaic)
    }

    fn address_tx(owner: u8, flags: RestrictionFlags, adds: &[u8]) -> RestrictionModification {
        AccountAddressRestrictionTransaction::new(account(owner), flags)
            .with_additions(adds.iter().map(|b| account(*b)))
            .into()
    }

    fn operation_tx(owner: u8, polarity: Polarity, adds: &[EntityType]) -> RestrictionModification {
        AccountOperationRestrictionTransaction::new(account(owner), RestrictionFlags::operation(polarity))
            .with_additions(adds.iter().copied())
            .into()
    }

    // =============================================================================
    // TRANSFER GATING
    // =============================================================================

    #[test]
    fn test_unrestricted_transfer_passes() {
        let service = AccountRestrictionService::new(RestrictionConfig::default());
        assert!(validate_transfer(&service, &account(ALICE), &account(BOB), MosaicId(1)).is_ok());
    }

    #[test]
    fn test_incoming_allow_list_gates_senders() {
        let service = AccountRestrictionService::new(RestrictionConfig::default());
        service
            .execute_block(
                1,
                &[address_tx(
                    BOB,
                    RestrictionFlags::address(Polarity::Allow, Direction::Incoming),
                    &[ALICE],
                )],
            )
            .unwrap();

        assert!(validate_transfer(&service, &account(ALICE), &account(BOB), MosaicId(1)).is_ok());
        assert!(matches!(
            validate_transfer(&service, &account(CAROL), &account(BOB), MosaicId(1)),
            Err(PolicyFailure::AddressInteractionProhibited { .. })
        ));
        // Bob's own outgoing transfers are unaffected.
        assert!(validate_transfer(&service, &account(BOB), &account(CAROL), MosaicId(1)).is_ok());
    }

    #[test]
    fn test_mosaic_and_operation_restrictions_combine() {
        let service = AccountRestrictionService::new(RestrictionConfig::default());
        let mosaics: RestrictionModification =
            AccountMosaicRestrictionTransaction::new(account(ALICE), RestrictionFlags::mosaic(Polarity::Block))
                .with_additions([MosaicId(0xBAD)])
                .into();
        service
            .execute_block(
                1,
                &[
                    mosaics,
                    operation_tx(
                        CAROL,
                        Polarity::Allow,
                        &[entity_types::ACCOUNT_OPERATION_RESTRICTION],
                    ),
                ],
            )
            .unwrap();

        assert!(matches!(
            validate_transfer(&service, &account(ALICE), &account(BOB), MosaicId(0xBAD)),
            Err(PolicyFailure::MosaicTransferProhibited { .. })
        ));
        assert!(validate_transfer(&service, &account(ALICE), &account(BOB), MosaicId(1)).is_ok());

        // Carol may only manage her operation restrictions.
        assert!(matches!(
            validate_transfer(&service, &account(CAROL), &account(BOB), MosaicId(1)),
            Err(PolicyFailure::OperationTypeProhibited { .. })
        ));
        assert!(service
            .check_operation(&account(CAROL), entity_types::ACCOUNT_OPERATION_RESTRICTION)
            .is_ok());
    }

    #[test]
    fn test_account_cannot_block_operation_restriction_management() {
        let service = AccountRestrictionService::new(RestrictionConfig::default());
        let outcome = service
            .execute_block(
                1,
                &[operation_tx(
                    ALICE,
                    Polarity::Block,
                    &[entity_types::ACCOUNT_OPERATION_RESTRICTION],
                )],
            )
            .unwrap();
        assert!(matches!(
            outcome.rejected[0].failure,
            ValidationFailure::InvalidModificationValue { .. }
        ));
    }

    #[test]
    fn test_foreign_network_address_is_rejected() {
        let service = AccountRestrictionService::new(RestrictionConfig::default());
        let mut foreign = account(BOB);
        foreign[0] = networks::MAINNET;
        let tx: RestrictionModification = AccountAddressRestrictionTransaction::new(
            account(ALICE),
            RestrictionFlags::address(Polarity::Block, Direction::Outgoing),
        )
        .with_additions([foreign])
        .into();

        assert!(matches!(
            service.validate(&tx),
            Err(ValidationFailure::InvalidModificationValue { .. })
        ));
    }

    // =============================================================================
    // CONCURRENT READERS
    // =============================================================================

    #[test]
    fn test_policy_reads_run_alongside_block_execution() {
        let service = Arc::new(AccountRestrictionService::new(RestrictionConfig::default()));
        let block = RestrictionFlags::address(Polarity::Block, Direction::Outgoing);

        std::thread::scope(|scope| {
            for reader in 0..4u8 {
                let service = Arc::clone(&service);
                scope.spawn(move || {
                    for _ in 0..500 {
                        // Either outcome is fine; reads must never block forever or panic.
                        let _ = service
                            .check_address_interaction(&account(ALICE), &account(0x20 + reader));
                    }
                });
            }

            let writer = Arc::clone(&service);
            scope.spawn(move || {
                for height in 1..=20u64 {
                    writer
                        .execute_block(height, &[address_tx(ALICE, block, &[0x20 + height as u8])])
                        .unwrap();
                }
            });
        });

        assert_eq!(service.cache().committed_version(), 20);
        assert_eq!(service.find(&account(ALICE)).unwrap().value_count(), 20);
        assert!(service
            .check_address_interaction(&account(ALICE), &account(0x21))
            .is_err());
    }
}
