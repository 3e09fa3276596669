//! Restriction policy checks for dependent transactions.
//!
//! Other transaction validators consult these before accepting a transfer
//! or any other operation:
//!
//! - a non-empty allow set must contain the value;
//! - a block set must not contain it;
//! - no active set means no restriction.

use super::cache::RestrictionStateView;
use super::entities::AccountRestrictions;
use super::errors::PolicyFailure;
use super::flags::{Direction, Polarity, RestrictionValueKind};
use super::values::RestrictionValue;
use shared_types::{address_to_hex, Address, EntityType, MosaicId};

fn is_permitted(
    account: Option<&AccountRestrictions>,
    kind: RestrictionValueKind,
    direction: Direction,
    value: &RestrictionValue,
) -> bool {
    match account.and_then(|a| a.active_set(kind, direction)) {
        None => true,
        Some(set) => match set.flags().polarity() {
            Polarity::Allow => set.contains(value),
            Polarity::Block => !set.contains(value),
        },
    }
}

/// Checks `source`'s outgoing and `recipient`'s incoming address restrictions.
///
/// An account interacting with itself is never restricted.
pub fn check_address_interaction<S>(
    view: &S,
    source: &Address,
    recipient: &Address,
) -> Result<(), PolicyFailure>
where
    S: RestrictionStateView + ?Sized,
{
    if source == recipient {
        return Ok(());
    }

    let outgoing_ok = is_permitted(
        view.find(source).as_ref(),
        RestrictionValueKind::Address,
        Direction::Outgoing,
        &RestrictionValue::Address(*recipient),
    );
    let incoming_ok = outgoing_ok
        && is_permitted(
            view.find(recipient).as_ref(),
            RestrictionValueKind::Address,
            Direction::Incoming,
            &RestrictionValue::Address(*source),
        );

    if incoming_ok {
        Ok(())
    } else {
        Err(PolicyFailure::AddressInteractionProhibited {
            source_account: address_to_hex(source),
            recipient: address_to_hex(recipient),
        })
    }
}

/// Checks whether `account` may send `mosaic`.
pub fn check_mosaic_transfer<S>(
    view: &S,
    account: &Address,
    mosaic: MosaicId,
) -> Result<(), PolicyFailure>
where
    S: RestrictionStateView + ?Sized,
{
    if is_permitted(
        view.find(account).as_ref(),
        RestrictionValueKind::Mosaic,
        Direction::Outgoing,
        &RestrictionValue::Mosaic(mosaic),
    ) {
        Ok(())
    } else {
        Err(PolicyFailure::MosaicTransferProhibited {
            account: address_to_hex(account),
            mosaic: mosaic.to_string(),
        })
    }
}

/// Checks whether `account` may submit a transaction of `entity_type`.
pub fn check_operation<S>(
    view: &S,
    account: &Address,
    entity_type: EntityType,
) -> Result<(), PolicyFailure>
where
    S: RestrictionStateView + ?Sized,
{
    if is_permitted(
        view.find(account).as_ref(),
        RestrictionValueKind::Operation,
        Direction::Outgoing,
        &RestrictionValue::Operation(entity_type),
    ) {
        Ok(())
    } else {
        Err(PolicyFailure::OperationTypeProhibited {
            account: address_to_hex(account),
            entity_type: entity_type.to_string(),
        })
    }
}
