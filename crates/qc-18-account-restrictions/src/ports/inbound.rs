//! # Inbound Port - AccountRestrictionApi
//!
//! Driving port used by the transaction pipeline and by other validators.
//!
//! | Method | Caller |
//! |--------|--------|
//! | `execute_block` | Block execution, in block order |
//! | `rollback_block` | Reorganization, newest block first |
//! | `validate` | Mempool / pre-validation |
//! | `find` | Query services |
//! | `check_*` | Validators of dependent transactions |

use crate::domain::{
    AccountRestrictions, PolicyFailure, RestrictionModification, ValidationFailure,
};
use crate::service::{BlockOutcome, ServiceError};
use shared_types::{Address, EntityType, Height, MosaicId};

/// Primary API of the account restriction engine.
///
/// # Example
///
/// ```rust,ignore
/// use qc_18_account_restrictions::ports::AccountRestrictionApi;
///
/// fn example(engine: &impl AccountRestrictionApi, block: &[RestrictionModification]) {
///     let outcome = engine.execute_block(42, block).unwrap();
///     // On reorganization, hand back only what was applied.
///     engine.rollback_block(42, &outcome.applied).unwrap();
/// }
/// ```
pub trait AccountRestrictionApi: Send + Sync {
    /// Validates and applies a block's restriction transactions in order,
    /// then commits and schedules mirror sync.
    ///
    /// Rejected transactions are reported in the outcome and leave no trace.
    ///
    /// # Errors
    /// - `Observer`: validator/observer desynchronization; nothing is committed
    /// - `Cache`: a delta is already open
    fn execute_block(
        &self,
        height: Height,
        modifications: &[RestrictionModification],
    ) -> Result<BlockOutcome, ServiceError>;

    /// Undoes previously applied transactions of one block, last first.
    fn rollback_block(
        &self,
        height: Height,
        applied: &[RestrictionModification],
    ) -> Result<BlockOutcome, ServiceError>;

    /// Validates one transaction against committed state without applying it.
    ///
    /// Changes of a block still being executed are not visible here.
    fn validate(&self, modification: &RestrictionModification) -> Result<(), ValidationFailure>;

    /// Current restrictions of an account.
    fn find(&self, address: &Address) -> Option<AccountRestrictions>;

    fn check_address_interaction(
        &self,
        source: &Address,
        recipient: &Address,
    ) -> Result<(), PolicyFailure>;

    fn check_mosaic_transfer(&self, account: &Address, mosaic: MosaicId)
        -> Result<(), PolicyFailure>;

    fn check_operation(&self, account: &Address, entity_type: EntityType)
        -> Result<(), PolicyFailure>;
}
