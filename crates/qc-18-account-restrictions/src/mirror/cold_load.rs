//! Startup reconstruction of the cache base from the mirror.

use super::MirrorError;
use crate::domain::{AccountRestrictionCache, CacheError};
use crate::ports::outbound::RestrictionDocumentStore;
use shared_types::address_to_hex;
use std::collections::HashSet;
use tracing::info;

/// Reads every stored document and installs the decoded accounts as the
/// committed base.
///
/// Must run before any transaction is applied: fails with
/// [`CacheError::BaseNotEmpty`] or [`CacheError::DeltaAlreadyOpen`]
/// otherwise. Any malformed or repeated document aborts the load and leaves
/// the cache untouched. Returns the number of accounts installed.
pub async fn cold_load<S>(store: &S, cache: &AccountRestrictionCache) -> Result<usize, MirrorError>
where
    S: RestrictionDocumentStore + ?Sized,
{
    if cache.has_open_delta() {
        return Err(CacheError::DeltaAlreadyOpen.into());
    }
    let existing = cache.committed_len();
    if existing > 0 {
        return Err(CacheError::BaseNotEmpty { accounts: existing }.into());
    }

    let documents = store.load_all().await?;
    let mut seen = HashSet::with_capacity(documents.len());
    let mut accounts = Vec::with_capacity(documents.len());
    for document in documents {
        let account = document.into_restrictions(cache.limits())?;
        if !seen.insert(*account.address()) {
            return Err(MirrorError::DuplicateDocument {
                account: address_to_hex(account.address()),
            });
        }
        accounts.push(account);
    }

    let installed = cache.restore_base(accounts)?;
    info!(accounts = installed, "Cold-loaded account restrictions from mirror");
    Ok(installed)
}
