//! The storage provider interface the account layer talks to.

use async_trait::async_trait;

use choir_core::{AccountDetails, AccountId, AccountKey, AccountModifications};

use crate::error::SyncError;

/// Load, store and tear down the attributes of an account.
#[async_trait]
pub trait AccountStorageProvider: Send + Sync {
    /// Cached details projected onto `keys`, returned without waiting on the
    /// network. Implementations may refresh in the background.
    async fn load(&self, account_id: &AccountId, keys: &[AccountKey]) -> Option<AccountDetails>;

    /// Push a full attribute bag.
    async fn store(&self, account_id: &AccountId, details: AccountDetails) -> Result<(), SyncError>;

    /// Push a partial update merged onto the caller's current details.
    async fn store_modifications(
        &self,
        account_id: &AccountId,
        modifications: AccountModifications,
    ) -> Result<(), SyncError>;

    /// Drop local state for the account without touching the remote record.
    async fn disassociate(&self, account_id: &AccountId);

    /// Disassociate, then delete the remote record.
    async fn delete(&self, account_id: &AccountId) -> Result<(), SyncError>;
}
