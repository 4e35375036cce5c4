//! A storage provider that never leaves the local cache.
//!
//! Useful for UI tests and demos: every account starts out with a
//! placeholder phone number and all writes land directly in the cache.

use std::sync::Arc;

use async_trait::async_trait;

use choir_core::{AccountDetails, AccountId, AccountKey, AccountModifications, KeySet};

use crate::collaborators::AttributeCache;
use crate::error::SyncError;
use crate::storage::AccountStorageProvider;

pub const PLACEHOLDER_PHONE: &str = "+1 (555) 555-5555";

pub struct TestStorageProvider {
    cache: Arc<dyn AttributeCache>,
}

impl TestStorageProvider {
    pub fn new(cache: Arc<dyn AttributeCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl AccountStorageProvider for TestStorageProvider {
    async fn load(&self, account_id: &AccountId, keys: &[AccountKey]) -> Option<AccountDetails> {
        let keys: KeySet = keys.iter().copied().collect();
        if let Some(entry) = self.cache.load_entry(account_id, &keys) {
            return Some(entry);
        }
        let details = AccountDetails::new().with_phone_number(PLACEHOLDER_PHONE);
        self.cache
            .communicate_remote_changes(account_id, details.clone());
        Some(details)
    }

    async fn store(&self, account_id: &AccountId, details: AccountDetails) -> Result<(), SyncError> {
        self.cache.communicate_remote_changes(account_id, details);
        Ok(())
    }

    async fn store_modifications(
        &self,
        account_id: &AccountId,
        modifications: AccountModifications,
    ) -> Result<(), SyncError> {
        self.cache
            .communicate_modifications(account_id, &modifications);
        Ok(())
    }

    async fn disassociate(&self, account_id: &AccountId) {
        self.cache.clear_entry(account_id);
    }

    async fn delete(&self, account_id: &AccountId) -> Result<(), SyncError> {
        self.disassociate(account_id).await;
        Ok(())
    }
}
