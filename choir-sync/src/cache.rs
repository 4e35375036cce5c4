//! In-memory attribute cache.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use choir_core::{AccountDetails, AccountId, AccountModifications, KeySet};

use crate::collaborators::{AccountContext, AttributeCache};

/// Attribute bags keyed by account. Readers always receive their own copy.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<AccountId, AccountDetails>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full cached bag, without projection.
    pub fn get(&self, account_id: &AccountId) -> Option<AccountDetails> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert without going through the collaborator interface (used when
    /// hydrating from disk).
    pub(crate) fn insert(&self, account_id: AccountId, details: AccountDetails) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account_id, details);
    }
}

impl AttributeCache for InMemoryCache {
    fn load_entry(&self, account_id: &AccountId, keys: &KeySet) -> Option<AccountDetails> {
        self.get(account_id)
            .map(|details| details.restricted_to(keys))
    }

    fn communicate_remote_changes(&self, account_id: &AccountId, details: AccountDetails) {
        self.insert(account_id.clone(), details);
    }

    fn communicate_modifications(&self, account_id: &AccountId, modifications: &AccountModifications) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let current = entries.remove(account_id).unwrap_or_default();
        entries.insert(account_id.clone(), current.applying(modifications));
    }

    fn clear_entry(&self, account_id: &AccountId) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(account_id);
    }
}

impl AccountContext for InMemoryCache {
    fn current_details(&self, account_id: &AccountId) -> Option<AccountDetails> {
        self.get(account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choir_core::AccountKey;

    fn keys(list: &[AccountKey]) -> KeySet {
        list.iter().copied().collect()
    }

    #[test]
    fn load_entry_projects_onto_requested_keys() {
        let cache = InMemoryCache::new();
        let id = AccountId::from("p-01");
        cache.communicate_remote_changes(
            &id,
            AccountDetails::new()
                .with_user_id("p-01")
                .with_email("a@x.com")
                .with_phone_number("555"),
        );

        let entry = cache
            .load_entry(&id, &keys(&[AccountKey::Email]))
            .expect("entry");
        assert_eq!(entry.email(), Some("a@x.com"));
        assert_eq!(entry.phone_number(), None);
        assert_eq!(entry.user_id(), Some("p-01"));
    }

    #[test]
    fn missing_entry_is_none() {
        let cache = InMemoryCache::new();
        assert!(cache
            .load_entry(&AccountId::from("nobody"), &KeySet::new())
            .is_none());
    }

    #[test]
    fn modifications_apply_on_top_of_existing_entry() {
        let cache = InMemoryCache::new();
        let id = AccountId::from("p-01");
        cache.communicate_remote_changes(
            &id,
            AccountDetails::new().with_email("a@x.com").with_organization("Stanford"),
        );
        cache.communicate_modifications(
            &id,
            &AccountModifications::new(AccountDetails::new().with_email("b@x.com"))
                .removing(AccountKey::Organization),
        );

        let entry = cache.get(&id).expect("entry");
        assert_eq!(entry.email(), Some("b@x.com"));
        assert_eq!(entry.organization(), None);
    }

    #[test]
    fn clear_entry_removes_only_that_account() {
        let cache = InMemoryCache::new();
        let a = AccountId::from("a");
        let b = AccountId::from("b");
        cache.communicate_remote_changes(&a, AccountDetails::new().with_email("a@x.com"));
        cache.communicate_remote_changes(&b, AccountDetails::new().with_email("b@x.com"));

        cache.clear_entry(&a);
        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
        assert_eq!(cache.len(), 1);
    }
}
