//! Collaborators the storage provider consumes besides the participant client.

use choir_core::{AccountDetails, AccountId, AccountModifications, KeySet};

/// Keyed store of per-account attribute bags. Reads never touch the network.
pub trait AttributeCache: Send + Sync + 'static {
    /// The cached bag for `account_id`, projected onto `keys`.
    fn load_entry(&self, account_id: &AccountId, keys: &KeySet) -> Option<AccountDetails>;

    /// Replace the entry with remote-sourced data.
    fn communicate_remote_changes(&self, account_id: &AccountId, details: AccountDetails);

    /// Apply a partial update on top of the current entry.
    fn communicate_modifications(&self, account_id: &AccountId, modifications: &AccountModifications);

    fn clear_entry(&self, account_id: &AccountId);
}

/// Tells subsystems outside the provider that an account's attributes changed.
pub trait ChangeNotifier: Send + Sync + 'static {
    fn notify_about_updated_details(&self, account_id: &AccountId, details: &AccountDetails);
}

/// The caller's current view of an account, consulted by partial updates.
pub trait AccountContext: Send + Sync + 'static {
    fn current_details(&self, account_id: &AccountId) -> Option<AccountDetails>;
}
