//! Storage provider backed by the CHOIR participant service.
//!
//! # Refresh model
//!
//! `load` answers from the cache and schedules a background refresh. At most
//! one refresh per account is in flight: the task table is checked and the new
//! handle registered under one lock. A refresh fetches the participant record
//! with no lock held, then re-takes the lock for its cancellation checkpoint
//! and the cache write, so a refresh cancelled by `disassociate` never writes
//! after teardown. Its table entry is released on every exit path, including
//! panics and a dropped runtime.
//!
//! Refreshes run on the Tokio runtime that was current when the provider was
//! built, so `load` may be awaited from any executor afterwards.
//!
//! A failed fetch overwrites the cache with a bag holding only the owner id
//! and still notifies. Nothing is retried; the next `load` schedules a new
//! refresh.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use choir_core::{
    AccountDetails, AccountId, AccountKey, AccountModifications, KeySet, Participant,
    ParticipantClient,
};

use crate::collaborators::{AccountContext, AttributeCache, ChangeNotifier};
use crate::error::SyncError;
use crate::storage::AccountStorageProvider;

#[derive(Clone)]
pub struct ChoirStorageProvider {
    client: Arc<dyn ParticipantClient>,
    cache: Arc<dyn AttributeCache>,
    notifier: Arc<dyn ChangeNotifier>,
    context: Arc<dyn AccountContext>,
    runtime: Handle,
    tables: Arc<Mutex<Tables>>,
}

/// Per-account bookkeeping. Collaborators are called with this locked, so
/// they must not call back into the provider.
#[derive(Default)]
struct Tables {
    registered_keys: HashMap<AccountId, KeySet>,
    refreshes: HashMap<AccountId, RefreshHandle>,
    next_generation: u64,
}

struct RefreshHandle {
    generation: u64,
    cancel: CancellationToken,
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChoirStorageProvider {
    /// Must be called from within a Tokio runtime; background refreshes are
    /// spawned onto it. Use [`with_runtime`](Self::with_runtime) otherwise.
    pub fn new(
        client: Arc<dyn ParticipantClient>,
        cache: Arc<dyn AttributeCache>,
        notifier: Arc<dyn ChangeNotifier>,
        context: Arc<dyn AccountContext>,
    ) -> Self {
        Self::with_runtime(client, cache, notifier, context, Handle::current())
    }

    pub fn with_runtime(
        client: Arc<dyn ParticipantClient>,
        cache: Arc<dyn AttributeCache>,
        notifier: Arc<dyn ChangeNotifier>,
        context: Arc<dyn AccountContext>,
        runtime: Handle,
    ) -> Self {
        Self {
            client,
            cache,
            notifier,
            context,
            runtime,
            tables: Arc::new(Mutex::new(Tables::default())),
        }
    }

    /// Keys captured by the most recent `load` of the account.
    pub fn registered_keys(&self, account_id: &AccountId) -> Option<KeySet> {
        lock(&self.tables).registered_keys.get(account_id).cloned()
    }

    pub fn is_refreshing(&self, account_id: &AccountId) -> bool {
        lock(&self.tables).refreshes.contains_key(account_id)
    }

    fn schedule_refresh(&self, account_id: &AccountId) {
        let refresh = {
            let mut tables = lock(&self.tables);
            if tables.refreshes.contains_key(account_id) {
                tracing::debug!(account_id = %account_id, "refresh already in flight");
                return;
            }
            tables.next_generation += 1;
            let generation = tables.next_generation;
            let cancel = CancellationToken::new();
            tables.refreshes.insert(
                account_id.clone(),
                RefreshHandle {
                    generation,
                    cancel: cancel.clone(),
                },
            );
            Refresh {
                account_id: account_id.clone(),
                cancel,
                client: self.client.clone(),
                cache: self.cache.clone(),
                notifier: self.notifier.clone(),
                slot: SlotRelease {
                    tables: self.tables.clone(),
                    account_id: account_id.clone(),
                    generation,
                },
            }
        };
        self.runtime.spawn(refresh.run());
    }
}

#[async_trait]
impl AccountStorageProvider for ChoirStorageProvider {
    async fn load(&self, account_id: &AccountId, keys: &[AccountKey]) -> Option<AccountDetails> {
        let keys: KeySet = keys.iter().copied().collect();
        let cached = {
            let mut tables = lock(&self.tables);
            tables.registered_keys.insert(account_id.clone(), keys.clone());
            self.cache.load_entry(account_id, &keys)
        };
        self.schedule_refresh(account_id);
        cached
    }

    async fn store(&self, account_id: &AccountId, details: AccountDetails) -> Result<(), SyncError> {
        let participant = Participant::from_account_details(&details);
        self.client.post_participant(account_id, &participant).await?;
        tracing::info!(account_id = %account_id, "participant record stored");
        self.notifier.notify_about_updated_details(account_id, &details);
        Ok(())
    }

    async fn store_modifications(
        &self,
        account_id: &AccountId,
        modifications: AccountModifications,
    ) -> Result<(), SyncError> {
        let details = self
            .context
            .current_details(account_id)
            .unwrap_or_default()
            .applying(&modifications);
        self.store(account_id, details).await
    }

    async fn disassociate(&self, account_id: &AccountId) {
        let mut tables = lock(&self.tables);
        if let Some(handle) = tables.refreshes.remove(account_id) {
            handle.cancel.cancel();
            tracing::debug!(account_id = %account_id, "cancelled in-flight refresh");
        }
        tables.registered_keys.remove(account_id);
        self.cache.clear_entry(account_id);
    }

    async fn delete(&self, account_id: &AccountId) -> Result<(), SyncError> {
        // Local state goes first; a failed unenroll leaves the remote record.
        self.disassociate(account_id).await;
        self.client.unenroll_participant(account_id).await?;
        tracing::info!(account_id = %account_id, "participant unenrolled");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Background refresh
// ---------------------------------------------------------------------------

struct Refresh {
    account_id: AccountId,
    cancel: CancellationToken,
    client: Arc<dyn ParticipantClient>,
    cache: Arc<dyn AttributeCache>,
    notifier: Arc<dyn ChangeNotifier>,
    slot: SlotRelease,
}

impl Refresh {
    async fn run(self) {
        let fetched = self.client.get_participant(&self.account_id).await;

        let tables = lock(&self.slot.tables);
        if self.cancel.is_cancelled() {
            tracing::debug!(account_id = %self.account_id, "refresh cancelled, discarding result");
            return;
        }
        let details = match fetched {
            Ok(participant) => participant.to_account_details(),
            Err(err) => {
                tracing::error!(
                    account_id = %self.account_id,
                    error = %err,
                    "reloading account details failed",
                );
                AccountDetails::degraded(&self.account_id)
            }
        };
        self.cache
            .communicate_remote_changes(&self.account_id, details.clone());
        self.notifier
            .notify_about_updated_details(&self.account_id, &details);
        drop(tables);
    }
}

/// Frees the task-table slot when the refresh ends, however it ends. Only the
/// entry registered by this refresh is removed.
struct SlotRelease {
    tables: Arc<Mutex<Tables>>,
    account_id: AccountId,
    generation: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let mut tables = lock(&self.tables);
        let owned = tables
            .refreshes
            .get(&self.account_id)
            .is_some_and(|handle| handle.generation == self.generation);
        if owned {
            tables.refreshes.remove(&self.account_id);
        }
    }
}
