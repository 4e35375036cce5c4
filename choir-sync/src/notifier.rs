//! Broadcast change notifier.

use std::sync::Arc;

use tokio::sync::broadcast;

use choir_core::{AccountDetails, AccountId};

use crate::collaborators::{AttributeCache, ChangeNotifier};

const DEFAULT_CAPACITY: usize = 64;

/// One "attributes changed" event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsChanged {
    pub account_id: AccountId,
    pub details: AccountDetails,
}

/// Fans change events out to every subscriber.
///
/// With a write-through cache attached, notified details are written to that
/// cache before the event is sent, so a `load` issued right after a `store`
/// already sees the pushed values.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<DetailsChanged>,
    write_through: Option<Arc<dyn AttributeCache>>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            write_through: None,
        }
    }

    pub fn with_write_through(mut self, cache: Arc<dyn AttributeCache>) -> Self {
        self.write_through = Some(cache);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetailsChanged> {
        self.sender.subscribe()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify_about_updated_details(&self, account_id: &AccountId, details: &AccountDetails) {
        if let Some(cache) = &self.write_through {
            cache.communicate_remote_changes(account_id, details.clone());
        }
        // No subscribers is fine; the event is simply dropped.
        let receivers = self
            .sender
            .send(DetailsChanged {
                account_id: account_id.clone(),
                details: details.clone(),
            })
            .unwrap_or(0);
        tracing::debug!(account_id = %account_id, receivers, "account details changed");
    }
}
