//! # choir-sync
//!
//! Keeps cached account attributes in step with the CHOIR participant record.
//!
//! [`ChoirStorageProvider`] serves `load` from an [`AttributeCache`] and
//! refreshes in the background, at most once in flight per account. Writes go
//! to the participant service and are announced through a [`ChangeNotifier`].
//! [`TestStorageProvider`] is a cache-only stand-in with the same interface.

pub mod cache;
pub mod collaborators;
pub mod error;
pub mod file_cache;
pub mod notifier;
pub mod provider;
pub mod storage;
pub mod test_provider;

pub use cache::InMemoryCache;
pub use collaborators::{AccountContext, AttributeCache, ChangeNotifier};
pub use error::SyncError;
pub use file_cache::FileCache;
pub use notifier::{BroadcastNotifier, DetailsChanged};
pub use provider::ChoirStorageProvider;
pub use storage::AccountStorageProvider;
pub use test_provider::TestStorageProvider;
