//! CHOIR core library — account attribute types, the participant record,
//! the remote client seam, errors and configuration.
//!
//! - [`types`] — `AccountId`, `AccountKey`, `AccountDetails`, `AccountModifications`
//! - [`participant`] — remote record and its projection to/from attribute bags
//! - [`remote`] — [`ParticipantClient`] trait
//! - [`error`] — [`ChoirError`], [`ConfigError`]
//! - [`config`] — `~/.choir/config.yaml` load / save

pub mod config;
pub mod error;
pub mod participant;
pub mod remote;
pub mod types;

pub use config::ChoirConfig;
pub use error::{ChoirError, ConfigError};
pub use participant::Participant;
pub use remote::ParticipantClient;
pub use types::{
    AccountDetails, AccountId, AccountKey, AccountModifications, CommunicationPreference, KeySet,
    PersonName,
};
