//! Seam between the storage provider and the CHOIR participant endpoints.

use async_trait::async_trait;

use crate::error::ChoirError;
use crate::participant::Participant;
use crate::types::AccountId;

/// Network round trips against the participant record of one account.
///
/// Implementations: `choir_client::HttpParticipantClient` for a real site,
/// `choir_client::MockParticipantService` for tests and demos.
#[async_trait]
pub trait ParticipantClient: Send + Sync + 'static {
    /// Fetch the current participant record.
    async fn get_participant(&self, account_id: &AccountId) -> Result<Participant, ChoirError>;

    /// Create or replace the participant record.
    async fn post_participant(
        &self,
        account_id: &AccountId,
        participant: &Participant,
    ) -> Result<(), ChoirError>;

    /// Unenroll the participant and delete its remote record.
    async fn unenroll_participant(&self, account_id: &AccountId) -> Result<(), ChoirError>;
}
