//! In-memory stand-in for a CHOIR site.
//!
//! Returns stored participant records after a simulated network latency so
//! storage providers and the CLI can be exercised without a server.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use choir_core::{AccountId, ChoirError, Participant, ParticipantClient};

/// Simulated round-trip latency.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(300);

#[derive(Default)]
struct MockState {
    participants: HashMap<AccountId, Participant>,
    fetch_failures: VecDeque<ChoirError>,
    fetches: usize,
    posts: usize,
    unenrolls: usize,
}

pub struct MockParticipantService {
    latency: Duration,
    state: Mutex<MockState>,
}

impl Default for MockParticipantService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockParticipantService {
    pub fn new() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            state: Mutex::new(MockState::default()),
        }
    }

    /// A service with [`demo_participant`](Self::demo_participant) enrolled
    /// under `account_id`.
    pub fn demo(account_id: &AccountId) -> Self {
        Self::new().with_participant(account_id.clone(), Self::demo_participant())
    }

    pub fn demo_participant() -> Participant {
        Participant {
            first_name: Some("Leland".to_string()),
            last_name: Some("Stanford".to_string()),
            email: Some("leland@stanford.example".to_string()),
            mobile_phone: Some("+1 (555) 555-5555".to_string()),
            home_phone: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_participant(self, account_id: AccountId, participant: Participant) -> Self {
        self.lock().participants.insert(account_id, participant);
        self
    }

    /// Make the next fetch fail with `err`. Failures queue up in order.
    pub fn fail_next_fetch(&self, err: ChoirError) {
        self.lock().fetch_failures.push_back(err);
    }

    pub fn participant(&self, account_id: &AccountId) -> Option<Participant> {
        self.lock().participants.get(account_id).cloned()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts
    }

    pub fn unenroll_count(&self) -> usize {
        self.lock().unenrolls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn not_enrolled(account_id: &AccountId) -> ChoirError {
    ChoirError::NotFound {
        message: format!("No participant enrolled for {account_id}."),
    }
}

#[async_trait]
impl ParticipantClient for MockParticipantService {
    async fn get_participant(&self, account_id: &AccountId) -> Result<Participant, ChoirError> {
        self.lock().fetches += 1;
        self.simulate_latency().await;
        let mut state = self.lock();
        if let Some(err) = state.fetch_failures.pop_front() {
            return Err(err);
        }
        state
            .participants
            .get(account_id)
            .cloned()
            .ok_or_else(|| not_enrolled(account_id))
    }

    async fn post_participant(
        &self,
        account_id: &AccountId,
        participant: &Participant,
    ) -> Result<(), ChoirError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.posts += 1;
        state
            .participants
            .insert(account_id.clone(), participant.clone());
        Ok(())
    }

    async fn unenroll_participant(&self, account_id: &AccountId) -> Result<(), ChoirError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.unenrolls += 1;
        state
            .participants
            .remove(account_id)
            .map(|_| ())
            .ok_or_else(|| not_enrolled(account_id))
    }
}
