#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use choir_core::{AccountDetails, AccountId, ChoirError, Participant, ParticipantClient};
use choir_sync::{ChangeNotifier, ChoirStorageProvider, InMemoryCache};

/// Participant client whose fetches block until the test releases them.
pub struct GatedClient {
    gate: Semaphore,
    ungated: bool,
    fetches: AtomicUsize,
    responses: Mutex<VecDeque<Result<Participant, ChoirError>>>,
    posted: Mutex<Vec<(AccountId, Participant)>>,
    post_error: Mutex<Option<ChoirError>>,
    unenroll_error: Mutex<Option<ChoirError>>,
    unenrolls: AtomicUsize,
}

impl Default for GatedClient {
    fn default() -> Self {
        Self {
            gate: Semaphore::new(0),
            ungated: false,
            fetches: AtomicUsize::default(),
            responses: Mutex::default(),
            posted: Mutex::default(),
            post_error: Mutex::default(),
            unenroll_error: Mutex::default(),
            unenrolls: AtomicUsize::default(),
        }
    }
}

impl GatedClient {
    pub fn gated() -> Self {
        Self::default()
    }

    pub fn ungated() -> Self {
        Self {
            ungated: true,
            ..Self::default()
        }
    }

    /// Let `n` waiting (or future) fetches through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn respond_with(&self, response: Result<Participant, ChoirError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn fail_posts_with(&self, err: ChoirError) {
        *self.post_error.lock().unwrap() = Some(err);
    }

    pub fn fail_unenroll_with(&self, err: ChoirError) {
        *self.unenroll_error.lock().unwrap() = Some(err);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn unenrolls(&self) -> usize {
        self.unenrolls.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> Vec<(AccountId, Participant)> {
        self.posted.lock().unwrap().clone()
    }
}

pub fn participant(first: &str, email: &str) -> Participant {
    Participant {
        first_name: Some(first.to_string()),
        last_name: Some("Stanford".to_string()),
        email: Some(email.to_string()),
        mobile_phone: Some("555-0100".to_string()),
        home_phone: None,
    }
}

#[async_trait]
impl ParticipantClient for GatedClient {
    async fn get_participant(&self, _account_id: &AccountId) -> Result<Participant, ChoirError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.ungated {
            self.gate
                .acquire()
                .await
                .map_err(|_| ChoirError::Network("gate closed".into()))?
                .forget();
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(participant("Leland", "leland@x.com")))
    }

    async fn post_participant(
        &self,
        account_id: &AccountId,
        participant: &Participant,
    ) -> Result<(), ChoirError> {
        if let Some(err) = self.post_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.posted
            .lock()
            .unwrap()
            .push((account_id.clone(), participant.clone()));
        Ok(())
    }

    async fn unenroll_participant(&self, _account_id: &AccountId) -> Result<(), ChoirError> {
        self.unenrolls.fetch_add(1, Ordering::SeqCst);
        match self.unenroll_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Records every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(AccountId, AccountDetails)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(AccountId, AccountDetails)> {
        self.events.lock().unwrap().clone()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify_about_updated_details(&self, account_id: &AccountId, details: &AccountDetails) {
        self.events
            .lock()
            .unwrap()
            .push((account_id.clone(), details.clone()));
    }
}

pub struct Harness {
    pub provider: ChoirStorageProvider,
    pub client: Arc<GatedClient>,
    pub cache: Arc<InMemoryCache>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(client: GatedClient) -> Self {
        let client = Arc::new(client);
        let cache = Arc::new(InMemoryCache::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let provider = ChoirStorageProvider::new(
            client.clone(),
            cache.clone(),
            notifier.clone(),
            cache.clone(),
        );
        Self {
            provider,
            client,
            cache,
            notifier,
        }
    }
}

/// Wait until no refresh is registered for `account_id`.
pub async fn wait_for_idle(provider: &ChoirStorageProvider, account_id: &AccountId) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while provider.is_refreshing(account_id) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("refresh did not finish");
}

/// Wait until the client has seen `count` fetches.
pub async fn wait_for_fetches(client: &GatedClient, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.fetches() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("fetch was never issued");
}

/// Give spawned tasks time to run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
