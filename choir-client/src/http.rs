//! Participant client for a real CHOIR site.
//!
//! Requests go through a blocking `ureq` agent on tokio's blocking pool.
//! Endpoint: `{server_url}/sites/{site_id}/participant`
//! - `GET`    fetch the record
//! - `POST`   create or replace the record
//! - `DELETE` unenroll

use std::sync::Arc;

use async_trait::async_trait;
use choir_core::{AccountId, ChoirConfig, ChoirError, Participant, ParticipantClient};

use crate::auth::{authorization_header, TokenProvider};

const USER_AGENT: &str = concat!("choir-client/", env!("CARGO_PKG_VERSION"));

pub struct HttpParticipantClient {
    agent: ureq::Agent,
    participant_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpParticipantClient {
    /// Build a client for the site in `config`. Socket timeouts come from
    /// `request_timeout_ms`.
    pub fn new(config: &ChoirConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        let timeout = config.request_timeout();
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            participant_url: config.participant_url(),
            tokens,
        }
    }

    pub fn participant_url(&self) -> &str {
        &self.participant_url
    }

    async fn execute<T, F>(
        &self,
        account_id: &AccountId,
        operation: &'static str,
        request: F,
    ) -> Result<T, ChoirError>
    where
        T: Send + 'static,
        F: FnOnce(ureq::Agent, String, String) -> Result<T, ChoirError> + Send + 'static,
    {
        let authorization = authorization_header(self.tokens.as_ref())?;
        let agent = self.agent.clone();
        let url = self.participant_url.clone();
        let result = tokio::task::spawn_blocking(move || request(agent, url, authorization))
            .await
            .map_err(|err| ChoirError::Network(format!("{operation} join error: {err}")))?;
        if let Err(err) = &result {
            tracing::debug!(
                account_id = %account_id,
                operation,
                error = %err,
                "participant request failed",
            );
        }
        result
    }
}

#[async_trait]
impl ParticipantClient for HttpParticipantClient {
    async fn get_participant(&self, account_id: &AccountId) -> Result<Participant, ChoirError> {
        self.execute(account_id, "getParticipant", |agent, url, authorization| {
            let response = agent
                .get(&url)
                .set("Accept", "application/json")
                .set("Authorization", &authorization)
                .call()
                .map_err(error_from_ureq)?;
            response
                .into_json::<Participant>()
                .map_err(ChoirError::decode)
        })
        .await
    }

    async fn post_participant(
        &self,
        account_id: &AccountId,
        participant: &Participant,
    ) -> Result<(), ChoirError> {
        let body = participant.clone();
        self.execute(account_id, "postParticipant", move |agent, url, authorization| {
            agent
                .post(&url)
                .set("Accept", "application/json")
                .set("Authorization", &authorization)
                .send_json(&body)
                .map(|_| ())
                .map_err(error_from_ureq)
        })
        .await
    }

    async fn unenroll_participant(&self, account_id: &AccountId) -> Result<(), ChoirError> {
        self.execute(account_id, "unenrollParticipant", |agent, url, authorization| {
            agent
                .delete(&url)
                .set("Authorization", &authorization)
                .call()
                .map(|_| ())
                .map_err(error_from_ureq)
        })
        .await
    }
}

fn error_from_ureq(err: ureq::Error) -> ChoirError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_string()
                .unwrap_or_else(|_| "Unknown error.".to_string());
            ChoirError::from_status(status, message.trim())
        }
        ureq::Error::Transport(transport) => ChoirError::Network(transport.to_string()),
    }
}
