//! # choir-client
//!
//! [`ParticipantClient`](choir_core::ParticipantClient) implementations:
//! [`HttpParticipantClient`] talks to a CHOIR site over HTTPS with a bearer
//! token, [`MockParticipantService`] keeps records in memory.

pub mod auth;
pub mod http;
pub mod mock;

pub use auth::{EnvToken, StaticToken, TokenProvider};
pub use http::HttpParticipantClient;
pub use mock::MockParticipantService;
