//! Bearer tokens attached to every participant request.

use choir_core::ChoirError;

/// Supplies the bearer token for the signed-in participant.
///
/// Called once per request so rotated tokens are picked up.
pub trait TokenProvider: Send + Sync + 'static {
    fn bearer_token(&self) -> Result<String, ChoirError>;
}

/// A fixed token, mostly for tests and scripts.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Result<String, ChoirError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvToken {
    pub var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvToken {
    fn bearer_token(&self) -> Result<String, ChoirError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ChoirError::Network(format!(
                "no authenticated user: ${} is not set",
                self.var
            ))),
        }
    }
}

pub(crate) fn authorization_header(provider: &dyn TokenProvider) -> Result<String, ChoirError> {
    Ok(format!("Bearer {}", provider.bearer_token()?))
}
