//! Error types for choir-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the CHOIR participant service.
///
/// The first five variants are well-formed rejections from the server.
/// Malformed payloads are reported as [`ChoirError::Network`] via
/// [`ChoirError::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoirError {
    #[error("The server was unable to process the request. {message}")]
    InternalServerError { message: String },

    #[error("The server was unable to process the request. {message}")]
    BadRequest { message: String },

    #[error(
        "Not allowed to request the resource. This can be caused by an unverified email. {message}"
    )]
    Unauthorized { message: String },

    #[error("The participant record was not found. {message}")]
    NotFound { message: String },

    #[error("An unknown error occurred.")]
    Unknown,

    /// Transport failure, timeout, missing credentials or undecodable body.
    #[error("network failure: {0}")]
    Network(String),
}

impl ChoirError {
    /// Map an HTTP status code plus response text to a rejection.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ChoirError::BadRequest { message },
            401 | 403 => ChoirError::Unauthorized { message },
            404 => ChoirError::NotFound { message },
            500..=599 => ChoirError::InternalServerError { message },
            _ => ChoirError::Unknown,
        }
    }

    /// A malformed participant payload. Surfaces as a network failure.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        ChoirError::Network(format!("malformed participant payload: {err}"))
    }

    /// `true` when the server answered with a well-formed error body.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ChoirError::InternalServerError { .. }
                | ChoirError::BadRequest { .. }
                | ChoirError::Unauthorized { .. }
                | ChoirError::NotFound { .. }
                | ChoirError::Unknown
        )
    }
}

/// All errors that can arise from configuration loading and saving.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("config not found at {path}; run `choir config init` first")]
    NotFound { path: PathBuf },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_rejections() {
        assert!(matches!(
            ChoirError::from_status(400, "bad"),
            ChoirError::BadRequest { .. }
        ));
        assert!(matches!(
            ChoirError::from_status(401, "nope"),
            ChoirError::Unauthorized { .. }
        ));
        assert!(matches!(
            ChoirError::from_status(404, "gone"),
            ChoirError::NotFound { .. }
        ));
        assert!(matches!(
            ChoirError::from_status(503, "down"),
            ChoirError::InternalServerError { .. }
        ));
        assert_eq!(ChoirError::from_status(418, "teapot"), ChoirError::Unknown);
    }

    #[test]
    fn decode_failures_surface_as_network() {
        let err = ChoirError::decode("expected value at line 1");
        assert!(matches!(err, ChoirError::Network(_)));
        assert!(!err.is_rejection());
        assert!(err.to_string().contains("malformed participant payload"));
    }

    #[test]
    fn unauthorized_message_mentions_unverified_email() {
        let err = ChoirError::Unauthorized {
            message: "token expired".into(),
        };
        assert!(err.is_rejection());
        assert!(err.to_string().contains("unverified email"));
        assert!(err.to_string().contains("token expired"));
    }
}
