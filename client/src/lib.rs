//! Trex HTTP client library
//!
//! Sends prompts to the hosted Trex API and returns the generated text,
//! optionally constrained by a context free grammar or a regular expression.
//! Grammar and pattern validation happen server side; the client surfaces
//! the server's verdict as a distinct [`ClientError`] variant.
//!
//! ```rust,ignore
//! use trex_client::Client;
//!
//! let client = Client::new(None)?;
//! let result = client.generate_json("A user record for Ada", None).await?;
//! println!("{} ({} tokens)", result.text, result.token_count);
//! ```

mod client;
mod config;
mod grammar;
mod restructure;

pub use client::{Client, GenerationResult, DEFAULT_MAX_TOKENS};
pub use config::{ClientConfig, API_KEY_ENV, BASE_URL};
pub use grammar::{Grammar, JSON_GRAMMAR};

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("{var} must be set in the environment or passed into the client")]
    MissingApiKey { var: String },
    #[error("Invalid API key")]
    InvalidApiKey(String),
    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Trex API returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("Could not reach Trex API: {0}")]
    Connection(String),
}

impl ClientError {
    pub fn error_type(&self) -> &str {
        match self {
            ClientError::MissingApiKey { .. } => "configuration",
            ClientError::InvalidApiKey(_) => "invalid_api_key",
            ClientError::InvalidGrammar(_) => "invalid_grammar",
            ClientError::InvalidPattern(_) => "invalid_pattern",
            ClientError::Http { .. } | ClientError::Connection(_) => "transport",
        }
    }

    /// HTTP or network level failure, as opposed to a rejected input
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http { .. } | ClientError::Connection(_))
    }

    /// Status code of the response, if one was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::InvalidApiKey(_) => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let err = Self::Connection(err.to_string());
        tracing::error!("{err}");
        err
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_types_group_transport_failures() {
        let http = ClientError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let connection = ClientError::Connection("refused".to_string());

        assert_eq!(http.error_type(), "transport");
        assert_eq!(connection.error_type(), "transport");
        assert!(http.is_transport());
        assert!(connection.is_transport());
        assert_eq!(http.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(connection.status(), None);
    }

    #[test]
    fn rejected_inputs_are_not_transport_failures() {
        for err in [
            ClientError::MissingApiKey {
                var: API_KEY_ENV.to_string(),
            },
            ClientError::InvalidApiKey("k".to_string()),
            ClientError::InvalidGrammar("Invalid grammar".to_string()),
            ClientError::InvalidPattern("Invalid regex".to_string()),
        ] {
            assert!(!err.is_transport(), "{err}");
        }
    }

    #[test]
    fn missing_key_message_names_variable() {
        let err = ClientError::MissingApiKey {
            var: "TREX_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "TREX_API_KEY must be set in the environment or passed into the client"
        );
    }
}
