//! Error type for Ontology Service calls.

use thiserror::Error;

/// Errors returned by an [`OntologyApi`](crate::OntologyApi) implementation.
///
/// Nothing here is retried: every failure is terminal for the user action that
/// triggered it.
#[derive(Debug, Error, Clone)]
pub enum OntologyError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("ontology service unreachable: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("ontology service returned {status}: {}", message.as_deref().unwrap_or("no details"))]
    Backend {
        status: u16,
        /// Human-readable message extracted from the response body, if any.
        message: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The requested resource does not exist.
    #[error("not found")]
    NotFound,
}

impl OntologyError {
    /// Generic text shown when the backend gave no usable message.
    pub const FALLBACK_MESSAGE: &'static str = "Something went wrong. Please try again.";

    /// Message suitable for a dismissible error banner.
    ///
    /// Prefers the backend's own wording and falls back to a generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            Self::NotFound => "The requested item no longer exists.".to_string(),
            _ => Self::FALLBACK_MESSAGE.to_string(),
        }
    }

    /// HTTP status to relay to the caller of the admin surface.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Backend { status, .. } => *status,
            Self::NotFound => 404,
            Self::Transport(_) | Self::Decode(_) => 502,
        }
    }
}

impl From<reqwest::Error> for OntologyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
