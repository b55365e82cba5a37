//! Error types for the dialog engine.

use std::fmt;

use rovassist_core::error::RovError;

use crate::state::DialogPhase;

/// External service a collaborator call went to.
///
/// Translation has no entry: its failures fall back to the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Search,
    Answer,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Search => write!(f, "search"),
            Service::Answer => write!(f, "answer"),
        }
    }
}

/// Failure reported by a collaborator implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service responded with status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the speech capability layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),
    #[error("voice capture is already active")]
    AlreadyActive,
    #[error("voice capture is not active")]
    NotActive,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Errors from the dialog engine.
///
/// Recoverable conditions (unresolved model, ambiguous mode, missing
/// translation, missing summary) never appear here; they become turn outcomes.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("{service} service failed: {source}")]
    Collaborator {
        service: Service,
        #[source]
        source: CollaboratorError,
    },
    #[error("utterance exceeds maximum length of {0} characters")]
    UtteranceTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("session store error: {0}")]
    Session(String),
    #[error("a turn is already in flight for session {0}")]
    Busy(uuid::Uuid),
    #[error("invalid dialog transition: {0} -> {1}")]
    InvalidTransition(DialogPhase, DialogPhase),
    #[error("lexicon error: {0}")]
    Lexicon(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("voice error: {0}")]
    Voice(#[from] VoiceError),
}

impl DialogError {
    pub fn collaborator(service: Service, source: CollaboratorError) -> Self {
        DialogError::Collaborator { service, source }
    }

    /// True for failures the user can retry by resubmitting the turn.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DialogError::Collaborator { .. } | DialogError::Busy(_))
    }
}

impl From<serde_json::Error> for DialogError {
    fn from(err: serde_json::Error) -> Self {
        DialogError::Serialization(err.to_string())
    }
}

impl From<RovError> for DialogError {
    fn from(err: RovError) -> Self {
        DialogError::Lexicon(err.to_string())
    }
}
