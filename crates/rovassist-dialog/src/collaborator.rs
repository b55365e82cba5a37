//! Traits for the external services the dialog engine calls.
//!
//! The engine only decides when and with what arguments to call these; it
//! never searches, answers or translates on its own. Timeouts are the
//! implementation's business and are reported as [`CollaboratorError::Timeout`].

use async_trait::async_trait;

use rovassist_core::types::{
    AnswerRequest, AnswerResponse, Lang, SearchRequest, SearchResponse,
};

use crate::error::CollaboratorError;

/// Document search over the manual library.
#[async_trait]
pub trait SearchCollaborator: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, CollaboratorError>;
}

/// Question answering for specific technical facts.
#[async_trait]
pub trait AnswerCollaborator: Send + Sync {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError>;
}

/// Text translation.
///
/// `Ok(None)` or an empty string means "no usable translation"; callers fall
/// back to the original text.
#[async_trait]
pub trait TranslateCollaborator: Send + Sync {
    async fn translate(&self, text: &str, target: Lang)
        -> Result<Option<String>, CollaboratorError>;
}
