//! Bilingual normalization around the dialog engine.
//!
//! Classification and resolution work in the working language. Utterances
//! are translated into it on the way in and messages are translated out of it
//! on the way back. A missing translation never fails a turn: the text is
//! passed through unchanged.
//!
//! Translation is lossy, so `from_working(to_working(x))` is not expected to
//! return `x`.

use std::sync::Arc;

use rovassist_core::types::{Answer, Lang};

use crate::collaborator::TranslateCollaborator;

/// Moves text between the user's language and the working language.
#[derive(Clone)]
pub struct LanguageNormalizer {
    translator: Arc<dyn TranslateCollaborator>,
    working: Lang,
}

impl std::fmt::Debug for LanguageNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageNormalizer")
            .field("working", &self.working)
            .finish()
    }
}

impl LanguageNormalizer {
    pub fn new(translator: Arc<dyn TranslateCollaborator>, working: Lang) -> Self {
        Self { translator, working }
    }

    pub fn working(&self) -> Lang {
        self.working
    }

    /// Translate user text into the working language.
    pub async fn to_working(&self, text: &str, active: Lang) -> String {
        if active == self.working {
            return text.to_string();
        }
        self.translate_or_original(text, self.working).await
    }

    /// Translate working-language text into the user's language.
    pub async fn from_working(&self, text: &str, active: Lang) -> String {
        if active == self.working {
            return text.to_string();
        }
        self.translate_or_original(text, active).await
    }

    /// Translate the natural-language parts of an answer.
    ///
    /// The answer text and each pinout signal label are translated one by one;
    /// pins, conversions and citations are left as they are.
    pub async fn answer_from_working(&self, mut answer: Answer, active: Lang) -> Answer {
        if active == self.working {
            return answer;
        }
        for pin in answer.pinout.iter_mut() {
            pin.signal = self.translate_or_original(&pin.signal, active).await;
        }
        if !answer.text.is_empty() {
            answer.text = self.translate_or_original(&answer.text, active).await;
        }
        answer
    }

    async fn translate_or_original(&self, text: &str, target: Lang) -> String {
        match self.translator.translate(text, target).await {
            Ok(Some(translated)) if !translated.trim().is_empty() => translated,
            Ok(_) => {
                tracing::debug!(target_lang = %target, "No translation returned, using original text");
                text.to_string()
            }
            Err(e) => {
                tracing::warn!(target_lang = %target, error = %e, "Translation unavailable, using original text");
                text.to_string()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
