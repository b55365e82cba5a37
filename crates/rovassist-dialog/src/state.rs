//! Per-session conversation state and the dialog phase machine.
//!
//! Phases of a turn:
//! - Idle -> AwaitingModel (manual request without a model)
//! - Idle -> AwaitingMode (manual request without a mode)
//! - Idle -> Fetching (enough information to call the services)
//! - Idle -> Presenting (help message, nothing to fetch)
//! - Fetching -> Presenting (results ready)
//! - Fetching -> Idle (collaborator failure)
//! - Presenting -> Idle (turn complete)
//!
//! The two awaiting phases behave like Idle for the next turn.

use std::fmt;

use serde::{Deserialize, Serialize};

use rovassist_core::types::{Lang, Mode};

use crate::error::DialogError;

/// What the session remembers between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Desired response shape. Once set it is never cleared by a turn.
    pub mode: Option<Mode>,
    /// Last non-empty utterance, in the working language.
    pub last_query_working: String,
    /// Last non-empty utterance as shown to the user.
    pub last_query_display: String,
    pub language: Lang,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(Lang::default())
    }
}

impl ConversationState {
    pub fn new(language: Lang) -> Self {
        Self {
            mode: None,
            last_query_working: String::new(),
            last_query_display: String::new(),
            language,
        }
    }

    /// Apply a mode suggested by the wording of an utterance.
    ///
    /// `None` leaves the current mode alone.
    pub fn apply_mode_hint(&mut self, hint: Option<Mode>) {
        if let Some(mode) = hint {
            if self.mode != Some(mode) {
                tracing::debug!(from = ?self.mode, to = %mode, "Mode hint applied");
            }
            self.mode = Some(mode);
        }
    }

    /// Explicit user selection; always wins.
    pub fn select_mode(&mut self, mode: Mode) {
        tracing::debug!(from = ?self.mode, to = %mode, "Mode selected");
        self.mode = Some(mode);
    }

    /// Remember the query of a turn that went on to fetch results.
    pub fn record_query(&mut self, working: &str, display: String) {
        self.last_query_working = working.to_string();
        self.last_query_display = display;
    }

    pub fn set_language(&mut self, language: Lang) {
        self.language = language;
    }

    pub fn to_json(&self) -> Result<String, DialogError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DialogError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where a session is in the turn lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogPhase {
    #[default]
    Idle,
    /// Waiting for the user to name a model.
    AwaitingModel,
    /// Waiting for the user to pick a response mode.
    AwaitingMode,
    /// Collaborator calls in progress.
    Fetching,
    /// Outcome being handed back to the front-end.
    Presenting,
}

impl fmt::Display for DialogPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogPhase::Idle => write!(f, "Idle"),
            DialogPhase::AwaitingModel => write!(f, "AwaitingModel"),
            DialogPhase::AwaitingMode => write!(f, "AwaitingMode"),
            DialogPhase::Fetching => write!(f, "Fetching"),
            DialogPhase::Presenting => write!(f, "Presenting"),
        }
    }
}

impl DialogPhase {
    /// Phases a session can sit in between turns.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            DialogPhase::Idle | DialogPhase::AwaitingModel | DialogPhase::AwaitingMode
        )
    }

    pub fn can_transition_to(&self, target: &DialogPhase) -> bool {
        match (self, target) {
            (DialogPhase::Fetching, DialogPhase::Presenting) => true,
            // Failure
            (DialogPhase::Fetching, DialogPhase::Idle) => true,
            (DialogPhase::Presenting, DialogPhase::Idle) => true,
            (from, DialogPhase::AwaitingModel)
            | (from, DialogPhase::AwaitingMode)
            | (from, DialogPhase::Fetching)
            | (from, DialogPhase::Presenting) => from.is_resting(),
            _ => false,
        }
    }
}

/// Validated phase transitions for one session.
///
/// Owned by the session, so unlike a shared machine it needs no locking.
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    phase: DialogPhase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> DialogPhase {
        self.phase
    }

    pub fn transition(&mut self, target: DialogPhase) -> Result<(), DialogError> {
        if self.phase.can_transition_to(&target) {
            tracing::trace!("Dialog phase: {} -> {}", self.phase, target);
            self.phase = target;
            Ok(())
        } else {
            Err(DialogError::InvalidTransition(self.phase, target))
        }
    }

    /// Force the machine back to Idle after an unexpected error.
    pub fn reset(&mut self) {
        if self.phase != DialogPhase::Idle {
            tracing::warn!("Dialog phase reset to Idle from {}", self.phase);
        }
        self.phase = DialogPhase::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================
