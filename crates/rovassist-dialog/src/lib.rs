//! Dialog and intent routing engine for rovassist.
//!
//! Turns a technician's utterance into an intent, resolves the equipment
//! model and response mode, and drives the search, answer and translation
//! services for one turn at a time per session.

pub mod collaborator;
pub mod entity;
pub mod error;
pub mod language;
pub mod mock;
pub mod mode;
pub mod orchestrator;
pub mod response;
pub mod router;
pub mod session;
pub mod state;
pub mod voice;

pub use collaborator::{AnswerCollaborator, SearchCollaborator, TranslateCollaborator};
pub use entity::EntityResolver;
pub use error::{CollaboratorError, DialogError, Service, VoiceError};
pub use language::LanguageNormalizer;
pub use mock::{MockAnswer, MockSearch, MockTranslate};
pub use mode::ModeSelector;
pub use orchestrator::{
    apply_manual_override, Clarification, Collaborators, DialogOrchestrator, Notice, NoticeKind,
    TurnOutcome,
};
pub use router::{Predicate, RouteMatch, Rule, RuleRouter};
pub use session::{Session, SessionManager, SessionSummary, TurnRecord};
pub use state::{ConversationState, DialogPhase, PhaseMachine};
pub use voice::{
    MockCapture, MockSynthesis, SilentSynthesis, SpeechCapture, SpeechSynthesis,
    UnavailableCapture, VoiceController,
};
