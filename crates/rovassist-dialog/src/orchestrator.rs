//! Dialog orchestrator: runs one turn from raw utterance to outcome.
//!
//! Wires the language normalizer, entity resolver, mode selector and rule
//! router together, decides which collaborator calls a turn needs and
//! produces a [`TurnOutcome`] in the user's language.
//!
//! A turn works on a copy of the session's [`ConversationState`] and only
//! commits it when the turn succeeds, so a failed collaborator call leaves the
//! session exactly as it was.

use std::sync::Arc;

use serde::Serialize;

use rovassist_core::config::{DialogConfig, RovConfig};
use rovassist_core::types::{
    Answer, AnswerRequest, Candidate, Intent, Lang, Mode, SearchRequest,
};

use crate::collaborator::{AnswerCollaborator, SearchCollaborator, TranslateCollaborator};
use crate::entity::EntityResolver;
use crate::error::{DialogError, Service};
use crate::language::LanguageNormalizer;
use crate::mode::ModeSelector;
use crate::response;
use crate::router::RuleRouter;
use crate::state::{ConversationState, DialogPhase, PhaseMachine};

/// Word that forces a manual request regardless of the matched rule.
const MANUAL_KEYWORD: &str = "manual";

// =============================================================================
// Outcomes
// =============================================================================

/// What the engine needs from the user before it can fetch anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clarification {
    Model { known_models: Vec<String> },
    Mode { options: Vec<Mode> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A summary was asked for but none of the files has one.
    SummaryUnavailable,
}

/// Non-fatal condition reported alongside results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Result of one turn. Every variant except `Ignored` carries a message in
/// the session's active language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Empty input; nothing happened.
    Ignored,
    Clarification {
        clarification: Clarification,
        intent: Intent,
        /// Model resolved before the engine stopped to ask.
        model: Option<String>,
        message: String,
    },
    Help {
        message: String,
        model: Option<String>,
    },
    Results {
        intent: Intent,
        model: String,
        mode: Mode,
        message: String,
        candidates: Vec<Candidate>,
        answer: Option<Answer>,
        notice: Option<Notice>,
    },
}

impl TurnOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnOutcome::Ignored => "ignored",
            TurnOutcome::Clarification { .. } => "clarification",
            TurnOutcome::Help { .. } => "help",
            TurnOutcome::Results { .. } => "results",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            TurnOutcome::Ignored => None,
            TurnOutcome::Clarification { message, .. }
            | TurnOutcome::Help { message, .. }
            | TurnOutcome::Results { message, .. } => Some(message),
        }
    }
}

/// Upgrade an intent when the utterance literally mentions a manual.
///
/// `RequestManualWithSummary` is already a manual request and is kept.
pub fn apply_manual_override(intent: Intent, working_text: &str) -> Intent {
    let mentions_manual = working_text.to_lowercase().contains(MANUAL_KEYWORD);
    match intent {
        Intent::Disambiguate | Intent::RequestSpecificInfo if mentions_manual => {
            Intent::RequestManual
        }
        other => other,
    }
}

// =============================================================================
// DialogOrchestrator
// =============================================================================

/// External services used by the orchestrator.
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchCollaborator>,
    pub answer: Arc<dyn AnswerCollaborator>,
    pub translate: Arc<dyn TranslateCollaborator>,
}

/// Per-turn dialog engine. Holds no session state of its own and can be
/// shared by every session.
pub struct DialogOrchestrator {
    router: Arc<RuleRouter>,
    resolver: Arc<EntityResolver>,
    modes: ModeSelector,
    normalizer: LanguageNormalizer,
    search: Arc<dyn SearchCollaborator>,
    answer: Arc<dyn AnswerCollaborator>,
    default_model: String,
    unit_kinds: Vec<String>,
}

impl DialogOrchestrator {
    pub fn new(
        router: Arc<RuleRouter>,
        resolver: Arc<EntityResolver>,
        collaborators: Collaborators,
        config: &DialogConfig,
    ) -> Self {
        Self {
            router,
            resolver,
            modes: ModeSelector::default(),
            normalizer: LanguageNormalizer::new(collaborators.translate, Lang::En),
            search: collaborators.search,
            answer: collaborators.answer,
            default_model: config.default_model.clone(),
            unit_kinds: config.unit_kinds.clone(),
        }
    }

    /// Build the router and resolver from configuration.
    pub fn from_config(config: &RovConfig, collaborators: Collaborators) -> Result<Self, DialogError> {
        let rules = config.lexicon.load_rules()?;
        let router = RuleRouter::from_rules(&rules.rules)?;
        let resolver = EntityResolver::new(&config.lexicon.models);
        Ok(Self::new(
            Arc::new(router),
            Arc::new(resolver),
            collaborators,
            &config.dialog,
        ))
    }

    pub fn known_models(&self) -> Vec<String> {
        self.resolver.known_models()
    }

    /// The help message in `lang`.
    pub async fn help_message(&self, lang: Lang) -> String {
        self.normalizer.from_working(response::HELP, lang).await
    }

    /// Run one turn.
    ///
    /// On success the returned outcome is final and `state` holds the
    /// post-turn state. On error `state` is untouched and the phase is back
    /// to Idle; the user retries by submitting the turn again.
    pub async fn handle_turn(
        &self,
        state: &mut ConversationState,
        phase: &mut PhaseMachine,
        raw: &str,
    ) -> Result<TurnOutcome, DialogError> {
        let raw = raw.trim();
        if raw.is_empty() {
            tracing::debug!("Ignoring empty utterance");
            return Ok(TurnOutcome::Ignored);
        }
        if !phase.current().is_resting() {
            phase.reset();
        }

        let mut next = state.clone();
        match self.run_turn(&mut next, phase, raw).await {
            Ok(outcome) => {
                *state = next;
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, phase = %phase.current(), "Turn failed; conversation state kept");
                if phase.current() == DialogPhase::Fetching {
                    phase.transition(DialogPhase::Idle)?;
                } else {
                    phase.reset();
                }
                Err(e)
            }
        }
    }

    async fn run_turn(
        &self,
        state: &mut ConversationState,
        phase: &mut PhaseMachine,
        raw: &str,
    ) -> Result<TurnOutcome, DialogError> {
        let active = state.language;
        let working_text = self.normalizer.to_working(raw, active).await;
        let display =
            response::display_query(raw, &working_text, active, self.normalizer.working());

        let model = self.resolver.resolve_model(&working_text);
        state.apply_mode_hint(self.modes.suggest_mode(&working_text));

        let route = self.router.classify_match(&working_text);
        let intent = apply_manual_override(route.intent, &working_text);
        tracing::info!(
            lang = %active,
            intent = %intent,
            routed = %route.intent,
            topic = route.topic.as_deref().unwrap_or(""),
            model = model.as_deref().unwrap_or(""),
            mode = ?state.mode,
            "Turn classified"
        );

        // Clarifications keep the previous query; only the mode hint sticks.
        match intent {
            Intent::RequestManual => {
                let Some(model) = model else {
                    return self.clarify_model(phase, intent, active).await;
                };
                match state.mode {
                    Some(mode) => {
                        state.record_query(&working_text, display);
                        self.fetch_manual(state, phase, intent, &working_text, &model, mode)
                            .await
                    }
                    None => self.clarify_mode(phase, intent, model, active).await,
                }
            }
            Intent::RequestManualWithSummary => {
                let Some(model) = model else {
                    return self.clarify_model(phase, intent, active).await;
                };
                state.record_query(&working_text, display);
                state.apply_mode_hint(Some(Mode::FileAndSummary));
                self.fetch_manual(
                    state,
                    phase,
                    intent,
                    &working_text,
                    &model,
                    Mode::FileAndSummary,
                )
                .await
            }
            Intent::RequestSpecificInfo => {
                let model = model.unwrap_or_else(|| self.default_model.clone());
                state.record_query(&working_text, display);
                self.fetch_specific_info(state, phase, &working_text, &model)
                    .await
            }
            Intent::Disambiguate => {
                state.last_query_display = display;
                phase.transition(DialogPhase::Presenting)?;
                let message = self.help_message(active).await;
                phase.transition(DialogPhase::Idle)?;
                Ok(TurnOutcome::Help { message, model })
            }
        }
    }

    async fn clarify_model(
        &self,
        phase: &mut PhaseMachine,
        intent: Intent,
        active: Lang,
    ) -> Result<TurnOutcome, DialogError> {
        phase.transition(DialogPhase::AwaitingModel)?;
        let known_models = self.resolver.known_models();
        let message = self
            .normalizer
            .from_working(&response::model_prompt(&known_models), active)
            .await;
        Ok(TurnOutcome::Clarification {
            clarification: Clarification::Model { known_models },
            intent,
            model: None,
            message,
        })
    }

    async fn clarify_mode(
        &self,
        phase: &mut PhaseMachine,
        intent: Intent,
        model: String,
        active: Lang,
    ) -> Result<TurnOutcome, DialogError> {
        phase.transition(DialogPhase::AwaitingMode)?;
        let message = self
            .normalizer
            .from_working(response::MODE_OPTIONS, active)
            .await;
        Ok(TurnOutcome::Clarification {
            clarification: Clarification::Mode {
                options: Mode::ALL.to_vec(),
            },
            intent,
            model: Some(model),
            message,
        })
    }

    async fn fetch_manual(
        &self,
        state: &mut ConversationState,
        phase: &mut PhaseMachine,
        intent: Intent,
        query: &str,
        model: &str,
        mode: Mode,
    ) -> Result<TurnOutcome, DialogError> {
        phase.transition(DialogPhase::Fetching)?;
        let want_summary = mode == Mode::FileAndSummary;
        let request = SearchRequest {
            query: query.to_string(),
            model: Some(model.to_string()),
            mode,
            want_summary,
        };
        let found = self
            .search
            .search(&request)
            .await
            .map_err(|e| DialogError::collaborator(Service::Search, e))?;

        let active = state.language;
        let mut mode = mode;
        let mut notice = None;
        if want_summary && !found.has_summary() {
            tracing::info!(model, candidates = found.candidates.len(), "No summary available; degrading to file only");
            mode = Mode::FileOnly;
            state.mode = Some(Mode::FileOnly);
            notice = Some(Notice {
                kind: NoticeKind::SummaryUnavailable,
                message: self
                    .normalizer
                    .from_working(response::SUMMARY_UNAVAILABLE, active)
                    .await,
            });
        }

        let message = self
            .normalizer
            .from_working(&response::files_found(found.candidates.len(), model), active)
            .await;
        phase.transition(DialogPhase::Presenting)?;
        let outcome = TurnOutcome::Results {
            intent,
            model: model.to_string(),
            mode,
            message,
            candidates: found.candidates,
            answer: None,
            notice,
        };
        phase.transition(DialogPhase::Idle)?;
        Ok(outcome)
    }

    async fn fetch_specific_info(
        &self,
        state: &mut ConversationState,
        phase: &mut PhaseMachine,
        query: &str,
        model: &str,
    ) -> Result<TurnOutcome, DialogError> {
        phase.transition(DialogPhase::Fetching)?;
        let request = AnswerRequest {
            query: query.to_string(),
            model: model.to_string(),
            units: self.unit_kinds.clone(),
        };
        let answered = self
            .answer
            .answer(&request)
            .await
            .map_err(|e| DialogError::collaborator(Service::Answer, e))?;

        let active = state.language;
        let answer = match answered.answer {
            Some(answer) => Some(self.normalizer.answer_from_working(answer, active).await),
            None => None,
        };

        let related = self
            .search
            .search(&SearchRequest {
                query: query.to_string(),
                model: Some(model.to_string()),
                mode: Mode::FileOnly,
                want_summary: false,
            })
            .await
            .map_err(|e| DialogError::collaborator(Service::Search, e))?;

        let message = match answer {
            Some(ref a) if !a.text.is_empty() => a.text.clone(),
            _ => {
                self.normalizer
                    .from_working(response::SHOWING_RESULTS, active)
                    .await
            }
        };
        tracing::debug!(
            model,
            has_answer = answer.is_some(),
            related = related.candidates.len(),
            "Specific info fetched"
        );

        phase.transition(DialogPhase::Presenting)?;
        let outcome = TurnOutcome::Results {
            intent: Intent::RequestSpecificInfo,
            model: model.to_string(),
            mode: Mode::SpecificInfo,
            message,
            candidates: related.candidates,
            answer,
            notice: None,
        };
        phase.transition(DialogPhase::Idle)?;
        Ok(outcome)
    }
}

// =============================================================================
// Tests
// =============================================================================
