//! Session management.
//!
//! Each session owns its [`ConversationState`] and is guarded by its own
//! `tokio::sync::Mutex`. Turns for one session queue on that lock in arrival
//! order, so two turns never interleave; turns for different sessions run
//! independently.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use rovassist_core::config::DialogConfig;
use rovassist_core::types::{Intent, Lang, Mode};

use crate::error::DialogError;
use crate::orchestrator::{DialogOrchestrator, TurnOutcome};
use crate::state::{ConversationState, PhaseMachine};

// =============================================================================
// Types
// =============================================================================

/// One entry of a session's turn history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub at: DateTime<Utc>,
    pub utterance: String,
    /// `ignored`, `clarification`, `help`, `results` or `error`.
    pub outcome: String,
    pub intent: Option<Intent>,
    pub model: Option<String>,
}

impl TurnRecord {
    fn from_result(utterance: &str, result: &Result<TurnOutcome, DialogError>) -> Self {
        let (outcome, intent, model) = match result {
            Ok(TurnOutcome::Results { intent, model, .. }) => {
                ("results", Some(*intent), Some(model.clone()))
            }
            Ok(TurnOutcome::Clarification { intent, model, .. }) => {
                ("clarification", Some(*intent), model.clone())
            }
            Ok(TurnOutcome::Help { model, .. }) => {
                ("help", Some(Intent::Disambiguate), model.clone())
            }
            Ok(TurnOutcome::Ignored) => ("ignored", None, None),
            Err(_) => ("error", None, None),
        };
        Self {
            at: Utc::now(),
            utterance: utterance.to_string(),
            outcome: outcome.to_string(),
            intent,
            model,
        }
    }
}

/// A conversation with one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub state: ConversationState,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub history: VecDeque<TurnRecord>,
    #[serde(skip)]
    phase: PhaseMachine,
}

impl Session {
    fn new(language: Lang) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: ConversationState::new(language),
            created_at: now,
            last_active: now,
            history: VecDeque::new(),
            phase: PhaseMachine::new(),
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_active > timeout
    }

    fn push_history(&mut self, record: TurnRecord, limit: usize) {
        self.history.push_back(record);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }
}

/// Lightweight view of a session for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub language: Lang,
    pub mode: Option<Mode>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub turns: usize,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            language: s.state.language,
            mode: s.state.mode,
            created_at: s.created_at,
            last_active: s.last_active,
            turns: s.history.len(),
        }
    }
}

type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

// =============================================================================
// SessionManager
// =============================================================================

/// Owns all sessions and routes turns to the shared orchestrator.
pub struct SessionManager {
    orchestrator: Arc<DialogOrchestrator>,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    default_language: Lang,
    max_utterance_chars: usize,
    session_timeout: Duration,
    history_turns: usize,
}

impl SessionManager {
    pub fn new(orchestrator: Arc<DialogOrchestrator>, config: &DialogConfig) -> Self {
        Self {
            orchestrator,
            sessions: Mutex::new(HashMap::new()),
            default_language: config.default_language,
            max_utterance_chars: config.max_utterance_chars,
            session_timeout: Duration::minutes(i64::from(config.session_timeout_minutes)),
            history_turns: config.history_turns,
        }
    }

    pub fn orchestrator(&self) -> &DialogOrchestrator {
        &self.orchestrator
    }

    /// Start a session in `language`, or the configured default.
    pub fn create_session(&self, language: Option<Lang>) -> Result<Uuid, DialogError> {
        let session = Session::new(language.unwrap_or(self.default_language));
        let id = session.id;
        self.insert(session)?;
        tracing::info!(session = %id, "Session created");
        Ok(id)
    }

    pub fn delete_session(&self, id: Uuid) -> Result<(), DialogError> {
        let mut sessions = self.lock_sessions()?;
        match sessions.remove(&id) {
            Some(_) => {
                tracing::info!(session = %id, "Session deleted");
                Ok(())
            }
            None => Err(DialogError::SessionNotFound(id)),
        }
    }

    /// Summaries of all sessions. Waits for turns in flight.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = match self.sessions.lock() {
            Ok(s) => s.values().cloned().collect(),
            Err(_) => return vec![],
        };
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(SessionSummary::from(&*handle.lock().await));
        }
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    /// Copy of a session's conversation state.
    pub async fn state(&self, id: Uuid) -> Result<ConversationState, DialogError> {
        let handle = self.handle(id)?;
        let session = handle.lock().await;
        Ok(session.state.clone())
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<TurnRecord>, DialogError> {
        let handle = self.handle(id)?;
        let session = handle.lock().await;
        Ok(session.history.iter().cloned().collect())
    }

    /// Submit a turn, waiting behind any turn already running for the session.
    pub async fn submit_turn(&self, id: Uuid, text: &str) -> Result<TurnOutcome, DialogError> {
        self.check_length(text)?;
        let handle = self.handle(id)?;
        let mut session = handle.lock().await;
        self.run(&mut session, text).await
    }

    /// Submit a turn only if none is running for the session.
    pub async fn try_submit_turn(&self, id: Uuid, text: &str) -> Result<TurnOutcome, DialogError> {
        self.check_length(text)?;
        let handle = self.handle(id)?;
        let mut session = handle.try_lock().map_err(|_| {
            tracing::debug!(session = %id, "Turn rejected; session busy");
            DialogError::Busy(id)
        })?;
        self.run(&mut session, text).await
    }

    /// Explicit mode selection between turns.
    pub async fn select_mode(&self, id: Uuid, mode: Mode) -> Result<(), DialogError> {
        let handle = self.handle(id)?;
        let mut session = handle.lock().await;
        session.state.select_mode(mode);
        session.last_active = Utc::now();
        Ok(())
    }

    pub async fn set_language(&self, id: Uuid, language: Lang) -> Result<(), DialogError> {
        let handle = self.handle(id)?;
        let mut session = handle.lock().await;
        tracing::info!(session = %id, from = %session.state.language, to = %language, "Language changed");
        session.state.set_language(language);
        session.last_active = Utc::now();
        Ok(())
    }

    /// Serialize a session to JSON.
    pub async fn export_session(&self, id: Uuid) -> Result<String, DialogError> {
        let handle = self.handle(id)?;
        let session = handle.lock().await;
        Ok(serde_json::to_string(&*session)?)
    }

    /// Restore a session previously produced by [`export_session`](Self::export_session).
    ///
    /// Replaces any live session with the same id.
    pub fn import_session(&self, json: &str) -> Result<Uuid, DialogError> {
        let mut session: Session = serde_json::from_str(json)?;
        session.last_active = Utc::now();
        let id = session.id;
        self.insert(session)?;
        tracing::info!(session = %id, "Session restored");
        Ok(id)
    }

    /// Drop sessions idle for longer than the timeout. Returns how many.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut sessions) = self.sessions.lock() else {
            return 0;
        };
        let before = sessions.len();
        // A session with a turn in flight is busy, not idle.
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_expired_at(now, self.session_timeout),
            Err(_) => true,
        });
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged, "Expired sessions removed");
        }
        purged
    }

    // -- Private helpers --

    async fn run(&self, session: &mut Session, text: &str) -> Result<TurnOutcome, DialogError> {
        let span = tracing::info_span!("turn", session = %session.id);
        let Session { state, phase, .. } = &mut *session;
        let result = self
            .orchestrator
            .handle_turn(state, phase, text)
            .instrument(span)
            .await;

        if !matches!(result, Ok(TurnOutcome::Ignored)) {
            let record = TurnRecord::from_result(text.trim(), &result);
            session.push_history(record, self.history_turns);
        }
        session.last_active = Utc::now();
        result
    }

    fn check_length(&self, text: &str) -> Result<(), DialogError> {
        if text.chars().count() > self.max_utterance_chars {
            return Err(DialogError::UtteranceTooLong(self.max_utterance_chars));
        }
        Ok(())
    }

    fn insert(&self, session: Session) -> Result<(), DialogError> {
        let mut sessions = self.lock_sessions()?;
        sessions.insert(session.id, Arc::new(tokio::sync::Mutex::new(session)));
        Ok(())
    }

    /// Look up a live session, removing it if it has expired.
    fn handle(&self, id: Uuid) -> Result<SessionHandle, DialogError> {
        let mut sessions = self.lock_sessions()?;
        let handle = sessions
            .get(&id)
            .cloned()
            .ok_or(DialogError::SessionNotFound(id))?;
        let expired = handle
            .try_lock()
            .map(|s| s.is_expired_at(Utc::now(), self.session_timeout))
            .unwrap_or(false);
        if expired {
            sessions.remove(&id);
            tracing::info!(session = %id, "Session expired");
            return Err(DialogError::SessionNotFound(id));
        }
        Ok(handle)
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>>, DialogError> {
        self.sessions
            .lock()
            .map_err(|e| DialogError::Session(format!("session lock poisoned: {}", e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::mock::{MockAnswer, MockSearch, MockTranslate};
    use crate::orchestrator::Collaborators;
    use rovassist_core::config::RovConfig;
    use rovassist_core::types::Candidate;

    fn manager_with(config: RovConfig, search: MockSearch) -> SessionManager {
        let collaborators = Collaborators {
            search: Arc::new(search),
            answer: Arc::new(MockAnswer::new(None)),
            translate: Arc::new(MockTranslate::unavailable()),
        };
        let orch = DialogOrchestrator::from_config(&config, collaborators).unwrap();
        SessionManager::new(Arc::new(orch), &config.dialog)
    }

    fn manager() -> SessionManager {
        let candidate = Candidate {
            path: "manuals/titan_4.pdf".into(),
            title: "Titan 4 Manual".into(),
            tags: vec![],
            summary: None,
            summary_available: false,
        };
        manager_with(RovConfig::default(), MockSearch::new(vec![candidate]))
    }

    #[tokio::test]
    async fn test_create_and_list_sessions() {
        let mgr = manager();
        let a = mgr.create_session(None).unwrap();
        let b = mgr.create_session(Some(Lang::Pt)).unwrap();
        assert_ne!(a, b);

        let list = mgr.list_sessions().await;
        assert_eq!(list.len(), 2);
        assert_eq!(mgr.state(a).await.unwrap().language, Lang::En);
        assert_eq!(mgr.state(b).await.unwrap().language, Lang::Pt);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        mgr.delete_session(id).unwrap();
        assert!(matches!(mgr.delete_session(id), Err(DialogError::SessionNotFound(_))));
        assert!(matches!(
            mgr.submit_turn(id, "T4 manual").await,
            Err(DialogError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_turns_update_state_and_history() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();

        let outcome = mgr.submit_turn(id, "T4 manual").await.unwrap();
        assert_eq!(outcome.kind(), "clarification");

        mgr.select_mode(id, Mode::FileOnly).await.unwrap();
        let outcome = mgr.submit_turn(id, "T4 manual").await.unwrap();
        assert_eq!(outcome.kind(), "results");

        let history = mgr.history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].outcome, "clarification");
        assert_eq!(history[0].intent, Some(Intent::RequestManual));
        assert_eq!(history[0].model.as_deref(), Some("Titan 4"));
        assert_eq!(history[1].intent, Some(Intent::RequestManual));
        assert_eq!(history[1].model.as_deref(), Some("Titan 4"));
        assert_eq!(mgr.state(id).await.unwrap().mode, Some(Mode::FileOnly));
    }

    #[tokio::test]
    async fn test_help_turn_records_intent_and_model() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        mgr.submit_turn(id, "duplex hello").await.unwrap();
        mgr.submit_turn(id, "the manual please").await.unwrap();

        let history = mgr.history(id).await.unwrap();
        assert_eq!(history[0].outcome, "help");
        assert_eq!(history[0].intent, Some(Intent::Disambiguate));
        assert_eq!(history[0].model.as_deref(), Some("Duplex Pump"));
        assert_eq!(history[1].outcome, "clarification");
        assert_eq!(history[1].intent, Some(Intent::RequestManual));
        assert!(history[1].model.is_none());
    }

    #[tokio::test]
    async fn test_empty_turn_not_recorded() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        assert_eq!(mgr.submit_turn(id, "  ").await.unwrap(), TurnOutcome::Ignored);
        assert!(mgr.history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let mut config = RovConfig::default();
        config.dialog.history_turns = 2;
        let mgr = manager_with(config, MockSearch::new(vec![]));
        let id = mgr.create_session(None).unwrap();
        for text in ["one", "two", "three"] {
            mgr.submit_turn(id, text).await.unwrap();
        }
        let history = mgr.history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].utterance, "two");
        assert_eq!(history[1].utterance, "three");
    }

    #[tokio::test]
    async fn test_utterance_too_long() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        let long = "a".repeat(2001);
        assert!(matches!(
            mgr.submit_turn(id, &long).await,
            Err(DialogError::UtteranceTooLong(2000))
        ));
        let at_limit = "a".repeat(2000);
        assert!(mgr.submit_turn(id, &at_limit).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_turn_recorded_as_error() {
        let mgr = manager_with(
            RovConfig::default(),
            MockSearch::failing(CollaboratorError::Timeout),
        );
        let id = mgr.create_session(None).unwrap();
        mgr.select_mode(id, Mode::FileOnly).await.unwrap();

        assert!(mgr.submit_turn(id, "T4 summary").await.is_err());
        let state = mgr.state(id).await.unwrap();
        assert_eq!(state.mode, Some(Mode::FileOnly));
        assert!(state.last_query_working.is_empty());
        assert_eq!(mgr.history(id).await.unwrap()[0].outcome, "error");
    }

    #[tokio::test]
    async fn test_try_submit_rejects_when_busy() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        let handle = mgr.handle(id).unwrap();
        let guard = handle.lock().await;

        let err = mgr.try_submit_turn(id, "T4 torque").await.unwrap_err();
        assert!(matches!(err, DialogError::Busy(busy) if busy == id));

        drop(guard);
        assert!(mgr.try_submit_turn(id, "T4 torque").await.is_ok());
    }

    #[tokio::test]
    async fn test_turns_are_serialized_in_order() {
        let mgr = Arc::new(manager());
        let id = mgr.create_session(None).unwrap();

        let handle = mgr.handle(id).unwrap();
        let guard = handle.lock().await;

        let first = {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.submit_turn(id, "first").await })
        };
        tokio::task::yield_now().await;
        let second = {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.submit_turn(id, "second").await })
        };
        tokio::task::yield_now().await;
        drop(guard);

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        let history = mgr.history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].utterance, "first");
        assert_eq!(history[1].utterance, "second");
    }

    #[tokio::test]
    async fn test_set_language() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        mgr.set_language(id, Lang::Pt).await.unwrap();
        assert_eq!(mgr.state(id).await.unwrap().language, Lang::Pt);
    }

    #[tokio::test]
    async fn test_export_and_import() {
        let mgr = manager();
        let id = mgr.create_session(Some(Lang::Pt)).unwrap();
        mgr.select_mode(id, Mode::FileAndSummary).await.unwrap();
        mgr.submit_turn(id, "hello").await.unwrap();

        let json = mgr.export_session(id).await.unwrap();
        let other = manager();
        let restored = other.import_session(&json).unwrap();
        assert_eq!(restored, id);

        let state = other.state(id).await.unwrap();
        assert_eq!(state, mgr.state(id).await.unwrap());
        assert_eq!(other.history(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        assert_eq!(mgr.purge_expired(), 0);

        let later = Utc::now() + Duration::minutes(31);
        assert_eq!(mgr.purge_expired_at(later), 1);
        assert!(mgr.state(id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_sessions_summary() {
        let mgr = manager();
        let id = mgr.create_session(None).unwrap();
        mgr.submit_turn(id, "T4 torque").await.unwrap();
        let list = mgr.list_sessions().await;
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].mode, Some(Mode::SpecificInfo));
        assert_eq!(list[0].turns, 1);
    }
}
