//! Speech capability layer.
//!
//! Capture and synthesis are platform services chosen once at startup; the
//! dialog engine only sees these traits. [`VoiceController`] keeps the two
//! mutually exclusive and turns a finished capture into exactly one turn.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

use rovassist_core::types::{Answer, Lang};

use crate::error::{DialogError, VoiceError};
use crate::orchestrator::TurnOutcome;
use crate::response::pinout_phrase;
use crate::session::SessionManager;

// =============================================================================
// Capability traits
// =============================================================================

/// One-shot speech recognition.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Listen until the recognizer produces a transcript or `stop` is called.
    async fn capture(&self, lang: Lang) -> Result<String, VoiceError>;

    fn stop(&self);
}

/// Text-to-speech. `speak` returns immediately.
pub trait SpeechSynthesis: Send + Sync {
    fn speak(&self, text: &str, lang: Lang);

    fn stop(&self);
}

/// Capture for platforms without a recognizer.
#[derive(Debug, Clone)]
pub struct UnavailableCapture {
    reason: String,
}

impl UnavailableCapture {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SpeechCapture for UnavailableCapture {
    async fn capture(&self, _lang: Lang) -> Result<String, VoiceError> {
        Err(VoiceError::CapabilityUnavailable(self.reason.clone()))
    }

    fn stop(&self) {}
}

/// Synthesis that only logs.
#[derive(Debug, Clone, Default)]
pub struct SilentSynthesis;

impl SpeechSynthesis for SilentSynthesis {
    fn speak(&self, text: &str, lang: Lang) {
        tracing::debug!(locale = lang.speech_locale(), chars = text.len(), "Speech output skipped");
    }

    fn stop(&self) {}
}

// =============================================================================
// Mocks
// =============================================================================

/// Capture returning scripted transcripts in order.
///
/// Once the script is exhausted `capture` blocks until `stop` is called.
#[derive(Debug, Default)]
pub struct MockCapture {
    script: Mutex<VecDeque<Result<String, VoiceError>>>,
    langs: Mutex<Vec<Lang>>,
    stopped: Notify,
    stops: AtomicUsize,
}

impl MockCapture {
    pub fn new(script: Vec<Result<String, VoiceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn transcripts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Languages `capture` was called with.
    pub fn langs(&self) -> Vec<Lang> {
        self.langs.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechCapture for MockCapture {
    async fn capture(&self, lang: Lang) -> Result<String, VoiceError> {
        if let Ok(mut langs) = self.langs.lock() {
            langs.push(lang);
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(result) => result,
            None => {
                self.stopped.notified().await;
                Err(VoiceError::CaptureFailed("capture stopped".into()))
            }
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stopped.notify_one();
    }
}

/// Synthesis recording everything it was asked to say.
#[derive(Debug, Default)]
pub struct MockSynthesis {
    spoken: Mutex<Vec<(String, Lang)>>,
    stops: AtomicUsize,
}

impl MockSynthesis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<(String, Lang)> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechSynthesis for MockSynthesis {
    fn speak(&self, text: &str, lang: Lang) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push((text.to_string(), lang));
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// VoiceController
// =============================================================================

/// Coordinates capture, synthesis and turn submission for a front-end.
pub struct VoiceController {
    capture: Arc<dyn SpeechCapture>,
    synthesis: Arc<dyn SpeechSynthesis>,
    listening: AtomicBool,
    speak_responses: bool,
}

impl VoiceController {
    pub fn new(
        capture: Arc<dyn SpeechCapture>,
        synthesis: Arc<dyn SpeechSynthesis>,
        speak_responses: bool,
    ) -> Self {
        Self {
            capture,
            synthesis,
            listening: AtomicBool::new(false),
            speak_responses,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Capture one utterance and submit it as one turn.
    ///
    /// Starting capture silences any speech in progress. If capture is
    /// stopped before it finishes, nothing is submitted and the outcome is
    /// `Ignored`.
    pub async fn listen_and_submit(
        &self,
        sessions: &SessionManager,
        id: Uuid,
    ) -> Result<TurnOutcome, DialogError> {
        let lang = sessions.state(id).await?.language;
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyActive.into());
        }
        self.synthesis.stop();
        tracing::debug!(session = %id, locale = lang.speech_locale(), "Listening");

        let captured = self.capture.capture(lang).await;
        if !self.listening.swap(false, Ordering::SeqCst) {
            tracing::debug!(session = %id, "Capture was stopped; discarding result");
            return Ok(TurnOutcome::Ignored);
        }
        let text = captured?;
        tracing::info!(session = %id, chars = text.len(), "Speech captured");

        self.submit(sessions, id, &text).await
    }

    /// Submit typed text. Stops any capture in progress first.
    pub async fn submit_text(
        &self,
        sessions: &SessionManager,
        id: Uuid,
        text: &str,
    ) -> Result<TurnOutcome, DialogError> {
        if self.halt_capture() {
            tracing::debug!(session = %id, "Capture stopped for text input");
        }
        self.submit(sessions, id, text).await
    }

    pub fn stop_listening(&self) -> Result<(), VoiceError> {
        if self.halt_capture() {
            Ok(())
        } else {
            Err(VoiceError::NotActive)
        }
    }

    /// Clear the listening flag and stop the recognizer if it was set.
    fn halt_capture(&self) -> bool {
        let was_listening = self.listening.swap(false, Ordering::SeqCst);
        if was_listening {
            self.capture.stop();
        }
        was_listening
    }

    pub fn speak(&self, text: &str, lang: Lang) {
        if self.speak_responses && !text.is_empty() {
            self.synthesis.speak(text, lang);
        }
    }

    /// Speak what the user should hear for `outcome`.
    ///
    /// A notice replaces the regular message, matching what is shown first.
    pub fn speak_outcome(&self, outcome: &TurnOutcome, lang: Lang) {
        let text = match outcome {
            TurnOutcome::Results {
                notice: Some(notice),
                ..
            } => Some(notice.message.as_str()),
            other => other.message(),
        };
        if let Some(text) = text {
            self.speak(text, lang);
        }
    }

    pub fn speak_pinout(&self, answer: &Answer, lang: Lang) {
        if !answer.pinout.is_empty() {
            self.speak(&pinout_phrase(&answer.pinout, lang), lang);
        }
    }

    /// Speak the help message in the session's language.
    pub async fn speak_help(&self, sessions: &SessionManager, id: Uuid) -> Result<(), DialogError> {
        let lang = sessions.state(id).await?.language;
        let message = sessions.orchestrator().help_message(lang).await;
        self.speak(&message, lang);
        Ok(())
    }

    pub fn stop_speaking(&self) {
        self.synthesis.stop();
    }

    async fn submit(
        &self,
        sessions: &SessionManager,
        id: Uuid,
        text: &str,
    ) -> Result<TurnOutcome, DialogError> {
        let outcome = sessions.submit_turn(id, text).await?;
        let lang = sessions.state(id).await?.language;
        self.speak_outcome(&outcome, lang);
        Ok(outcome)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAnswer, MockSearch, MockTranslate};
    use crate::orchestrator::{Collaborators, DialogOrchestrator};
    use crate::response;
    use rovassist_core::config::RovConfig;
    use rovassist_core::types::{PinAssignment, PinLabel};

    fn sessions() -> SessionManager {
        let config = RovConfig::default();
        let collaborators = Collaborators {
            search: Arc::new(MockSearch::new(vec![])),
            answer: Arc::new(MockAnswer::new(None)),
            translate: Arc::new(MockTranslate::unavailable()),
        };
        let orch = DialogOrchestrator::from_config(&config, collaborators).unwrap();
        SessionManager::new(Arc::new(orch), &config.dialog)
    }

    fn controller(
        capture: MockCapture,
        speak: bool,
    ) -> (VoiceController, Arc<MockCapture>, Arc<MockSynthesis>) {
        let capture = Arc::new(capture);
        let synthesis = Arc::new(MockSynthesis::new());
        let vc = VoiceController::new(capture.clone(), synthesis.clone(), speak);
        (vc, capture, synthesis)
    }

    #[tokio::test]
    async fn test_unavailable_capture() {
        let capture = UnavailableCapture::new("no recognizer");
        let err = capture.capture(Lang::En).await.unwrap_err();
        assert_eq!(err, VoiceError::CapabilityUnavailable("no recognizer".into()));
    }

    #[tokio::test]
    async fn test_unavailable_capture_surfaces_and_resets() {
        let mgr = sessions();
        let id = mgr.create_session(None).unwrap();
        let vc = VoiceController::new(
            Arc::new(UnavailableCapture::new("no recognizer")),
            Arc::new(SilentSynthesis),
            true,
        );
        let err = vc.listen_and_submit(&mgr, id).await.unwrap_err();
        assert!(matches!(
            err,
            DialogError::Voice(VoiceError::CapabilityUnavailable(_))
        ));
        assert!(!vc.is_listening());

        // Text turns are unaffected.
        let outcome = vc.submit_text(&mgr, id, "hello").await.unwrap();
        assert_eq!(outcome.kind(), "help");
    }

    #[tokio::test]
    async fn test_capture_submits_one_turn_and_speaks() {
        let mgr = sessions();
        let id = mgr.create_session(Some(Lang::Pt)).unwrap();
        let (vc, capture, synthesis) = controller(MockCapture::transcripts(&["hello"]), true);

        let outcome = vc.listen_and_submit(&mgr, id).await.unwrap();
        assert_eq!(outcome.kind(), "help");
        assert_eq!(capture.langs(), vec![Lang::Pt]);
        assert_eq!(mgr.history(id).await.unwrap().len(), 1);

        // Capture start silenced synthesis, then the reply was spoken.
        assert_eq!(synthesis.stop_count(), 1);
        let spoken = synthesis.spoken();
        assert_eq!(spoken, vec![(response::HELP.to_string(), Lang::Pt)]);
    }

    #[tokio::test]
    async fn test_text_submission_stops_capture() {
        let mgr = Arc::new(sessions());
        let id = mgr.create_session(None).unwrap();
        let (vc, capture, _) = controller(MockCapture::default(), false);
        let vc = Arc::new(vc);

        let listening = {
            let (vc, mgr) = (Arc::clone(&vc), Arc::clone(&mgr));
            tokio::spawn(async move { vc.listen_and_submit(&mgr, id).await })
        };
        while !vc.is_listening() {
            tokio::task::yield_now().await;
        }

        vc.submit_text(&mgr, id, "T4 torque").await.unwrap();
        assert_eq!(capture.stop_count(), 1);

        // The interrupted capture submits nothing.
        let interrupted = listening.await.unwrap().unwrap();
        assert_eq!(interrupted, TurnOutcome::Ignored);
        assert_eq!(mgr.history(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_listen_is_rejected() {
        let mgr = Arc::new(sessions());
        let id = mgr.create_session(None).unwrap();
        let (vc, _, _) = controller(MockCapture::default(), false);
        let vc = Arc::new(vc);

        let first = {
            let (vc, mgr) = (Arc::clone(&vc), Arc::clone(&mgr));
            tokio::spawn(async move { vc.listen_and_submit(&mgr, id).await })
        };
        while !vc.is_listening() {
            tokio::task::yield_now().await;
        }

        let err = vc.listen_and_submit(&mgr, id).await.unwrap_err();
        assert!(matches!(err, DialogError::Voice(VoiceError::AlreadyActive)));

        vc.stop_listening().unwrap();
        assert_eq!(first.await.unwrap().unwrap(), TurnOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_text_submission_after_capture_finished() {
        let mgr = sessions();
        let id = mgr.create_session(None).unwrap();
        let (vc, capture, _) = controller(MockCapture::transcripts(&["hello"]), false);

        vc.listen_and_submit(&mgr, id).await.unwrap();
        assert!(!vc.is_listening());

        // Capture already ended on its own; typed text goes straight through.
        let outcome = vc.submit_text(&mgr, id, "T4 torque").await.unwrap();
        assert_eq!(outcome.kind(), "results");
        assert_eq!(capture.stop_count(), 0);
        assert_eq!(mgr.history(id).await.unwrap().len(), 2);
    }

    #[test]
    fn test_stop_listening_when_idle() {
        let (vc, _, _) = controller(MockCapture::default(), false);
        assert_eq!(vc.stop_listening(), Err(VoiceError::NotActive));
    }

    #[test]
    fn test_speak_respects_setting() {
        let (vc, _, synthesis) = controller(MockCapture::default(), false);
        vc.speak("hello", Lang::En);
        assert!(synthesis.spoken().is_empty());

        let (vc, _, synthesis) = controller(MockCapture::default(), true);
        vc.speak("", Lang::En);
        vc.speak("hello", Lang::En);
        assert_eq!(synthesis.spoken().len(), 1);
        vc.stop_speaking();
        assert_eq!(synthesis.stop_count(), 1);
    }

    #[test]
    fn test_speak_pinout() {
        let (vc, _, synthesis) = controller(MockCapture::default(), true);
        let answer = Answer {
            pinout: vec![PinAssignment { pin: PinLabel::Number(1), signal: "Terra".into() }],
            ..Answer::default()
        };
        vc.speak_pinout(&answer, Lang::Pt);
        assert_eq!(
            synthesis.spoken()[0].0,
            "Pinagem do conector: Pino 1: Terra."
        );
        vc.speak_pinout(&Answer::default(), Lang::Pt);
        assert_eq!(synthesis.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_speak_help_in_session_language() {
        let mgr = sessions();
        let id = mgr.create_session(None).unwrap();
        let (vc, _, synthesis) = controller(MockCapture::default(), true);
        vc.speak_help(&mgr, id).await.unwrap();
        assert_eq!(synthesis.spoken()[0], (response::HELP.to_string(), Lang::En));
    }
}
