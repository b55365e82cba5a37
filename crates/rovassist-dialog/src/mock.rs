//! In-memory collaborators that return canned data and record every call.
//!
//! Used by the test suites and by the offline mode of the application.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use rovassist_core::types::{
    Answer, AnswerRequest, AnswerResponse, Candidate, Lang, SearchRequest, SearchResponse,
};

use crate::collaborator::{AnswerCollaborator, SearchCollaborator, TranslateCollaborator};
use crate::error::CollaboratorError;

fn record<T>(calls: &Mutex<Vec<T>>, call: T) {
    if let Ok(mut guard) = calls.lock() {
        guard.push(call);
    }
}

fn snapshot<T: Clone>(calls: &Mutex<Vec<T>>) -> Vec<T> {
    calls.lock().map(|c| c.clone()).unwrap_or_default()
}

// =============================================================================
// MockSearch
// =============================================================================

/// Search collaborator returning a fixed candidate list.
#[derive(Debug, Default)]
pub struct MockSearch {
    candidates: Vec<Candidate>,
    filter_by_model: bool,
    failure: Option<CollaboratorError>,
    calls: Mutex<Vec<SearchRequest>>,
}

impl MockSearch {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    /// A search service that fails every call with `error`.
    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Only return candidates whose title or tags mention the requested model.
    pub fn filter_by_model(mut self) -> Self {
        self.filter_by_model = true;
        self
    }

    pub fn calls(&self) -> Vec<SearchRequest> {
        snapshot(&self.calls)
    }

    fn mentions(candidate: &Candidate, model: &str) -> bool {
        let model = model.to_lowercase();
        candidate.title.to_lowercase().contains(&model)
            || candidate.tags.iter().any(|t| t.to_lowercase() == model)
    }
}

#[async_trait]
impl SearchCollaborator for MockSearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, CollaboratorError> {
        record(&self.calls, request.clone());
        if let Some(ref err) = self.failure {
            return Err(err.clone());
        }
        let candidates = match (self.filter_by_model, request.model.as_deref()) {
            (true, Some(model)) => self
                .candidates
                .iter()
                .filter(|c| Self::mentions(c, model))
                .cloned()
                .collect(),
            _ => self.candidates.clone(),
        };
        Ok(SearchResponse { candidates })
    }
}

// =============================================================================
// MockAnswer
// =============================================================================

/// Answer collaborator returning a fixed answer (or none).
#[derive(Debug, Default)]
pub struct MockAnswer {
    answer: Option<Answer>,
    failure: Option<CollaboratorError>,
    calls: Mutex<Vec<AnswerRequest>>,
}

impl MockAnswer {
    pub fn new(answer: Option<Answer>) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<AnswerRequest> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl AnswerCollaborator for MockAnswer {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError> {
        record(&self.calls, request.clone());
        match self.failure {
            Some(ref err) => Err(err.clone()),
            None => Ok(AnswerResponse {
                answer: self.answer.clone(),
            }),
        }
    }
}

// =============================================================================
// MockTranslate
// =============================================================================

/// Translation collaborator backed by an exact-match phrase table.
///
/// Texts missing from the table yield `Ok(None)`, which callers treat as
/// "use the original text".
#[derive(Debug, Default)]
pub struct MockTranslate {
    table: HashMap<(String, Lang), String>,
    failure: Option<CollaboratorError>,
    calls: Mutex<Vec<(String, Lang)>>,
}

impl MockTranslate {
    /// A translator that never has a usable result.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Add a phrase translation.
    pub fn with(mut self, text: &str, target: Lang, translated: &str) -> Self {
        self.table
            .insert((text.to_string(), target), translated.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Lang)> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl TranslateCollaborator for MockTranslate {
    async fn translate(
        &self,
        text: &str,
        target: Lang,
    ) -> Result<Option<String>, CollaboratorError> {
        record(&self.calls, (text.to_string(), target));
        if let Some(ref err) = self.failure {
            return Err(err.clone());
        }
        Ok(self.table.get(&(text.to_string(), target)).cloned())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rovassist_core::types::Mode;

    fn candidate(title: &str, tags: &[&str]) -> Candidate {
        Candidate {
            path: format!("manuals/{}.pdf", title.to_lowercase().replace(' ', "_")),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: None,
            summary_available: false,
        }
    }

    fn search_request(model: Option<&str>) -> SearchRequest {
        SearchRequest {
            query: "manual".into(),
            model: model.map(|m| m.to_string()),
            mode: Mode::FileOnly,
            want_summary: false,
        }
    }

    #[tokio::test]
    async fn test_mock_search_records_calls() {
        let search = MockSearch::new(vec![candidate("Titan 4 Manual", &[])]);
        let resp = search.search(&search_request(Some("Titan 4"))).await.unwrap();
        assert_eq!(resp.candidates.len(), 1);
        assert_eq!(search.calls().len(), 1);
        assert_eq!(search.calls()[0].model.as_deref(), Some("Titan 4"));
    }

    #[tokio::test]
    async fn test_mock_search_filter_by_model() {
        let search = MockSearch::new(vec![
            candidate("Titan 4 Manual", &[]),
            candidate("Pump Service Guide", &["duplex pump"]),
        ])
        .filter_by_model();

        let resp = search.search(&search_request(Some("Duplex Pump"))).await.unwrap();
        assert_eq!(resp.candidates.len(), 1);
        assert_eq!(resp.candidates[0].title, "Pump Service Guide");

        let resp = search.search(&search_request(None)).await.unwrap();
        assert_eq!(resp.candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_search_failing() {
        let search = MockSearch::failing(CollaboratorError::Timeout);
        let err = search.search(&search_request(None)).await.unwrap_err();
        assert_eq!(err, CollaboratorError::Timeout);
        assert_eq!(search.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_answer_returns_answer() {
        let answer = MockAnswer::new(Some(Answer {
            text: "45 Nm".into(),
            ..Answer::default()
        }));
        let request = AnswerRequest {
            query: "t4 torque".into(),
            model: "Titan 4".into(),
            units: vec!["Nm".into()],
        };
        let resp = answer.answer(&request).await.unwrap();
        assert_eq!(resp.answer.unwrap().text, "45 Nm");
        assert_eq!(answer.calls()[0].units, vec!["Nm"]);
    }

    #[tokio::test]
    async fn test_mock_translate_table_and_miss() {
        let t = MockTranslate::unavailable().with("torque do T4", Lang::En, "T4 torque");
        assert_eq!(
            t.translate("torque do T4", Lang::En).await.unwrap().as_deref(),
            Some("T4 torque")
        );
        assert_eq!(t.translate("torque do T4", Lang::Pt).await.unwrap(), None);
        assert_eq!(t.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_translate_failing() {
        let t = MockTranslate::failing(CollaboratorError::Status(503));
        assert!(t.translate("oi", Lang::En).await.is_err());
    }
}
