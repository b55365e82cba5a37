//! Keyword heuristic for the desired response shape.

use rovassist_core::types::Mode;

const SUMMARY_KEYWORDS: &[&str] = &["summary"];
const FACT_KEYWORDS: &[&str] = &["torque", "pinout", "pin", "pressure", "flow"];

/// Suggests a [`Mode`] from the wording of an utterance.
///
/// The suggestion is advisory: an explicit selection made by the user always
/// replaces whatever was suggested.
#[derive(Debug, Clone)]
pub struct ModeSelector {
    summary_keywords: Vec<String>,
    fact_keywords: Vec<String>,
}

impl Default for ModeSelector {
    fn default() -> Self {
        Self::new(SUMMARY_KEYWORDS, FACT_KEYWORDS)
    }
}

impl ModeSelector {
    pub fn new(summary_keywords: &[&str], fact_keywords: &[&str]) -> Self {
        let lower = |words: &[&str]| -> Vec<String> {
            words.iter().map(|w| w.to_lowercase()).collect()
        };
        Self {
            summary_keywords: lower(summary_keywords),
            fact_keywords: lower(fact_keywords),
        }
    }

    /// Summary keywords win over fact keywords; no keyword means no opinion.
    pub fn suggest_mode(&self, text: &str) -> Option<Mode> {
        let lowered = text.to_lowercase();
        if self
            .summary_keywords
            .iter()
            .any(|k| lowered.contains(k.as_str()))
        {
            return Some(Mode::FileAndSummary);
        }
        if self.fact_keywords.iter().any(|k| lowered.contains(k.as_str())) {
            return Some(Mode::SpecificInfo);
        }
        None
    }
}
