use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Classified purpose of an utterance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Fetch the manual for a model.
    RequestManual,
    /// Fetch the manual together with a full summary.
    RequestManualWithSummary,
    /// Look up a specific fact (torque, pinout, pressure, flow...).
    RequestSpecificInfo,
    /// Nothing matched; ask the user what they need.
    Disambiguate,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::RequestManual => "request_manual",
            Intent::RequestManualWithSummary => "request_manual_with_summary",
            Intent::RequestSpecificInfo => "request_specific_info",
            Intent::Disambiguate => "disambiguate",
        };
        f.write_str(s)
    }
}

/// Desired shape of a manual-retrieval response.
///
/// The wire names (`file`, `file+summary`, `specific-info`) are the ones the
/// search service and the mode chips use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "file")]
    FileOnly,
    #[serde(rename = "file+summary")]
    FileAndSummary,
    #[serde(rename = "specific-info")]
    SpecificInfo,
}

impl Mode {
    /// All modes, in the order they are offered to the user.
    pub const ALL: [Mode; 3] = [Mode::FileOnly, Mode::FileAndSummary, Mode::SpecificInfo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::FileOnly => "file",
            Mode::FileAndSummary => "file+summary",
            Mode::SpecificInfo => "specific-info",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" | "file-only" | "1" => Ok(Mode::FileOnly),
            "file+summary" | "summary" | "2" => Ok(Mode::FileAndSummary),
            "specific-info" | "specific" | "3" => Ok(Mode::SpecificInfo),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// User-facing language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    #[default]
    En,
    Pt,
}

impl Lang {
    /// Two-letter code sent to the translation service.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Pt => "pt",
        }
    }

    /// Locale used for speech capture and synthesis.
    pub fn speech_locale(&self) -> &'static str {
        match self {
            Lang::En => "en-US",
            Lang::Pt => "pt-BR",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Lang::En),
            "pt" | "pt-br" | "portuguese" => Ok(Lang::Pt),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

// =============================================================================
// Retrieval results
// =============================================================================

/// A file returned by the search service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Relative path of the document.
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Whether summary content exists for this file.
    #[serde(default)]
    pub summary_available: bool,
}

/// Pin identifier on a connector; services send either numbers or labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinLabel {
    Number(u32),
    Text(String),
}

impl fmt::Display for PinLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinLabel::Number(n) => write!(f, "{}", n),
            PinLabel::Text(s) => f.write_str(s),
        }
    }
}

/// One pin of a connector pinout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinAssignment {
    pub pin: PinLabel,
    /// Natural-language signal label (translated for the user).
    pub signal: String,
}

/// A value expressed in a primary and an alternate unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub kind: String,
    pub primary: String,
    pub alt: String,
}

/// Source location supporting an answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Structured answer to a specific-info question.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pinout: Vec<PinAssignment>,
    #[serde(default)]
    pub conversions: Vec<Conversion>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

// =============================================================================
// Collaborator wire types
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub model: Option<String>,
    pub mode: Mode,
    pub want_summary: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl SearchResponse {
    /// True when at least one candidate carries summary content.
    pub fn has_summary(&self) -> bool {
        self.candidates.iter().any(|c| c.summary_available)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    pub model: String,
    /// Unit kinds the answer service should recognize and convert.
    pub units: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub answer: Option<Answer>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target: Lang,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translated: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
