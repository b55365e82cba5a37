//! Rule-based intent classification.
//!
//! Rules are evaluated in configuration order against the lowercased
//! utterance. The first rule whose predicates all hold decides the intent;
//! when nothing matches the utterance is classified as `Disambiguate`.

use std::sync::LazyLock;

use regex::Regex;
use rovassist_core::lexicon::RuleConfig;
use rovassist_core::types::Intent;
use serde_json::{Map, Value};

use crate::error::DialogError;

/// Accepts `contains(token)`, `contains('token')` and `contains("token")`.
static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*contains\(\s*(?:'([^']*)'|"([^"]*)"|([^'"()]*?))\s*\)\s*$"#)
        .expect("Invalid condition regex")
});

/// A single test against the utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring test. The token is stored lowercased.
    Contains(String),
}

impl Predicate {
    /// Parse a condition string from the router file.
    pub fn parse(condition: &str) -> Result<Self, DialogError> {
        let caps = CONDITION.captures(condition).ok_or_else(|| {
            DialogError::Lexicon(format!("unsupported condition: {}", condition))
        })?;
        let token = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        if token.is_empty() {
            return Err(DialogError::Lexicon(format!(
                "empty token in condition: {}",
                condition
            )));
        }
        Ok(Predicate::Contains(token.to_lowercase()))
    }

    /// Evaluate against text that is already lowercased.
    pub fn holds(&self, lowered: &str) -> bool {
        match self {
            Predicate::Contains(token) => lowered.contains(token.as_str()),
        }
    }
}

/// An ordered classification rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub predicates: Vec<Predicate>,
    pub intent: Intent,
    pub entities: Map<String, Value>,
    pub topic: Option<String>,
}

impl Rule {
    pub fn from_config(config: &RuleConfig) -> Result<Self, DialogError> {
        let predicates = config
            .conditions
            .iter()
            .map(|c| Predicate::parse(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            predicates,
            intent: config.intent,
            entities: config.entities.clone().unwrap_or_default(),
            topic: config.topic.clone(),
        })
    }

    fn matches(&self, lowered: &str) -> bool {
        self.predicates.iter().all(|p| p.holds(lowered))
    }
}

/// Result of classifying an utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub intent: Intent,
    /// Entities of the matched rule, passed through untouched.
    pub entities: Map<String, Value>,
    pub topic: Option<String>,
}

impl RouteMatch {
    fn fallback() -> Self {
        Self {
            intent: Intent::Disambiguate,
            entities: Map::new(),
            topic: None,
        }
    }
}

/// First-match-wins classifier over an immutable rule sequence.
#[derive(Debug, Clone)]
pub struct RuleRouter {
    rules: Vec<Rule>,
}

impl RuleRouter {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Build a router from router-file rules, rejecting unsupported conditions.
    pub fn from_rules(configs: &[RuleConfig]) -> Result<Self, DialogError> {
        let rules = configs
            .iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(rules = rules.len(), "Rule router built");
        Ok(Self { rules })
    }

    /// Classify `text` into an intent.
    pub fn classify(&self, text: &str) -> Intent {
        self.classify_match(text).intent
    }

    /// Classify `text`, also returning the matched rule's topic and entities.
    pub fn classify_match(&self, text: &str) -> RouteMatch {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| RouteMatch {
                intent: rule.intent,
                entities: rule.entities.clone(),
                topic: rule.topic.clone(),
            })
            .unwrap_or_else(RouteMatch::fallback)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
