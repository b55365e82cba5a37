//! Equipment model resolution from free text.

use rovassist_core::lexicon::ModelAliasConfig;

#[derive(Debug, Clone)]
struct AliasEntry {
    /// Lowercased aliases.
    aliases: Vec<String>,
    canonical: String,
}

/// Maps model mentions to canonical model names.
///
/// Entries are checked in table order and the first entry with a matching
/// alias wins, so a text naming two models resolves to the earlier entry.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    entries: Vec<AliasEntry>,
}

impl EntityResolver {
    pub fn new(table: &[ModelAliasConfig]) -> Self {
        let entries = table
            .iter()
            .map(|entry| AliasEntry {
                aliases: entry.aliases.iter().map(|a| a.to_lowercase()).collect(),
                canonical: entry.canonical.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Return the canonical model mentioned in `text`, if any.
    ///
    /// `None` means "unresolved"; callers decide whether to clarify or to
    /// fall back to a default model.
    pub fn resolve_model(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.aliases.iter().any(|a| lowered.contains(a.as_str())))
            .map(|entry| entry.canonical.clone())
    }

    /// Distinct canonical names in table order.
    pub fn known_models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !models.contains(&entry.canonical) {
                models.push(entry.canonical.clone());
            }
        }
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rovassist_core::lexicon::default_model_aliases;

    fn resolver() -> EntityResolver {
        EntityResolver::new(&default_model_aliases())
    }

    #[test]
    fn test_resolves_short_alias() {
        assert_eq!(resolver().resolve_model("T4 torque").as_deref(), Some("Titan 4"));
    }

    #[test]
    fn test_multiple_aliases_same_model() {
        let r = resolver();
        assert_eq!(r.resolve_model("titan 4 manual").as_deref(), Some("Titan 4"));
        assert_eq!(r.resolve_model("TITAN 4").as_deref(), Some("Titan 4"));
    }

    #[test]
    fn test_each_default_model() {
        let r = resolver();
        assert_eq!(r.resolve_model("rigmaster arm").as_deref(), Some("RigMaster 2"));
        assert_eq!(
            r.resolve_model("Millennium hydraulics").as_deref(),
            Some("Millennium Plus")
        );
        assert_eq!(r.resolve_model("duplex flow").as_deref(), Some("Duplex Pump"));
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(resolver().resolve_model("camera pinout").is_none());
        assert!(resolver().resolve_model("").is_none());
    }

    #[test]
    fn test_alias_order_is_stable() {
        let table = vec![
            ModelAliasConfig::new("Titan 4", &["t4"]),
            ModelAliasConfig::new("RigMaster 2", &["rigmaster"]),
        ];
        let r = EntityResolver::new(&table);
        assert_eq!(
            r.resolve_model("compare rigmaster and t4").as_deref(),
            Some("Titan 4")
        );

        let reversed = vec![table[1].clone(), table[0].clone()];
        let r = EntityResolver::new(&reversed);
        assert_eq!(
            r.resolve_model("compare rigmaster and t4").as_deref(),
            Some("RigMaster 2")
        );
    }

    #[test]
    fn test_aliases_are_case_insensitive_at_load() {
        let r = EntityResolver::new(&[ModelAliasConfig::new("Titan 4", &["T4"])]);
        assert_eq!(r.resolve_model("t4 pinout").as_deref(), Some("Titan 4"));
    }

    #[test]
    fn test_known_models_distinct_in_order() {
        let table = vec![
            ModelAliasConfig::new("Titan 4", &["t4"]),
            ModelAliasConfig::new("RigMaster 2", &["rigmaster"]),
            ModelAliasConfig::new("Titan 4", &["titan"]),
        ];
        let r = EntityResolver::new(&table);
        assert_eq!(r.known_models(), vec!["Titan 4", "RigMaster 2"]);
    }
}
