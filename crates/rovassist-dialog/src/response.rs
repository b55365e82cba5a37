//! Canonical messages in the working language and spoken renderings.

use rovassist_core::types::{Lang, PinAssignment};

// =============================================================================
// Message catalog
// =============================================================================

pub const HELP: &str = "What do you need? I can fetch manuals, full summaries, or specific info (e.g., T4 torque, 9-pin camera pinout).";

pub const MODE_OPTIONS: &str =
    "Would you like: (1) File only, (2) File + full summary, or (3) A specific information search?";

pub const SUMMARY_UNAVAILABLE: &str = "Summary not available; I'll return the file only.";

pub const SHOWING_RESULTS: &str = "Showing results and citations.";

/// Prompt asking which model's manual is wanted.
pub fn model_prompt(known_models: &[String]) -> String {
    format!(
        "Which model manual do you want? ({})",
        known_models.join(", ")
    )
}

pub fn files_found(count: usize, model: &str) -> String {
    match count {
        0 => format!("No files found for {}.", model),
        1 => format!("Found 1 file for {}.", model),
        n => format!("Found {} files for {}.", n, model),
    }
}

/// Text shown for the user's query.
///
/// Outside the working language the translation is shown next to the raw
/// text so the user can see what was actually searched.
pub fn display_query(raw: &str, working_text: &str, active: Lang, working: Lang) -> String {
    if active == working {
        raw.to_string()
    } else {
        format!(
            "{}  (translated to {}: {})",
            raw,
            working.code().to_uppercase(),
            working_text
        )
    }
}

// =============================================================================
// Spoken output
// =============================================================================

/// Render a pinout table as one sentence for speech synthesis.
///
/// Signals are expected to be in `lang` already.
pub fn pinout_phrase(pins: &[PinAssignment], lang: Lang) -> String {
    let (lead, pin_word) = match lang {
        Lang::En => ("Connector pinout: ", "Pin"),
        Lang::Pt => ("Pinagem do conector: ", "Pino"),
    };
    let items: Vec<String> = pins
        .iter()
        .map(|p| format!("{} {}: {}", pin_word, p.pin, p.signal))
        .collect();
    format!("{}{}.", lead, items.join("; "))
}
