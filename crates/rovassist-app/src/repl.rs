//! Line-oriented front-end: command parsing and outcome rendering.
//!
//! Plain lines are utterances. Lines starting with `:` are commands:
//!
//! ```text
//! :mode <1|2|3|file|summary|specific>   pick the response mode
//! :lang <en|pt>                         switch language
//! :listen                               capture one spoken utterance
//! :speak-help                           speak the help message
//! :stop                                 stop speaking
//! :pinout                               speak the last pinout
//! :history                              show recent turns
//! :help                                 show this list
//! :quit                                 exit
//! ```

use std::fmt::Write;

use rovassist_core::types::{Answer, Lang, Mode};
use rovassist_dialog::orchestrator::{Clarification, TurnOutcome};
use rovassist_dialog::session::TurnRecord;
use rovassist_dialog::state::ConversationState;

pub const USAGE: &str = "Commands: :mode <1|2|3>, :lang <en|pt>, :listen, :speak-help, :stop, :pinout, :history, :help, :quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Turn(String),
    Mode(Mode),
    Lang(Lang),
    Listen,
    SpeakHelp,
    StopSpeaking,
    Pinout,
    History,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Turn(line.to_string());
    };
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().unwrap_or("").trim();

    match name.as_str() {
        "mode" => arg.parse().map(Command::Mode).unwrap_or_else(Command::Invalid),
        "lang" => arg.parse().map(Command::Lang).unwrap_or_else(Command::Invalid),
        "listen" => Command::Listen,
        "speak-help" => Command::SpeakHelp,
        "stop" => Command::StopSpeaking,
        "pinout" => Command::Pinout,
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Invalid(format!("unknown command: :{}", other)),
    }
}

/// Render a turn outcome for the terminal.
pub fn render_outcome(
    outcome: &TurnOutcome,
    state: &ConversationState,
    citation_limit: usize,
) -> String {
    let mut out = String::new();
    // Clarifications leave the previous query in place, so only echo fresh ones.
    if matches!(outcome, TurnOutcome::Results { .. } | TurnOutcome::Help { .. })
        && !state.last_query_display.is_empty()
    {
        let _ = writeln!(out, "> {}", state.last_query_display);
    }

    match outcome {
        TurnOutcome::Ignored => {}
        TurnOutcome::Help { message, .. } => {
            let _ = writeln!(out, "{}", message);
        }
        TurnOutcome::Clarification {
            clarification,
            message,
            ..
        } => {
            let _ = writeln!(out, "{}", message);
            if let Clarification::Mode { options } = clarification {
                for (i, mode) in options.iter().enumerate() {
                    let _ = writeln!(out, "  :mode {}  ({})", i + 1, mode);
                }
            }
        }
        TurnOutcome::Results {
            model,
            mode,
            message,
            candidates,
            answer,
            notice,
            ..
        } => {
            if let Some(notice) = notice {
                let _ = writeln!(out, "! {}", notice.message);
            }
            let _ = writeln!(out, "[{} | {}] {}", model, mode, message);
            if let Some(answer) = answer {
                render_answer(&mut out, answer, state.language, citation_limit);
            }
            for c in candidates {
                let marker = if c.summary_available { " [summary]" } else { "" };
                let _ = writeln!(out, "  - {} ({}){}", c.title, c.path, marker);
                if let Some(ref summary) = c.summary {
                    let _ = writeln!(out, "      {}", summary);
                }
            }
        }
    }
    out
}

fn render_answer(out: &mut String, answer: &Answer, lang: Lang, citation_limit: usize) {
    let pin_word = match lang {
        Lang::En => "Pin",
        Lang::Pt => "Pino",
    };
    for p in &answer.pinout {
        let _ = writeln!(out, "  • {} {}: {}", pin_word, p.pin, p.signal);
    }
    for c in &answer.conversions {
        let _ = writeln!(out, "  {}: {} ({})", c.kind, c.primary, c.alt);
    }
    for c in answer.citations.iter().take(citation_limit) {
        match c.page {
            Some(page) => {
                let _ = writeln!(out, "  cite: {} p.{}", c.path, page);
            }
            None => {
                let _ = writeln!(out, "  cite: {}", c.path);
            }
        }
    }
}

pub fn render_history(history: &[TurnRecord]) -> String {
    let mut out = String::new();
    for r in history {
        let _ = write!(out, "{} {:<13} {}", r.at.format("%H:%M:%S"), r.outcome, r.utterance);
        if let Some(ref model) = r.model {
            let _ = write!(out, "  [{}]", model);
        }
        out.push('\n');
    }
    out
}
