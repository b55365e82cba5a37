//! rovassist binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build collaborators (HTTP services, or sample data with --offline)
//! 4. Build the dialog orchestrator and session manager
//! 5. Select platform speech capabilities
//! 6. Run the interactive prompt until EOF or :quit

mod cli;
mod http;
mod offline;
mod repl;
mod speech;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use rovassist_core::config::RovConfig;
use rovassist_core::types::Answer;
use rovassist_dialog::error::DialogError;
use rovassist_dialog::orchestrator::{Collaborators, DialogOrchestrator, TurnOutcome};
use rovassist_dialog::session::SessionManager;
use rovassist_dialog::voice::VoiceController;

use cli::CliArgs;
use http::HttpServices;
use repl::Command;

/// Interactive session state owned by the prompt loop.
struct Repl {
    sessions: Arc<SessionManager>,
    voice: VoiceController,
    session: Uuid,
    citation_limit: usize,
    last_answer: Option<Answer>,
}

impl Repl {
    async fn handle(&mut self, command: Command) -> Result<bool, DialogError> {
        match command {
            Command::Turn(text) => {
                let outcome = self.voice.submit_text(&self.sessions, self.session, &text).await;
                self.show(outcome).await?;
            }
            Command::Listen => {
                let outcome = self.voice.listen_and_submit(&self.sessions, self.session).await;
                self.show(outcome).await?;
            }
            Command::Mode(mode) => {
                self.sessions.select_mode(self.session, mode).await?;
                println!("mode: {}", mode);
            }
            Command::Lang(lang) => {
                self.sessions.set_language(self.session, lang).await?;
                println!("language: {} ({})", lang, lang.speech_locale());
            }
            Command::SpeakHelp => self.voice.speak_help(&self.sessions, self.session).await?,
            Command::StopSpeaking => self.voice.stop_speaking(),
            Command::Pinout => {
                let lang = self.sessions.state(self.session).await?.language;
                match self.last_answer {
                    Some(ref answer) if !answer.pinout.is_empty() => {
                        self.voice.speak_pinout(answer, lang)
                    }
                    _ => println!("no pinout to speak"),
                }
            }
            Command::History => {
                let history = self.sessions.history(self.session).await?;
                print!("{}", repl::render_history(&history));
            }
            Command::Help => println!("{}", repl::USAGE),
            Command::Quit => return Ok(false),
            Command::Invalid(msg) => println!("{}", msg),
        }
        Ok(true)
    }

    /// Print an outcome. Turn failures are reported and the prompt continues.
    async fn show(&mut self, outcome: Result<TurnOutcome, DialogError>) -> Result<(), DialogError> {
        match outcome {
            Ok(outcome) => {
                let state = self.sessions.state(self.session).await?;
                if let TurnOutcome::Results { ref answer, .. } = outcome {
                    self.last_answer = answer.clone();
                }
                print!(
                    "{}",
                    repl::render_outcome(&outcome, &state, self.citation_limit)
                );
            }
            Err(e @ DialogError::SessionNotFound(_)) => return Err(e),
            Err(e) if e.is_retryable() => println!("error: {} (try again)", e),
            Err(e) => println!("error: {}", e),
        }
        Ok(())
    }
}

fn build_collaborators(args: &CliArgs, config: &RovConfig) -> Result<Collaborators, Box<dyn std::error::Error>> {
    if args.offline {
        tracing::info!("Offline mode: using built-in sample data");
        return Ok(offline::collaborators());
    }
    let services = Arc::new(HttpServices::new(&config.services)?);
    tracing::info!(url = %services.base_url(), timeout_ms = config.services.timeout_ms, "Using remote services");
    Ok(Collaborators {
        search: services.clone(),
        answer: services.clone(),
        translate: services,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = RovConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over --log-level and the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting rovassist v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Dialog engine.
    let collaborators = build_collaborators(&args, &config)?;
    let orchestrator = DialogOrchestrator::from_config(&config, collaborators)?;
    tracing::info!(models = ?orchestrator.known_models(), "Dialog engine ready");
    let sessions = Arc::new(SessionManager::new(Arc::new(orchestrator), &config.dialog));
    let session = sessions.create_session(Some(config.dialog.default_language))?;

    // Speech.
    let synthesis = if config.voice.speak_responses {
        speech::platform_synthesis()
    } else {
        speech::silent_synthesis()
    };
    let voice = VoiceController::new(
        speech::platform_capture(),
        synthesis,
        config.voice.speak_responses,
    );

    let mut repl = Repl {
        sessions: Arc::clone(&sessions),
        voice,
        session,
        citation_limit: config.dialog.citation_limit,
        last_answer: None,
    };

    // Idle sessions are purged in the background.
    let purge_sessions = Arc::clone(&sessions);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            purge_sessions.purge_expired();
        }
    });

    println!("{}", repl::USAGE);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"rov> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match repl.handle(repl::parse_command(&line)).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(DialogError::SessionNotFound(_)) => {
                repl.session = sessions.create_session(Some(config.dialog.default_language))?;
                println!("session expired; started a new one");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Command failed");
                println!("error: {}", e);
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
