//! Platform speech capabilities, chosen once at startup.
//!
//! The terminal front-end has no recognizer, so capture is always
//! unavailable. Synthesis shells out to the platform speech command where
//! one exists.

use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use rovassist_core::types::Lang;
use rovassist_dialog::voice::{SilentSynthesis, SpeechCapture, SpeechSynthesis, UnavailableCapture};

/// Synthesis through an external text-to-speech program.
///
/// Each utterance runs as a child process watched by a task that reaps it
/// when it exits or kills it when told to stop.
#[derive(Debug)]
pub struct CommandSynthesis {
    program: &'static str,
    current: Mutex<Option<Utterance>>,
}

/// The watcher of the utterance in progress.
#[derive(Debug)]
struct Utterance {
    stop: Option<oneshot::Sender<()>>,
    watcher: JoinHandle<()>,
}

impl CommandSynthesis {
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            current: Mutex::new(None),
        }
    }

    /// Arguments for one utterance.
    fn args(&self, text: &str, lang: Lang) -> Vec<String> {
        match self.program {
            "say" => match lang {
                Lang::En => vec![text.to_string()],
                Lang::Pt => vec!["-v".into(), "Luciana".into(), text.to_string()],
            },
            _ => {
                let voice = match lang {
                    Lang::En => "en-us",
                    Lang::Pt => "pt-br",
                };
                vec!["-v".into(), voice.into(), text.to_string()]
            }
        }
    }

    fn stop_current(current: &mut Option<Utterance>) {
        if let Some(stop) = current.as_mut().and_then(|u| u.stop.take()) {
            // Already finished if the watcher is gone.
            let _ = stop.send(());
        }
    }

    async fn watch(program: &'static str, mut child: Child, stop: oneshot::Receiver<()>) {
        tokio::select! {
            status = child.wait() => {
                if let Err(e) = status {
                    tracing::debug!(program, error = %e, "Speech process wait failed");
                }
            }
            _ = stop => {
                if let Err(e) = child.kill().await {
                    tracing::debug!(program, error = %e, "Speech process kill failed");
                }
            }
        }
    }
}

impl SpeechSynthesis for CommandSynthesis {
    fn speak(&self, text: &str, lang: Lang) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        Self::stop_current(&mut current);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(program = self.program, "Speech output needs a tokio runtime");
            return;
        };
        let spawned = Command::new(self.program)
            .args(self.args(text, lang))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        match spawned {
            Ok(child) => {
                let (stop, stopped) = oneshot::channel();
                let watcher = runtime.spawn(Self::watch(self.program, child, stopped));
                *current = Some(Utterance {
                    stop: Some(stop),
                    watcher,
                });
            }
            Err(e) => {
                tracing::warn!(program = self.program, error = %e, "Speech output failed");
            }
        }
    }

    fn stop(&self) {
        if let Ok(mut current) = self.current.lock() {
            Self::stop_current(&mut current);
        }
    }
}

pub fn platform_capture() -> Arc<dyn SpeechCapture> {
    Arc::new(UnavailableCapture::new(
        "speech recognition is not available in the terminal",
    ))
}

#[cfg(target_os = "macos")]
pub fn platform_synthesis() -> Arc<dyn SpeechSynthesis> {
    Arc::new(CommandSynthesis::new("say"))
}

#[cfg(target_os = "linux")]
pub fn platform_synthesis() -> Arc<dyn SpeechSynthesis> {
    Arc::new(CommandSynthesis::new("espeak-ng"))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn platform_synthesis() -> Arc<dyn SpeechSynthesis> {
    Arc::new(SilentSynthesis)
}

/// Synthesis for sessions that should stay quiet.
pub fn silent_synthesis() -> Arc<dyn SpeechSynthesis> {
    Arc::new(SilentSynthesis)
}
