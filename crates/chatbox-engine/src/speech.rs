//! Speech playback capability.
//!
//! Playback sits behind [`SpeechSynthesizer`] so the conversation logic
//! never touches audio directly. Each utterance is tagged with an
//! [`UtteranceId`]; backends report its lifecycle as [`SpeechEvent`]s on a
//! channel handed to them at construction.

use crate::config::{SpeechBackend, SpeechConfig};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Words per minute at rate 1.0 for espeak-style engines.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Pitch value at 1.0 for espeak-style engines (range 0-99).
const BASE_PITCH: f32 = 50.0;

/// Identifies one speak request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utterance-{}", self.0)
    }
}

/// Lifecycle signal for an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEvent {
    Started(UtteranceId),
    Ended(UtteranceId),
    Failed(UtteranceId),
}

impl SpeechEvent {
    /// The utterance this event belongs to.
    pub fn id(&self) -> UtteranceId {
        match self {
            Self::Started(id) | Self::Ended(id) | Self::Failed(id) => *id,
        }
    }
}

/// Sender half used by backends to report lifecycle events.
pub type SpeechEventSender = mpsc::UnboundedSender<SpeechEvent>;

/// Receiver half drained by the UI loop.
pub type SpeechEventReceiver = mpsc::UnboundedReceiver<SpeechEvent>;

/// Errors from starting playback.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The configured command line is empty.
    #[error("Speech command is empty")]
    EmptyCommand,

    /// The speech process could not be started.
    #[error("Failed to start speech command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can read text aloud, one utterance at a time.
pub trait SpeechSynthesizer: Send {
    /// Start speaking `text`. Any utterance still playing is cancelled first.
    fn speak(&mut self, id: UtteranceId, text: &str) -> Result<(), SpeechError>;

    /// Stop everything currently playing or pending. No events are reported
    /// for a cancelled utterance.
    fn cancel(&mut self);
}

/// Build a synthesizer for the configured backend.
pub fn synthesizer_from_config(
    config: &SpeechConfig,
    events: SpeechEventSender,
) -> Box<dyn SpeechSynthesizer> {
    match config.backend {
        SpeechBackend::System => Box::new(SystemSpeech::new(config.clone(), events)),
        SpeechBackend::Silent => Box::new(SilentSpeech::new(events)),
    }
}

/// Default command line for the current platform.
///
/// Placeholders: `{lang}`, `{rate}`, `{pitch}` and `{text}`. When `{text}`
/// is absent the text is appended as the last argument.
pub fn default_speech_command() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["say".into()]
    } else {
        ["espeak-ng", "-v", "{lang}", "-s", "{rate}", "-p", "{pitch}"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

/// Expand a command template into concrete arguments for `text`.
pub fn build_speech_argv(template: &[String], config: &SpeechConfig, text: &str) -> Vec<String> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rate = (BASE_WORDS_PER_MINUTE * config.rate.max(0.1)).round() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pitch = (BASE_PITCH * config.pitch.max(0.0)).round().min(99.0) as u32;
    let lang = config.language.to_lowercase();
    let text = sanitize(text);

    let mut has_text = false;
    let mut argv: Vec<String> = template
        .iter()
        .map(|arg| {
            if arg.contains("{text}") {
                has_text = true;
            }
            arg.replace("{lang}", &lang)
                .replace("{rate}", &rate.to_string())
                .replace("{pitch}", &pitch.to_string())
                .replace("{text}", &text)
        })
        .collect();

    if !has_text {
        argv.push(text);
    }
    argv
}

/// Drop control characters other than line breaks.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\r')
        .collect()
}

/// Plays speech through a system text-to-speech command (`espeak-ng`, `say`).
///
/// Each utterance is a child process; cancelling kills it.
pub struct SystemSpeech {
    config: SpeechConfig,
    events: SpeechEventSender,
    current: Option<JoinHandle<()>>,
}

impl SystemSpeech {
    pub fn new(config: SpeechConfig, events: SpeechEventSender) -> Self {
        Self {
            config,
            events,
            current: None,
        }
    }

    fn template(&self) -> Vec<String> {
        self.config
            .command
            .clone()
            .unwrap_or_else(default_speech_command)
    }
}

impl SpeechSynthesizer for SystemSpeech {
    fn speak(&mut self, id: UtteranceId, text: &str) -> Result<(), SpeechError> {
        self.cancel();

        let template = self.template();
        if template.is_empty() {
            return Err(SpeechError::EmptyCommand);
        }
        let argv = build_speech_argv(&template, &self.config, text);
        let (program, args) = argv.split_first().ok_or(SpeechError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: program.clone(),
                source,
            })?;

        debug!(%id, program = %program, "speech started");
        let _ = self.events.send(SpeechEvent::Started(id));

        let events = self.events.clone();
        self.current = Some(tokio::spawn(async move {
            let event = match child.wait().await {
                Ok(status) if status.success() => SpeechEvent::Ended(id),
                Ok(status) => {
                    warn!(%id, %status, "speech command exited unsuccessfully");
                    SpeechEvent::Failed(id)
                }
                Err(e) => {
                    warn!(%id, error = %e, "failed waiting for speech command");
                    SpeechEvent::Failed(id)
                }
            };
            let _ = events.send(event);
        }));

        Ok(())
    }

    fn cancel(&mut self) {
        // Aborting drops the child, and kill_on_drop stops the audio.
        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                debug!("cancelling speech");
            }
            handle.abort();
        }
    }
}

impl Drop for SystemSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Backend without audio: every utterance starts and ends immediately.
pub struct SilentSpeech {
    events: SpeechEventSender,
}

impl SilentSpeech {
    pub fn new(events: SpeechEventSender) -> Self {
        Self { events }
    }
}

impl SpeechSynthesizer for SilentSpeech {
    fn speak(&mut self, id: UtteranceId, _text: &str) -> Result<(), SpeechError> {
        let _ = self.events.send(SpeechEvent::Started(id));
        let _ = self.events.send(SpeechEvent::Ended(id));
        Ok(())
    }

    fn cancel(&mut self) {}
}

/// A call observed by [`RecordingSpeech`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCall {
    Speak { id: UtteranceId, text: String },
    Cancel,
}

/// Records speak/cancel calls without producing audio or events.
///
/// Clones share the same log, so a test can keep one and hand the other to
/// the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    calls: Arc<Mutex<Vec<SpeechCall>>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SpeechCall::Speak { text, .. } => Some(text),
                SpeechCall::Cancel => None,
            })
            .collect()
    }

    /// Number of `cancel` calls.
    pub fn cancel_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SpeechCall::Cancel))
            .count()
    }

    fn record(&self, call: SpeechCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&mut self, id: UtteranceId, text: &str) -> Result<(), SpeechError> {
        self.record(SpeechCall::Speak {
            id,
            text: text.to_string(),
        });
        Ok(())
    }

    fn cancel(&mut self) {
        self.record(SpeechCall::Cancel);
    }
}
