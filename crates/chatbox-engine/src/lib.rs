//! chatbox-engine: Headless conversation engine for the chatbox client
//!
//! This crate provides everything below the user interface:
//! - The append-only conversation model
//! - The conversation controller state machine
//! - The remote assistant client
//! - Speech playback backends
//! - Configuration

pub mod assistant;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod notification;
pub mod speech;

// Re-export commonly used types
pub use assistant::{AssistantClient, AssistantError, AssistantReply, AssistantRequest, HttpAssistant};
pub use config::{Config, ConfigError, SpeechBackend, SpeechConfig, ThemeName};
pub use controller::{ConversationController, Effect, Phase};
pub use conversation::{ChatTurn, Conversation};
pub use notification::{Notification, NotificationVariant};
pub use speech::{
    synthesizer_from_config, RecordingSpeech, SilentSpeech, SpeechCall, SpeechError, SpeechEvent,
    SpeechEventReceiver, SpeechEventSender, SpeechSynthesizer, SystemSpeech, UtteranceId,
};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
