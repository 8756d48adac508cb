//! Effect execution.
//!
//! A [`Session`] owns the outside world the controller talks to: the
//! assistant client, the speech backend and the one in-flight request.

use std::sync::Arc;

use chatbox_engine::{
    AssistantClient, AssistantError, AssistantReply, Effect, SpeechEvent, SpeechEventReceiver,
    SpeechSynthesizer,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::App;

type ReplyHandle = JoinHandle<Result<AssistantReply, AssistantError>>;

/// Runs effects and feeds their outcomes back into the [`App`].
pub struct Session {
    assistant: Arc<dyn AssistantClient>,
    speech: Box<dyn SpeechSynthesizer>,
    speech_events: SpeechEventReceiver,
    pending: Option<ReplyHandle>,
}

impl Session {
    pub fn new(
        assistant: Arc<dyn AssistantClient>,
        speech: Box<dyn SpeechSynthesizer>,
        speech_events: SpeechEventReceiver,
    ) -> Self {
        Self {
            assistant,
            speech,
            speech_events,
            pending: None,
        }
    }

    /// Whether an assistant request is in flight.
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Carry out effects in order.
    pub fn apply(&mut self, app: &mut App, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RequestReply(request) => {
                    if self.pending.is_some() {
                        warn!("request already in flight, dropping new request");
                        continue;
                    }
                    let assistant = Arc::clone(&self.assistant);
                    self.pending = Some(tokio::spawn(async move { assistant.send(request).await }));
                }
                Effect::CancelSpeech => self.speech.cancel(),
                Effect::Speak { id, text } => {
                    debug!(%id, chars = text.len(), "speaking reply");
                    if let Err(e) = self.speech.speak(id, &text) {
                        warn!(error = %e, %id, "speech playback failed");
                        app.speech_event(SpeechEvent::Failed(id));
                    }
                }
                Effect::Notify(notification) => app.notify(notification),
            }
        }
    }

    /// Drain speech signals and collect a finished reply, if any.
    pub async fn poll(&mut self, app: &mut App) {
        while let Ok(event) = self.speech_events.try_recv() {
            app.speech_event(event);
        }

        if !self.pending.as_ref().is_some_and(JoinHandle::is_finished) {
            return;
        }
        if let Some(handle) = self.pending.take() {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(AssistantError::Interrupted(e.to_string())));
            let effects = app.receive_reply(result);
            self.apply(app, effects);
        }
    }

    /// Wait for the in-flight request to finish and apply it.
    ///
    /// Used by one-shot and headless drivers; the UI loop polls instead.
    pub async fn settle(&mut self, app: &mut App) {
        if let Some(handle) = self.pending.take() {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(AssistantError::Interrupted(e.to_string())));
            let effects = app.receive_reply(result);
            self.apply(app, effects);
        }
        while let Ok(event) = self.speech_events.try_recv() {
            app.speech_event(event);
        }
    }

    /// Abort outstanding work and silence speech.
    pub fn shutdown(&mut self, app: &mut App) {
        if let Some(handle) = self.pending.take() {
            debug!("aborting in-flight assistant request");
            handle.abort();
        }
        let effects = app.controller.shutdown();
        self.apply(app, effects);
        self.speech.cancel();
    }
}
