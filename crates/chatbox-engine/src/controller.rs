//! Conversation controller.
//!
//! Owns the conversation and the request lifecycle. The controller is a
//! plain state machine: every transition updates state and returns the
//! [`Effect`]s the caller has to carry out (send a request, speak, show a
//! notification). It never performs I/O itself.
//!
//! ```text
//!   Idle ──submit(text)──▶ Awaiting ──reply──▶ Idle
//!                              └──────failure──▶ Idle (+ notification)
//! ```

use crate::assistant::{AssistantError, AssistantReply, AssistantRequest};
use crate::conversation::{ChatTurn, Conversation};
use crate::notification::Notification;
use crate::speech::{SpeechEvent, UtteranceId};
use tracing::debug;

/// Request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Ready to accept a message.
    #[default]
    Idle,
    /// A request is in flight.
    Awaiting,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send this request to the assistant.
    RequestReply(AssistantRequest),
    /// Stop any speech in progress.
    CancelSpeech,
    /// Read `text` aloud as utterance `id`.
    Speak { id: UtteranceId, text: String },
    /// Show a notification.
    Notify(Notification),
}

/// Owns the conversation, the loading flag and the speech state.
#[derive(Debug)]
pub struct ConversationController {
    conversation: Conversation,
    phase: Phase,
    auto_speak: bool,
    speaking: bool,
    /// The utterance whose signals are currently tracked.
    current_utterance: Option<UtteranceId>,
    next_utterance: u64,
}

impl Default for ConversationController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConversationController {
    /// Create a controller with an empty conversation.
    pub fn new(auto_speak: bool) -> Self {
        Self {
            conversation: Conversation::new(),
            phase: Phase::Idle,
            auto_speak,
            speaking: false,
            current_utterance: None,
            next_utterance: 1,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a reply is pending.
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Awaiting
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn auto_speak(&self) -> bool {
        self.auto_speak
    }

    /// Index of the turn being read aloud: the last turn, only when it is an
    /// assistant turn and speech is playing.
    pub fn speaking_turn(&self) -> Option<usize> {
        if !self.speaking {
            return None;
        }
        match self.conversation.last() {
            Some(turn) if turn.is_assistant() => Some(self.conversation.len() - 1),
            _ => None,
        }
    }

    /// Submit user text.
    ///
    /// Ignored when the text is blank or a request is already in flight.
    pub fn submit(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank submission");
            return Vec::new();
        }
        if self.phase == Phase::Awaiting {
            debug!("ignoring submission while awaiting a reply");
            return Vec::new();
        }

        self.conversation.push(ChatTurn::user(text));
        self.phase = Phase::Awaiting;
        debug!(turns = self.conversation.len(), "awaiting assistant reply");

        vec![Effect::RequestReply(AssistantRequest::new(text))]
    }

    /// Resolve the in-flight request.
    ///
    /// Ignored when no request is in flight.
    pub fn receive_reply(&mut self, result: Result<AssistantReply, AssistantError>) -> Vec<Effect> {
        if self.phase != Phase::Awaiting {
            debug!("ignoring reply with no request in flight");
            return Vec::new();
        }
        self.phase = Phase::Idle;

        let reply = match result {
            Ok(reply) if !reply.message.trim().is_empty() => reply,
            Ok(_) => {
                let message = AssistantError::EmptyReply.to_string();
                return vec![Effect::Notify(Notification::error(message))];
            }
            Err(e) => return vec![Effect::Notify(Notification::error(e.to_string()))],
        };

        self.conversation.push(ChatTurn::assistant(reply.message.clone()));
        debug!(turns = self.conversation.len(), "assistant replied");

        if self.auto_speak {
            self.begin_utterance(reply.message)
        } else {
            Vec::new()
        }
    }

    /// Flip the auto-speak preference.
    pub fn toggle_auto_speak(&mut self) -> Vec<Effect> {
        self.set_auto_speak(!self.auto_speak)
    }

    /// Set the auto-speak preference.
    ///
    /// Turning it off stops speech immediately; turning it on only affects
    /// later replies.
    pub fn set_auto_speak(&mut self, enabled: bool) -> Vec<Effect> {
        self.auto_speak = enabled;
        if enabled {
            vec![Effect::Notify(Notification::info(
                "Voice enabled",
                "The assistant will now speak responses",
            ))]
        } else {
            self.stop_speaking();
            vec![
                Effect::CancelSpeech,
                Effect::Notify(Notification::info(
                    "Voice disabled",
                    "The assistant will no longer speak",
                )),
            ]
        }
    }

    /// Apply a lifecycle signal from the speech backend.
    pub fn speech_event(&mut self, event: SpeechEvent) {
        if self.current_utterance != Some(event.id()) {
            debug!(?event, "ignoring signal for stale utterance");
            return;
        }
        match event {
            SpeechEvent::Started(_) => self.speaking = true,
            SpeechEvent::Ended(_) | SpeechEvent::Failed(_) => self.stop_speaking(),
        }
    }

    /// Effects needed to release resources before exiting.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        if self.current_utterance.is_some() || self.speaking {
            self.stop_speaking();
            vec![Effect::CancelSpeech]
        } else {
            Vec::new()
        }
    }

    fn begin_utterance(&mut self, text: String) -> Vec<Effect> {
        let id = UtteranceId(self.next_utterance);
        self.next_utterance += 1;
        self.speaking = false;
        self.current_utterance = Some(id);
        vec![Effect::CancelSpeech, Effect::Speak { id, text }]
    }

    fn stop_speaking(&mut self) {
        self.speaking = false;
        self.current_utterance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationVariant;
    use insta::assert_debug_snapshot;

    fn ok(message: &str) -> Result<AssistantReply, AssistantError> {
        Ok(AssistantReply::new(message))
    }

    fn speak_id(effects: &[Effect]) -> UtteranceId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Speak { id, .. } => Some(*id),
                _ => None,
            })
            .expect("no speak effect")
    }

    #[test]
    fn test_blank_submission_is_ignored() {
        let mut controller = ConversationController::new(true);
        assert!(controller.submit("").is_empty());
        assert!(controller.submit("   \n\t ").is_empty());
        assert!(controller.conversation().is_empty());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn test_submit_appends_user_turn_and_requests_reply() {
        let mut controller = ConversationController::new(true);
        let effects = controller.submit("  Hello \n");

        assert_eq!(
            effects,
            vec![Effect::RequestReply(AssistantRequest::new("Hello"))]
        );
        assert!(controller.is_loading());
        assert_eq!(controller.conversation().len(), 1);
        assert!(controller.conversation().turns()[0].is_user());
    }

    #[test]
    fn test_submit_while_awaiting_is_ignored() {
        let mut controller = ConversationController::new(true);
        controller.submit("first");
        assert!(controller.submit("second").is_empty());
        assert_eq!(controller.conversation().len(), 1);
    }

    #[test]
    fn test_successful_reply_scenario() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let effects = controller.receive_reply(ok("Hi there!"));

        assert!(!controller.is_loading());
        assert_debug_snapshot!(controller.conversation().turns(), @r###"
        [
            ChatTurn {
                text: "Hello",
                is_user: true,
            },
            ChatTurn {
                text: "Hi there!",
                is_user: false,
            },
        ]
        "###);

        let speaks: Vec<&Effect> = effects
            .iter()
            .filter(|e| matches!(e, Effect::Speak { .. }))
            .collect();
        assert_eq!(speaks.len(), 1);
        assert_eq!(
            effects,
            vec![
                Effect::CancelSpeech,
                Effect::Speak {
                    id: UtteranceId(1),
                    text: "Hi there!".into()
                }
            ]
        );
    }

    #[test]
    fn test_reply_without_auto_speak_does_not_speak() {
        let mut controller = ConversationController::new(false);
        controller.submit("Hello");
        let effects = controller.receive_reply(ok("Hi there!"));
        assert!(effects.is_empty());
        assert_eq!(controller.conversation().len(), 2);
    }

    #[test]
    fn test_failed_reply_scenario() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let effects =
            controller.receive_reply(Err(AssistantError::Remote("network down".into())));

        assert!(!controller.is_loading());
        assert_eq!(controller.conversation().turns(), &[ChatTurn::user("Hello")]);
        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::Notify(n) => {
                assert_eq!(n.variant, NotificationVariant::Destructive);
                assert!(n.description.contains("network down"));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_failure_without_message_uses_fallback() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let effects = controller.receive_reply(Err(AssistantError::Remote(String::new())));
        assert_eq!(
            effects,
            vec![Effect::Notify(Notification::error(
                "Failed to get response from assistant"
            ))]
        );
    }

    #[test]
    fn test_empty_reply_is_a_failure() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let effects = controller.receive_reply(ok("  "));
        assert_eq!(controller.conversation().len(), 1);
        assert!(matches!(&effects[..], [Effect::Notify(n)] if n.is_error()));
    }

    #[test]
    fn test_reply_while_idle_is_ignored() {
        let mut controller = ConversationController::new(true);
        assert!(controller.receive_reply(ok("unsolicited")).is_empty());
        assert!(controller.conversation().is_empty());
    }

    #[test]
    fn test_controller_accepts_new_submission_after_failure() {
        let mut controller = ConversationController::new(true);
        controller.submit("one");
        controller.receive_reply(Err(AssistantError::MissingMessage));
        let effects = controller.submit("two");
        assert_eq!(effects.len(), 1);
        assert_eq!(controller.conversation().len(), 2);
    }

    #[test]
    fn test_speech_signals_track_speaking_flag() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let id = speak_id(&controller.receive_reply(ok("Hi there!")));

        assert!(!controller.is_speaking());
        controller.speech_event(SpeechEvent::Started(id));
        assert!(controller.is_speaking());
        assert_eq!(controller.speaking_turn(), Some(1));

        controller.speech_event(SpeechEvent::Ended(id));
        assert!(!controller.is_speaking());
        assert_eq!(controller.speaking_turn(), None);
    }

    #[test]
    fn test_speech_failure_resets_flag_silently() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let id = speak_id(&controller.receive_reply(ok("Hi")));
        controller.speech_event(SpeechEvent::Started(id));
        controller.speech_event(SpeechEvent::Failed(id));
        assert!(!controller.is_speaking());
    }

    #[test]
    fn test_toggle_off_cancels_speech_immediately() {
        let mut controller = ConversationController::new(true);
        controller.submit("Hello");
        let id = speak_id(&controller.receive_reply(ok("Hi there!")));
        controller.speech_event(SpeechEvent::Started(id));

        let effects = controller.toggle_auto_speak();
        assert!(!controller.auto_speak());
        assert!(!controller.is_speaking());
        assert_eq!(effects[0], Effect::CancelSpeech);
        assert!(
            matches!(&effects[1], Effect::Notify(n) if n.title == "Voice disabled")
        );

        // Late signals from the cancelled utterance change nothing.
        controller.speech_event(SpeechEvent::Started(id));
        assert!(!controller.is_speaking());
        controller.speech_event(SpeechEvent::Ended(id));
        assert!(!controller.is_speaking());
    }

    #[test]
    fn test_toggle_on_is_not_retroactive() {
        let mut controller = ConversationController::new(false);
        controller.submit("Hello");
        controller.receive_reply(ok("Hi there!"));

        let effects = controller.toggle_auto_speak();
        assert!(controller.auto_speak());
        assert_eq!(effects.len(), 1);
        assert!(matches!(&effects[0], Effect::Notify(n) if n.title == "Voice enabled"));
    }

    #[test]
    fn test_newest_utterance_wins() {
        let mut controller = ConversationController::new(true);
        controller.submit("one");
        let first = speak_id(&controller.receive_reply(ok("first reply")));
        controller.speech_event(SpeechEvent::Started(first));

        controller.submit("two");
        // While awaiting, the last turn is a user turn: nothing is highlighted.
        assert_eq!(controller.speaking_turn(), None);

        let second = speak_id(&controller.receive_reply(ok("second reply")));
        assert_ne!(first, second);

        // The old utterance ending must not clear the new one.
        controller.speech_event(SpeechEvent::Started(second));
        controller.speech_event(SpeechEvent::Ended(first));
        assert!(controller.is_speaking());
        assert_eq!(controller.speaking_turn(), Some(3));
    }

    #[test]
    fn test_shutdown_cancels_active_speech() {
        let mut controller = ConversationController::new(true);
        assert!(controller.shutdown().is_empty());

        controller.submit("Hello");
        let id = speak_id(&controller.receive_reply(ok("Hi")));
        controller.speech_event(SpeechEvent::Started(id));
        assert_eq!(controller.shutdown(), vec![Effect::CancelSpeech]);
        assert!(!controller.is_speaking());
    }
}
