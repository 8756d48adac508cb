//! UI widgets for the TUI.
//!
//! This module provides:
//! - [`StatusBar`] - Header with title, speaking status and voice toggle
//! - [`MessageList`] - Chat bubbles with follow mode
//! - [`Composer`] - Message input with a send affordance
//! - [`Toasts`] - Notification stack
//! - [`FooterHints`] - Bottom keybinding hints

mod composer;
mod footer_hints;
mod message_list;
mod status_bar;
mod toasts;

pub use composer::{Composer, ComposerOutcome, ComposerState, PLACEHOLDER, SEND_LABEL, WAITING_TEXT};
pub use footer_hints::{FooterHints, KeyHint};
pub use message_list::{
    MessageList, MessageListState, ASSISTANT_LABEL, EMPTY_SUBTITLE, EMPTY_TITLE, SPEAKING_MARKER,
    USER_LABEL, WHEEL_LINES,
};
pub use status_bar::{StatusBar, STATUS_READY, STATUS_SPEAKING, TITLE};
pub use toasts::{ToastStack, Toasts};
