//! Color themes for the TUI.
//!
//! [`Theme`] provides the Catppuccin Mocha/Latte palettes plus a high
//! contrast variant, selected by [`chatbox_engine::ThemeName`].

mod colors;

pub use colors::Theme;
