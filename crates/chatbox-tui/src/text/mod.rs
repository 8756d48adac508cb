//! Text layout utilities.
//!
//! - [`wrap_text`] - Wrap message text to a bubble width
//! - [`visual_width`], [`char_width`], [`truncate_to_width`] - Unicode-aware width handling

mod width;
mod wrap;

pub use width::{char_width, truncate_to_width, visual_width};
pub use wrap::{wrap_text, widest_line};
