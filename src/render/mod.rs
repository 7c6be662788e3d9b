//! Rendering of analysis results to JSON and plain text.

mod json;
mod text;

pub use json::{to_json, JsonFormat};
pub use text::{to_text, TextOptions};
