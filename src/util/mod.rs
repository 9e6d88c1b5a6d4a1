//! Text helpers for terminal output.
//!
//! - **Width**: Unicode-aware display width and truncation
//! - **Sanitizing**: control characters and escape sequences removed from feed text
//! - **Excerpts**: HTML bodies reduced to a short plain-text line
//!
//! ```
//! use blogview::util::{display_width, excerpt, truncate_to_width};
//!
//! assert_eq!(display_width("Hello 世界"), 10);
//! assert_eq!(truncate_to_width("Long article title", 8), "Long...");
//! assert_eq!(excerpt("<p>Hello <b>there</b></p>", 20), "Hello there");
//! ```

mod text;

pub use text::{display_width, excerpt, html_to_text, strip_control_chars, truncate_to_width};
