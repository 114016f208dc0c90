//! Prompt builders for model-backed tasks
//!
//! Each task gets its own generator function; callers wrap the returned text
//! in a user message and hand it to a structured prompt.

pub mod classify_prompt;

pub use classify_prompt::generate_classification_prompt;
