//! Structured-output extraction from generative-model responses
//!
//! - `schema`: schema descriptors, the `StructuredOutput` trait and validators
//! - `prompt`: the conversation plus schema that gets rendered for the backend
//! - `connector`: the extract, validate, retry loop

pub mod connector;
pub mod prompt;
pub mod schema;

pub use connector::{
    correction_message, find_json_span, normalize_escapes, parse_response, Extraction,
    ModelConnector,
};
pub use prompt::StructuredPrompt;
pub use schema::{AcceptAll, SchemaDescriptor, StructuredOutput, Validator};
