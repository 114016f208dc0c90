//! Output schema descriptors and validation hooks
//!
//! A schema descriptor only tells the model what to produce. The actual
//! contract is enforced in two phases: serde deserialization into the target
//! type, then a caller-supplied [`Validator`].

use serde::de::DeserializeOwned;
use std::fmt;

/// Ordered mapping from field name to a human-readable type hint
///
/// # Examples
///
/// ```
/// use playsift::extraction::SchemaDescriptor;
///
/// let schema = SchemaDescriptor::new()
///     .field("reason", "str")
///     .field("fundamental_genre", "str");
/// assert_eq!(schema.to_json(), r#"{"reason": "str", "fundamental_genre": "str"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDescriptor {
    fields: Vec<(String, String)>,
}

impl SchemaDescriptor {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing the hint if the name is already declared
    pub fn field(mut self, name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        let name = name.into();
        let type_hint = type_hint.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = type_hint,
            None => self.fields.push((name, type_hint)),
        }
        self
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field has been declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the descriptor as a single-line JSON object in declaration order
    pub fn to_json(&self) -> String {
        let body = self
            .fields
            .iter()
            .map(|(name, hint)| format!("{}: {}", json_string(name), json_string(hint)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", body)
    }
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl fmt::Display for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// A record that can be extracted from a model response
///
/// Implementors declare their schema explicitly; serde performs the
/// structural parse.
pub trait StructuredOutput: DeserializeOwned + Send {
    /// Field-name-to-type-hint mapping shown to the model
    fn schema() -> SchemaDescriptor;
}

/// Domain-level check applied after a successful structural parse
///
/// The validator may normalize the value (for example lower-casing a label)
/// and returns the value to keep, or an error message that is quoted back
/// to the model.
pub trait Validator<T>: Send + Sync {
    /// Validate and optionally normalize a parsed value
    fn validate(&self, value: T) -> std::result::Result<T, String>;
}

impl<T, F> Validator<T> for F
where
    F: Fn(T) -> std::result::Result<T, String> + Send + Sync,
{
    fn validate(&self, value: T) -> std::result::Result<T, String> {
        self(value)
    }
}

/// Validator that accepts every structurally valid value
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<T> Validator<T> for AcceptAll {
    fn validate(&self, value: T) -> std::result::Result<T, String> {
        Ok(value)
    }
}
