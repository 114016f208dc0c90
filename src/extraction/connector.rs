//! Model connector implementing the extract, validate, retry protocol
//!
//! The connector sends a [`StructuredPrompt`] to a [`Provider`], digs the
//! first `{...}` span out of the free-text reply, parses it into the target
//! type, runs the caller's validator, and on failure feeds the error back to
//! the model as a correction message. Transport failures are never retried
//! here.

use super::prompt::StructuredPrompt;
use super::schema::{StructuredOutput, Validator};
use crate::error::{PlaysiftError, Result};
use crate::providers::{Message, Provider};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Terminal result of a structured extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    /// A schema-valid, domain-valid record
    Extracted(T),
    /// Every attempt was rejected
    ExhaustedRetries {
        /// Backend calls made before giving up
        attempts: usize,
    },
}

impl<T> Extraction<T> {
    /// The extracted value, if any
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Extracted(value) => Some(value),
            Self::ExhaustedRetries { .. } => None,
        }
    }

    /// Whether the retry budget ran out
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ExhaustedRetries { .. })
    }
}

/// Single point of contact with the generative-model backend
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use playsift::config::OllamaConfig;
/// use playsift::extraction::{AcceptAll, ModelConnector, SchemaDescriptor, StructuredOutput, StructuredPrompt};
/// use playsift::providers::{Message, OllamaProvider};
///
/// #[derive(serde::Deserialize)]
/// struct Answer {
///     answer: String,
/// }
///
/// impl StructuredOutput for Answer {
///     fn schema() -> SchemaDescriptor {
///         SchemaDescriptor::new().field("answer", "str")
///     }
/// }
///
/// # async fn example() -> playsift::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let connector = ModelConnector::new(Arc::new(provider));
///
/// let mut prompt = StructuredPrompt::new(Answer::schema())
///     .with_message(Message::user("What is the capital of France?"));
/// let outcome = connector.extract::<Answer, _>(&mut prompt, 3, &AcceptAll).await?;
/// # Ok(())
/// # }
/// ```
pub struct ModelConnector {
    provider: Arc<dyn Provider>,
}

impl ModelConnector {
    /// Create a connector over the given provider
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// The underlying provider
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Run the extraction protocol with at most `retry_budget` backend calls
    ///
    /// Every response is appended to the prompt as an assistant message. A
    /// rejected response is followed by a user correction quoting the error,
    /// so after `k` rejections the conversation has grown by `2k` messages.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged on a transport failure; the
    /// prompt keeps whatever was appended before the failure.
    pub async fn extract<T, V>(
        &self,
        prompt: &mut StructuredPrompt,
        retry_budget: usize,
        validator: &V,
    ) -> Result<Extraction<T>>
    where
        T: StructuredOutput,
        V: Validator<T> + ?Sized,
    {
        let mut remaining = retry_budget;
        let mut attempts = 0;

        while remaining > 0 {
            debug!(
                "Making structured request with {} messages ({} attempts left)",
                prompt.len(),
                remaining
            );

            let response = self.provider.complete(&prompt.render()).await?;
            attempts += 1;

            let text = response.message.content;
            prompt.append(Message::assistant(text.clone()));

            match parse_response(&text, validator) {
                Ok(value) => return Ok(Extraction::Extracted(value)),
                Err(err) if err.is_recoverable() => {
                    warn!("Error parsing response: {}. Retrying. Resp: {}", err, text);
                    prompt.append(correction_message(&err));
                    remaining -= 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Extraction::ExhaustedRetries { attempts })
    }
}

/// Correction sent back to the model after a rejected response
pub fn correction_message(err: &PlaysiftError) -> Message {
    let detail = match err {
        PlaysiftError::Parse(msg) | PlaysiftError::Validation(msg) => msg.clone(),
        other => other.to_string(),
    };
    Message::user(format!(
        "That did not work. Here is the error I get: `{}`. Please try again.",
        detail
    ))
}

/// Collapse over-escaped ampersands (`\&` becomes `&`) until none remain
///
/// # Examples
///
/// ```
/// use playsift::extraction::normalize_escapes;
///
/// assert_eq!(normalize_escapes(r"R\&B"), "R&B");
/// assert_eq!(normalize_escapes(r"\\&"), "&");
/// ```
pub fn normalize_escapes(text: &str) -> String {
    let mut normalized = text.to_string();
    while normalized.contains("\\&") {
        normalized = normalized.replace("\\&", "&");
    }
    normalized
}

fn brace_span_regex() -> &'static Regex {
    static SPAN: OnceLock<Regex> = OnceLock::new();
    SPAN.get_or_init(|| Regex::new(r"\{[^}]*\}").expect("brace span pattern is valid"))
}

/// First `{` up to the next `}`, without any nesting awareness
///
/// A string value containing a literal `}` truncates the span; that is a
/// known limitation.
pub fn find_json_span(text: &str) -> Option<&str> {
    brace_span_regex().find(text).map(|m| m.as_str())
}

/// Normalize, locate, deserialize, then validate one response
///
/// # Errors
///
/// Returns `PlaysiftError::Parse` when no span is found or deserialization
/// fails, and `PlaysiftError::Validation` when the validator rejects the value.
pub fn parse_response<T, V>(text: &str, validator: &V) -> std::result::Result<T, PlaysiftError>
where
    T: StructuredOutput,
    V: Validator<T> + ?Sized,
{
    let normalized = normalize_escapes(text);
    let span = find_json_span(&normalized)
        .ok_or_else(|| PlaysiftError::Parse("No JSON found in response.".to_string()))?;
    let parsed: T = serde_json::from_str(span).map_err(|e| PlaysiftError::Parse(e.to_string()))?;
    validator.validate(parsed).map_err(PlaysiftError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::schema::{AcceptAll, SchemaDescriptor};
    use crate::providers::Role;
    use crate::test_utils::{FailingProvider, ScriptedProvider};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        reason: String,
        label: String,
    }

    impl StructuredOutput for Verdict {
        fn schema() -> SchemaDescriptor {
            SchemaDescriptor::new().field("reason", "str").field("label", "str")
        }
    }

    fn lowercase_in(permitted: &'static [&'static str]) -> impl Validator<Verdict> {
        move |mut v: Verdict| {
            v.label = v.label.to_lowercase();
            if permitted.contains(&v.label.as_str()) {
                Ok(v)
            } else {
                Err(format!("Invalid label: {}. Choose from {:?}", v.label, permitted))
            }
        }
    }

    fn prompt() -> StructuredPrompt {
        StructuredPrompt::new(Verdict::schema()).with_message(Message::user("judge"))
    }

    #[test]
    fn test_normalize_escapes() {
        assert_eq!(normalize_escapes(r"\&\&text\&"), "&&text&");
        assert_eq!(normalize_escapes("&&text&"), "&&text&");
        assert_eq!(normalize_escapes(r"\\\&"), "&");
        assert_eq!(normalize_escapes("no escapes"), "no escapes");
    }

    #[test]
    fn test_normalize_escapes_is_idempotent() {
        let once = normalize_escapes(r"R\&B and \\&drum \& bass");
        assert_eq!(normalize_escapes(&once), once);
    }

    #[test]
    fn test_find_json_span() {
        assert_eq!(
            find_json_span(r#"blah {"a": "b"} trailing {"c": 1}"#),
            Some(r#"{"a": "b"}"#)
        );
        assert_eq!(find_json_span("no braces here"), None);
        assert_eq!(find_json_span("only { open"), None);
        assert_eq!(find_json_span("} backwards {"), None);
    }

    #[test]
    fn test_find_json_span_is_not_nesting_aware() {
        let text = r#"{"reason": "uses {G} chords", "label": "rock"}"#;
        assert_eq!(find_json_span(text), Some(r#"{"reason": "uses {G}"#));
    }

    #[test]
    fn test_parse_response_markdown_fenced() {
        let text = "```json\n{\"reason\": \"loud\", \"label\": \"ROCK\"}\n```";
        let verdict: Verdict = parse_response(text, &lowercase_in(&["rock"])).unwrap();
        assert_eq!(verdict.label, "rock");
        assert_eq!(verdict.reason, "loud");
    }

    #[test]
    fn test_parse_response_missing_field_is_parse_error() {
        let err = parse_response::<Verdict, _>(r#"{"reason": "x"}"#, &AcceptAll).unwrap_err();
        assert!(matches!(err, PlaysiftError::Parse(_)));
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn test_parse_response_no_span_is_parse_error() {
        let err = parse_response::<Verdict, _>("I think it is rock.", &AcceptAll).unwrap_err();
        assert!(matches!(err, PlaysiftError::Parse(ref m) if m == "No JSON found in response."));
    }

    #[test]
    fn test_parse_response_rejected_value_is_validation_error() {
        let err = parse_response::<Verdict, _>(
            r#"{"reason": "x", "label": "jazz"}"#,
            &lowercase_in(&["rock", "pop"]),
        )
        .unwrap_err();
        assert!(matches!(err, PlaysiftError::Validation(_)));
        assert!(err.to_string().contains("jazz"));
    }

    #[test]
    fn test_parse_response_errors_are_recoverable() {
        let no_span = parse_response::<Verdict, _>("rock", &AcceptAll).unwrap_err();
        let rejected = parse_response::<Verdict, _>(
            r#"{"reason": "x", "label": "jazz"}"#,
            &lowercase_in(&["rock"]),
        )
        .unwrap_err();
        assert!(no_span.is_recoverable());
        assert!(rejected.is_recoverable());
        assert!(!PlaysiftError::Provider("down".into()).is_recoverable());
    }

    #[test]
    fn test_correction_message_quotes_error() {
        let msg = correction_message(&PlaysiftError::Validation("Invalid label: jazz".into()));
        assert_eq!(msg.role, Role::User);
        assert_eq!(
            msg.content,
            "That did not work. Here is the error I get: `Invalid label: jazz`. Please try again."
        );
    }

    #[tokio::test]
    async fn test_extract_success_first_try() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"Sure! {"reason": "guitars", "label": "Rock"} hope that helps"#,
        ]));
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        let outcome = connector
            .extract::<Verdict, _>(&mut prompt, 3, &lowercase_in(&["rock"]))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Extraction::Extracted(Verdict {
                reason: "guitars".to_string(),
                label: "rock".to_string(),
            })
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt.messages()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_extract_zero_budget_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![r#"{"reason": "x", "label": "rock"}"#]));
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        let outcome = connector
            .extract::<Verdict, _>(&mut prompt, 0, &AcceptAll)
            .await
            .unwrap();

        assert_eq!(outcome, Extraction::ExhaustedRetries { attempts: 0 });
        assert_eq!(provider.call_count(), 0);
        assert_eq!(prompt.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_unparsable_consumes_one_retry_and_one_correction() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "I would say rock",
            r#"{"reason": "x", "label": "rock"}"#,
        ]));
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        let outcome = connector
            .extract::<Verdict, _>(&mut prompt, 2, &lowercase_in(&["rock"]))
            .await
            .unwrap();

        assert!(!outcome.is_exhausted());
        assert_eq!(provider.call_count(), 2);
        let roles: Vec<Role> = prompt.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert!(prompt.messages()[2]
            .content
            .contains("No JSON found in response."));
    }

    #[tokio::test]
    async fn test_extract_validation_failure_quotes_invalid_value() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"{"reason": "swing", "label": "jazz"}"#,
        ]));
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        let outcome = connector
            .extract::<Verdict, _>(&mut prompt, 1, &lowercase_in(&["rock", "pop"]))
            .await
            .unwrap();

        assert_eq!(outcome, Extraction::ExhaustedRetries { attempts: 1 });
        assert_eq!(provider.call_count(), 1);
        let correction = &prompt.messages()[2];
        assert_eq!(correction.role, Role::User);
        assert!(correction.content.contains("jazz"));
    }

    #[tokio::test]
    async fn test_extract_always_unparsable_makes_exactly_budget_calls() {
        let provider = Arc::new(ScriptedProvider::repeating("no json, sorry"));
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        let outcome = connector
            .extract::<Verdict, _>(&mut prompt, 5, &AcceptAll)
            .await
            .unwrap();

        assert_eq!(outcome, Extraction::ExhaustedRetries { attempts: 5 });
        assert_eq!(provider.call_count(), 5);
        assert_eq!(prompt.len(), 1 + 2 * 5);
    }

    #[tokio::test]
    async fn test_extract_sends_growing_conversation() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "nope",
            r#"{"reason": "x", "label": "pop"}"#,
        ]));
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        connector
            .extract::<Verdict, _>(&mut prompt, 3, &AcceptAll)
            .await
            .unwrap();

        let sent = provider.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].len(), 2);
        assert_eq!(sent[1].len(), 4);
        assert!(sent.iter().all(|r| r[0].role == Role::System));
    }

    #[tokio::test]
    async fn test_extract_transport_failure_is_not_retried() {
        let provider = Arc::new(FailingProvider::default());
        let connector = ModelConnector::new(provider.clone());
        let mut prompt = prompt();

        let err = connector
            .extract::<Verdict, _>(&mut prompt, 10, &AcceptAll)
            .await
            .unwrap_err();

        assert_eq!(provider.call_count(), 1);
        assert!(matches!(
            err.downcast_ref::<PlaysiftError>(),
            Some(PlaysiftError::Provider(_))
        ));
        assert_eq!(prompt.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_handles_escaped_ampersand() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"{"reason": "smooth", "label": "R\&B"}"#,
        ]));
        let connector = ModelConnector::new(provider);
        let mut prompt = prompt();

        let verdict = connector
            .extract::<Verdict, _>(&mut prompt, 1, &lowercase_in(&["r&b"]))
            .await
            .unwrap()
            .into_value()
            .unwrap();

        assert_eq!(verdict.label, "r&b");
        assert_eq!(prompt.messages()[1].content, r#"{"reason": "smooth", "label": "R\&B"}"#);
    }
}
