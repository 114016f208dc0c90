//! Genre classification record and its closed-set validator

use crate::extraction::{SchemaDescriptor, StructuredOutput, Validator};
use serde::{Deserialize, Serialize};

/// What the model must return for one sub-genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreClassification {
    /// Free-text reasoning, given before the label
    pub reason: String,
    /// One of the permitted fundamental genres, lower-cased after validation
    pub fundamental_genre: String,
}

impl StructuredOutput for GenreClassification {
    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field("reason", "str")
            .field("fundamental_genre", "str")
    }
}

/// Accepts a classification only when its label is in the permitted set
///
/// Comparison is case-insensitive and otherwise exact. Accepted labels are
/// returned lower-cased.
///
/// # Examples
///
/// ```
/// use playsift::classify::{GenreClassification, GenreValidator};
/// use playsift::extraction::Validator;
///
/// let validator = GenreValidator::new(&["Rock".to_string(), "pop".to_string()]);
/// let value = GenreClassification {
///     reason: "distorted guitars".to_string(),
///     fundamental_genre: "ROCK".to_string(),
/// };
/// assert_eq!(validator.validate(value).unwrap().fundamental_genre, "rock");
/// ```
#[derive(Debug, Clone)]
pub struct GenreValidator {
    permitted: Vec<String>,
}

impl GenreValidator {
    /// Build a validator over `permitted`, folding every label to lower case
    pub fn new(permitted: &[String]) -> Self {
        Self {
            permitted: permitted.iter().map(|g| g.to_lowercase()).collect(),
        }
    }

    /// The lower-cased permitted labels
    pub fn permitted(&self) -> &[String] {
        &self.permitted
    }
}

impl Validator<GenreClassification> for GenreValidator {
    fn validate(
        &self,
        mut value: GenreClassification,
    ) -> std::result::Result<GenreClassification, String> {
        let folded = value.fundamental_genre.to_lowercase();
        if self.permitted.iter().any(|p| *p == folded) {
            value.fundamental_genre = folded;
            Ok(value)
        } else {
            Err(format!(
                "Invalid fundamental genre: \"{}\". Choose from {:?}",
                value.fundamental_genre, self.permitted
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::parse_response;

    fn permitted() -> Vec<String> {
        vec!["rock".to_string(), "pop".to_string()]
    }

    fn classification(label: &str) -> GenreClassification {
        GenreClassification {
            reason: "x".to_string(),
            fundamental_genre: label.to_string(),
        }
    }

    #[test]
    fn test_schema_fields() {
        assert_eq!(
            GenreClassification::schema().to_json(),
            r#"{"reason": "str", "fundamental_genre": "str"}"#
        );
    }

    #[test]
    fn test_validator_folds_case() {
        let validator = GenreValidator::new(&permitted());
        let value = validator.validate(classification("PoP")).unwrap();
        assert_eq!(value.fundamental_genre, "pop");
    }

    #[test]
    fn test_validator_rejects_outside_set_with_raw_value() {
        let validator = GenreValidator::new(&permitted());
        let err = validator.validate(classification("Jazz")).unwrap_err();
        assert!(err.contains("\"Jazz\""));
        assert!(err.contains("rock"));
    }

    #[test]
    fn test_validator_is_not_fuzzy() {
        let validator = GenreValidator::new(&permitted());
        assert!(validator.validate(classification(" rock")).is_err());
        assert!(validator.validate(classification("rocks")).is_err());
    }

    #[test]
    fn test_permitted_labels_are_folded() {
        let validator = GenreValidator::new(&["R&B".to_string()]);
        assert_eq!(validator.permitted(), &["r&b".to_string()]);
        assert!(validator.validate(classification("r&b")).is_ok());
    }

    #[test]
    fn test_noisy_response_extracts_lowercase_label() {
        let text = r#"blah blah {"reason": "x", "fundamental_genre": "ROCK"} trailing"#;
        let value: GenreClassification =
            parse_response(text, &GenreValidator::new(&permitted())).unwrap();
        assert_eq!(value, classification("rock"));
    }
}
