//! Sub-genre classification prompt
//!
//! This module builds the user instruction that seeds each classification
//! conversation: the closed set of fundamental genres followed by the one
//! sub-genre to place.

/// Generates the instruction for classifying a single sub-genre
///
/// The fundamental genres are rendered as a pretty-printed JSON array so the
/// model sees the exact spelling it must reproduce.
///
/// # Arguments
///
/// * `fundamentals` - The permitted fundamental genre labels
/// * `genre` - The sub-genre to classify
///
/// # Examples
///
/// ```
/// use playsift::prompts::classify_prompt::generate_classification_prompt;
///
/// let fundamentals = vec!["rock".to_string(), "pop".to_string()];
/// let prompt = generate_classification_prompt(&fundamentals, "shoegaze");
/// assert!(prompt.contains("\"rock\""));
/// assert!(prompt.ends_with("Classify the sub-genre: \"shoegaze\""));
/// ```
pub fn generate_classification_prompt(fundamentals: &[String], genre: &str) -> String {
    let listing = serde_json::to_string_pretty(fundamentals).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are tasked with classifying sub-genres of music into their respective fundamental genres.

Here is a list of the fundamental genres:
{listing}

You must first give your reasoning for why the sub-genre belongs to the fundamental genre.

Then, you must output the exact fundamental genre that the sub-genre belongs to. Do not change case or spelling.

Classify the sub-genre: "{genre}""#
    )
}
