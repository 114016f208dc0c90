//! Sequential classification over a batch of sub-genres

use super::genre::{GenreClassification, GenreValidator};
use crate::extraction::{Extraction, ModelConnector, StructuredOutput, StructuredPrompt};
use crate::prompts::generate_classification_prompt;
use crate::providers::Message;
use colored::Colorize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Why an item ended without a classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Every attempt was rejected
    ExhaustedRetries { attempts: usize },
    /// The backend could not be reached or answered with an error
    Transport(String),
    /// The batch was cancelled before this item ran
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExhaustedRetries { attempts } => {
                write!(f, "retries exhausted after {} attempts", attempts)
            }
            Self::Transport(msg) => write!(f, "transport failure: {}", msg),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreOutcome {
    Classified { genre: String, reason: String },
    Failed(FailureKind),
}

impl GenreOutcome {
    /// The fundamental genre, if classification succeeded
    pub fn genre(&self) -> Option<&str> {
        match self {
            Self::Classified { genre, .. } => Some(genre),
            Self::Failed(_) => None,
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, Self::Classified { .. })
    }
}

impl From<GenreClassification> for GenreOutcome {
    fn from(value: GenreClassification) -> Self {
        Self::Classified {
            genre: value.fundamental_genre,
            reason: value.reason,
        }
    }
}

/// One outcome per distinct input, in input order
///
/// Serializes as a flat JSON object mapping each sub-genre to its
/// fundamental genre, or `null` when the item failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationOutcome {
    entries: Vec<(String, GenreOutcome)>,
    index: HashMap<String, usize>,
}

impl ClassificationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome; a repeated sub-genre replaces the earlier entry
    pub fn insert(&mut self, item: impl Into<String>, outcome: GenreOutcome) {
        let item = item.into();
        match self.index.get(&item) {
            Some(&pos) => self.entries[pos].1 = outcome,
            None => {
                self.index.insert(item.clone(), self.entries.len());
                self.entries.push((item, outcome));
            }
        }
    }

    pub fn get(&self, item: &str) -> Option<&GenreOutcome> {
        self.index.get(item).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GenreOutcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items that received a genre
    pub fn classified_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_classified()).count()
    }

    /// Number of items recorded as failed
    pub fn failed_count(&self) -> usize {
        self.len() - self.classified_count()
    }
}

impl Serialize for ClassificationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (item, outcome) in &self.entries {
            map.serialize_entry(item, &outcome.genre())?;
        }
        map.end()
    }
}

/// Receives a notification after each item finishes
pub trait ProgressObserver: Send + Sync {
    /// `index` is 1-based
    fn item_finished(&self, index: usize, total: usize, item: &str, outcome: &GenreOutcome);
}

/// Prints one colored line per item to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn item_finished(&self, index: usize, total: usize, item: &str, outcome: &GenreOutcome) {
        let counter = format!("({}/{})", index, total);
        match outcome {
            GenreOutcome::Classified { genre, reason } => println!(
                " > {} {} -> {} ({})",
                counter,
                item,
                genre.green(),
                reason.dimmed()
            ),
            GenreOutcome::Failed(kind) => {
                println!(" > {} {} -> {} ({})", counter, item, "ERROR".red(), kind)
            }
        }
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn item_finished(&self, _index: usize, _total: usize, _item: &str, _outcome: &GenreOutcome) {}
}

/// Distinct items, first occurrence wins
fn distinct(items: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(String::as_str)
        .filter(|item| seen.insert(*item))
        .collect()
}

/// Classify one sub-genre with a fresh conversation
pub async fn classify_one(
    connector: &ModelConnector,
    validator: &GenreValidator,
    fundamentals: &[String],
    item: &str,
    retry_budget: usize,
) -> GenreOutcome {
    let mut prompt = StructuredPrompt::new(GenreClassification::schema()).with_message(
        Message::user(generate_classification_prompt(fundamentals, item)),
    );

    match connector
        .extract::<GenreClassification, _>(&mut prompt, retry_budget, validator)
        .await
    {
        Ok(Extraction::Extracted(value)) => value.into(),
        Ok(Extraction::ExhaustedRetries { attempts }) => {
            GenreOutcome::Failed(FailureKind::ExhaustedRetries { attempts })
        }
        Err(e) => {
            error!("Backend request failed for {:?}: {:#}", item, e);
            GenreOutcome::Failed(FailureKind::Transport(e.to_string()))
        }
    }
}

/// Classify every distinct item in order, never aborting on a per-item failure
///
/// Once `cancel` is tripped the remaining items are recorded as
/// [`FailureKind::Cancelled`] without contacting the backend.
pub async fn classify_genres(
    items: &[String],
    fundamentals: &[String],
    connector: &ModelConnector,
    retry_budget: usize,
    observer: &dyn ProgressObserver,
    cancel: &CancellationToken,
) -> ClassificationOutcome {
    let validator = GenreValidator::new(fundamentals);
    let items = distinct(items);
    let total = items.len();
    let mut outcome = ClassificationOutcome::new();

    info!("Classifying {} sub-genres", total);

    for (i, item) in items.into_iter().enumerate() {
        let result = if cancel.is_cancelled() {
            debug!("Skipping {:?}: batch cancelled", item);
            GenreOutcome::Failed(FailureKind::Cancelled)
        } else {
            classify_one(connector, &validator, fundamentals, item, retry_budget).await
        };

        observer.item_finished(i + 1, total, item, &result);
        outcome.insert(item, result);
    }

    info!(
        "Classified {} of {} sub-genres ({} failed)",
        outcome.classified_count(),
        outcome.len(),
        outcome.failed_count()
    );
    outcome
}
