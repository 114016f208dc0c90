//! Sub-genre to fundamental-genre classification
//!
//! - `genre`: the extracted record and its closed-set validator
//! - `run`: the sequential batch loop and its outcome mapping
//! - `output`: persisting the mapping as flat JSON

pub mod genre;
pub mod output;
pub mod run;

pub use genre::{GenreClassification, GenreValidator};
pub use output::write_classified;
pub use run::{
    classify_genres, classify_one, ClassificationOutcome, ConsoleProgress, FailureKind,
    GenreOutcome, NoProgress, ProgressObserver,
};
