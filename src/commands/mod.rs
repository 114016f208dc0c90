/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `classify`: classify the sub-genre list into fundamental genres
- `sync`: load the streaming-history export into the local database
- `enrich`: fetch catalog metadata for synced songs and their artists

These handlers stay small and delegate to the library components.
*/

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use std::sync::Arc;

// Classify command handler
pub mod classify {
    //! Genre classification handler.
    //!
    //! Builds the provider and connector, runs the batch with console
    //! progress, and writes the mapping even when the batch was cancelled.

    use super::*;
    use crate::catalog::load_genres;
    use crate::classify::{
        classify_genres, write_classified, ClassificationOutcome, ConsoleProgress,
        ProgressObserver,
    };
    use crate::extraction::ModelConnector;
    use crate::providers::{create_provider, Provider};
    use tokio_util::sync::CancellationToken;

    /// Response to the n-th Ctrl-C received during a batch
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Interrupt {
        /// Stop after the current item and still write the output
        Cancel,
        /// Leave immediately with the conventional SIGINT status
        Exit,
    }

    pub(crate) fn interrupt_action(count: usize) -> Interrupt {
        if count <= 1 {
            Interrupt::Cancel
        } else {
            Interrupt::Exit
        }
    }

    fn spawn_interrupt_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut count = 0;
            while tokio::signal::ctrl_c().await.is_ok() {
                count += 1;
                match interrupt_action(count) {
                    Interrupt::Cancel => {
                        tracing::warn!(
                            "Interrupted, finishing the current item (Ctrl-C again to exit)"
                        );
                        cancel.cancel();
                    }
                    Interrupt::Exit => {
                        tracing::warn!("Interrupted again, exiting without writing output");
                        std::process::exit(130);
                    }
                }
            }
        })
    }

    /// Classify the configured catalog and write the result
    ///
    /// The first Ctrl-C stops the batch between items and the remaining
    /// items are written as `null`. A second Ctrl-C exits with status 130.
    pub async fn run_classify(config: Config) -> Result<ClassificationOutcome> {
        let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.provider)?);

        let cancel = CancellationToken::new();
        let watcher = spawn_interrupt_watcher(cancel.clone());

        let outcome = classify_with(&config, provider, &ConsoleProgress, &cancel).await;
        watcher.abort();
        outcome
    }

    /// Run the batch against an explicit provider and write the output file
    pub async fn classify_with(
        config: &Config,
        provider: Arc<dyn Provider>,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<ClassificationOutcome> {
        let genres = load_genres(&config.classify.genres_path)?;
        tracing::info!(
            "Loaded {} sub-genres from {}",
            genres.len(),
            config.classify.genres_path.display()
        );

        let connector = ModelConnector::new(provider);
        let outcome = classify_genres(
            &genres,
            &config.classify.fundamental_genres,
            &connector,
            config.classify.retry_budget,
            observer,
            cancel,
        )
        .await;

        write_classified(&config.classify.output_path, &outcome)?;

        println!(
            "{} {} classified, {} failed -> {}",
            "Done:".bold(),
            outcome.classified_count().to_string().green(),
            outcome.failed_count().to_string().red(),
            config.classify.output_path.display()
        );
        Ok(outcome)
    }

}

// Sync command handler
pub mod sync {
    use super::*;
    use crate::history::{sync_history, SyncReport};
    use crate::storage::HistoryStore;

    /// Mirror the configured history directory into the database
    pub fn run_sync(config: &Config) -> Result<SyncReport> {
        let store = HistoryStore::open(config.history.db_path.as_deref())?;
        tracing::info!("Using history database {}", store.db_path().display());

        let report = sync_history(&store, &config.history.data_dir)?;
        if report.skipped {
            println!("{}", "History unchanged, nothing to do".yellow());
        } else {
            println!(
                "Total spans: {}, valid spans: {} (filtered out {})",
                report.total_spans, report.valid_spans, report.filtered
            );
            println!(
                "{}",
                format!("Stored {} songs and {} plays", report.songs, report.plays).green()
            );
        }
        Ok(report)
    }

}

// Enrich command handler
pub mod enrich {
    use super::*;
    use crate::catalog::{create_catalog, Catalog};
    use crate::history::{enrich_history, EnrichReport};
    use crate::storage::HistoryStore;

    /// Enrich the configured database from the configured catalog
    pub async fn run_enrich(config: &Config) -> Result<EnrichReport> {
        let catalog = create_catalog(&config.catalog)?;
        enrich_with(config, catalog.as_ref()).await
    }

    /// Enrich the configured database from an explicit catalog
    pub async fn enrich_with(config: &Config, catalog: &dyn Catalog) -> Result<EnrichReport> {
        let store = HistoryStore::open(config.history.db_path.as_deref())?;
        tracing::info!("Using history database {}", store.db_path().display());

        println!("{}", "Syncing song, artist, and album data".bold());
        let report = enrich_history(&store, catalog, config.catalog.batch_size).await?;

        println!("> Unique songs: {}", report.unique_songs);
        println!("> Existing songs: {}", report.existing_songs);
        println!("> New songs: {}", report.new_songs);
        println!("> Unique artists: {}", report.unique_artists);
        println!("> Existing artists: {}", report.existing_artists);
        println!("> New artists: {}", report.new_artists);
        println!(
            "{}",
            format!(
                "Stored {} songs, {} albums and {} artists",
                report.songs_stored, report.albums_stored, report.artists_stored
            )
            .green()
        );
        Ok(report)
    }

}
