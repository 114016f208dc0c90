//! Writes the classification mapping to disk

use super::run::ClassificationOutcome;
use crate::error::Result;
use anyhow::Context;
use std::path::Path;
use tracing::info;

/// Write `outcome` as a pretty-printed flat JSON object
///
/// Parent directories are created as needed and an existing file is
/// overwritten.
pub fn write_classified(path: &Path, outcome: &ClassificationOutcome) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(outcome)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote {} classifications to {}", outcome.len(), path.display());
    Ok(())
}
