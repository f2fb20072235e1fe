// ============================================================
// Layer 4 — Submission Writer
// ============================================================
// Writes one row per evaluation example:
//
//   id, winner_model_a, winner_model_b, winner_tie
//
// The header is always written, even for zero rows. The file
// is written next to the target under a temporary name and
// renamed into place once complete; on any failure the
// temporary file is removed, so a failed run never leaves a
// half-written submission behind.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::triple::ProbabilityTriple;

const HEADER: [&str; 4] = ["id", "winner_model_a", "winner_model_b", "winner_tie"];

/// One output row in the competition format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub id:             String,
    pub winner_model_a: f64,
    pub winner_model_b: f64,
    pub winner_tie:     f64,
}

impl SubmissionRow {
    pub fn new(id: impl Into<String>, p: ProbabilityTriple) -> Self {
        Self {
            id:             id.into(),
            winner_model_a: p.a,
            winner_model_b: p.b,
            winner_tie:     p.tie,
        }
    }

    #[cfg(test)]
    pub fn probabilities(&self) -> ProbabilityTriple {
        ProbabilityTriple::new(self.winner_model_a, self.winner_model_b, self.winner_tie)
    }
}

/// Write `rows` to `path`, replacing any existing file.
pub fn write_submission(path: &Path, rows: &[SubmissionRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create output directory '{}'", parent.display()))?;
    }

    let partial = path.with_extension("csv.partial");
    let written = write_rows(&partial, rows).and_then(|()| {
        fs::rename(&partial, path)
            .with_context(|| format!("Cannot move submission into place at '{}'", path.display()))
    });
    if let Err(e) = written {
        if partial.exists() {
            if let Err(rm) = fs::remove_file(&partial) {
                tracing::warn!("Cannot remove '{}': {}", partial.display(), rm);
            }
        }
        return Err(e);
    }

    tracing::info!("Wrote {} predictions to '{}'", rows.len(), path.display());
    Ok(())
}

fn write_rows(path: &Path, rows: &[SubmissionRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a submission file back.
#[cfg(test)]
pub fn read_submission(path: &Path) -> Result<Vec<SubmissionRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<SubmissionRow>, _>>()
        .with_context(|| format!("Cannot parse '{}'", path.display()))
}
