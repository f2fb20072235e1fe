// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads the training and evaluation CSV files into
// PreferenceExample rows using the `csv` crate with serde.
//
// Training header:
//   id, prompt, response_a, response_b, model_a, model_b,
//   winner_model_a, winner_model_b, winner_tie
//
// Evaluation header:
//   id, prompt, response_a, response_b
//
// Columns the pipeline does not use (model_a, model_b) are
// ignored. A missing file is a MissingInput error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::composer::{LabelMode, TextComposer};
use crate::domain::error::PipelineError;
use crate::domain::example::{PreferenceExample, WinnerIndicators};
use crate::domain::traits::ExampleSource;

#[derive(Debug, Deserialize)]
struct TrainingRecord {
    id:             String,
    prompt:         String,
    response_a:     String,
    response_b:     String,
    winner_model_a: f64,
    winner_model_b: f64,
    winner_tie:     f64,
}

#[derive(Debug, Deserialize)]
struct EvaluationRecord {
    id:         String,
    prompt:     String,
    response_a: String,
    response_b: String,
}

/// Labelled rows from a training CSV.
pub struct TrainingCsv {
    path:     PathBuf,
    composer: TextComposer,
}

impl TrainingCsv {
    pub fn new(path: impl Into<PathBuf>, mode: LabelMode) -> Self {
        Self { path: path.into(), composer: TextComposer::new(mode) }
    }
}

impl ExampleSource for TrainingCsv {
    fn load_all(&self) -> Result<Vec<PreferenceExample>> {
        let mut reader = open_reader(&self.path)?;
        let mut rows   = Vec::new();

        for (line, record) in reader.deserialize::<TrainingRecord>().enumerate() {
            let r = record.with_context(|| {
                format!("Cannot parse training row {} of '{}'", line + 1, self.path.display())
            })?;
            let indicators = WinnerIndicators::new(
                r.winner_model_a == 1.0,
                r.winner_model_b == 1.0,
                r.winner_tie     == 1.0,
            );
            let winner = self.composer.label(&r.id, indicators)?;
            rows.push(PreferenceExample::new(r.id, r.prompt, r.response_a, r.response_b, Some(winner)));
        }

        tracing::debug!("Loaded {} training rows from '{}'", rows.len(), self.path.display());
        Ok(rows)
    }
}

/// Unlabelled rows from an evaluation CSV.
pub struct EvaluationCsv {
    path: PathBuf,
}

impl EvaluationCsv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for EvaluationCsv {
    fn load_all(&self) -> Result<Vec<PreferenceExample>> {
        let mut reader = open_reader(&self.path)?;
        let mut rows   = Vec::new();

        for (line, record) in reader.deserialize::<EvaluationRecord>().enumerate() {
            let r = record.with_context(|| {
                format!("Cannot parse evaluation row {} of '{}'", line + 1, self.path.display())
            })?;
            rows.push(PreferenceExample::new(r.id, r.prompt, r.response_a, r.response_b, None));
        }

        tracing::debug!("Loaded {} evaluation rows from '{}'", rows.len(), self.path.display());
        Ok(rows)
    }
}

/// Fail with MissingInput unless `path` exists.
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::missing_input(path).into())
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    require_file(path)?;
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::Winner;
    use std::fs;

    const TRAIN: &str = "\
id,prompt,response_a,response_b,model_a,model_b,winner_model_a,winner_model_b,winner_tie
1,Hi?,\"Hello, there.\",Hey,m1,m2,1,0,0
2,Hi?,Hey,Hello,m1,m2,0,1,0
3,Hi?,Hey,Hello,m1,m2,0,0,1
4,Hi?,Hey,Hello,m1,m2,0,0,0
";

    #[test]
    fn test_loads_training_rows_in_order() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, TRAIN).unwrap();

        let rows = TrainingCsv::new(&path, LabelMode::Lenient).load_all().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].response_a, "Hello, there.");
        let winners: Vec<_> = rows.iter().map(|r| r.winner.unwrap()).collect();
        assert_eq!(winners, vec![Winner::A, Winner::B, Winner::Tie, Winner::Tie]);
    }

    #[test]
    fn test_strict_mode_surfaces_malformed_row() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, TRAIN).unwrap();

        let err = TrainingCsv::new(&path, LabelMode::Strict).load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedRow { id, .. }) if id == "4"
        ));
    }

    #[test]
    fn test_loads_evaluation_rows() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "id,prompt,response_a,response_b\n10,p,a,b\n11,q,c,d\n").unwrap();

        let rows = EvaluationCsv::new(&path).load_all().unwrap();
        assert_eq!(rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["10", "11"]);
        assert!(rows.iter().all(|r| r.winner.is_none()));
    }

    #[test]
    fn test_missing_file_is_missing_input() {
        let err = EvaluationCsv::new("/nonexistent/test.csv").load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingInput { .. })
        ));
    }
}
