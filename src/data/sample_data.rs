// ============================================================
// Layer 4 — Sample Data Generator
// ============================================================
// Writes a small synthetic competition dataset so the whole
// pipeline can be exercised without downloading anything.
//
// Five prompts, each with a detailed and a curt answer. Each
// training row places the detailed answer on side A or B with
// even odds, then relabels roughly 10% of rows as ties.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

const PROMPTS: [&str; 5] = [
    "What is the capital of France?",
    "Explain quantum computing in simple terms.",
    "How do I make chocolate chip cookies?",
    "What are the benefits of exercise?",
    "Write a haiku about spring.",
];

const GOOD_RESPONSES: [&str; 5] = [
    "Paris is the capital of France.",
    "Quantum computing uses quantum bits or qubits that can exist in multiple states simultaneously.",
    "Mix butter, sugar, eggs, flour, and chocolate chips. Bake at 350°F for 12 minutes.",
    "Exercise improves cardiovascular health, strengthens muscles, and boosts mental well-being.",
    "Cherry blossoms bloom,\nSoft petals dance in the breeze,\nSpring awakens life.",
];

const BAD_RESPONSES: [&str; 5] = [
    "The capital is London.",
    "It's computers that are really fast.",
    "Buy them from the store.",
    "Exercise is tiring.",
    "Spring is nice.",
];

const TIE_RATE: f64 = 0.1;

/// Paths of the files a generator run produced.
#[derive(Debug, Clone)]
pub struct SampleFiles {
    pub train: PathBuf,
    pub test:  PathBuf,
}

pub struct SampleDataGenerator {
    rng: StdRng,
}

impl SampleDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Write `train.csv` and `test.csv` into `dir`.
    pub fn write(&mut self, dir: &Path, train_rows: usize, test_rows: usize) -> Result<SampleFiles> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let files = SampleFiles {
            train: dir.join("train.csv"),
            test:  dir.join("test.csv"),
        };
        self.write_train(&files.train, train_rows)?;
        self.write_test(&files.test, test_rows)?;

        tracing::info!(
            "Sample data written: {} training rows, {} evaluation rows in '{}'",
            train_rows,
            test_rows,
            dir.display()
        );
        Ok(files)
    }

    fn write_train(&mut self, path: &Path, rows: usize) -> Result<()> {
        let mut w = csv::Writer::from_path(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        w.write_record([
            "id", "prompt", "response_a", "response_b", "model_a", "model_b",
            "winner_model_a", "winner_model_b", "winner_tie",
        ])?;

        for i in 0..rows {
            let k = i % PROMPTS.len();
            let (a, b, mut winner) = if self.rng.gen_bool(0.5) {
                (GOOD_RESPONSES[k], BAD_RESPONSES[k], 0)
            } else {
                (BAD_RESPONSES[k], GOOD_RESPONSES[k], 1)
            };
            if self.rng.gen_bool(TIE_RATE) {
                winner = 2;
            }
            let flag = |w: usize| if winner == w { "1" } else { "0" };

            w.write_record([
                i.to_string().as_str(), PROMPTS[k], a, b, "model_a", "model_b",
                flag(0), flag(1), flag(2),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    fn write_test(&mut self, path: &Path, rows: usize) -> Result<()> {
        let mut w = csv::Writer::from_path(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        w.write_record(["id", "prompt", "response_a", "response_b"])?;

        for i in 0..rows {
            let k = i % PROMPTS.len();
            let (a, b) = if self.rng.gen_bool(0.5) {
                (GOOD_RESPONSES[k], BAD_RESPONSES[k])
            } else {
                (BAD_RESPONSES[k], GOOD_RESPONSES[k])
            };
            w.write_record([i.to_string().as_str(), PROMPTS[k], a, b])?;
        }
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::composer::LabelMode;
    use crate::data::loader::{EvaluationCsv, TrainingCsv};
    use crate::domain::traits::ExampleSource;

    #[test]
    fn test_generated_files_load_cleanly() {
        let dir   = tempfile::tempdir().unwrap();
        let files = SampleDataGenerator::new(42).write(dir.path(), 100, 20).unwrap();

        // Strict mode: every generated row has exactly one indicator set
        let train = TrainingCsv::new(&files.train, LabelMode::Strict).load_all().unwrap();
        let test  = EvaluationCsv::new(&files.test).load_all().unwrap();
        assert_eq!(train.len(), 100);
        assert_eq!(test.len(), 20);
        assert_eq!(test[19].id, "19");
    }

    #[test]
    fn test_same_seed_same_files() {
        let d1 = tempfile::tempdir().unwrap();
        let d2 = tempfile::tempdir().unwrap();
        let f1 = SampleDataGenerator::new(7).write(d1.path(), 30, 5).unwrap();
        let f2 = SampleDataGenerator::new(7).write(d2.path(), 30, 5).unwrap();
        assert_eq!(
            std::fs::read_to_string(f1.train).unwrap(),
            std::fs::read_to_string(f2.train).unwrap()
        );
    }
}
