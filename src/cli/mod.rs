// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with `clap` and hands the resulting config
// to a Layer 2 use case. The only printing in the crate
// happens here.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use commands::{BaselineArgs, Commands, PredictArgs, SampleDataArgs};

use crate::application::orchestrator::Prediction;

/// Rows shown after a run
const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "pairwise-preference",
    version = "0.1.0",
    about = "Predict which of two chatbot responses a human preferred (A, B, or tie)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Predict(args)    => run_predict(args),
            Commands::Baseline(args)   => run_baseline(args),
            Commands::SampleData(args) => run_sample_data(args),
        }
    }
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let output = args.output.clone();
    let run    = PredictUseCase::new(args.into()).execute()?;

    println!("Strategy: {}", run.strategy.name());
    print_preview(&run.predictions);
    println!("Wrote {} predictions to {}", run.predictions.len(), output);
    Ok(())
}

fn run_baseline(args: BaselineArgs) -> Result<()> {
    use crate::application::baseline_use_case::BaselineUseCase;

    let output = args.output.clone();
    let report = BaselineUseCase::new(args.into()).execute()?;

    if let Some(fit) = report.training {
        println!(
            "Heuristic on {} training rows: accuracy {:.4}, log loss {:.4}",
            fit.rows, fit.accuracy, fit.log_loss
        );
    }
    print_preview(&report.predictions);
    println!("Wrote {} predictions to {}", report.predictions.len(), output);
    Ok(())
}

fn run_sample_data(args: SampleDataArgs) -> Result<()> {
    use crate::data::sample_data::SampleDataGenerator;

    let files = SampleDataGenerator::new(args.seed).write(
        Path::new(&args.out_dir),
        args.train_rows,
        args.test_rows,
    )?;
    println!("Training data:   {}", files.train.display());
    println!("Evaluation data: {}", files.test.display());
    Ok(())
}

fn print_preview(predictions: &[Prediction]) {
    println!("\n{:<12} {:>8} {:>8} {:>8}", "id", "A", "B", "tie");
    for p in predictions.iter().take(PREVIEW_ROWS) {
        let t = p.probabilities;
        println!("{:<12} {:>8.4} {:>8.4} {:>8.4}", p.id, t.a, t.b, t.tie);
    }
    println!();
}
