// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
//   1. `train`   — trains a classifier on a .jsonl corpus
//   2. `predict` — loads a checkpoint and labels every step
//   3. `summary` — prints the inputs and size of an architecture
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, SummaryArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "han-classifier",
    version = "0.1.0",
    about = "Hierarchical attention network for per-step classification of nested text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; the CLI layer never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Summary(args) => run_summary(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on records in: {}", args.data);
    let best = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete. Best epoch {} (val_loss={:.4}, val_acc={:.1}%).",
        best.epoch,
        best.val_loss,
        best.val_acc * 100.0
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case    = PredictUseCase::new(&args.checkpoint_dir)?;
    let predictions = use_case.predict(&args.data)?;

    for record in &predictions {
        for step in &record.steps {
            println!(
                "{}\tstep {}\tlabel {}\tconfidence {:.4}",
                record.id, step.step, step.label, step.confidence
            );
        }
    }
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    use crate::application::summary_use_case::summarize;

    let summary = summarize(&args.into())?;
    println!("{summary}");
    Ok(())
}
