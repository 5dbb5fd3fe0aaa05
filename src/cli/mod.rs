// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and routes to a use case.
//
//   1. `train`    — fine-tune the head, save the model
//   2. `evaluate` — score a saved model on the test split
//
// The compute backend and device are picked here, once, and
// handed down explicitly.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;
use crate::backend::{default_device, InnerBackend, TrainingBackend};

#[derive(Parser, Debug)]
#[command(
    name = "dog-breed-finetune",
    version,
    about = "Fine-tune a pretrained ResNet-50 on a 133-class dog breed image folder."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let config = TrainConfig::try_from(args)?;
    let device = default_device();

    let report = TrainUseCase::new(config)?.execute::<TrainingBackend>(&device)?;

    println!(
        "Training complete. {} classes, model saved to {}",
        report.classes.len(),
        report.model_path.display()
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let device = default_device();
    let summary = EvaluateUseCase::new(args.into()).execute::<InnerBackend>(&device)?;

    println!(
        "Test set: Average loss: {:.4}, Accuracy: {}/{} ({:.0}%)",
        summary.avg_loss,
        summary.correct,
        summary.dataset_len,
        100.0 * summary.accuracy,
    );
    Ok(())
}
