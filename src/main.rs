#![recursion_limit = "256"]

mod application;
mod backend;
mod cli;
mod data;
mod domain;
mod infra;
mod ml;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

/// Outputs of the classification head: one per dog breed.
pub const NUM_CLASSES: usize = 133;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dog_breed_finetune=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
