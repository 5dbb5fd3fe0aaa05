// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and
// their flags. Flag names use underscores (`--batch_size`) and
// the path flags fall back to the SageMaker-style environment
// variables when omitted.
//
// Reference: Rust Book §12 (Building a CLI Program)
//            clap derive documentation

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    train_use_case::TrainConfig,
};
use crate::domain::errors::ConfigError;
use crate::ml::model::BackboneWeights;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier head on an image-folder dataset
    Train(TrainArgs),

    /// Evaluate a saved model on the test split
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Images per batch
    #[arg(long = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    /// Full passes over the training split
    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    /// AdamW learning rate
    #[arg(long, default_value_t = 0.1)]
    pub lr: f64,

    /// AdamW epsilon
    #[arg(long, default_value_t = 1e-8)]
    pub eps: f32,

    /// AdamW decoupled weight decay
    #[arg(long = "weight_decay", default_value_t = 1e-2)]
    pub weight_decay: f32,

    /// Seeds the backend, the shuffle and the augmentations
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long = "num_workers", default_value_t = 1)]
    pub num_workers: usize,

    /// Dataset root containing train/ and test/
    #[arg(long = "data_dir", env = "SM_CHANNEL_TRAIN")]
    pub data_dir: PathBuf,

    /// Where model.bin and its metadata are written
    #[arg(long = "model_dir", env = "SM_MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Where metrics.csv and hook output are written
    #[arg(long = "output_dir", env = "SM_OUTPUT_DATA_DIR")]
    pub output_dir: PathBuf,

    /// Pretrained backbone: torchvision .pth or Burn .bin record
    #[arg(long = "backbone_weights", env = "BACKBONE_WEIGHTS")]
    pub backbone_weights: Option<PathBuf>,

    /// Start from a randomly initialised backbone
    #[arg(long = "from_scratch")]
    pub from_scratch: bool,

    /// JSON file with telemetry hook settings
    #[arg(long = "hook_config", env = "HOOK_CONFIG_PATH")]
    pub hook_config: Option<PathBuf>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl TryFrom<TrainArgs> for TrainConfig {
    type Error = ConfigError;

    fn try_from(a: TrainArgs) -> Result<Self, Self::Error> {
        let backbone_weights = match (a.backbone_weights, a.from_scratch) {
            (Some(path), false) => BackboneWeights::from_path(path),
            (None, true) => BackboneWeights::Scratch,
            (Some(_), true) => return Err(ConfigError::ConflictingBackbone),
            (None, false) => return Err(ConfigError::MissingBackbone),
        };

        let mut cfg = TrainConfig::new(a.data_dir, a.model_dir, a.output_dir, backbone_weights);
        cfg.batch_size = a.batch_size;
        cfg.epochs = a.epochs;
        cfg.lr = a.lr;
        cfg.eps = a.eps;
        cfg.weight_decay = a.weight_decay;
        cfg.seed = a.seed;
        cfg.num_workers = a.num_workers;
        cfg.hook_config = a.hook_config;

        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Dataset root containing test/
    #[arg(long = "data_dir", env = "SM_CHANNEL_TRAIN")]
    pub data_dir: PathBuf,

    /// Directory written by `train`
    #[arg(long = "model_dir", env = "SM_MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Images per evaluation batch
    #[arg(long = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    /// Data loader worker threads
    #[arg(long = "num_workers", default_value_t = 1)]
    pub num_workers: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_dir:    a.data_dir,
            model_dir:   a.model_dir,
            batch_size:  a.batch_size,
            num_workers: a.num_workers,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::{CommandFactory, Parser};

    fn train_args(extra: &[&str]) -> Result<TrainArgs, clap::Error> {
        let mut argv = vec![
            "dog-breed-finetune",
            "train",
            "--data_dir",
            "/data",
            "--model_dir",
            "/model",
            "--output_dir",
            "/out",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv)?.command {
            Commands::Train(args) => Ok(args),
            Commands::Evaluate(_) => unreachable!(),
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = TrainConfig::try_from(train_args(&["--from_scratch"]).unwrap()).unwrap();
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.epochs, 2);
        assert_eq!(cfg.lr, 0.1);
        assert_eq!(cfg.eps, 1e-8);
        assert_eq!(cfg.weight_decay, 1e-2);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.backbone_weights, BackboneWeights::Scratch);
        assert_eq!(cfg.data_dir, PathBuf::from("/data"));
    }

    #[test]
    fn test_underscore_flags_and_weights() {
        let args = train_args(&[
            "--batch_size",
            "16",
            "--weight_decay",
            "0.05",
            "--backbone_weights",
            "/w/resnet50.pth",
        ])
        .unwrap();
        let cfg = TrainConfig::try_from(args).unwrap();
        assert_eq!(cfg.batch_size, 16);
        assert_eq!(cfg.weight_decay, 0.05);
        assert_eq!(
            cfg.backbone_weights,
            BackboneWeights::Torchvision("/w/resnet50.pth".into())
        );
    }

    #[test]
    fn test_backbone_source_required_and_exclusive() {
        let missing = TrainConfig::try_from(train_args(&[]).unwrap());
        assert_eq!(missing.unwrap_err(), ConfigError::MissingBackbone);

        let both = TrainConfig::try_from(
            train_args(&["--from_scratch", "--backbone_weights", "/w/b.bin"]).unwrap(),
        );
        assert_eq!(both.unwrap_err(), ConfigError::ConflictingBackbone);
    }

    #[test]
    fn test_invalid_values_rejected_at_the_boundary() {
        let args = train_args(&["--from_scratch", "--batch_size", "0"]).unwrap();
        assert_eq!(
            TrainConfig::try_from(args).unwrap_err(),
            ConfigError::NotPositive("batch_size")
        );
        assert!(train_args(&["--from_scratch", "--lr", "fast"]).is_err());
    }

    #[test]
    fn test_every_flag_has_help_text() {
        let cli = Cli::command();
        for sub in ["train", "evaluate"] {
            let cmd = cli.find_subcommand(sub).unwrap();
            for arg in cmd.get_arguments().filter(|a| a.get_long().is_some()) {
                if matches!(arg.get_id().as_str(), "help" | "version") {
                    continue;
                }
                assert!(
                    arg.get_help().is_some(),
                    "{sub} --{} has no help text",
                    arg.get_id()
                );
            }
        }
    }
}
