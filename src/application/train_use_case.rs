// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full fine-tuning run in order:
//
//   Step 1: Log backend, hyperparameters and paths
//   Step 2: Seed the backend                     (Layer 5 - ml)
//   Step 3: Build model, freeze the backbone     (Layer 5 - ml)
//   Step 4: Create the hook, attach model + loss (Layer 6 - infra)
//   Step 5: Build train / test loaders           (Layer 4 - data)
//   Step 6: AdamW over the head only             (Layer 5 - ml)
//   Step 7: Per epoch: train pass, test pass,
//           metrics rows                         (Layer 5 / 6)
//   Step 8: Save weights, config, class names    (Layer 6 - infra)
//   Step 9: Close the hook
//
// Any failure stops the run; nothing is retried.
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::AdamWConfig,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{build_loaders, LoaderOptions, transform::{CROP_SIZE, RESIZE_SIZE}};
use crate::domain::errors::ConfigError;
use crate::domain::stats::EpochSummary;
use crate::domain::traits::EpochContext;
use crate::infra::{
    checkpoint::CheckpointManager,
    hook::HookConfig,
    metrics::MetricsLogger,
};
use crate::ml::{
    evaluator::evaluate_epoch,
    model::{build_model, BackboneWeights, ClassifierConfig, ClassifierHead},
    trainer::train_epoch,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for one run. Checked once by `validate` and never
// changed afterwards; saved next to the weights as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub batch_size:       usize,
    pub epochs:           usize,
    pub lr:               f64,
    pub eps:              f32,
    pub weight_decay:     f32,
    pub seed:             u64,
    pub num_workers:      usize,
    pub resize:           u32,
    pub crop:             u32,
    pub data_dir:         PathBuf,
    pub model_dir:        PathBuf,
    pub output_dir:       PathBuf,
    pub backbone_weights: BackboneWeights,
    pub hook_config:      Option<PathBuf>,
}

impl TrainConfig {
    /// Default hyperparameters for the given paths.
    pub fn new(
        data_dir:         impl Into<PathBuf>,
        model_dir:        impl Into<PathBuf>,
        output_dir:       impl Into<PathBuf>,
        backbone_weights: BackboneWeights,
    ) -> Self {
        Self {
            batch_size:   64,
            epochs:       2,
            lr:           0.1,
            eps:          1e-8,
            weight_decay: 1e-2,
            seed:         42,
            num_workers:  1,
            resize:       RESIZE_SIZE,
            crop:         CROP_SIZE,
            data_dir:     data_dir.into(),
            model_dir:    model_dir.into(),
            output_dir:   output_dir.into(),
            backbone_weights,
            hook_config:  None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::NotPositive("batch_size"));
        }
        if self.epochs == 0 {
            return Err(ConfigError::NotPositive("epochs"));
        }
        if !self.lr.is_finite() {
            return Err(ConfigError::NotFinite("lr"));
        }
        if self.lr <= 0.0 {
            return Err(ConfigError::NotPositive("lr"));
        }
        if !self.eps.is_finite() {
            return Err(ConfigError::NotFinite("eps"));
        }
        if self.eps <= 0.0 {
            return Err(ConfigError::NotPositive("eps"));
        }
        if !self.weight_decay.is_finite() {
            return Err(ConfigError::NotFinite("weight_decay"));
        }
        if self.crop == 0 {
            return Err(ConfigError::NotPositive("crop"));
        }
        if self.crop > self.resize {
            return Err(ConfigError::CropLargerThanResize {
                crop: self.crop,
                resize: self.resize,
            });
        }
        Ok(())
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions::new(self.batch_size)
            .with_seed(self.seed)
            .with_num_workers(self.num_workers)
            .with_sizes(self.resize, self.crop)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Train and eval summaries, in the order they ran
    pub history:    Vec<EpochSummary>,
    pub model_path: PathBuf,
    pub classes:    Vec<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:       TrainConfig,
    architecture: ClassifierConfig,
}

impl TrainUseCase {
    /// Fails if the configuration is invalid.
    pub fn new(config: TrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            architecture: ClassifierConfig::resnet50(),
        })
    }

    /// Replace the default ResNet-50 architecture.
    pub fn with_architecture(mut self, architecture: ClassifierConfig) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Run the full fine-tuning pipeline on `device`.
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Log the run ───────────────────────────────────────────────
        tracing::info!("Backend: {} on {:?}", B::name(), device);
        tracing::info!(
            "Hyperparameters: batch_size={}, epochs={}, lr={}, eps={}, weight_decay={}, seed={}",
            cfg.batch_size, cfg.epochs, cfg.lr, cfg.eps, cfg.weight_decay, cfg.seed,
        );
        tracing::info!(
            "Data paths: data_dir='{}', model_dir='{}', output_dir='{}'",
            cfg.data_dir.display(),
            cfg.model_dir.display(),
            cfg.output_dir.display(),
        );

        // ── Step 2: Seed ──────────────────────────────────────────────────────
        B::seed(cfg.seed);

        // ── Step 3: Model ─────────────────────────────────────────────────────
        let mut model = build_model::<B>(&self.architecture, &cfg.backbone_weights, device)
            .context("Cannot build the model")?;

        // ── Step 4: Hook ──────────────────────────────────────────────────────
        let hook_config = match &cfg.hook_config {
            Some(path) => HookConfig::from_json_file(path)?,
            None => HookConfig::default(),
        };
        let mut hook = hook_config.create(&cfg.output_dir)?;
        hook.register_module(&model.summary())?;
        hook.register_loss("cross_entropy")?;

        // ── Step 5: Data ──────────────────────────────────────────────────────
        let (train_loader, test_loader) =
            build_loaders::<B>(&cfg.data_dir, &cfg.loader_options(), device)
                .with_context(|| format!("Cannot load dataset from '{}'", cfg.data_dir.display()))?;
        tracing::info!(
            "Dataset: {} training images, {} test images, {} classes",
            train_loader.len(),
            test_loader.len(),
            train_loader.classes().len(),
        );

        // ── Step 6: Optimiser (head parameters only) ──────────────────────────
        let mut optim = AdamWConfig::new()
            .with_epsilon(cfg.eps)
            .with_weight_decay(cfg.weight_decay)
            .init::<B, ClassifierHead<B>>();

        // ── Step 7: Epoch loop ────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        tracing::debug!("Metrics CSV: '{}'", metrics.csv_path().display());
        let mut history = Vec::with_capacity(cfg.epochs * 2);

        for epoch in 1..=cfg.epochs {
            let mut ctx = EpochContext::new(epoch, &mut *hook);

            let (trained, train_summary) =
                train_epoch(model, &mut optim, cfg.lr, &train_loader, &mut ctx)?;
            model = trained;

            let eval_summary = evaluate_epoch(&model.valid(), &test_loader, &mut ctx)?;

            metrics.log(&train_summary)?;
            metrics.log(&eval_summary)?;
            history.push(train_summary);
            history.push(eval_summary);
        }

        // ── Step 8: Persist ───────────────────────────────────────────────────
        tracing::info!("Saving the model");
        let checkpoint = CheckpointManager::new(&cfg.model_dir)?;
        let model_path = checkpoint.save_model(&model)?;
        checkpoint.save_architecture(&self.architecture)?;
        checkpoint.save_config(cfg)?;
        checkpoint.save_classes(train_loader.classes())?;

        // ── Step 9: Flush telemetry ───────────────────────────────────────────
        hook.close()?;

        tracing::info!("Training complete!");
        Ok(TrainReport {
            history,
            model_path,
            classes: train_loader.classes().to_vec(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::path::Path;
    use tempfile::tempdir;

    use crate::data::tests::write_image_folder;
    use crate::domain::stats::Phase;
    use crate::ml::model::Classifier;
    use crate::ml::resnet::ResNetConfig;

    type TestBackend = Autodiff<NdArray>;

    pub(crate) fn small_run(root: &Path) -> TrainUseCase {
        let mut cfg = TrainConfig::new(
            root.join("data"),
            root.join("model"),
            root.join("output"),
            BackboneWeights::Scratch,
        );
        cfg.batch_size = 5;
        cfg.epochs = 1;
        cfg.resize = 20;
        cfg.crop = 16;
        TrainUseCase::new(cfg)
            .unwrap()
            .with_architecture(ClassifierConfig::new(ResNetConfig::new([1, 1, 1, 1])))
    }

    #[test]
    fn test_end_to_end_small_run() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        write_image_folder(&data, "train", &["akita", "beagle"], 10);
        write_image_folder(&data, "test", &["akita", "beagle"], 10);

        let use_case = small_run(dir.path());
        let device = Default::default();
        let report = use_case.execute::<TestBackend>(&device).unwrap();

        assert_eq!(report.history.len(), 2);
        assert_eq!(report.classes, vec!["akita", "beagle"]);
        let train = report.history[0];
        let eval = report.history[1];
        assert_eq!(train.phase, Phase::Train);
        assert_eq!(train.batches, 4);
        assert_eq!(eval.phase, Phase::Eval);
        assert_eq!(eval.samples, 20);
        for s in &report.history {
            assert!((0.0..=1.0).contains(&s.accuracy));
            assert!(s.avg_loss >= 0.0);
        }

        // weights load back into the same architecture
        assert!(report.model_path.exists());
        let checkpoint = CheckpointManager::open(dir.path().join("model")).unwrap();
        let architecture = checkpoint.load_architecture().unwrap();
        let fresh: Classifier<NdArray> = architecture.init(&device);
        let restored = checkpoint.load_model(fresh, &device).unwrap();
        assert_eq!(restored.head.output.weight.dims(), [256, 133]);
        assert_eq!(checkpoint.load_classes().unwrap(), vec!["akita", "beagle"]);
        assert_eq!(checkpoint.load_config().unwrap(), *use_case.config());

        let csv = std::fs::read_to_string(dir.path().join("output/metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(dir.path().join("output/hook/steps.jsonl").exists());
    }

    #[test]
    fn test_missing_data_dir_fails_before_any_epoch() {
        let dir = tempdir().unwrap();
        let use_case = small_run(dir.path());
        let err = use_case
            .execute::<TestBackend>(&Default::default())
            .unwrap_err();

        assert!(format!("{err:#}").contains("dataset directory not found"));
        assert!(!dir.path().join("output/metrics.csv").exists());
        assert!(!dir.path().join("model/model.bin").exists());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let base = TrainConfig::new("d", "m", "o", BackboneWeights::Scratch);
        assert_eq!(base.validate(), Ok(()));

        let cfg = TrainConfig { batch_size: 0, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::NotPositive("batch_size")));

        let cfg = TrainConfig { lr: f64::NAN, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::NotFinite("lr")));

        let cfg = TrainConfig { eps: 0.0, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::NotPositive("eps")));

        let cfg = TrainConfig { crop: 300, ..base };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::CropLargerThanResize { crop: 300, resize: 256 })
        );
    }
}
