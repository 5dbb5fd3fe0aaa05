// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a model saved by `train` against a test split:
//
//   Step 1: Read architecture, run config, class names (infra)
//   Step 2: Rebuild the classifier and load model.bin   (infra)
//   Step 3: Build the test loader with the same sizes   (data)
//   Step 4: One evaluation pass                         (ml)
//
// The pass runs on a plain backend; no autodiff is involved.

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use std::path::PathBuf;

use crate::data::{build_test_loader, transform::{CROP_SIZE, RESIZE_SIZE}, LoaderOptions};
use crate::domain::stats::EpochSummary;
use crate::domain::traits::EpochContext;
use crate::infra::{checkpoint::CheckpointManager, hook::NullHook};
use crate::ml::{evaluator::evaluate_epoch, model::Classifier};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_dir:    PathBuf,
    pub model_dir:   PathBuf,
    pub batch_size:  usize,
    pub num_workers: usize,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<EpochSummary> {
        let cfg = &self.config;
        anyhow::ensure!(cfg.batch_size > 0, "batch_size must be greater than zero");

        // ── Step 1: Run metadata ──────────────────────────────────────────────
        let checkpoint = CheckpointManager::open(&cfg.model_dir)?;
        let architecture = checkpoint.load_architecture()?;
        let classes = checkpoint.load_classes()?;
        let (resize, crop) = match checkpoint.load_config() {
            Ok(train_cfg) => (train_cfg.resize, train_cfg.crop),
            Err(e) => {
                tracing::warn!("{:#}; using default image sizes", e);
                (RESIZE_SIZE, CROP_SIZE)
            }
        };

        // ── Step 2: Model ─────────────────────────────────────────────────────
        let model: Classifier<B> = architecture.init(device);
        let model = checkpoint.load_model(model, device)?;
        tracing::info!("Loaded model from '{}'", checkpoint.model_path().display());

        // ── Step 3: Test data ─────────────────────────────────────────────────
        let options = LoaderOptions::new(cfg.batch_size)
            .with_num_workers(cfg.num_workers)
            .with_sizes(resize, crop);
        let loader = build_test_loader::<B>(&cfg.data_dir, &options, device)
            .with_context(|| format!("Cannot load dataset from '{}'", cfg.data_dir.display()))?;
        anyhow::ensure!(
            loader.classes() == classes.as_slice(),
            "Test classes {:?} differ from the classes the model was trained on {:?}",
            loader.classes(),
            classes,
        );

        // ── Step 4: Evaluate ──────────────────────────────────────────────────
        let mut hook = NullHook::new();
        evaluate_epoch(&model, &loader, &mut EpochContext::new(1, &mut hook))
    }
}
