// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the trained classifier with Burn's
// BinFileRecorder (full precision).
//
// What gets written to the model directory:
//   model.bin          — every parameter, backbone and head
//   classifier.json    — architecture (ResNet blocks, head sizes)
//   train_config.json  — hyperparameters and paths of the run
//   classes.json       — class names, index = label
//
// The architecture file is what makes model.bin loadable: the
// loader rebuilds an empty classifier of the same shape and
// then pours the record into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Classifier, ClassifierConfig};

const MODEL_FILE: &str = "model";
const ARCHITECTURE_FILE: &str = "classifier.json";
const CONFIG_FILE: &str = "train_config.json";
const CLASSES_FILE: &str = "classes.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` (like `mkdir -p`) if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing model directory for reading.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        anyhow::ensure!(
            dir.is_dir(),
            "Model directory '{}' does not exist. Have you run 'train' first?",
            dir.display()
        );
        Ok(Self { dir })
    }

    /// Path of the weights file as written by [`save_model`](Self::save_model).
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE).with_extension("bin")
    }

    /// Write all parameters of the classifier to `model.bin`.
    pub fn save_model<B: Backend>(&self, model: &Classifier<B>) -> Result<PathBuf> {
        let path = self.dir.join(MODEL_FILE);

        BinFileRecorder::<FullPrecisionSettings>::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        let path = self.model_path();
        tracing::info!("Saved model weights to '{}'", path.display());
        Ok(path)
    }

    /// Load `model.bin` into a classifier of the matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  Classifier<B>,
        device: &B::Device,
    ) -> Result<Classifier<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = BinFileRecorder::<FullPrecisionSettings>::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load model '{}'. Have you trained the model first?",
                    self.model_path().display()
                )
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_architecture(&self, config: &ClassifierConfig) -> Result<()> {
        let path = self.dir.join(ARCHITECTURE_FILE);
        config
            .save(&path)
            .with_context(|| format!("Cannot write architecture to '{}'", path.display()))
    }

    pub fn load_architecture(&self) -> Result<ClassifierConfig> {
        let path = self.dir.join(ARCHITECTURE_FILE);
        ClassifierConfig::load(&path)
            .with_context(|| format!("Cannot read architecture from '{}'", path.display()))
    }

    /// Save the run's configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_classes(&self, classes: &[String]) -> Result<()> {
        let path = self.dir.join(CLASSES_FILE);
        fs::write(&path, serde_json::to_string_pretty(classes)?)
            .with_context(|| format!("Cannot write class names to '{}'", path.display()))
    }

    pub fn load_classes(&self) -> Result<Vec<String>> {
        let path = self.dir.join(CLASSES_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read class names from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
