// ============================================================
// Layer 3 — Error Kinds
// ============================================================
// Typed errors for the failures a caller (or a test) needs to
// tell apart. Everything else travels as anyhow::Error with
// context attached at the boundary where it happened.
//
// Every error here is terminal for the run: there is no retry.
//
// Reference: thiserror crate documentation
//            Rust Book §9 (Error Handling)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::stats::Phase;

/// Failures while discovering an image-folder dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no class directories under {}", .0.display())]
    NoClasses(PathBuf),

    #[error("no images found under {}", .0.display())]
    Empty(PathBuf),

    #[error("{found} classes under {} but the classifier head only has {max} outputs", .dir.display())]
    TooManyClasses { dir: PathBuf, found: usize, max: usize },

    #[error("class folders differ between train {train:?} and test {test:?}")]
    ClassMismatch { train: Vec<String>, test: Vec<String> },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid hyperparameters or missing required settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("crop size {crop} is larger than resize size {resize}")]
    CropLargerThanResize { crop: u32, resize: u32 },

    #[error("either --backbone_weights or --from_scratch is required")]
    MissingBackbone,

    #[error("--backbone_weights and --from_scratch cannot be combined")]
    ConflictingBackbone,
}

/// Failures detected by the training / evaluation loops themselves.
#[derive(Debug, Error, PartialEq)]
pub enum LoopError {
    #[error("{phase} pass ended after {seen} of {expected} samples; an image failed to load")]
    ShortPass {
        phase: Phase,
        seen: usize,
        expected: usize,
    },
}
