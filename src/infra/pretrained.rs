// ============================================================
// Layer 6 — Pretrained Backbone Weights
// ============================================================
// Reads backbone parameters from disk into a ResNet record.
//
//   torchvision .pth  → burn-import's PyTorchFileRecorder
//   Burn .bin record  → BinFileRecorder (full precision)
//
// torchvision names the projection shortcut `downsample.0`
// (conv) and `downsample.1` (batch norm); those keys are
// remapped onto the named `downsample.conv` / `downsample.bn`
// fields. The `fc.*` classifier keys have no counterpart in
// the backbone and are skipped.
//
// Reference: burn-import documentation (PyTorch model import)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::Path;

use crate::ml::resnet::ResNetRecord;

pub fn load_torchvision<B: Backend>(path: &Path, device: &B::Device) -> Result<ResNetRecord<B>> {
    tracing::info!("Loading torchvision backbone from '{}'", path.display());

    let args = LoadArgs::new(path.to_path_buf())
        .with_key_remap(r"^(layer\d+\.\d+)\.downsample\.0\.(.+)$", "$1.downsample.conv.$2")
        .with_key_remap(r"^(layer\d+\.\d+)\.downsample\.1\.(.+)$", "$1.downsample.bn.$2");

    PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .with_context(|| format!("Cannot load pretrained weights from '{}'", path.display()))
}

pub fn load_backbone_record<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<ResNetRecord<B>> {
    tracing::info!("Loading backbone record from '{}'", path.display());

    BinFileRecorder::<FullPrecisionSettings>::new()
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Cannot load backbone record from '{}'", path.display()))
}
