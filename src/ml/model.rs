// ============================================================
// Layer 5 — Classifier Model
// ============================================================
// A frozen ResNet feature extractor with a fresh two-layer
// classification head on top:
//
//   images [batch, 3, H, W]
//       │  backbone (frozen, never updated)
//       ▼
//   features [batch, 2048]
//       │  Linear(2048 → 256) → ReLU
//       │  Linear(256 → 133)  → ReLU
//       ▼
//   scores [batch, 133]
//
// The frozen and trainable parts live in two separate fields.
// The optimiser is built over ClassifierHead only, so the
// backbone cannot receive an update even by accident.
//
// Reference: Burn Book §3 (Building Blocks)
//            Yosinski et al. (2014) How transferable are features

use anyhow::Result;
use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::traits::ModuleSummary;
use crate::infra::pretrained;
use crate::ml::resnet::{ResNet, ResNetConfig, FEATURE_DIM};

// Saved as classifier.json next to the weights so the same shape
// can be rebuilt before loading them.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub backbone: ResNetConfig,
    #[config(default = 256)]
    pub hidden_size: usize,
    #[config(default = 133)]
    pub num_classes: usize,
}

impl ClassifierConfig {
    /// ResNet-50 backbone with the default 256 → 133 head.
    pub fn resnet50() -> Self {
        Self::new(ResNetConfig::resnet50())
    }

    /// A classifier with freshly initialised backbone and head.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        Classifier {
            backbone: self.backbone.init(device),
            head:     self.init_head(device),
        }
    }

    pub fn init_head<B: Backend>(&self, device: &B::Device) -> ClassifierHead<B> {
        ClassifierHead {
            hidden: LinearConfig::new(FEATURE_DIM, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
        }
    }
}

/// Where the backbone's weights come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum BackboneWeights {
    /// A torchvision `resnet50` state dict (`.pth`)
    Torchvision(PathBuf),
    /// A Burn record of the backbone alone
    Record(PathBuf),
    /// Random initialisation
    Scratch,
}

impl BackboneWeights {
    /// `.pth` / `.pt` files are read as torchvision state dicts,
    /// anything else as a Burn record.
    pub fn from_path(path: PathBuf) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("pth") | Some("pt") => Self::Torchvision(path),
            _ => Self::Record(path),
        }
    }
}

// ─── ClassifierHead ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ClassifierHead<B: Backend> {
    pub hidden: Linear<B>,
    pub output: Linear<B>,
}

impl<B: Backend> ClassifierHead<B> {
    /// features: [batch, 2048] → scores: [batch, num_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(features));
        // The scores go through a ReLU too, so they are never negative.
        relu(self.output.forward(x))
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub backbone: ResNet<B>,
    pub head:     ClassifierHead<B>,
}

impl<B: Backend> Classifier<B> {
    /// images: [batch, 3, H, W] → scores: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.head.forward(self.backbone.forward(images))
    }

    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            name:             "resnet50".to_string(),
            frozen_params:    self.backbone.num_params(),
            trainable_params: self.head.num_params(),
        }
    }
}

/// Build the backbone, load its weights, freeze it and attach a new head.
pub fn build_model<B: Backend>(
    config:  &ClassifierConfig,
    weights: &BackboneWeights,
    device:  &B::Device,
) -> Result<Classifier<B>> {
    let model: Classifier<B> = config.init(device);

    let backbone = match weights {
        BackboneWeights::Torchvision(path) => {
            model.backbone.load_record(pretrained::load_torchvision(path, device)?)
        }
        BackboneWeights::Record(path) => {
            model.backbone.load_record(pretrained::load_backbone_record(path, device)?)
        }
        BackboneWeights::Scratch => {
            tracing::warn!("Backbone is randomly initialised; features will not be meaningful");
            model.backbone
        }
    };

    let model = Classifier {
        backbone: backbone.no_grad(),
        head:     model.head,
    };

    let summary = model.summary();
    tracing::info!(
        "Model ready: {} frozen params, {} trainable params, {} classes",
        summary.frozen_params, summary.trainable_params, config.num_classes,
    );
    Ok(model)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use tempfile::tempdir;

    type TestBackend = NdArray;

    fn small_config() -> ClassifierConfig {
        ClassifierConfig::new(ResNetConfig::new([1, 1, 1, 1]))
    }

    #[test]
    fn test_resnet50_head_outputs_133_non_negative_scores() {
        let device = Default::default();
        let model = build_model::<TestBackend>(
            &ClassifierConfig::resnet50(),
            &BackboneWeights::Scratch,
            &device,
        )
        .unwrap();

        assert_eq!(model.head.hidden.weight.dims(), [2048, 256]);
        assert_eq!(model.head.output.weight.dims(), [256, 133]);

        let images = Tensor::<TestBackend, 4>::random(
            [2, 3, 32, 32],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let scores = model.forward(images);
        assert_eq!(scores.dims(), [2, 133]);

        let values: Vec<f32> = scores.into_data().to_vec().unwrap();
        assert!(values.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_summary_splits_frozen_and_trainable() {
        let device = Default::default();
        let model =
            build_model::<TestBackend>(&small_config(), &BackboneWeights::Scratch, &device).unwrap();
        let summary = model.summary();

        // 2048*256 + 256 + 256*133 + 133
        assert_eq!(summary.trainable_params, 558_725);
        assert_eq!(summary.frozen_params, model.backbone.num_params());
    }

    #[test]
    fn test_backbone_record_is_loaded() {
        use burn::record::{BinFileRecorder, FullPrecisionSettings, Recorder};

        let dir = tempdir().unwrap();
        let device = Default::default();
        let source: ResNet<TestBackend> = ResNetConfig::new([1, 1, 1, 1]).init(&device);
        let path = dir.path().join("backbone");
        BinFileRecorder::<FullPrecisionSettings>::new()
            .record(source.clone().into_record(), path.clone())
            .unwrap();

        let weights = BackboneWeights::Record(path.with_extension("bin"));
        let model = build_model::<TestBackend>(&small_config(), &weights, &device).unwrap();

        model
            .backbone
            .conv1
            .weight
            .val()
            .into_data()
            .assert_eq(&source.conv1.weight.val().into_data(), true);
    }

    #[test]
    fn test_missing_weights_file_is_fatal() {
        let device = Default::default();
        let weights = BackboneWeights::Torchvision(PathBuf::from("/nonexistent/resnet50.pth"));
        assert!(build_model::<TestBackend>(&small_config(), &weights, &device).is_err());
    }

    #[test]
    fn test_weights_kind_from_extension() {
        assert_eq!(
            BackboneWeights::from_path("w/resnet50.pth".into()),
            BackboneWeights::Torchvision("w/resnet50.pth".into())
        );
        assert_eq!(
            BackboneWeights::from_path("w/backbone.bin".into()),
            BackboneWeights::Record("w/backbone.bin".into())
        );
    }
}
