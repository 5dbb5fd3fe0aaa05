// ============================================================
// Layer 5 — ResNet Feature Extractor
// ============================================================
// A bottleneck ResNet without its classification layer:
//
//   conv 7×7/2 → BN → ReLU → maxpool 3×3/2
//   layer1: blocks[0] × Bottleneck(width  64, stride 1)
//   layer2: blocks[1] × Bottleneck(width 128, stride 2)
//   layer3: blocks[2] × Bottleneck(width 256, stride 2)
//   layer4: blocks[3] × Bottleneck(width 512, stride 2)
//   adaptive avg pool 1×1 → flatten → [batch, 2048]
//
// ResNet-50 is blocks = [3, 4, 6, 3]. Field names follow the
// torchvision layout (conv1, bn1, layerN.i.convK, downsample)
// so a torchvision state dict maps onto the record directly.
//
// Reference: He et al. (2016) Deep Residual Learning
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

/// Output channels of a bottleneck block relative to its width
pub const EXPANSION: usize = 4;

/// Width of the feature vector the backbone produces
pub const FEATURE_DIM: usize = 512 * EXPANSION;

const STAGE_WIDTHS: [usize; 4] = [64, 128, 256, 512];
const STAGE_STRIDES: [usize; 4] = [1, 2, 2, 2];

#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Bottleneck blocks per stage
    pub blocks: [usize; 4],
}

impl ResNetConfig {
    pub fn resnet50() -> Self {
        Self::new([3, 4, 6, 3])
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(64).init(device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let mut in_channels = 64;
        let mut stages: Vec<Vec<Bottleneck<B>>> = STAGE_WIDTHS
            .iter()
            .zip(STAGE_STRIDES)
            .zip(self.blocks)
            .map(|((&width, stride), blocks)| {
                let stage = build_stage(in_channels, width, blocks, stride, device);
                in_channels = width * EXPANSION;
                stage
            })
            .collect();

        let layer4 = stages.pop().unwrap_or_default();
        let layer3 = stages.pop().unwrap_or_default();
        let layer2 = stages.pop().unwrap_or_default();
        let layer1 = stages.pop().unwrap_or_default();

        ResNet {
            conv1,
            bn1,
            maxpool,
            layer1,
            layer2,
            layer3,
            layer4,
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
        }
    }
}

fn build_stage<B: Backend>(
    in_channels: usize,
    width: usize,
    blocks: usize,
    stride: usize,
    device: &B::Device,
) -> Vec<Bottleneck<B>> {
    (0..blocks)
        .map(|i| {
            if i == 0 {
                Bottleneck::new(in_channels, width, stride, device)
            } else {
                Bottleneck::new(width * EXPANSION, width, 1, device)
            }
        })
        .collect()
}

// ─── Bottleneck ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Bottleneck<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
    pub bn2: BatchNorm<B, 2>,
    pub conv3: Conv2d<B>,
    pub bn3: BatchNorm<B, 2>,
    pub downsample: Option<Downsample<B>>,
}

impl<B: Backend> Bottleneck<B> {
    /// 1×1 reduce → 3×3 (strided) → 1×1 expand, with a projection
    /// shortcut whenever the shape changes.
    pub fn new(in_channels: usize, width: usize, stride: usize, device: &B::Device) -> Self {
        let out_channels = width * EXPANSION;

        let downsample = (stride != 1 || in_channels != out_channels).then(|| Downsample {
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        });

        Self {
            conv1: Conv2dConfig::new([in_channels, width], [1, 1])
                .with_bias(false)
                .init(device),
            bn1: BatchNormConfig::new(width).init(device),
            conv2: Conv2dConfig::new([width, width], [3, 3])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false)
                .init(device),
            bn2: BatchNormConfig::new(width).init(device),
            conv3: Conv2dConfig::new([width, out_channels], [1, 1])
                .with_bias(false)
                .init(device),
            bn3: BatchNormConfig::new(out_channels).init(device),
            downsample,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(down) => down.forward(x.clone()),
            None => x.clone(),
        };

        let out = relu(self.bn1.forward(self.conv1.forward(x)));
        let out = relu(self.bn2.forward(self.conv2.forward(out)));
        let out = self.bn3.forward(self.conv3.forward(out));

        relu(out + identity)
    }
}

/// Projection shortcut: 1×1 strided conv + BN.
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
}

impl<B: Backend> Downsample<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

// ─── ResNet ───────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub maxpool: MaxPool2d,
    pub layer1: Vec<Bottleneck<B>>,
    pub layer2: Vec<Bottleneck<B>>,
    pub layer3: Vec<Bottleneck<B>>,
    pub layer4: Vec<Bottleneck<B>>,
    pub avgpool: AdaptiveAvgPool2d,
}

impl<B: Backend> ResNet<B> {
    /// images: [batch, 3, H, W] → features: [batch, 2048]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.bn1.forward(self.conv1.forward(images)));
        let x = self.maxpool.forward(x);

        let x = [&self.layer1, &self.layer2, &self.layer3, &self.layer4]
            .into_iter()
            .flatten()
            .fold(x, |x, block| block.forward(x));

        // [batch, 2048, 1, 1] → [batch, 2048]
        self.avgpool.forward(x).flatten(1, 3)
    }
}
