// Compute backend chosen at build time.
//
//   --features wgpu (default) → Autodiff<Wgpu>, GPU through wgpu
//   --no-default-features     → Autodiff<NdArray>, CPU only

use burn::{backend::Autodiff, tensor::backend::Backend};

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

/// Backend for training; evaluation runs on `InnerBackend`.
pub type TrainingBackend = Autodiff<InnerBackend>;

pub fn default_device() -> <InnerBackend as Backend>::Device {
    Default::default()
}
