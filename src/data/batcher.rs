// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageItem>
// into device tensors.
//
//   Input:  N items, each a CHW buffer of 3 × S × S floats
//   Output: images  [N, 3, S, S]
//           targets [N]
//
// All items in a split share the same crop size, so the
// buffers are concatenated and reshaped in one go.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ImageItem;

// ─── ImageBatch ───────────────────────────────────────────────────────────────
/// A batch of labelled images. Created per iteration and dropped
/// right after the step that consumes it.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Shape: [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,

    /// Class index per image, shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device and the square image size.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
    pub image_size: usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let size = self.image_size;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.image.iter().copied())
            .collect();

        let labels: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(pixels, [batch_size, 3, size, size]),
            &self.device,
        );

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device = Default::default();
        let batcher = ImageBatcher::<NdArray>::new(device, 2);

        let items = vec![
            ImageItem { image: vec![0.25; 12], label: 4 },
            ImageItem { image: vec![0.75; 12], label: 1 },
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);
        assert_eq!(batch.len(), 2);

        let targets: Vec<i64> = batch
            .targets
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap();
        assert_eq!(targets, vec![4, 1]);

        let second: Vec<f32> = batch
            .images
            .slice([1..2, 0..3, 0..2, 0..2])
            .into_data()
            .to_vec()
            .unwrap();
        assert!(second.iter().all(|v| (*v - 0.75).abs() < 1e-6));
    }
}
