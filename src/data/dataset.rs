use burn::data::dataset::Dataset;
use image::{DynamicImage, ImageReader};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{
    path::Path,
    sync::{Mutex, PoisonError},
};

use crate::data::loader::ImageSample;
use crate::data::transform::ImageTransform;

/// One decoded and transformed image.
/// `image` is CHW, `3 * size * size` floats in [0, 1].
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub image: Vec<f32>,
    pub label: usize,
}

/// Lazily decodes images from disk and runs them through a transform.
///
/// Random augmentations draw from one seeded generator owned by the
/// dataset, so the sequence of crops and flips depends only on the
/// seed and the order in which items are requested.
pub struct ImageFolderDataset {
    samples: Vec<ImageSample>,
    transform: ImageTransform,
    rng: Mutex<ChaCha8Rng>,
}

impl ImageFolderDataset {
    pub fn new(samples: Vec<ImageSample>, transform: ImageTransform, seed: u64) -> Self {
        Self {
            samples,
            transform,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

}

impl Dataset<ImageItem> for ImageFolderDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let sample = self.samples.get(index)?;

        let img = match decode(&sample.path) {
            Ok(img) => img,
            Err(e) => {
                // The loop notices the missing sample and fails the pass.
                tracing::error!("Cannot load '{}': {:#}", sample.path.display(), e);
                return None;
            }
        };

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let image = self.transform.apply(img, &mut *rng);

        Some(ImageItem { image, label: sample.label })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

fn decode(path: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 77]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_items_have_expected_shape_and_label() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 50, 40);

        let ds = ImageFolderDataset::new(
            vec![ImageSample { path, label: 3 }],
            ImageTransform::eval().with_sizes(20, 16),
            0,
        );
        let item = ds.get(0).unwrap();
        assert_eq!(item.label, 3);
        assert_eq!(item.image.len(), 3 * 16 * 16);
        assert!(item.image.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(ds.get(1).is_none());
    }

    #[test]
    fn test_unreadable_image_yields_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let ds = ImageFolderDataset::new(
            vec![ImageSample { path, label: 0 }],
            ImageTransform::eval(),
            0,
        );
        assert!(ds.get(0).is_none());
    }

    #[test]
    fn test_same_seed_same_augmentations() {
        let dir = tempdir().unwrap();
        let samples: Vec<ImageSample> = (0..3)
            .map(|i| {
                let path: PathBuf = dir.path().join(format!("{i}.png"));
                write_png(&path, 60 + i, 45);
                ImageSample { path, label: i as usize }
            })
            .collect();

        let transform = ImageTransform::train().with_sizes(24, 16);
        let a = ImageFolderDataset::new(samples.clone(), transform, 99);
        let b = ImageFolderDataset::new(samples, transform, 99);
        for i in 0..3 {
            assert_eq!(a.get(i).unwrap().image, b.get(i).unwrap().image);
        }
    }
}
