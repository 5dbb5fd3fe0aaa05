// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from an image-folder dataset on disk to
// device-ready tensor batches.
//
//   root/train, root/test
//       │
//       ▼
//   ImageFolder         → scans class folders into (path, label)
//       │
//       ▼
//   ImageFolderDataset  → decodes + transforms on demand
//       │
//       ▼
//   ImageBatcher        → stacks items into tensors
//       │
//       ▼
//   DataLoader          → feeds batches to the loops
//
// The training split is shuffled every pass and randomly
// augmented; the test split is read in order with a fixed
// resize + centre crop.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Scans image-folder directories
pub mod loader;

/// Resize / crop / flip pipelines
pub mod transform;

/// Implements Burn's Dataset trait for image folders
pub mod dataset;

/// Implements Burn's Batcher trait for image batches
pub mod batcher;

use std::{path::Path, sync::Arc};

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder, DataLoaderIterator},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::domain::errors::DatasetError;
use crate::NUM_CLASSES;
use batcher::{ImageBatch, ImageBatcher};
use dataset::ImageFolderDataset;
use loader::ImageFolder;
use transform::{ImageTransform, CROP_SIZE, RESIZE_SIZE};

/// Knobs for building the two loaders.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub batch_size: usize,
    /// Seeds both the per-pass shuffle and the augmentation generator
    pub seed: u64,
    pub num_workers: usize,
    pub resize: u32,
    pub crop: u32,
}

impl LoaderOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            seed: 42,
            num_workers: 1,
            resize: RESIZE_SIZE,
            crop: CROP_SIZE,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_sizes(mut self, resize: u32, crop: u32) -> Self {
        self.resize = resize;
        self.crop = crop;
        self
    }
}

// ─── SplitLoader ──────────────────────────────────────────────────────────────
/// A restartable batch sequence over one split, plus what the
/// loops need to know about it.
pub struct SplitLoader<B: Backend> {
    loader: Arc<dyn DataLoader<ImageBatch<B>>>,
    len: usize,
    classes: Vec<String>,
}

impl<B: Backend> SplitLoader<B> {
    /// Start a fresh pass over the split.
    pub fn iter(&self) -> Box<dyn DataLoaderIterator<ImageBatch<B>> + '_> {
        self.loader.iter()
    }

    /// Number of images in the split.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Build the training loader (on the autodiff backend) and the
/// test loader (on its inner backend) from `root/train` and
/// `root/test`.
pub fn build_loaders<B: AutodiffBackend>(
    root: &Path,
    options: &LoaderOptions,
    device: &B::Device,
) -> Result<(SplitLoader<B>, SplitLoader<B::InnerBackend>), DatasetError> {
    if !root.is_dir() {
        return Err(DatasetError::NotFound(root.to_path_buf()));
    }

    let train = scan_split(&root.join("train"))?;
    let counts = train.class_counts();
    tracing::debug!(
        "Training images per class: min {}, max {}",
        counts.iter().min().copied().unwrap_or(0),
        counts.iter().max().copied().unwrap_or(0),
    );
    let test = scan_split(&root.join("test"))?;

    if train.classes != test.classes {
        return Err(DatasetError::ClassMismatch {
            train: train.classes,
            test: test.classes,
        });
    }

    let train_loader = split_loader::<B>(
        train,
        ImageTransform::train().with_sizes(options.resize, options.crop),
        options,
        true,
        device,
    );
    let test_loader = split_loader::<B::InnerBackend>(
        test,
        ImageTransform::eval().with_sizes(options.resize, options.crop),
        options,
        false,
        device,
    );

    Ok((train_loader, test_loader))
}

/// Only the test split, for evaluating a saved model.
pub fn build_test_loader<B: Backend>(
    root: &Path,
    options: &LoaderOptions,
    device: &B::Device,
) -> Result<SplitLoader<B>, DatasetError> {
    if !root.is_dir() {
        return Err(DatasetError::NotFound(root.to_path_buf()));
    }
    let test = scan_split(&root.join("test"))?;
    Ok(split_loader::<B>(
        test,
        ImageTransform::eval().with_sizes(options.resize, options.crop),
        options,
        false,
        device,
    ))
}

fn scan_split(dir: &Path) -> Result<ImageFolder, DatasetError> {
    let folder = ImageFolder::scan(dir)?;
    if folder.num_classes() > NUM_CLASSES {
        return Err(DatasetError::TooManyClasses {
            dir: dir.to_path_buf(),
            found: folder.num_classes(),
            max: NUM_CLASSES,
        });
    }
    Ok(folder)
}

fn split_loader<B: Backend>(
    folder: ImageFolder,
    transform: ImageTransform,
    options: &LoaderOptions,
    shuffle: bool,
    device: &B::Device,
) -> SplitLoader<B> {
    let len = folder.len();
    let classes = folder.classes;
    let dataset = ImageFolderDataset::new(folder.samples, transform, options.seed);
    let batcher = ImageBatcher::<B>::new(device.clone(), transform.crop as usize);

    let builder = DataLoaderBuilder::new(batcher)
        .batch_size(options.batch_size)
        .num_workers(options.num_workers);
    let builder = if shuffle { builder.shuffle(options.seed) } else { builder };

    SplitLoader {
        loader: builder.build(dataset),
        len,
        classes,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    type TestBackend = Autodiff<NdArray>;

    /// Write `per_class` small PNGs for each class into `root/<split>/<class>/`.
    pub(crate) fn write_image_folder(root: &Path, split: &str, classes: &[&str], per_class: usize) {
        for (c, class) in classes.iter().enumerate() {
            let dir = root.join(split).join(class);
            std::fs::create_dir_all(&dir).unwrap();
            for i in 0..per_class {
                let shade = (40 * c + 7 * i) as u8;
                RgbImage::from_fn(24 + i as u32, 20, |x, y| {
                    Rgb([shade, (x * 5) as u8, (y * 9) as u8])
                })
                .save(dir.join(format!("{class}_{i:03}.png")))
                .unwrap();
            }
        }
    }

    #[test]
    fn test_batches_cover_split_exactly() {
        let dir = tempdir().unwrap();
        write_image_folder(dir.path(), "train", &["akita", "beagle"], 10);
        write_image_folder(dir.path(), "test", &["akita", "beagle"], 3);

        let options = LoaderOptions::new(5).with_sizes(20, 16);
        let device = Default::default();
        let (train, test) = build_loaders::<TestBackend>(dir.path(), &options, &device).unwrap();

        assert_eq!(train.len(), 20);
        assert_eq!(test.len(), 6);
        assert_eq!(train.classes(), ["akita".to_string(), "beagle".to_string()]);

        let sizes: Vec<usize> = train.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![5, 5, 5, 5]);

        let sizes: Vec<usize> = test.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![5, 1]);

        // restartable
        assert_eq!(train.iter().count(), 4);
    }

    #[test]
    fn test_test_split_keeps_directory_order() {
        let dir = tempdir().unwrap();
        write_image_folder(dir.path(), "train", &["a", "b"], 2);
        write_image_folder(dir.path(), "test", &["a", "b"], 2);

        let options = LoaderOptions::new(4).with_sizes(20, 16);
        let device = Default::default();
        let (_, test) = build_loaders::<TestBackend>(dir.path(), &options, &device).unwrap();

        assert_eq!(labels(test.iter().next().unwrap()), vec![0, 0, 1, 1]);
    }

    fn labels<B: Backend>(batch: ImageBatch<B>) -> Vec<i64> {
        batch.targets.into_data().convert::<i64>().to_vec().unwrap()
    }

    #[test]
    fn test_train_split_reshuffles_every_pass() {
        let dir = tempdir().unwrap();
        write_image_folder(dir.path(), "train", &["a", "b", "c", "d"], 5);
        write_image_folder(dir.path(), "test", &["a", "b", "c", "d"], 5);

        let options = LoaderOptions::new(20).with_sizes(20, 16);
        let device = Default::default();
        let (train, test) = build_loaders::<TestBackend>(dir.path(), &options, &device).unwrap();

        let passes: Vec<Vec<i64>> = (0..3)
            .map(|_| labels(train.iter().next().unwrap()))
            .collect();
        assert_ne!(passes[0], passes[1]);
        assert_ne!(passes[1], passes[2]);
        assert_ne!(passes[0], passes[2]);
        for pass in &passes {
            let mut sorted = pass.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..4).flat_map(|c| [c; 5]).collect::<Vec<i64>>());
        }

        let first = labels(test.iter().next().unwrap());
        let second = labels(test.iter().next().unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_too_many_classes() {
        let dir = tempdir().unwrap();
        let names: Vec<String> = (0..=NUM_CLASSES).map(|i| format!("{i:03}.breed")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        write_image_folder(dir.path(), "train", &names, 1);

        let options = LoaderOptions::new(4);
        let device = Default::default();
        let err = build_loaders::<TestBackend>(dir.path(), &options, &device)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DatasetError::TooManyClasses { found: 134, max: 133, .. }
        ));
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let options = LoaderOptions::new(4);
        let device = Default::default();
        let err = build_loaders::<TestBackend>(&dir.path().join("missing"), &options, &device)
            .err()
            .unwrap();
        assert!(matches!(err, DatasetError::NotFound(_)));
    }

    #[test]
    fn test_missing_test_split() {
        let dir = tempdir().unwrap();
        write_image_folder(dir.path(), "train", &["a"], 1);
        let options = LoaderOptions::new(4);
        let device = Default::default();
        let err = build_loaders::<TestBackend>(dir.path(), &options, &device)
            .err()
            .unwrap();
        assert!(matches!(err, DatasetError::NotFound(p) if p.ends_with("test")));
    }

    #[test]
    fn test_class_mismatch() {
        let dir = tempdir().unwrap();
        write_image_folder(dir.path(), "train", &["a", "b"], 1);
        write_image_folder(dir.path(), "test", &["a", "c"], 1);
        let options = LoaderOptions::new(4);
        let device = Default::default();
        let err = build_loaders::<TestBackend>(dir.path(), &options, &device)
            .err()
            .unwrap();
        assert!(matches!(err, DatasetError::ClassMismatch { .. }));
    }
}
