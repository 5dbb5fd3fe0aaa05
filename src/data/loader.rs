// ============================================================
// Layer 4 — Image Folder Scanner
// ============================================================
// Discovers labelled images laid out one folder per class:
//
//   root/
//     001.Affenpinscher/
//       Affenpinscher_00001.jpg
//       ...
//     002.Afghan_hound/
//       ...
//
// Class folders are sorted by name and numbered from 0, so the
// same folder always gets the same label. Only files with a
// known image extension are kept; nested folders inside a class
// folder are walked too.
//
// Nothing is decoded here; only (path, label) pairs are collected.
// Decoding happens lazily in the dataset.
//
// Reference: walkdir crate documentation
//            Rust Book §9 (Error Handling)

use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::domain::errors::DatasetError;

/// Extensions accepted as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 9] =
    ["jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp"];

/// One labelled image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSample {
    pub path: PathBuf,
    pub label: usize,
}

/// The result of scanning one split directory.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    /// Class names, index == label
    pub classes: Vec<String>,
    pub samples: Vec<ImageSample>,
}

impl ImageFolder {
    /// Scan `root` for class folders and their images.
    ///
    /// Fails if the directory is missing, has no class folders,
    /// or has no images at all.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(DatasetError::NotFound(root));
        }

        let entries = fs::read_dir(&root).map_err(|source| DatasetError::Io {
            path: root.clone(),
            source,
        })?;

        let mut classes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DatasetError::Io {
                path: root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    classes.push(name.to_string());
                }
            }
        }
        classes.sort();

        if classes.is_empty() {
            return Err(DatasetError::NoClasses(root));
        }

        let mut samples = Vec::new();
        for (label, class_name) in classes.iter().enumerate() {
            let class_dir = root.join(class_name);

            let mut files: Vec<PathBuf> = WalkDir::new(&class_dir)
                .min_depth(1)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_image(p))
                .collect();
            // WalkDir order depends on the filesystem
            files.sort();

            tracing::debug!("Class '{}' (label {}): {} images", class_name, label, files.len());
            samples.extend(files.into_iter().map(|path| ImageSample { path, label }));
        }

        if samples.is_empty() {
            return Err(DatasetError::Empty(root));
        }

        tracing::info!(
            "Found {} images in {} classes under '{}'",
            samples.len(),
            classes.len(),
            root.display()
        );

        Ok(Self { classes, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Number of images per class, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for s in &self.samples {
            counts[s.label] += 1;
        }
        counts
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
