// ============================================================
// Layer 4 — Image Transforms
// ============================================================
// Turns a decoded image into a CHW float buffer in [0, 1].
//
// Training pipeline (random):
//   1. horizontal flip with probability 0.5
//   2. resize so the shorter side is 256, keeping aspect ratio
//   3. random-resized crop: pick a box covering 8%–100% of the
//      area with aspect ratio in [3/4, 4/3], resize it to 224×224
//   4. HWC u8 → CHW f32 / 255
//
// Evaluation pipeline (deterministic):
//   1. resize so the shorter side is 256
//   2. centre crop 224×224
//   3. HWC u8 → CHW f32 / 255
//
// Resizing uses bilinear filtering (FilterType::Triangle).
//
// Reference: image crate documentation
//            rand crate documentation

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use rand::Rng;

/// Shorter side after the first resize
pub const RESIZE_SIZE: u32 = 256;

/// Side of the square fed to the network
pub const CROP_SIZE: u32 = 224;

/// Area fraction range for the random-resized crop
const CROP_SCALE: (f64, f64) = (0.08, 1.0);

/// Aspect ratio range for the random-resized crop
const CROP_RATIO: (f64, f64) = (3.0 / 4.0, 4.0 / 3.0);

const CROP_ATTEMPTS: usize = 10;

/// A crop rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    Train,
    Eval,
}

/// The full per-image pipeline for one split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub mode: Augmentation,
    pub resize: u32,
    pub crop: u32,
    pub flip_prob: f64,
}

impl ImageTransform {
    pub fn train() -> Self {
        Self {
            mode: Augmentation::Train,
            resize: RESIZE_SIZE,
            crop: CROP_SIZE,
            flip_prob: 0.5,
        }
    }

    pub fn eval() -> Self {
        Self {
            mode: Augmentation::Eval,
            resize: RESIZE_SIZE,
            crop: CROP_SIZE,
            flip_prob: 0.0,
        }
    }

    pub fn with_sizes(mut self, resize: u32, crop: u32) -> Self {
        self.resize = resize;
        self.crop = crop;
        self
    }

    /// Run the pipeline. `rng` is only drawn from in training mode.
    pub fn apply<R: Rng>(&self, img: DynamicImage, rng: &mut R) -> Vec<f32> {
        let img = match self.mode {
            Augmentation::Train => {
                let img = if rng.gen_bool(self.flip_prob) { img.fliph() } else { img };
                let img = resize_shorter_side(&img, self.resize);
                let (w, h) = img.dimensions();
                let b = random_resized_crop_box(w, h, rng);
                img.crop_imm(b.x, b.y, b.width, b.height)
                    .resize_exact(self.crop, self.crop, FilterType::Triangle)
            }
            Augmentation::Eval => {
                let img = resize_shorter_side(&img, self.resize);
                let (w, h) = img.dimensions();
                let b = center_crop_box(w, h, self.crop);
                let img = img.crop_imm(b.x, b.y, b.width, b.height);
                if img.dimensions() == (self.crop, self.crop) {
                    img
                } else {
                    img.resize_exact(self.crop, self.crop, FilterType::Triangle)
                }
            }
        };
        to_chw(&img)
    }
}

/// Target size when the shorter side is scaled to `size`.
/// The longer side is truncated, not rounded.
pub fn shorter_side_dims(width: u32, height: u32, size: u32) -> (u32, u32) {
    let (w, h) = (width.max(1) as u64, height.max(1) as u64);
    let size64 = size as u64;
    if w <= h {
        (size, ((size64 * h) / w).max(1) as u32)
    } else {
        (((size64 * w) / h).max(1) as u32, size)
    }
}

pub fn resize_shorter_side(img: &DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let (nw, nh) = shorter_side_dims(w, h, size);
    if (nw, nh) == (w, h) {
        img.clone()
    } else {
        img.resize_exact(nw, nh, FilterType::Triangle)
    }
}

/// Pick a random crop box inside a `width × height` image.
///
/// Up to ten random boxes are tried; if none fits, falls back to
/// the largest centred box whose aspect ratio is within range.
pub fn random_resized_crop_box<R: Rng>(width: u32, height: u32, rng: &mut R) -> CropBox {
    let area = width as f64 * height as f64;
    let (log_lo, log_hi) = (CROP_RATIO.0.ln(), CROP_RATIO.1.ln());

    for _ in 0..CROP_ATTEMPTS {
        let target_area = area * rng.gen_range(CROP_SCALE.0..=CROP_SCALE.1);
        let aspect = rng.gen_range(log_lo..=log_hi).exp();

        let w = (target_area * aspect).sqrt().round() as u32;
        let h = (target_area / aspect).sqrt().round() as u32;

        if w > 0 && h > 0 && w <= width && h <= height {
            let y = rng.gen_range(0..=height - h);
            let x = rng.gen_range(0..=width - w);
            return CropBox { x, y, width: w, height: h };
        }
    }

    let in_ratio = width as f64 / height.max(1) as f64;
    let (w, h) = if in_ratio < CROP_RATIO.0 {
        (width, ((width as f64 / CROP_RATIO.0).round() as u32).min(height))
    } else if in_ratio > CROP_RATIO.1 {
        (((height as f64 * CROP_RATIO.1).round() as u32).min(width), height)
    } else {
        (width, height)
    };
    CropBox {
        x: (width - w) / 2,
        y: (height - h) / 2,
        width: w.max(1),
        height: h.max(1),
    }
}

/// Centred `size × size` box, clamped to the image.
pub fn center_crop_box(width: u32, height: u32, size: u32) -> CropBox {
    let w = size.min(width);
    let h = size.min(height);
    CropBox {
        x: ((width - w) as f64 / 2.0).round() as u32,
        y: ((height - h) as f64 / 2.0).round() as u32,
        width: w,
        height: h,
    }
}

/// HWC RGB bytes → CHW floats in [0, 1].
pub fn to_chw(img: &DynamicImage) -> Vec<f32> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let plane = width * height;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let i = y as usize * width + x as usize;
        data[i] = pixel[0] as f32 / 255.0;
        data[plane + i] = pixel[1] as f32 / 255.0;
        data[2 * plane + i] = pixel[2] as f32 / 255.0;
    }
    data
}
