// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Canvas preparation for the CRAFT detector
//!
//! Steps:
//! 1. Scale the image so its longer side becomes
//!    `min(canvas_size, mag_ratio * max(h, w))` (bilinear)
//! 2. Zero-pad bottom/right so both sides are multiples of 32
//! 3. Normalize with ImageNet mean/std: (pixel/255 - mean) / std
//! 4. Lay out as NCHW tensor [1, 3, H, W]

use image::{imageops, imageops::FilterType, RgbImage};
use ndarray::Array4;

/// Mean values for normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Canvas sides are padded up to a multiple of this
pub const CANVAS_ALIGN: u32 = 32;

/// Longer side of the resized image for a given source size
///
/// `mag_ratio * max(height, width)`, clipped to `canvas_size`.
pub fn target_size(height: u32, width: u32, canvas_size: u32, mag_ratio: f64) -> f64 {
    let longer = height.max(width) as f64;
    (mag_ratio * longer).min(canvas_size as f64)
}

/// Resized network input with the geometry needed to map results back
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Normalized NCHW tensor
    pub tensor: Array4<f32>,
    /// Scale applied to the source image (`target_size / max(h, w)`)
    pub target_ratio: f64,
    /// Size of the scaled image before padding (width, height)
    pub resized_size: (u32, u32),
    /// Padded canvas size (width, height)
    pub padded_size: (u32, u32),
}

impl Canvas {
    /// Build the canvas for an image
    pub fn from_image(image: &RgbImage, canvas_size: u32, mag_ratio: f64) -> Self {
        let (width, height) = image.dimensions();
        let longer = height.max(width).max(1) as f64;
        let target = target_size(height, width, canvas_size, mag_ratio);
        let target_ratio = target / longer;

        let target_w = ((width as f64 * target_ratio) as u32).max(1);
        let target_h = ((height as f64 * target_ratio) as u32).max(1);
        let resized = imageops::resize(image, target_w, target_h, FilterType::Triangle);

        let padded_w = align_up(target_w, CANVAS_ALIGN);
        let padded_h = align_up(target_h, CANVAS_ALIGN);

        // Padding stays at raw pixel value 0 before normalization
        let mut tensor = Array4::zeros((1, 3, padded_h as usize, padded_w as usize));
        for c in 0..3 {
            let fill = -MEAN[c] / STD[c];
            tensor
                .slice_mut(ndarray::s![0, c, .., ..])
                .fill(fill);
        }

        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let normalized = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
                tensor[[0, c, y as usize, x as usize]] = normalized;
            }
        }

        Self {
            tensor,
            target_ratio,
            resized_size: (target_w, target_h),
            padded_size: (padded_w, padded_h),
        }
    }

    /// Expected heatmap size (rows, cols) for a detector with the given stride
    pub fn heatmap_dim(&self, stride: u32) -> (usize, usize) {
        let stride = stride.max(1);
        (
            (self.padded_size.1 / stride) as usize,
            (self.padded_size.0 / stride) as usize,
        )
    }
}

fn align_up(value: u32, align: u32) -> u32 {
    if value % align == 0 {
        value
    } else {
        value + (align - value % align)
    }
}
