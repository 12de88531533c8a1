// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cropping detected characters out of the original image
//!
//! Steps per box:
//! 1. Margin of `ceil(0.22 * sqrt(w * h))` around the box
//! 2. Slicing axes picked from a width/height pair (see [`AxisPolicy`])
//! 3. Slice bounds clamped to the image; zero-area results are dropped
//! 4. Height/width ratio must lie strictly inside (0.25, 4)
//! 5. Resize to 28px height, aspect-preserving width, cubic filter

use image::{imageops, imageops::FilterType, RgbImage};
use tracing::{debug, trace};

use super::remap::RescaledBox;
use crate::config::AxisPolicy;

/// Margin as a fraction of the box's geometric mean side
pub const MARGIN_FACTOR: f64 = 0.22;

/// Output height of every normalized crop
pub const CROP_HEIGHT: u32 = 28;

/// Exclusive lower bound of the kept height/width ratio
pub const MIN_ASPECT: f64 = 0.25;

/// Exclusive upper bound of the kept height/width ratio
pub const MAX_ASPECT: f64 = 4.0;

/// Area-proportional padding for a `w` × `h` box
pub fn margin(w: i64, h: i64) -> i64 {
    let area = w.saturating_mul(h);
    if area <= 0 {
        return 0;
    }
    (MARGIN_FACTOR * (area as f64).sqrt()).ceil() as i64
}

/// Which axes of the image get narrowed to the box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAxes {
    /// Narrow columns, keep every row
    Columns,
    /// Narrow rows, keep every column
    Rows,
    /// Narrow both
    Both,
}

/// Pick slicing axes from a width/height pair
///
/// More than twice as wide as high narrows columns only; more than twice as
/// high as wide narrows rows only.
pub fn select_axes(w: i64, h: i64) -> SliceAxes {
    if 2 * h < w {
        SliceAxes::Columns
    } else if 2 * w < h {
        SliceAxes::Rows
    } else {
        SliceAxes::Both
    }
}

/// Clamped pixel rectangle to cut from the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn clamp_span(start: i64, end: i64, dim: u32) -> Option<(u32, u32)> {
    let dim = dim as i64;
    let start = start.clamp(0, dim);
    let end = end.clamp(0, dim);
    if end <= start {
        return None;
    }
    Some((start as u32, (end - start) as u32))
}

/// Compute the clamped slice for a box; `None` when nothing is left
pub fn crop_window(
    rbox: &RescaledBox,
    axes: SliceAxes,
    margin: i64,
    image_width: u32,
    image_height: u32,
) -> Option<CropWindow> {
    let (x0, y0, x2, y2) = rbox.span();
    let (col_start, col_end) = match axes {
        SliceAxes::Rows => (0, image_width as i64),
        _ => (x0 - margin, x2 + margin),
    };
    let (row_start, row_end) = match axes {
        SliceAxes::Columns => (0, image_height as i64),
        _ => (y0 - margin, y2 + margin),
    };

    let (x, width) = clamp_span(col_start, col_end, image_width)?;
    let (y, height) = clamp_span(row_start, row_end, image_height)?;
    Some(CropWindow { x, y, width, height })
}

/// Height/width ratio check, strict on both ends
pub fn aspect_ok(height: u32, width: u32) -> bool {
    if width == 0 {
        return false;
    }
    let ratio = height as f64 / width as f64;
    ratio > MIN_ASPECT && ratio < MAX_ASPECT
}

/// Width of a crop after scaling it to `CROP_HEIGHT`; at least 1
pub fn normalized_width(height: u32, width: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    let scaled = CROP_HEIGHT as f64 * width as f64 / height as f64;
    (scaled as u32).max(1)
}

/// Resize a crop to `CROP_HEIGHT` rows with cubic interpolation
pub fn normalize_height(crop: &RgbImage) -> RgbImage {
    let (width, height) = crop.dimensions();
    imageops::resize(
        crop,
        normalized_width(height, width),
        CROP_HEIGHT,
        FilterType::CatmullRom,
    )
}

/// Result of cropping one box
#[derive(Debug, Clone)]
pub enum CropOutcome {
    /// Normalized crop ready to be written
    Kept(RgbImage),
    /// Box fell outside the image after clamping
    Degenerate,
    /// Aspect ratio outside (0.25, 4)
    Filtered { ratio: f64 },
}

/// Crops boxes of one image at a time
///
/// Under [`AxisPolicy::Legacy`] the width/height pair deciding the axes is
/// the one left over from the previous step: the last region's bounding
/// rectangle for the first box of an image, then the size of the last
/// non-empty slice.
#[derive(Debug, Clone)]
pub struct CharCropper {
    policy: AxisPolicy,
    /// (w, h) carried between boxes for the legacy policy
    carried: Option<(i64, i64)>,
}

impl CharCropper {
    pub fn new(policy: AxisPolicy) -> Self {
        Self {
            policy,
            carried: None,
        }
    }

    pub fn policy(&self) -> AxisPolicy {
        self.policy
    }

    /// Width/height pair the legacy policy would use for the next box
    pub fn carried(&self) -> Option<(i64, i64)> {
        self.carried
    }

    /// Reset carried state for a new image
    ///
    /// `last_region` is the (width, height) of the last traced region in
    /// heatmap cells.
    pub fn begin_image(&mut self, last_region: Option<(i64, i64)>) {
        if last_region.is_some() {
            self.carried = last_region;
        }
    }

    fn axis_dims(&self, current: (i64, i64)) -> (i64, i64) {
        match self.policy {
            AxisPolicy::Current => current,
            AxisPolicy::Legacy => self.carried.unwrap_or(current),
        }
    }

    /// Cut, filter and normalize the crop for one box
    pub fn crop(&mut self, image: &RgbImage, rbox: &RescaledBox) -> CropOutcome {
        let (x0, y0, x2, y2) = rbox.span();
        let (w, h) = (x2 - x0, y2 - y0);
        let m = margin(w, h);

        let (axis_w, axis_h) = self.axis_dims((w, h));
        let axes = select_axes(axis_w, axis_h);

        let (image_width, image_height) = image.dimensions();
        let window = match crop_window(rbox, axes, m, image_width, image_height) {
            Some(window) => window,
            None => {
                debug!(
                    "Dropping degenerate crop for box {:?} in {}x{} image",
                    rbox.points, image_width, image_height
                );
                return CropOutcome::Degenerate;
            }
        };

        self.carried = Some((window.width as i64, window.height as i64));

        if !aspect_ok(window.height, window.width) {
            let ratio = window.height as f64 / window.width as f64;
            trace!("Filtered crop {:?} with aspect ratio {:.3}", window, ratio);
            return CropOutcome::Filtered { ratio };
        }

        let sliced =
            imageops::crop_imm(image, window.x, window.y, window.width, window.height).to_image();
        CropOutcome::Kept(normalize_height(&sliced))
    }
}
