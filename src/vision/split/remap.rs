// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mapping boxes from heatmap space back to original image pixels

use super::region::CharBox;
use crate::vision::craft::target_size;

/// Per-axis multipliers from heatmap coordinates to image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemapRatio {
    pub ratio_w: f64,
    pub ratio_h: f64,
}

impl RemapRatio {
    pub fn uniform(ratio: f64) -> Self {
        Self {
            ratio_w: ratio,
            ratio_h: ratio,
        }
    }

    /// Ratio from canvas pixels to image pixels for an image of `height` × `width`
    ///
    /// Only the longer side enters the target-size computation, so both axes
    /// share one value: `max(h, w) / min(canvas_size, mag_ratio * max(h, w))`.
    pub fn for_image(height: u32, width: u32, canvas_size: u32, mag_ratio: f64) -> Self {
        let longer = height.max(width).max(1) as f64;
        let target = target_size(height, width, canvas_size, mag_ratio);
        if target <= 0.0 {
            return Self::uniform(1.0);
        }
        // Inverse of the canvas scale, taken the same way the canvas takes it
        Self::uniform(1.0 / (target / longer))
    }

    /// Account for heatmap cells covering `stride` canvas pixels
    pub fn with_stride(self, stride: u32) -> Self {
        let stride = stride as f64;
        Self {
            ratio_w: self.ratio_w * stride,
            ratio_h: self.ratio_h * stride,
        }
    }
}

/// Box corners in original image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescaledBox {
    /// top-left, top-right, bottom-right, bottom-left as [x, y]
    pub points: [[i64; 2]; 4],
}

impl RescaledBox {
    /// (x0, y0, x2, y2) taken from the first and third corners
    pub fn span(&self) -> (i64, i64, i64, i64) {
        let [x0, y0] = self.points[0];
        let [x2, y2] = self.points[2];
        (x0, y0, x2, y2)
    }
}

/// Scale a single box; coordinates are truncated toward zero
pub fn remap_box(char_box: &CharBox, ratio: RemapRatio) -> RescaledBox {
    let mut points = [[0i64; 2]; 4];
    for (dst, src) in points.iter_mut().zip(char_box.points.iter()) {
        dst[0] = (src[0] * ratio.ratio_w) as i64;
        dst[1] = (src[1] * ratio.ratio_h) as i64;
    }
    RescaledBox { points }
}

/// Scale every box; output keeps input order and count
pub fn remap_boxes(boxes: &[CharBox], ratio: RemapRatio) -> Vec<RescaledBox> {
    boxes.iter().map(|b| remap_box(b, ratio)).collect()
}
