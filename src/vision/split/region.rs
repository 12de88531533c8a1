// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Character region extraction from the text heatmap
//!
//! The heatmap is binarized, every border (outer and hole) of the binary
//! mask is traced, and the bounding rectangle of each border becomes one
//! box. Boxes are neither merged nor deduplicated.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use ndarray::Array2;

/// Axis-aligned rectangle in heatmap cells
///
/// `width`/`height` count cells, so a single-cell region is 1×1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    /// Smallest rectangle holding every contour point; `None` for an empty contour
    pub fn of_contour(contour: &Contour<u32>) -> Option<Self> {
        let first = contour.points.first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in &contour.points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// Four corners, clockwise from top-left
    pub fn to_char_box(&self) -> CharBox {
        let (x, y) = (self.x as f64, self.y as f64);
        let (r, b) = (x + self.width as f64, y + self.height as f64);
        CharBox {
            points: [[x, y], [r, y], [r, b], [x, b]],
        }
    }
}

/// Four corner points of a detected region in heatmap space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharBox {
    /// top-left, top-right, bottom-right, bottom-left as [x, y]
    pub points: [[f64; 2]; 4],
}

/// One traced border of the binary mask
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub rect: BoundingRect,
    pub border: BorderType,
}

/// Binarize a heatmap: scores at or above `threshold` become 255, the rest 0
pub fn binarize(heatmap: &Array2<f32>, threshold: f32) -> GrayImage {
    let (rows, cols) = heatmap.dim();
    let mut mask = GrayImage::new(cols as u32, rows as u32);
    for ((row, col), &score) in heatmap.indexed_iter() {
        if score >= threshold {
            mask.put_pixel(col as u32, row as u32, Luma([255]));
        }
    }
    mask
}

/// Trace every border of the binarized heatmap, in tracing order
pub fn extract_regions(heatmap: &Array2<f32>, threshold: f32) -> Vec<Region> {
    let mask = binarize(heatmap, threshold);
    let contours: Vec<Contour<u32>> = find_contours(&mask);

    contours
        .iter()
        .filter_map(|contour| {
            BoundingRect::of_contour(contour).map(|rect| Region {
                rect,
                border: contour.border_type,
            })
        })
        .collect()
}

/// Boxes for every region above `threshold`; an empty mask gives no boxes
pub fn extract_boxes(heatmap: &Array2<f32>, threshold: f32) -> Vec<CharBox> {
    extract_regions(heatmap, threshold)
        .iter()
        .map(|region| region.rect.to_char_box())
        .collect()
}
