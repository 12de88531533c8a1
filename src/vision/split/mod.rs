// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Character splitting: heatmap regions to normalized crops
//!
//! Components:
//! - `region` - Binarize the text heatmap and box every traced border
//! - `remap` - Heatmap coordinates to original image pixels
//! - `crop` - Margin, axis choice, clamping, aspect filter, resize
//! - `writer` - JPEG output with collision-free names

pub mod crop;
pub mod region;
pub mod remap;
pub mod writer;

pub use crop::{CharCropper, CropOutcome};
pub use region::{extract_boxes, extract_regions, BoundingRect, CharBox, Region};
pub use remap::{remap_boxes, RemapRatio, RescaledBox};
pub use writer::CropWriter;
