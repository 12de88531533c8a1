// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CRAFT character-region detector
//!
//! Components:
//! - `preprocessing` - Canvas construction (resize, pad, normalize)
//! - `heatmap` - Score maps and the `HeatmapProducer` seam
//! - `model` - ONNX Runtime session for the CRAFT network

pub mod heatmap;
pub mod model;
pub mod preprocessing;

pub use heatmap::{HeatmapProducer, ScoreMaps};
pub use model::CraftDetectionModel;
pub use preprocessing::{target_size, Canvas};
