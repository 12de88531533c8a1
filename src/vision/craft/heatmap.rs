// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector score maps and the producer seam

use ndarray::{s, Array2, ArrayViewD, Ix4};

use super::preprocessing::Canvas;
use crate::error::SplitError;

/// Region and affinity heatmaps produced for one canvas
///
/// Both maps are indexed `[row, col]` in heatmap space, which is the canvas
/// downscaled by the detector stride.
#[derive(Debug, Clone)]
pub struct ScoreMaps {
    /// Character region score
    pub text: Array2<f32>,
    /// Affinity (link) score between neighbouring characters
    pub link: Array2<f32>,
}

impl ScoreMaps {
    /// Heatmap size as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.text.dim()
    }

    /// Split a raw detector output into text and link maps
    ///
    /// Accepts `[1, H, W, 2]` (CRAFT's native channels-last output) and
    /// `[1, 2, H, W]`.
    pub fn from_output(output: ArrayViewD<f32>) -> Result<Self, SplitError> {
        let shape = output.shape().to_vec();
        let view = output
            .into_dimensionality::<Ix4>()
            .map_err(|_| SplitError::InvalidHeatmap(format!("expected 4-D output, got {:?}", shape)))?;

        if shape[0] != 1 {
            return Err(SplitError::InvalidHeatmap(format!(
                "expected batch size 1, got {:?}",
                shape
            )));
        }

        let (text, link) = if shape[3] == 2 {
            (
                view.slice(s![0, .., .., 0]).to_owned(),
                view.slice(s![0, .., .., 1]).to_owned(),
            )
        } else if shape[1] == 2 {
            (
                view.slice(s![0, 0, .., ..]).to_owned(),
                view.slice(s![0, 1, .., ..]).to_owned(),
            )
        } else {
            return Err(SplitError::InvalidHeatmap(format!(
                "expected two score channels, got {:?}",
                shape
            )));
        };

        Ok(Self { text, link })
    }

    /// Check the maps against the canvas they were produced from
    pub fn check_against(&self, canvas: &Canvas, stride: u32) -> Result<(), SplitError> {
        let expected = canvas.heatmap_dim(stride);
        if self.text.dim() != expected || self.link.dim() != expected {
            return Err(SplitError::InvalidHeatmap(format!(
                "heatmap is {:?}, canvas {:?} with stride {} expects {:?}",
                self.text.dim(),
                canvas.padded_size,
                stride,
                expected
            )));
        }
        Ok(())
    }
}

/// Anything that turns a canvas into score maps
///
/// The production implementation is [`super::CraftDetectionModel`]; tests
/// plug in synthetic producers.
pub trait HeatmapProducer {
    fn produce(&self, canvas: &Canvas) -> Result<ScoreMaps, SplitError>;
}

impl<T: HeatmapProducer + ?Sized> HeatmapProducer for &T {
    fn produce(&self, canvas: &Canvas) -> Result<ScoreMaps, SplitError> {
        (**self).produce(canvas)
    }
}
