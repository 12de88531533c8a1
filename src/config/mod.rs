// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Run configuration for the character splitter
//!
//! One `SplitConfig` is built at start-up (defaults, then an optional TOML
//! file, then CLI flags) and passed explicitly to every component.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SplitError;

/// Default ONNX export of the CRAFT MLT weights
pub const DEFAULT_MODEL_PATH: &str = "weights/craft_mlt_25k.onnx";

/// Default folder scanned for input images
pub const DEFAULT_INPUT_DIR: &str = "/data/images";

/// Default folder receiving the character crops
pub const DEFAULT_OUTPUT_DIR: &str = "charPartImg";

/// Score thresholds used by the detector
///
/// `text_threshold`, `low_text` and `link_threshold` are the standard CRAFT
/// knobs and are carried for parity with the detector's own tooling.
/// Character regions are cut from the text heatmap at `char_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Text confidence threshold
    pub text_threshold: f32,
    /// Text low-bound score
    pub low_text: f32,
    /// Link confidence threshold
    pub link_threshold: f32,
    /// Binarization threshold for character regions
    pub char_threshold: f32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            text_threshold: 0.7,
            low_text: 0.4,
            link_threshold: 0.4,
            char_threshold: 0.6,
        }
    }
}

impl DetectionThresholds {
    fn validate(&self) -> Result<(), SplitError> {
        let named = [
            ("text_threshold", self.text_threshold),
            ("low_text", self.low_text),
            ("link_threshold", self.link_threshold),
            ("char_threshold", self.char_threshold),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(SplitError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Execution device for the detection model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// Map the legacy boolean `--cuda` switch onto a device
    pub fn from_cuda_flag(cuda: bool) -> Self {
        if cuda {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }
}

/// Which box dimensions decide the slicing axes of a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AxisPolicy {
    /// Use the dimensions of the box being cropped
    Current,
    /// Use the dimensions left over from the previous box, matching crops
    /// produced by earlier splitter releases
    Legacy,
}

/// File naming for written crops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// Seconds since the epoch with 10 decimals, e.g. `1700000000.1234567890.jpg`
    Timestamp,
    /// Random v4 UUID
    Uuid,
}

/// Complete configuration for one splitting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Path to the ONNX detection model
    pub model_path: PathBuf,
    /// Folder scanned (recursively) for input images
    pub input_dir: PathBuf,
    /// Folder receiving crops
    pub output_dir: PathBuf,
    pub thresholds: DetectionThresholds,
    /// Upper bound of the longer canvas side
    pub canvas_size: u32,
    /// Magnification applied to the longer image side before clipping to `canvas_size`
    pub mag_ratio: f64,
    /// Canvas pixels per heatmap cell
    pub heatmap_stride: u32,
    pub device: Device,
    pub axis_policy: AxisPolicy,
    pub naming: NamingScheme,
    /// Log per-image timings
    pub show_time: bool,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            thresholds: DetectionThresholds::default(),
            canvas_size: 1280,
            mag_ratio: 1.5,
            heatmap_stride: 2,
            device: Device::Cuda,
            axis_policy: AxisPolicy::Current,
            naming: NamingScheme::Timestamp,
            show_time: false,
            intra_threads: 4,
        }
    }
}

impl SplitConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SplitError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SplitError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| SplitError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, SplitError> {
        toml::from_str(content).map_err(|e| SplitError::Config(e.to_string()))
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), SplitError> {
        self.thresholds.validate()?;

        if self.canvas_size == 0 {
            return Err(SplitError::Config("canvas_size must be positive".into()));
        }
        if !self.mag_ratio.is_finite() || self.mag_ratio <= 0.0 {
            return Err(SplitError::Config(format!(
                "mag_ratio must be a positive number, got {}",
                self.mag_ratio
            )));
        }
        if self.heatmap_stride == 0 {
            return Err(SplitError::Config("heatmap_stride must be positive".into()));
        }
        if self.intra_threads == 0 {
            return Err(SplitError::Config("intra_threads must be positive".into()));
        }
        Ok(())
    }
}
