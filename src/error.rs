// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the character splitter
//!
//! Every failure is classified by [`Severity`]:
//!
//! - **Fatal**: the run cannot continue (model missing, bad configuration,
//!   output folder not writable)
//! - **Skippable**: only the current image is affected; the driver logs it
//!   and moves on to the next image
//!
//! Crops rejected by the aspect-ratio filter or collapsed to zero area by
//! bounds clamping are not errors and never surface here.

use std::path::PathBuf;

use thiserror::Error;

use crate::vision::ImageError;

/// How the pipeline driver reacts to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the whole run
    Fatal,
    /// Log and continue with the next image
    Skippable,
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Detection model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Failed to load detection model: {0}")]
    ModelLoad(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode image {}: {source}", .path.display())]
    ImageDecode { path: PathBuf, source: ImageError },

    #[error("Detection inference failed: {0}")]
    Inference(String),

    #[error("Unexpected heatmap: {0}")]
    InvalidHeatmap(String),

    #[error("Failed to write crop {}: {reason}", .path.display())]
    CropWrite { path: PathBuf, reason: String },
}

impl SplitError {
    pub fn severity(&self) -> Severity {
        match self {
            SplitError::ModelNotFound(_)
            | SplitError::ModelLoad(_)
            | SplitError::Config(_)
            | SplitError::OutputDir { .. } => Severity::Fatal,
            SplitError::ImageRead { .. }
            | SplitError::ImageDecode { .. }
            | SplitError::Inference(_)
            | SplitError::InvalidHeatmap(_)
            | SplitError::CropWrite { .. } => Severity::Skippable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
