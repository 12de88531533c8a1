// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persisting normalized crops as JPEG files

use std::path::{Path, PathBuf};

use chrono::Utc;
use image::{ImageFormat, RgbImage};
use tracing::debug;
use uuid::Uuid;

use crate::config::NamingScheme;
use crate::error::SplitError;

/// Writes crops into one flat output directory
#[derive(Debug)]
pub struct CropWriter {
    dir: PathBuf,
    naming: NamingScheme,
    last_stem: Option<String>,
    written: usize,
}

/// Seconds since the Unix epoch with 10 decimals
fn timestamp_stem() -> String {
    let now = Utc::now();
    let secs = now.timestamp() as f64 + now.timestamp_subsec_nanos() as f64 * 1e-9;
    format!("{:.10}", secs)
}

impl CropWriter {
    /// Create the writer, creating `dir` if needed
    ///
    /// # Errors
    /// `SplitError::OutputDir` (fatal) when the directory cannot be created.
    pub fn new<P: AsRef<Path>>(dir: P, naming: NamingScheme) -> Result<Self, SplitError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| SplitError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            naming,
            last_stem: None,
            written: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of crops written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Next unused output path
    ///
    /// Timestamp names that repeat the previous name, or that already exist
    /// on disk, get a `_N` suffix.
    pub fn next_path(&mut self) -> PathBuf {
        let stem = match self.naming {
            NamingScheme::Timestamp => timestamp_stem(),
            NamingScheme::Uuid => Uuid::new_v4().to_string(),
        };

        let mut candidate = stem.clone();
        let mut suffix = 0;
        while self.last_stem.as_deref() == Some(candidate.as_str())
            || self.dir.join(format!("{}.jpg", candidate)).exists()
        {
            suffix += 1;
            candidate = format!("{}_{}", stem, suffix);
        }

        self.last_stem = Some(candidate.clone());
        self.dir.join(format!("{}.jpg", candidate))
    }

    /// Write one crop as JPEG and return its path
    pub fn write(&mut self, crop: &RgbImage) -> Result<PathBuf, SplitError> {
        let path = self.next_path();
        crop.save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|e| SplitError::CropWrite {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        self.written += 1;
        debug!("Saved crop {}", path.display());
        Ok(path)
    }
}
