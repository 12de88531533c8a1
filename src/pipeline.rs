// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sequential splitting run over a list of images
//!
//! For each image: canvas → score maps → regions → remap → crop → write.
//! Fatal errors end the run; skippable errors are logged and the next image
//! is processed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::vision::craft::{Canvas, HeatmapProducer};
use crate::vision::load_image;
use crate::vision::split::{
    extract_regions, remap_boxes, CharBox, CharCropper, CropOutcome, CropWriter, RemapRatio,
};

/// What happened to one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageReport {
    /// Regions traced in the heatmap
    pub regions: usize,
    /// Crops written
    pub saved: Vec<PathBuf>,
    /// Crops rejected by the aspect filter
    pub filtered: usize,
    /// Boxes left empty after clamping
    pub degenerate: usize,
    /// Crops that could not be written
    pub write_failed: usize,
    pub inference_time: Duration,
    pub postprocess_time: Duration,
}

/// Totals for a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitSummary {
    pub images_total: usize,
    pub images_processed: usize,
    pub images_skipped: usize,
    pub crops_saved: usize,
    pub crops_filtered: usize,
    pub crops_degenerate: usize,
    pub crops_failed: usize,
    pub elapsed: Duration,
}

impl SplitSummary {
    fn absorb(&mut self, report: &ImageReport) {
        self.images_processed += 1;
        self.crops_saved += report.saved.len();
        self.crops_filtered += report.filtered;
        self.crops_degenerate += report.degenerate;
        self.crops_failed += report.write_failed;
    }
}

/// Runs the splitting pipeline with one heatmap producer
pub struct CharSplitter<P: HeatmapProducer> {
    producer: P,
    config: SplitConfig,
    cropper: CharCropper,
    writer: CropWriter,
}

impl<P: HeatmapProducer> CharSplitter<P> {
    /// Validate the config and prepare the output directory
    pub fn new(producer: P, config: SplitConfig) -> Result<Self, SplitError> {
        config.validate()?;
        let writer = CropWriter::new(&config.output_dir, config.naming)?;
        let cropper = CharCropper::new(config.axis_policy);
        Ok(Self {
            producer,
            config,
            cropper,
            writer,
        })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn writer(&self) -> &CropWriter {
        &self.writer
    }

    pub fn cropper(&self) -> &CharCropper {
        &self.cropper
    }

    /// Process every image in order
    ///
    /// Prints a progress line per image. Returns early only on fatal errors.
    pub fn run(&mut self, images: &[PathBuf]) -> Result<SplitSummary, SplitError> {
        let started = Instant::now();
        let mut summary = SplitSummary {
            images_total: images.len(),
            ..SplitSummary::default()
        };

        for (k, path) in images.iter().enumerate() {
            print!("Test image {}/{}: {}\r", k + 1, images.len(), path.display());
            let _ = std::io::stdout().flush();

            match self.process_image(path) {
                Ok(report) => {
                    if self.config.show_time {
                        info!(
                            "{}: infer/postproc time : {:.3}/{:.3}s",
                            path.display(),
                            report.inference_time.as_secs_f64(),
                            report.postprocess_time.as_secs_f64()
                        );
                    }
                    summary.absorb(&report);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    summary.images_skipped += 1;
                }
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Load one image from disk and split it
    pub fn process_image(&mut self, path: &Path) -> Result<ImageReport, SplitError> {
        let (image, info) = load_image(path)?;
        debug!(
            "Loaded {}: {}x{}, {} bytes",
            path.display(),
            info.width,
            info.height,
            info.size_bytes
        );
        self.split_image(&image)
    }

    /// Split an already decoded image
    pub fn split_image(&mut self, image: &RgbImage) -> Result<ImageReport, SplitError> {
        let (width, height) = image.dimensions();
        let stride = self.config.heatmap_stride;

        let infer_started = Instant::now();
        let canvas = Canvas::from_image(image, self.config.canvas_size, self.config.mag_ratio);
        let maps = self.producer.produce(&canvas)?;
        maps.check_against(&canvas, stride)?;
        let inference_time = infer_started.elapsed();

        let post_started = Instant::now();
        let regions = extract_regions(&maps.text, self.config.thresholds.char_threshold);
        if regions.is_empty() {
            debug!("No character regions above threshold");
        }

        let boxes: Vec<CharBox> = regions.iter().map(|r| r.rect.to_char_box()).collect();
        let ratio = RemapRatio::for_image(height, width, self.config.canvas_size, self.config.mag_ratio)
            .with_stride(stride);
        let rescaled = remap_boxes(&boxes, ratio);

        self.cropper.begin_image(
            regions
                .last()
                .map(|r| (r.rect.width as i64, r.rect.height as i64)),
        );

        let mut report = ImageReport {
            regions: regions.len(),
            inference_time,
            ..ImageReport::default()
        };

        for rbox in &rescaled {
            match self.cropper.crop(image, rbox) {
                CropOutcome::Kept(crop) => match self.writer.write(&crop) {
                    Ok(path) => report.saved.push(path),
                    Err(e) => {
                        warn!("{}", e);
                        report.write_failed += 1;
                    }
                },
                CropOutcome::Filtered { .. } => report.filtered += 1,
                CropOutcome::Degenerate => report.degenerate += 1,
            }
        }

        report.postprocess_time = post_started.elapsed();
        debug!(
            "{} regions, {} saved, {} filtered, {} degenerate, {} failed",
            report.regions,
            report.saved.len(),
            report.filtered,
            report.degenerate,
            report.write_failed
        );
        Ok(report)
    }
}
