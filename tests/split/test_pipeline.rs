// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end splitting runs with a scripted heatmap producer
//!
//! These tests verify:
//! - A folder of images produces one JPEG per accepted region
//! - Undecodable images are skipped without ending the run
//! - Model-level failures abort the run
//! - Crop files are named by timestamp with 10 decimals
//! - Failed crop writes are counted without losing saved crops
//! - Legacy axis dimensions carry over images without regions

use std::cell::Cell;
use std::path::{Path, PathBuf};

use fabstir_char_split::config::{AxisPolicy, NamingScheme, SplitConfig};
use fabstir_char_split::error::SplitError;
use fabstir_char_split::pipeline::CharSplitter;
use fabstir_char_split::vision::craft::{Canvas, HeatmapProducer, ScoreMaps};
use fabstir_char_split::vision::list_images;
use image::{Rgb, RgbImage};
use ndarray::Array2;
use tempfile::TempDir;

/// Two separated blocks of text cells on every canvas
struct TwoBlocks;

impl HeatmapProducer for TwoBlocks {
    fn produce(&self, canvas: &Canvas) -> Result<ScoreMaps, SplitError> {
        let dim = canvas.heatmap_dim(2);
        let mut text = Array2::<f32>::zeros(dim);
        for (r0, c0) in [(8, 8), (8, 40)] {
            for r in r0..r0 + 12 {
                for c in c0..c0 + 12 {
                    text[[r, c]] = 0.9;
                }
            }
        }
        Ok(ScoreMaps {
            link: Array2::zeros(dim),
            text,
        })
    }
}

/// Fails as if the runtime had gone away
struct BrokenModel;

impl HeatmapProducer for BrokenModel {
    fn produce(&self, _canvas: &Canvas) -> Result<ScoreMaps, SplitError> {
        Err(SplitError::ModelLoad("session lost".into()))
    }
}

fn write_image(dir: &Path, name: &str) {
    RgbImage::from_pixel(160, 120, Rgb([200, 200, 200]))
        .save(dir.join(name))
        .unwrap();
}

fn config(input: &Path, output: &Path) -> SplitConfig {
    SplitConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        ..SplitConfig::default()
    }
}

#[test]
fn test_folder_run_writes_crops() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_image(input.path(), "a.png");
    write_image(input.path(), "b.jpg");
    std::fs::write(input.path().join("notes.txt"), b"not an image").unwrap();

    let images = list_images(input.path()).unwrap();
    assert_eq!(images.len(), 2);

    let out_dir = output.path().join("charPartImg");
    let mut splitter = CharSplitter::new(TwoBlocks, config(input.path(), &out_dir)).unwrap();
    let summary = splitter.run(&images).unwrap();

    assert_eq!(summary.images_total, 2);
    assert_eq!(summary.images_processed, 2);
    assert_eq!(summary.images_skipped, 0);
    assert_eq!(summary.crops_saved, 4);

    let written: Vec<_> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(written.len(), 4);
    for path in written {
        let crop = image::open(&path).unwrap();
        assert_eq!(crop.height(), 28);
    }
}

#[test]
fn test_corrupt_image_is_skipped() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_image(input.path(), "good.png");
    std::fs::write(input.path().join("broken.jpg"), b"\xFF\xD8\xFF\x00truncated").unwrap();

    let images = list_images(input.path()).unwrap();
    let mut splitter =
        CharSplitter::new(TwoBlocks, config(input.path(), output.path())).unwrap();
    let summary = splitter.run(&images).unwrap();

    assert_eq!(summary.images_total, 2);
    assert_eq!(summary.images_skipped, 1);
    assert_eq!(summary.crops_saved, 2);
}

#[test]
fn test_model_failure_aborts_run() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_image(input.path(), "a.png");
    write_image(input.path(), "b.png");

    let images = list_images(input.path()).unwrap();
    let mut splitter =
        CharSplitter::new(BrokenModel, config(input.path(), output.path())).unwrap();
    let err = splitter.run(&images).unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_crop_names_are_timestamps() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_image(input.path(), "a.png");

    let mut cfg = config(input.path(), output.path());
    cfg.naming = NamingScheme::Timestamp;
    let mut splitter = CharSplitter::new(TwoBlocks, cfg).unwrap();
    let report = splitter
        .process_image(&input.path().join("a.png"))
        .unwrap();

    assert_eq!(report.saved.len(), 2);
    for path in &report.saved {
        let stem = path.file_stem().unwrap().to_str().unwrap();
        let base = stem.split('_').next().unwrap();
        let (secs, decimals) = base.split_once('.').unwrap();
        assert!(secs.parse::<u64>().is_ok());
        assert_eq!(decimals.len(), 10);
    }
}

/// Behaves like `TwoBlocks`, but blocks the output folder before the second image
struct BlocksOutputOnSecondImage {
    out_dir: PathBuf,
    moved_to: PathBuf,
    calls: Cell<usize>,
}

impl HeatmapProducer for BlocksOutputOnSecondImage {
    fn produce(&self, canvas: &Canvas) -> Result<ScoreMaps, SplitError> {
        self.calls.set(self.calls.get() + 1);
        if self.calls.get() == 2 {
            std::fs::rename(&self.out_dir, &self.moved_to).unwrap();
            std::fs::write(&self.out_dir, b"blocked").unwrap();
        }
        TwoBlocks.produce(canvas)
    }
}

#[test]
fn test_write_failures_keep_summary_in_step_with_disk() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_image(input.path(), "a.png");
    write_image(input.path(), "b.png");

    let out_dir = output.path().join("crops");
    let moved_to = output.path().join("first");
    let producer = BlocksOutputOnSecondImage {
        out_dir: out_dir.clone(),
        moved_to: moved_to.clone(),
        calls: Cell::new(0),
    };

    let images = list_images(input.path()).unwrap();
    let mut splitter = CharSplitter::new(producer, config(input.path(), &out_dir)).unwrap();
    let summary = splitter.run(&images).unwrap();

    let on_disk = std::fs::read_dir(&moved_to).unwrap().count();
    assert_eq!(on_disk, 2);
    assert_eq!(summary.crops_saved, on_disk);
    assert_eq!(summary.crops_saved, splitter.writer().written());
    assert_eq!(summary.crops_failed, 2);
    assert_eq!(summary.images_processed, 2);
    assert_eq!(summary.images_skipped, 0);
}

/// Text only on the first canvas; every later canvas is empty
struct FirstImageOnly {
    calls: Cell<usize>,
    block: (usize, usize, usize, usize),
}

impl HeatmapProducer for FirstImageOnly {
    fn produce(&self, canvas: &Canvas) -> Result<ScoreMaps, SplitError> {
        self.calls.set(self.calls.get() + 1);
        let dim = canvas.heatmap_dim(2);
        let mut text = Array2::<f32>::zeros(dim);
        if self.calls.get() == 1 {
            let (r0, c0, h, w) = self.block;
            for r in r0..r0 + h {
                for c in c0..c0 + w {
                    text[[r, c]] = 0.9;
                }
            }
        }
        Ok(ScoreMaps {
            link: Array2::zeros(dim),
            text,
        })
    }
}

#[test]
fn test_legacy_axes_carry_across_images_without_regions() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_image(input.path(), "a.png");
    write_image(input.path(), "b.png");

    // One region 2 cells wide and 30 high maps to a 3x40 px box. The
    // region itself is tall, so the first box is sliced on rows only:
    // rows 10..56 over all 160 columns
    let producer = FirstImageOnly {
        calls: Cell::new(0),
        block: (10, 20, 30, 2),
    };
    let mut cfg = config(input.path(), output.path());
    cfg.axis_policy = AxisPolicy::Legacy;
    let mut splitter = CharSplitter::new(producer, cfg).unwrap();

    let first = splitter
        .process_image(&input.path().join("a.png"))
        .unwrap();
    assert_eq!(first.regions, 1);
    assert_eq!(first.saved.len(), 1);
    assert_eq!(splitter.cropper().carried(), Some((160, 46)));

    let crop = image::open(&first.saved[0]).unwrap();
    assert_eq!((crop.width(), crop.height()), (97, 28));

    // No regions on the second image: nothing is cropped and the slice
    // size from the first image stays carried
    let second = splitter
        .process_image(&input.path().join("b.png"))
        .unwrap();
    assert_eq!(second.regions, 0);
    assert!(second.saved.is_empty());
    assert_eq!(splitter.cropper().carried(), Some((160, 46)));
}
