// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::config::{AxisPolicy, Device, NamingScheme, SplitConfig};
use crate::pipeline::{CharSplitter, SplitSummary};
use crate::vision::craft::CraftDetectionModel;
use crate::vision::list_images;

/// Parse the loose boolean spellings accepted by `--cuda`
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Ok(true),
        "no" | "n" | "false" | "f" | "0" => Ok(false),
        other => Err(format!("expected a boolean, got '{}'", other)),
    }
}

/// Character crop extraction with the CRAFT text detector
///
/// Flags override values from `--config`, which override built-in defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "char-split")]
#[command(version)]
#[command(about = "Split images into normalized single-character crops", long_about = None)]
pub struct Cli {
    /// TOML file with base configuration
    #[arg(long, env = "CHAR_SPLIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pretrained CRAFT model in ONNX format [default: weights/craft_mlt_25k.onnx]
    #[arg(long, env = "CRAFT_MODEL_PATH")]
    pub trained_model: Option<PathBuf>,

    /// Folder path to input images [default: /data/images]
    #[arg(long, env = "CHAR_SPLIT_INPUT")]
    pub test_folder: Option<PathBuf>,

    /// Folder receiving character crops [default: charPartImg]
    #[arg(long, env = "CHAR_SPLIT_OUTPUT")]
    pub output_dir: Option<PathBuf>,

    /// Text confidence threshold [default: 0.7]
    #[arg(long)]
    pub text_threshold: Option<f32>,

    /// Text low-bound score [default: 0.4]
    #[arg(long)]
    pub low_text: Option<f32>,

    /// Link confidence threshold [default: 0.4]
    #[arg(long)]
    pub link_threshold: Option<f32>,

    /// Heatmap threshold for character regions [default: 0.6]
    #[arg(long)]
    pub char_threshold: Option<f32>,

    /// Image size for inference [default: 1280]
    #[arg(long)]
    pub canvas_size: Option<u32>,

    /// Image magnification ratio [default: 1.5]
    #[arg(long)]
    pub mag_ratio: Option<f64>,

    /// Use CUDA for inference (yes/no, true/false, 1/0) [default: true]
    #[arg(long, env = "CHAR_SPLIT_CUDA", value_parser = parse_bool)]
    pub cuda: Option<bool>,

    /// Dimensions deciding the crop axes [default: current]
    #[arg(long, value_enum)]
    pub axis_policy: Option<AxisPolicy>,

    /// Crop file naming [default: timestamp]
    #[arg(long, value_enum)]
    pub naming: Option<NamingScheme>,

    /// Show per-image processing time
    #[arg(long)]
    pub show_time: bool,
}

impl Cli {
    /// Resolve the final configuration: defaults, then file, then flags
    pub fn to_config(&self) -> Result<SplitConfig> {
        let mut config = match &self.config {
            Some(path) => SplitConfig::from_file(path)?,
            None => SplitConfig::default(),
        };

        if let Some(path) = &self.trained_model {
            config.model_path = path.clone();
        }
        if let Some(path) = &self.test_folder {
            config.input_dir = path.clone();
        }
        if let Some(path) = &self.output_dir {
            config.output_dir = path.clone();
        }
        if let Some(v) = self.text_threshold {
            config.thresholds.text_threshold = v;
        }
        if let Some(v) = self.low_text {
            config.thresholds.low_text = v;
        }
        if let Some(v) = self.link_threshold {
            config.thresholds.link_threshold = v;
        }
        if let Some(v) = self.char_threshold {
            config.thresholds.char_threshold = v;
        }
        if let Some(v) = self.canvas_size {
            config.canvas_size = v;
        }
        if let Some(v) = self.mag_ratio {
            config.mag_ratio = v;
        }
        if let Some(cuda) = self.cuda {
            config.device = Device::from_cuda_flag(cuda);
        }
        if let Some(policy) = self.axis_policy {
            config.axis_policy = policy;
        }
        if let Some(naming) = self.naming {
            config.naming = naming;
        }
        if self.show_time {
            config.show_time = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute a full splitting run
pub fn execute(cli: Cli) -> Result<SplitSummary> {
    let config = cli.to_config()?;
    info!(
        "Splitting {} into {} (canvas {}, mag {}, threshold {})",
        config.input_dir.display(),
        config.output_dir.display(),
        config.canvas_size,
        config.mag_ratio,
        config.thresholds.char_threshold
    );

    let images = list_images(&config.input_dir)?;

    let model = CraftDetectionModel::load(&config.model_path, config.device, config.intra_threads)
        .with_context(|| format!("cannot start without model {}", config.model_path.display()))?;

    let started = Instant::now();
    let mut splitter = CharSplitter::new(&model, config)?;
    let summary = splitter.run(&images)?;

    println!();
    println!("elapsed time : {}s", started.elapsed().as_secs_f64());
    println!(
        "📋 {} images ({} skipped), {} crops saved, {} filtered",
        summary.images_total,
        summary.images_skipped,
        summary.crops_saved,
        summary.crops_filtered
    );
    if summary.crops_failed > 0 {
        println!("⚠️  {} crops could not be written", summary.crops_failed);
    }

    Ok(summary)
}
