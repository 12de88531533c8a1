// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod vision;

// Re-export main types
pub use config::{AxisPolicy, Device, NamingScheme, SplitConfig};
pub use error::{Severity, SplitError};
pub use pipeline::{CharSplitter, ImageReport, SplitSummary};
pub use vision::craft::{CraftDetectionModel, HeatmapProducer};
