// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for character extraction
//!
//! This module provides:
//! - Image discovery and decoding
//! - CRAFT character-region detection via ONNX Runtime
//! - Region extraction, coordinate remapping and crop normalization

pub mod craft;
pub mod image_utils;
pub mod split;

pub use image_utils::{decode_image_bytes, detect_format, list_images, load_image, ImageError, ImageInfo};
