// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Crop & normalize tests
//!
//! These tests verify:
//! - Margin and slice window for a detected box
//! - Strict aspect-ratio filtering
//! - Resize to 28px height with aspect-preserving width
//! - Clamping of windows that leave the image

use fabstir_char_split::config::AxisPolicy;
use fabstir_char_split::vision::split::crop::{
    aspect_ok, crop_window, margin, normalize_height, select_axes, CropWindow, SliceAxes,
    CROP_HEIGHT,
};
use fabstir_char_split::vision::split::{CharCropper, CropOutcome, RescaledBox};
use image::{Rgb, RgbImage};

fn detected_box() -> RescaledBox {
    RescaledBox {
        points: [[10, 10], [50, 10], [50, 40], [10, 40]],
    }
}

#[test]
fn test_detected_box_slice_window() {
    let rbox = detected_box();
    let (x0, y0, x2, y2) = rbox.span();
    let (w, h) = (x2 - x0, y2 - y0);
    assert_eq!((w, h), (40, 30));

    let m = margin(w, h);
    assert_eq!(m, 8);

    // Neither side doubles the other
    let axes = select_axes(w, h);
    assert_eq!(axes, SliceAxes::Both);

    // rows 2..48, cols 2..58
    let window = crop_window(&rbox, axes, m, 640, 480).unwrap();
    assert_eq!(
        window,
        CropWindow {
            x: 2,
            y: 2,
            width: 56,
            height: 46
        }
    );
}

#[test]
fn test_aspect_ratio_edges() {
    assert!(!aspect_ok(25, 100));
    assert!(!aspect_ok(100, 25));
    assert!(aspect_ok(64, 64));
}

#[test]
fn test_resize_to_fixed_height() {
    let crop = RgbImage::from_pixel(50, 100, Rgb([120, 60, 30]));
    let out = normalize_height(&crop);
    assert_eq!(out.height(), CROP_HEIGHT);
    assert_eq!(out.width(), 14);

    let sliver = RgbImage::new(1, 300);
    assert_eq!(normalize_height(&sliver).dimensions(), (1, 28));
}

#[test]
fn test_crop_content_comes_from_window() {
    // Left half black, right half white; box sits in the white half
    let mut image = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
    for y in 0..100 {
        for x in 0..100 {
            image.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }

    let rbox = RescaledBox {
        points: [[130, 30], [160, 30], [160, 60], [130, 60]],
    };
    let mut cropper = CharCropper::new(AxisPolicy::Current);
    match cropper.crop(&image, &rbox) {
        CropOutcome::Kept(out) => {
            assert_eq!(out.height(), 28);
            assert!(out.pixels().all(|p| p[0] > 200));
        }
        other => panic!("expected a kept crop, got {:?}", other),
    }
}

#[test]
fn test_box_at_image_edge_is_clamped_and_kept() {
    let image = RgbImage::new(60, 60);
    // margin 7 pushes below zero on both axes
    let rbox = RescaledBox {
        points: [[2, 2], [32, 2], [32, 32], [2, 32]],
    };
    let mut cropper = CharCropper::new(AxisPolicy::Current);
    match cropper.crop(&image, &rbox) {
        CropOutcome::Kept(out) => assert_eq!(out.dimensions(), (28, 28)),
        other => panic!("expected a kept crop, got {:?}", other),
    }
}

#[test]
fn test_box_outside_image_is_degenerate() {
    let image = RgbImage::new(60, 60);
    let rbox = RescaledBox {
        points: [[90, 90], [120, 90], [120, 120], [90, 120]],
    };
    let mut cropper = CharCropper::new(AxisPolicy::Current);
    assert!(matches!(cropper.crop(&image, &rbox), CropOutcome::Degenerate));
}
