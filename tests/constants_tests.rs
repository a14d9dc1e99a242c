// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use trichrome::constants::{self, roi, thresholds, throttle};
use trichrome::frame_processor::RegionOfInterest;

#[test]
fn test_threshold_values() {
    assert_eq!(thresholds::RED, 160);
    assert_eq!(thresholds::GREEN, 175);
    assert_eq!(thresholds::BLUE, 160);
}

#[test]
fn test_throttle_window_matches_millis() {
    assert_eq!(throttle::WINDOW.as_millis() as u64, throttle::WINDOW_MS);
}

#[test]
fn test_roi_uses_shrink_divisor() {
    // 1920x1080: edge = 1080 - 1080 / 4 = 810
    let roi = RegionOfInterest::for_frame(1920, 1080);
    assert_eq!(roi.edge, 1080 - 1080 / roi::SHRINK_DIVISOR);
    assert_eq!((roi.x, roi.y), (555, 135));
}

#[test]
fn test_image_extensions() {
    assert!(constants::is_image_extension("png"));
    assert!(constants::is_image_extension("jpeg"));
    assert!(!constants::is_image_extension("mp4"));
}
