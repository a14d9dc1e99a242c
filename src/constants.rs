// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use std::time::Duration;

/// Per-channel binarization thresholds
///
/// A component strictly greater than its threshold becomes white, anything
/// else black. Green runs hotter than red and blue on typical sensors, hence
/// the higher cut-off.
pub mod thresholds {
    /// Red channel threshold
    pub const RED: u8 = 160;
    /// Green channel threshold
    pub const GREEN: u8 = 175;
    /// Blue channel threshold
    pub const BLUE: u8 = 160;
}

/// Region of interest geometry
pub mod roi {
    /// The ROI edge is `min(width, height) - min(width, height) / SHRINK_DIVISOR`
    pub const SHRINK_DIVISOR: u32 = 4;
}

/// Decoder throttling after a failed pass
pub mod throttle {
    use super::Duration;

    /// Cooldown in milliseconds after a decoder failure
    pub const WINDOW_MS: u64 = 1000;

    /// Cooldown as a Duration
    pub const WINDOW: Duration = Duration::from_millis(WINDOW_MS);
}

/// Decoder adapter settings
pub mod decoder {
    /// Maximum processed dimension; 0 disables downscaling
    pub const MAX_DIMENSION: u32 = 0;
}

/// Pure white in RGB
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Pure black in RGB
pub const BLACK: [u8; 3] = [0, 0, 0];

/// Image extensions accepted by the file frame source
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "tiff", "tif"];

/// Check whether a lowercase extension names a loadable image
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}
