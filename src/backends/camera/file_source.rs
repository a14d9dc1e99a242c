// SPDX-License-Identifier: GPL-3.0-only

//! Still-image frame source
//!
//! Loads image files as frames so the frame processor can be driven without
//! a camera (CLI scans, tests, replaying captures).

use super::types::{CameraFrame, PixelFormat};
use crate::constants::is_image_extension;
use crate::errors::FrameError;
use std::path::Path;
use tracing::{debug, info};

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> Result<CameraFrame, FrameError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !is_image_extension(&extension) {
        return Err(FrameError::LoadFailed(format!(
            "Unsupported file format: '{}'",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        FrameError::LoadFailed(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    debug!(width, height, "Image loaded successfully");

    CameraFrame::new(width, height, width * 4, PixelFormat::RGBA, rgba.into_raw())
}
