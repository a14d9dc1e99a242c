// SPDX-License-Identifier: GPL-3.0-only

//! QR code decoding task
//!
//! Implements the decoder seam with the rqrr crate. Channel images are
//! converted to grayscale, turned upright according to their rotation
//! metadata and optionally downscaled before grid detection.

use crate::backends::camera::SensorRotation;
use crate::config::ScannerConfig;
use crate::errors::DecodeError;
use crate::frame_processor::decoder::{BarcodeDecoder, DecodeResult};
use crate::frame_processor::types::{DecodedCandidate, MonochromeImage, SymbolFormat};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::GrayImage;
use image::imageops::{self, FilterType};
use tracing::{debug, trace, warn};

/// QR code decoder
///
/// Configured once with the symbol formats the caller wants; rqrr only reads
/// QR codes, so other formats are accepted but ignored.
#[derive(Debug, Clone)]
pub struct QrDecoder {
    /// Maximum dimension for processing (0 disables downscaling)
    max_dimension: u32,
}

impl QrDecoder {
    /// Create a decoder for the requested formats
    pub fn new(formats: &[SymbolFormat]) -> Result<Self, DecodeError> {
        if !formats.contains(&SymbolFormat::QrCode) {
            return Err(DecodeError::UnsupportedFormat(format!(
                "QR decoder cannot read any of {:?}",
                formats
            )));
        }

        for format in formats.iter().filter(|f| **f != SymbolFormat::QrCode) {
            warn!(
                format = format.display_name(),
                "Format not supported by QR decoder, ignoring"
            );
        }

        Ok(Self { max_dimension: 0 })
    }

    /// Create a decoder from scanner settings
    pub fn from_config(config: &ScannerConfig) -> Result<Self, DecodeError> {
        Ok(Self::new(&config.formats)?.with_max_dimension(config.max_dimension))
    }

    /// Downscale images larger than `max_dimension` before detection
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

impl BarcodeDecoder for QrDecoder {
    fn decode(&self, image: MonochromeImage) -> BoxFuture<'static, DecodeResult> {
        let max_dim = self.max_dimension;

        // Run detection in a blocking task to avoid blocking the async runtime
        async move {
            tokio::task::spawn_blocking(move || decode_sync(&image, max_dim))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "QR decoding task panicked");
                    Err(DecodeError::TaskFailed(e.to_string()))
                })
        }
        .boxed()
    }
}

/// Synchronous QR decoding (runs in blocking task)
fn decode_sync(image: &MonochromeImage, max_dimension: u32) -> DecodeResult {
    let start = std::time::Instant::now();

    let gray = prepare_gray(image, max_dimension);
    let (width, height) = gray.dimensions();
    trace!(
        channel = %image.channel,
        width,
        height,
        rotation = %image.rotation,
        prepare_ms = start.elapsed().as_millis(),
        "Prepared grayscale image"
    );

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();

    let mut candidates = Vec::with_capacity(grids.len());
    for grid in &grids {
        match grid.decode() {
            Ok((meta, content)) => {
                debug!(
                    channel = %image.channel,
                    ecc_level = meta.ecc_level,
                    len = content.len(),
                    "Decoded QR grid"
                );
                candidates.push(DecodedCandidate {
                    raw_value: Some(content),
                    format: SymbolFormat::QrCode,
                });
            }
            Err(e) => debug!(channel = %image.channel, error = %e, "Failed to decode QR grid"),
        }
    }

    trace!(
        channel = %image.channel,
        grids = grids.len(),
        decoded = candidates.len(),
        total_ms = start.elapsed().as_millis(),
        "QR decoding complete"
    );

    // An unreadable grid is a miss, not a decoder fault
    Ok(candidates)
}

/// Grayscale, upright and size-capped copy of a channel image
fn prepare_gray(image: &MonochromeImage, max_dimension: u32) -> GrayImage {
    let gray = imageops::grayscale(&image.pixels);
    let gray = match image.rotation {
        SensorRotation::None => gray,
        SensorRotation::Rotate90 => imageops::rotate90(&gray),
        SensorRotation::Rotate180 => imageops::rotate180(&gray),
        SensorRotation::Rotate270 => imageops::rotate270(&gray),
    };

    let (width, height) = gray.dimensions();
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return gray;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
}
