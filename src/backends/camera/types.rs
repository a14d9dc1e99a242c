// SPDX-License-Identifier: GPL-3.0-only

//! Frame types shared between frame sources and the frame processor

use crate::errors::FrameError;
use image::RgbImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Sensor rotation in degrees (clockwise)
///
/// Carried from the frame source to the decoder untouched; the channel
/// separator never rotates pixels itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Rotation from a degree value such as a `--rotation` argument
    ///
    /// Normalised to 0-360; values that are not a multiple of 90 collapse
    /// to `None`.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Packed pixel layouts a frame may carry
///
/// Only packed RGB-family layouts are accepted. YUV and Bayer conversion is
/// the frame source's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    #[default]
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
}

impl PixelFormat {
    /// Bytes occupied by one pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::RGBA | Self::BGRA => 4,
            Self::RGB24 => 3,
        }
    }

    /// Split one packed pixel into `[r, g, b]`
    #[inline]
    pub fn rgb(&self, px: &[u8]) -> [u8; 3] {
        match self {
            Self::RGBA | Self::RGB24 => [px[0], px[1], px[2]],
            Self::BGRA => [px[2], px[1], px[0]],
        }
    }
}

/// A single color frame
///
/// Pixel data is reference counted so a pass can hold the frame across
/// await points without copying.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Packed pixel data, `stride * height` bytes at least
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Orientation metadata forwarded to the decoder
    pub rotation: SensorRotation,
}

impl CameraFrame {
    /// Build a frame, validating stride and buffer length
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<Self, FrameError> {
        let data = data.into();
        let min_stride = width * format.bytes_per_pixel() as u32;
        if stride < min_stride {
            return Err(FrameError::InvalidStride {
                stride,
                min: min_stride,
            });
        }

        let expected = stride as usize * height as usize;
        if data.len() < expected {
            return Err(FrameError::BufferTooShort {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
            format,
            stride,
            rotation: SensorRotation::None,
        })
    }

    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        Self::new(width, height, width * 4, PixelFormat::RGBA, data)
    }

    /// Attach rotation metadata
    pub fn with_rotation(mut self, rotation: SensorRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Color of the pixel at column `x`, row `y`
    ///
    /// Callers stay within `width`/`height`; the constructor guarantees the
    /// buffer covers that area.
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        self.format.rgb(&self.data[offset..offset + bpp])
    }

    /// Copy the frame into a packed RGB image, dropping stride padding and alpha
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(self.rgb_at(x, y))
        })
    }
}

type ReleaseHook = Box<dyn Fn(&CameraFrame) + Send + Sync>;

/// A frame on loan from its source
///
/// The source gets its frame back through the release hook exactly once,
/// however many tasks race to call [`FrameLease::release`]. Dropping an
/// unreleased lease releases it.
pub struct FrameLease {
    frame: Arc<CameraFrame>,
    released: AtomicBool,
    on_release: ReleaseHook,
}

impl FrameLease {
    /// Lease a frame, calling `on_release` when the core is done with it
    pub fn new(
        frame: impl Into<Arc<CameraFrame>>,
        on_release: impl Fn(&CameraFrame) + Send + Sync + 'static,
    ) -> Self {
        Self {
            frame: frame.into(),
            released: AtomicBool::new(false),
            on_release: Box::new(on_release),
        }
    }

    /// Lease a frame nobody needs back
    pub fn detached(frame: impl Into<Arc<CameraFrame>>) -> Self {
        Self::new(frame, |_| {})
    }

    /// The leased frame
    pub fn frame(&self) -> &Arc<CameraFrame> {
        &self.frame
    }

    /// Hand the frame back to its source
    ///
    /// Returns `true` only for the call that actually released it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        trace!(
            width = self.frame.width,
            height = self.frame.height,
            "Releasing frame"
        );
        (self.on_release)(&self.frame);
        true
    }

    /// Whether the frame has been handed back
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for FrameLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLease")
            .field("width", &self.frame.width)
            .field("height", &self.frame.height)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_rgb_at_respects_stride() {
        // 2x2 RGBA frame with 2 bytes of row padding
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // Red pixel
            0, 255, 0, 255, // Green pixel
            0, 0,           // stride padding
            0, 0, 255, 255, // Blue pixel
            255, 255, 255, 255, // White pixel
            0, 0,           // stride padding
        ];

        let frame = CameraFrame::new(2, 2, 10, PixelFormat::RGBA, data).unwrap();
        assert_eq!(frame.rgb_at(0, 0), [255, 0, 0]);
        assert_eq!(frame.rgb_at(1, 0), [0, 255, 0]);
        assert_eq!(frame.rgb_at(0, 1), [0, 0, 255]);
        assert_eq!(frame.rgb_at(1, 1), [255, 255, 255]);
    }

    #[test]
    fn test_bgra_is_swizzled() {
        let frame = CameraFrame::new(1, 1, 4, PixelFormat::BGRA, vec![10, 20, 30, 255]).unwrap();
        assert_eq!(frame.rgb_at(0, 0), [30, 20, 10]);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = CameraFrame::new(2, 2, 6, PixelFormat::RGB24, vec![0u8; 11]).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferTooShort {
                expected: 12,
                actual: 11
            }
        );
    }

    #[test]
    fn test_rejects_narrow_stride() {
        let err = CameraFrame::new(4, 1, 8, PixelFormat::RGBA, vec![0u8; 16]).unwrap_err();
        assert_eq!(err, FrameError::InvalidStride { stride: 8, min: 16 });
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(SensorRotation::from_degrees_int(-90), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees_int(450), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees_int(45), SensorRotation::None);
        assert_eq!(SensorRotation::from_degrees_int(270).degrees(), 270);
    }

    #[test]
    fn test_lease_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let frame = CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255]).unwrap();
        let lease = FrameLease::new(frame, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(lease.release());
        assert!(!lease.release());
        drop(lease);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_lease_is_released() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let frame = CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255]).unwrap();
        drop(FrameLease::new(frame, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
