// SPDX-License-Identifier: GPL-3.0-only

//! Channel separation
//!
//! Splits one color frame into three per-channel images. Inside a centered
//! square region of interest every pixel is thresholded on a single color
//! component into pure black or white; everything outside the region keeps
//! its source color. The decoder is expected to ignore the margins.

use crate::backends::camera::CameraFrame;
use crate::config::{ChannelThresholds, ScannerConfig};
use crate::constants::{BLACK, WHITE, roi};
use crate::frame_processor::types::{Channel, MonochromeImage};
use image::{Rgb, RgbImage};
use std::ops::Range;
use tracing::trace;

/// Centered square region that gets binarized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Side length in pixels
    pub edge: u32,
}

impl RegionOfInterest {
    /// ROI for a frame using the default shrink divisor
    pub fn for_frame(width: u32, height: u32) -> Self {
        Self::with_divisor(width, height, roi::SHRINK_DIVISOR)
    }

    /// ROI whose edge is `min - min / divisor` of the shorter frame side
    pub fn with_divisor(width: u32, height: u32, divisor: u32) -> Self {
        let min_length = width.min(height);
        let edge = min_length - min_length / divisor.max(1);
        Self {
            x: (width - edge) / 2,
            y: (height - edge) / 2,
            edge,
        }
    }

    /// Degenerate ROI covering no pixels
    pub fn is_empty(&self) -> bool {
        self.edge == 0
    }

    pub fn columns(&self) -> Range<u32> {
        self.x..self.x + self.edge
    }

    pub fn rows(&self) -> Range<u32> {
        self.y..self.y + self.edge
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.columns().contains(&x) && self.rows().contains(&y)
    }
}

/// Threshold one color component: strictly above the threshold is white
#[inline]
pub fn binarize(component: u8, threshold: u8) -> [u8; 3] {
    if component > threshold { WHITE } else { BLACK }
}

/// Produces per-channel thresholded images from color frames
#[derive(Debug, Clone)]
pub struct ChannelSeparator {
    thresholds: ChannelThresholds,
    roi_divisor: u32,
}

impl Default for ChannelSeparator {
    fn default() -> Self {
        Self::new(ChannelThresholds::default(), roi::SHRINK_DIVISOR)
    }
}

impl ChannelSeparator {
    pub fn new(thresholds: ChannelThresholds, roi_divisor: u32) -> Self {
        Self {
            thresholds,
            roi_divisor: roi_divisor.max(1),
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.thresholds, config.roi_shrink_divisor)
    }

    /// ROI this separator uses for a frame of the given size
    pub fn region_for(&self, width: u32, height: u32) -> RegionOfInterest {
        RegionOfInterest::with_divisor(width, height, self.roi_divisor)
    }

    /// Split a frame into one image per channel
    ///
    /// `filled[i]` marks channels whose slot already holds a decoded payload;
    /// those yield `None` and cost nothing. A zero-area frame yields
    /// unmodified copies.
    pub fn separate(&self, frame: &CameraFrame, filled: [bool; 3]) -> [Option<MonochromeImage>; 3] {
        if filled.iter().all(|f| *f) {
            return [None, None, None];
        }

        let source = frame.to_rgb_image();
        let mut images: [Option<RgbImage>; 3] =
            std::array::from_fn(|i| (!filled[i]).then(|| source.clone()));

        let region = self.region_for(frame.width, frame.height);
        trace!(
            width = frame.width,
            height = frame.height,
            roi_x = region.x,
            roi_y = region.y,
            roi_edge = region.edge,
            "Separating channels"
        );

        for y in region.rows() {
            for x in region.columns() {
                let rgb = frame.rgb_at(x, y);
                for channel in Channel::ALL {
                    if let Some(image) = images[channel.index()].as_mut() {
                        let threshold = self.thresholds.for_channel(channel);
                        image.put_pixel(x, y, Rgb(binarize(channel.component(rgb), threshold)));
                    }
                }
            }
        }

        let [red, green, blue] = images;
        let wrap = |channel: Channel, pixels: Option<RgbImage>| {
            pixels.map(|pixels| MonochromeImage {
                channel,
                pixels,
                rotation: frame.rotation,
            })
        };

        [
            wrap(Channel::Red, red),
            wrap(Channel::Green, green),
            wrap(Channel::Blue, blue),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::SensorRotation;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> CameraFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        CameraFrame::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn test_roi_geometry() {
        // min 480, edge 480 - 120 = 360
        let roi = RegionOfInterest::for_frame(640, 480);
        assert_eq!(roi, RegionOfInterest { x: 140, y: 60, edge: 360 });
        assert!(roi.contains(140, 60));
        assert!(roi.contains(499, 419));
        assert!(!roi.contains(500, 419));
        assert!(!roi.contains(139, 100));
    }

    #[test]
    fn test_roi_degenerate() {
        assert!(RegionOfInterest::for_frame(0, 480).is_empty());
        assert!(RegionOfInterest::for_frame(640, 0).is_empty());
        assert!(!RegionOfInterest::for_frame(1, 1).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(binarize(161, 160), WHITE);
        assert_eq!(binarize(160, 160), BLACK);
        assert_eq!(binarize(176, 175), WHITE);
        assert_eq!(binarize(175, 175), BLACK);
    }

    #[test]
    fn test_red_threshold_boundary() {
        let separator = ChannelSeparator::default();

        let [red, _, _] = separator.separate(&solid_frame(8, 8, [161, 0, 0]), [false; 3]);
        assert_eq!(red.unwrap().pixels.get_pixel(4, 4).0, WHITE);

        let [red, _, _] = separator.separate(&solid_frame(8, 8, [160, 0, 0]), [false; 3]);
        assert_eq!(red.unwrap().pixels.get_pixel(4, 4).0, BLACK);
    }

    #[test]
    fn test_channels_use_own_thresholds() {
        // Green at 170 is below its 175 threshold, blue at 170 is above 160
        let separator = ChannelSeparator::default();
        let [red, green, blue] =
            separator.separate(&solid_frame(8, 8, [200, 170, 170]), [false; 3]);

        assert_eq!(red.unwrap().pixels.get_pixel(3, 3).0, WHITE);
        assert_eq!(green.unwrap().pixels.get_pixel(3, 3).0, BLACK);
        assert_eq!(blue.unwrap().pixels.get_pixel(3, 3).0, WHITE);
    }

    #[test]
    fn test_pixels_outside_roi_unchanged() {
        // 8x8: edge 6, offsets 1 -> ROI covers 1..7
        let separator = ChannelSeparator::default();
        let [red, green, blue] = separator.separate(&solid_frame(8, 8, [200, 100, 50]), [false; 3]);

        for image in [red.unwrap(), green.unwrap(), blue.unwrap()] {
            assert_eq!((image.width(), image.height()), (8, 8));
            assert_eq!(image.pixels.get_pixel(0, 0).0, [200, 100, 50]);
            assert_eq!(image.pixels.get_pixel(7, 7).0, [200, 100, 50]);
            assert_eq!(image.pixels.get_pixel(7, 3).0, [200, 100, 50]);
        }
    }

    #[test]
    fn test_filled_channels_skipped() {
        let separator = ChannelSeparator::default();
        let [red, green, blue] =
            separator.separate(&solid_frame(4, 4, [255, 255, 255]), [true, false, true]);

        assert!(red.is_none());
        assert!(blue.is_none());
        let green = green.unwrap();
        assert_eq!(green.channel, Channel::Green);

        let all_filled = separator.separate(&solid_frame(4, 4, [0, 0, 0]), [true; 3]);
        assert!(all_filled.iter().all(Option::is_none));
    }

    #[test]
    fn test_rotation_carried() {
        let separator = ChannelSeparator::default();
        let frame = solid_frame(4, 4, [0, 0, 0]).with_rotation(SensorRotation::Rotate90);
        let [red, _, _] = separator.separate(&frame, [false; 3]);
        assert_eq!(red.unwrap().rotation, SensorRotation::Rotate90);
    }

    #[test]
    fn test_zero_area_passes_through() {
        let separator = ChannelSeparator::default();
        let frame = CameraFrame::from_rgba(0, 4, Vec::new()).unwrap();
        let images = separator.separate(&frame, [false; 3]);
        for image in images {
            let image = image.unwrap();
            assert_eq!((image.width(), image.height()), (0, 4));
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let separator = ChannelSeparator::new(
            ChannelThresholds {
                red: 10,
                green: 10,
                blue: 10,
            },
            4,
        );
        let [red, _, _] = separator.separate(&solid_frame(4, 4, [11, 0, 0]), [false; 3]);
        assert_eq!(red.unwrap().pixels.get_pixel(2, 2).0, WHITE);
    }
}
