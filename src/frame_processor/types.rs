// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing
//!
//! These types flow between the channel separator, the decoder collaborator
//! and the pass controller, and out to callers as scan events.

use crate::backends::camera::SensorRotation;
use crate::errors::AppError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One of the three color channels carrying a barcode
///
/// The discriminants are load-bearing: they fix slot order in the decode
/// session and the interleaving order of the merged payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Channel {
    /// All channels in slot order
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Slot index of this channel
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Channel for a slot index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get display name for the channel
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }

    /// Pick this channel's component out of an `[r, g, b]` triple
    #[inline]
    pub fn component(&self, rgb: [u8; 3]) -> u8 {
        rgb[self.index()]
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Barcode symbologies a decoder can be asked to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolFormat {
    QrCode,
    MicroQr,
    DataMatrix,
    Aztec,
}

impl SymbolFormat {
    /// Get display name for the format
    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolFormat::QrCode => "QR Code",
            SymbolFormat::MicroQr => "Micro QR",
            SymbolFormat::DataMatrix => "Data Matrix",
            SymbolFormat::Aztec => "Aztec",
        }
    }
}

/// One channel's thresholded image, ready for the decoder
///
/// Has the dimensions of the whole source frame. Only the region of
/// interest is binarized; pixels outside it keep the source color.
#[derive(Debug, Clone)]
pub struct MonochromeImage {
    /// Channel this image was thresholded for
    pub channel: Channel,
    /// Pixel data
    pub pixels: RgbImage,
    /// Rotation copied from the source frame
    pub rotation: SensorRotation,
}

impl MonochromeImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// A symbol found by the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCandidate {
    /// Raw text payload, if the symbol carried text
    pub raw_value: Option<String>,
    /// Symbology the candidate was decoded as
    pub format: SymbolFormat,
}

impl DecodedCandidate {
    /// Create a QR candidate carrying text
    pub fn qr(text: impl Into<String>) -> Self {
        Self {
            raw_value: Some(text.into()),
            format: SymbolFormat::QrCode,
        }
    }
}

/// Notifications emitted by the pass controller
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// All three channels decoded; carries the merged payload
    Decoded(String),
    /// One channel's decode failed, or the filled session could not be merged
    Failed {
        channel: Option<Channel>,
        error: AppError,
    },
    /// A pass finished and its frame was released
    PassCompleted { had_failure: bool },
}

/// Result of awaiting a whole pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Skipped because a recent failure is still cooling down
    Throttled,
    /// The pass ran to completion
    Completed {
        /// Merged payload, if this pass filled the last slot
        output: Option<String>,
        /// Whether any channel failed during this pass
        had_failure: bool,
    },
}

impl PassOutcome {
    /// Merged payload produced by this pass, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            PassOutcome::Completed { output, .. } => output.as_deref(),
            PassOutcome::Throttled => None,
        }
    }
}
