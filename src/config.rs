// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to override.

use crate::constants::{decoder, roi, thresholds, throttle};
use crate::errors::{AppError, AppResult};
use crate::frame_processor::types::{Channel, SymbolFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Per-channel binarization thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelThresholds {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Default for ChannelThresholds {
    fn default() -> Self {
        Self {
            red: thresholds::RED,
            green: thresholds::GREEN,
            blue: thresholds::BLUE,
        }
    }
}

impl ChannelThresholds {
    /// Threshold applied to the given channel
    pub fn for_channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Channel thresholds used by the separator
    pub thresholds: ChannelThresholds,
    /// Cooldown after a decoder failure, in milliseconds
    pub throttle_window_ms: u64,
    /// ROI edge is `min(w, h) - min(w, h) / roi_shrink_divisor`
    pub roi_shrink_divisor: u32,
    /// Symbologies the decoder is configured for
    pub formats: Vec<SymbolFormat>,
    /// Downscale images above this size before decoding (0 = never)
    pub max_dimension: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            thresholds: ChannelThresholds::default(),
            throttle_window_ms: throttle::WINDOW_MS,
            roi_shrink_divisor: roi::SHRINK_DIVISOR,
            formats: vec![SymbolFormat::QrCode],
            max_dimension: decoder::MAX_DIMENSION,
        }
    }
}

impl ScannerConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> AppResult<Self> {
        info!(path = %path.display(), "Loading scanner config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        debug!(?config, "Scanner config parsed");
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        // A divisor of 1 makes the ROI edge zero for every frame
        if self.roi_shrink_divisor < 2 {
            return Err(AppError::Config(format!(
                "roi_shrink_divisor must be at least 2, got {}",
                self.roi_shrink_divisor
            )));
        }
        if self.formats.is_empty() {
            return Err(AppError::Config(
                "at least one symbol format is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }
}
