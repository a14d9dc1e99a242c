// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for tri-channel barcode decoding
//!
//! A frame flows through the [`separator`] into three channel images, the
//! [`controller`] submits them to a [`decoder`] and folds the results into
//! the [`session`], which merges the payload once every channel is decoded.

pub mod controller;
pub mod decoder;
pub mod separator;
pub mod session;
pub mod tasks;
pub mod throttle;
pub mod types;

pub use controller::{PassController, PassHandle};
pub use decoder::{BarcodeDecoder, DecodeResult};
pub use separator::{ChannelSeparator, RegionOfInterest};
pub use session::{DecodeSession, Recorded};
pub use tasks::QrDecoder;
pub use throttle::Throttle;
pub use types::{
    Channel, DecodedCandidate, MonochromeImage, PassOutcome, ScanEvent, SymbolFormat,
};
