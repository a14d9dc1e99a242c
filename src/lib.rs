// SPDX-License-Identifier: GPL-3.0-only

//! trichrome - decode payloads split across the color channels of an image
//!
//! A payload is cut into three equal-length fragments, each encoded as its
//! own barcode and printed into the red, green and blue channels of a single
//! image. This crate separates the channels, decodes them over as many
//! frames as it takes and interleaves the fragments back together.
//!
//! # Architecture
//!
//! - [`backends`]: frame model and frame sources
//! - [`frame_processor`]: channel separation, decode session, pass control
//! - [`config`]: scanner settings
//! - [`errors`]: error types
//!
//! # Example
//!
//! ```no_run
//! use trichrome::backends::camera::{FrameLease, load_image_as_frame};
//! use trichrome::frame_processor::{PassController, QrDecoder};
//! use trichrome::ScannerConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScannerConfig::default();
//! let decoder = QrDecoder::from_config(&config)?;
//! let (controller, _events) = PassController::new(decoder, &config);
//!
//! let frame = load_image_as_frame(std::path::Path::new("capture.png"))?;
//! let outcome = controller.run_pass(FrameLease::detached(frame)).await;
//! if let Some(payload) = outcome.output() {
//!     println!("{payload}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;

// Re-export commonly used types
pub use config::{ChannelThresholds, ScannerConfig};
pub use errors::{AppError, AppResult};
pub use frame_processor::{Channel, PassController, PassOutcome, ScanEvent};
