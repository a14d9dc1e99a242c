// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources and the frame model they produce

pub mod file_source;
pub mod types;

pub use file_source::load_image_as_frame;
pub use types::{CameraFrame, FrameLease, PixelFormat, SensorRotation};
