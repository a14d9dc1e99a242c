// SPDX-License-Identifier: GPL-3.0-only

//! Error types for trichrome
//!
//! Every error here is local to one channel of one pass or to one frame.
//! Nothing in the core is fatal; callers log and keep scanning.

use crate::frame_processor::types::Channel;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Frame construction or loading errors
    Frame(FrameError),
    /// Barcode decoder errors
    Decode(DecodeError),
    /// Decode session validation errors
    Session(SessionError),
    /// Configuration errors
    Config(String),
    /// Filesystem errors
    Io(String),
}

/// Errors raised while building or loading a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Pixel buffer shorter than `stride * height`
    BufferTooShort { expected: usize, actual: usize },
    /// Stride smaller than one row of pixels
    InvalidStride { stride: u32, min: u32 },
    /// Image file could not be loaded
    LoadFailed(String),
}

/// Errors reported by a barcode decoder collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The decoding engine rejected a symbol as malformed
    Corrupt(String),
    /// Decoder cannot be configured for the requested formats
    UnsupportedFormat(String),
    /// The background decoding task panicked or was cancelled
    TaskFailed(String),
    /// Anything else a decoder wants to report
    Other(String),
}

/// Errors raised by the decode session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Reconstruction requested before all three channels were filled
    Incomplete { missing: Vec<Channel> },
    /// Channel payloads do not share a length and cannot be interleaved
    LengthMismatch { red: usize, green: usize, blue: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Frame(e) => write!(f, "Frame error: {}", e),
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::BufferTooShort { expected, actual } => write!(
                f,
                "Pixel buffer too short: expected {} bytes, got {}",
                expected, actual
            ),
            FrameError::InvalidStride { stride, min } => {
                write!(f, "Invalid stride {} (minimum {})", stride, min)
            }
            FrameError::LoadFailed(msg) => write!(f, "Failed to load frame: {}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Corrupt(msg) => write!(f, "Symbol could not be decoded: {}", msg),
            DecodeError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            DecodeError::TaskFailed(msg) => write!(f, "Decoding task failed: {}", msg),
            DecodeError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Incomplete { missing } => {
                let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
                write!(f, "Session incomplete, missing: {}", names.join(", "))
            }
            SessionError::LengthMismatch { red, green, blue } => write!(
                f,
                "Channel payload lengths differ (red {}, green {}, blue {})",
                red, green, blue
            ),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for SessionError {}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Frame(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message() {
        let err = SessionError::LengthMismatch {
            red: 3,
            green: 2,
            blue: 3,
        };
        assert_eq!(
            err.to_string(),
            "Channel payload lengths differ (red 3, green 2, blue 3)"
        );
    }

    #[test]
    fn test_incomplete_lists_channels() {
        let err = SessionError::Incomplete {
            missing: vec![Channel::Green, Channel::Blue],
        };
        assert_eq!(err.to_string(), "Session incomplete, missing: green, blue");
    }

    #[test]
    fn test_app_error_wraps_decode_error() {
        let err: AppError = DecodeError::Corrupt("ecc failure".into()).into();
        assert_eq!(
            err.to_string(),
            "Decode error: Symbol could not be decoded: ecc failure"
        );
    }
}
