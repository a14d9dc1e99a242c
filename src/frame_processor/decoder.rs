// SPDX-License-Identifier: GPL-3.0-only

//! Barcode decoder seam
//!
//! The pass controller hands each channel image to a [`BarcodeDecoder`] and
//! reacts to whatever comes back. Symbol decoding itself lives behind this
//! trait; see [`QrDecoder`](super::tasks::QrDecoder) for the shipped
//! implementation.

use crate::errors::DecodeError;
use crate::frame_processor::types::{DecodedCandidate, MonochromeImage};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Result of one decode attempt: zero or more candidates, or an error
pub type DecodeResult = Result<Vec<DecodedCandidate>, DecodeError>;

/// Asynchronous barcode decoder
///
/// Implementations must not block the calling task; CPU-heavy work belongs
/// on a blocking pool. Returning `Ok(vec![])` means "nothing found" and is
/// not a failure.
pub trait BarcodeDecoder: Send + Sync + 'static {
    fn decode(&self, image: MonochromeImage) -> BoxFuture<'static, DecodeResult>;
}

impl<D: BarcodeDecoder + ?Sized> BarcodeDecoder for Arc<D> {
    fn decode(&self, image: MonochromeImage) -> BoxFuture<'static, DecodeResult> {
        (**self).decode(image)
    }
}
