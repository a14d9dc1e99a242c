// SPDX-License-Identifier: GPL-3.0-only

//! Decoder implementations

pub mod qr_decoder;

pub use qr_decoder::QrDecoder;
