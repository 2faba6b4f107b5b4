// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Forensic watermark encoding and decoding pipelines.
//!
//! Four components composed as a stateless pipeline:
//!
//! - **frame** (+ payload): fixed-layout serialization with magic, version
//!   and checksum.
//! - **positions**: deterministic, collision-free position derivation from
//!   image dimensions alone.
//! - **embed**: spread-spectrum intensity modulation into a fresh image.
//! - **extract**: blind sampling, majority voting and confidence-scored
//!   payload reconstruction.
//!
//! Every call operates on its own buffers; there is no shared mutable state
//! and no I/O, so encode/decode calls parallelize freely at the caller.

pub mod capacity;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod frame;
pub mod payload;
pub mod positions;
pub mod repetition;

use error::EncodeError;

/// Minimum pixel dimension (width or height) for encode.
/// Below this there is not enough interior capacity for an invisible payload.
pub const MIN_DIMENSION: u32 = 64;

/// Maximum pixel dimension (width or height) for encode.
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum total pixel count for encode (width x height). Also bounds the
/// interior position count to `u32` range for the portable shuffle.
pub const MAX_PIXELS: u32 = 16_000_000;

/// Validate image dimensions for encoding.
///
/// # Errors
/// - [`EncodeError::ImageTooSmall`] if either dimension < 64px.
/// - [`EncodeError::ImageTooLarge`] if either dimension > 8192px or total
///   pixels > 16M.
pub fn validate_encode_dimensions(width: u32, height: u32) -> Result<(), EncodeError> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(EncodeError::ImageTooSmall);
    }
    if width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || width.checked_mul(height).map_or(true, |p| p > MAX_PIXELS)
    {
        return Err(EncodeError::ImageTooLarge);
    }
    Ok(())
}

pub use config::{Channel, DecodingConfig, EncodingConfig};
pub use embed::encode;
pub use error::{ConfigError, DecodeError};
pub use extract::{decode, DecodeQuality};
pub use payload::{PartialPayload, WatermarkPayload};

#[cfg(test)]
mod dimension_tests {
    use super::*;

    #[test]
    fn valid_dimensions() {
        assert!(validate_encode_dimensions(64, 64).is_ok());
        assert!(validate_encode_dimensions(800, 600).is_ok());
        assert!(validate_encode_dimensions(3000, 4000).is_ok());
    }

    #[test]
    fn boundary_min() {
        assert!(validate_encode_dimensions(64, 64).is_ok());
        assert!(validate_encode_dimensions(63, 64).is_err());
        assert!(validate_encode_dimensions(64, 63).is_err());
    }

    #[test]
    fn boundary_max_dimension() {
        assert!(validate_encode_dimensions(8192, 1000).is_ok());
        assert!(validate_encode_dimensions(1000, 8192).is_ok());
        assert!(validate_encode_dimensions(8193, 1000).is_err());
        assert!(validate_encode_dimensions(1000, 8193).is_err());
    }

    #[test]
    fn too_many_pixels() {
        // 5000 * 3201 = 16_005_000 > 16M
        assert!(validate_encode_dimensions(5000, 3201).is_err());
        // 4000 * 4000 = 16M exactly — OK
        assert!(validate_encode_dimensions(4000, 4000).is_ok());
    }

    #[test]
    fn error_variants() {
        match validate_encode_dimensions(32, 300) {
            Err(EncodeError::ImageTooSmall) => {}
            other => panic!("expected ImageTooSmall, got {other:?}"),
        }
        match validate_encode_dimensions(9000, 1000) {
            Err(EncodeError::ImageTooLarge) => {}
            other => panic!("expected ImageTooLarge, got {other:?}"),
        }
    }
}
