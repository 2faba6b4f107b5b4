// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! # tracemark-core
//!
//! Pure-Rust forensic watermarking engine: invisibly embeds a short
//! identifying payload (viewer, timestamp, asset id) into a raster image so
//! a later leak can be traced back to the view that produced it.
//!
//! The codec works in the pixel (spatial) domain:
//!
//! - **Spread-spectrum embedding**: the payload is scattered across
//!   thousands of pseudo-random pixel positions at low per-pixel amplitude.
//! - **Blind decoding**: positions derive deterministically from the image
//!   dimensions and a fixed constant — never from the payload — so the
//!   decoder needs nothing but the image.
//! - **Repetition coding**: every bit is embedded several times,
//!   interleaved, and majority-voted back with a confidence score, so the
//!   payload survives cropping and mild recompression.
//!
//! Encode and decode are synchronous, stateless, CPU-bound transforms over
//! owned buffers. Container formats, authentication, audit logging and
//! retention policy are caller concerns.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use tracemark_core::{encode, decode, EncodingConfig, DecodingConfig, WatermarkPayload};
//!
//! let payload = WatermarkPayload::new("uid_1234", 1_700_000_000_000, "ss_0001");
//! let marked = encode(&image, &payload, &EncodingConfig::default()).unwrap();
//! let (recovered, quality) = decode(&marked, &DecodingConfig::default()).unwrap();
//! assert_eq!(recovered.viewer_id, "uid_1234");
//! assert!(quality.confidence >= 0.95);
//! ```

pub mod mark;
pub mod raster;

pub use mark::error::EncodeError;
pub use mark::{
    decode, encode, validate_encode_dimensions, Channel, ConfigError, DecodeError, DecodeQuality,
    DecodingConfig, EncodingConfig, PartialPayload, WatermarkPayload,
};
pub use mark::{MAX_DIMENSION, MAX_PIXELS, MIN_DIMENSION};
pub use raster::{RasterError, RasterImage};
