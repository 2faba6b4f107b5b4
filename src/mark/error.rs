// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Error types for the watermarking pipeline.
//!
//! Encode errors are hard failures: the caller must not serve an image whose
//! watermark embedding failed. Decode errors are recoverable forensic
//! outcomes — "no watermark detected" is a result, not a crash.

use core::fmt;

use crate::mark::config::Channel;
use crate::mark::payload::PartialPayload;

/// A configuration constraint violation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// `strength` outside (0.0, 1.0].
    Strength(f64),
    /// `repetition_factor` not an odd integer in 3..=255.
    RepetitionFactor(usize),
    /// `margin_fraction` outside [0.0, 0.4].
    MarginFraction(f64),
    /// The configured channel does not exist in the image.
    ChannelUnavailable {
        /// The channel the configuration asked for.
        channel: Channel,
        /// How many channels the image actually has.
        available: u8,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strength(s) => write!(f, "strength {s} outside (0.0, 1.0]"),
            Self::RepetitionFactor(r) => {
                write!(f, "repetition factor {r} must be an odd integer in 3..=255")
            }
            Self::MarginFraction(m) => write!(f, "margin fraction {m} outside [0.0, 0.4]"),
            Self::ChannelUnavailable { channel, available } => {
                write!(f, "channel {channel:?} not present in a {available}-channel image")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from watermark embedding. All fatal to the caller.
#[derive(Debug)]
pub enum EncodeError {
    /// Image below the 64x64 minimum; too little capacity for an invisible payload.
    ImageTooSmall,
    /// Image exceeds the maximum dimensions (8192px per axis / 16MP).
    ImageTooLarge,
    /// The payload cannot be represented in the fixed frame layout, or the
    /// repetition-expanded frame exceeds the image's margin-excluded capacity.
    PayloadTooLarge,
    /// Caller-supplied configuration violates its constraints.
    ConfigInvalid(ConfigError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageTooSmall => write!(f, "image too small for embedding"),
            Self::ImageTooLarge => write!(f, "image too large (max 8192px / 16MP)"),
            Self::PayloadTooLarge => write!(f, "payload too large for this image"),
            Self::ConfigInvalid(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigInvalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EncodeError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigInvalid(e)
    }
}

/// Errors from watermark extraction. All recoverable at the call site.
#[derive(Debug)]
pub enum DecodeError {
    /// No coherent watermark signal: magic bytes absent or the sampled
    /// signal is too degraded to vote on.
    NoWatermarkFound,
    /// Frame structure plausible but the checksum failed and no field could
    /// be localized as intact.
    ChecksumMismatch,
    /// Checksum failed, but the fields before the first corrupted bit were
    /// recovered as forensic leads. Confidence is capped low.
    PartialExtraction {
        /// Fields recovered before the corruption point.
        recovered: PartialPayload,
        /// Extraction confidence, capped by the checksum failure.
        confidence: f64,
    },
    /// Magic and checksum valid, but the frame version byte is unknown to
    /// this build. Distinguishes "newer watermark" from "no watermark".
    VersionUnsupported(u8),
    /// Caller-supplied configuration violates its constraints.
    ConfigInvalid(ConfigError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWatermarkFound => write!(f, "no watermark detected"),
            Self::ChecksumMismatch => write!(f, "watermark frame checksum mismatch"),
            Self::PartialExtraction { recovered, confidence } => write!(
                f,
                "partial extraction (confidence {confidence:.2}): {recovered}"
            ),
            Self::VersionUnsupported(v) => write!(f, "unsupported watermark version {v}"),
            Self::ConfigInvalid(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigInvalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for DecodeError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigInvalid(e)
    }
}
