// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Embedding and extraction configuration.
//!
//! Both configs are plain immutable value structs. Every pipeline entry
//! point calls `validate()` before touching pixel data, so an invalid
//! configuration always surfaces as `ConfigInvalid` rather than garbage
//! output.

use crate::mark::error::ConfigError;

/// Default modulation amplitude as a fraction of the channel range.
pub const DEFAULT_STRENGTH: f64 = 0.15;
/// Default number of embedded copies per payload bit.
pub const DEFAULT_REPETITION_FACTOR: usize = 5;
/// Default fraction of width/height excluded from embedding at each edge.
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.10;
/// Largest supported repetition factor (fits in a u8 for quality reporting).
pub const MAX_REPETITION_FACTOR: usize = 255;

/// The color channel carrying the watermark signal.
///
/// Green is the default: it contributes the most to perceived luminance, so
/// chroma-subsampling recompression preserves it best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Index of this channel in an interleaved RGB(A) buffer.
    pub fn index(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::Green
    }
}

/// Configuration for watermark embedding.
#[derive(Debug, Clone)]
pub struct EncodingConfig {
    /// Modulation amplitude as a fraction of the channel range, (0.0, 1.0].
    pub strength: f64,
    /// Embedded copies per payload bit; odd integer in 3..=255.
    pub repetition_factor: usize,
    /// Fraction of width/height excluded at each edge, [0.0, 0.4].
    pub margin_fraction: f64,
    /// Channel carrying the signal.
    pub channel: Channel,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            repetition_factor: DEFAULT_REPETITION_FACTOR,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            channel: Channel::default(),
        }
    }
}

impl EncodingConfig {
    /// Check every constraint, including channel availability for a given
    /// image channel count.
    pub fn validate(&self, image_channels: u8) -> Result<(), ConfigError> {
        if !(self.strength > 0.0 && self.strength <= 1.0) {
            return Err(ConfigError::Strength(self.strength));
        }
        validate_repetition_factor(self.repetition_factor)?;
        validate_margin_fraction(self.margin_fraction)?;
        validate_channel(self.channel, image_channels)
    }
}

/// Configuration for watermark extraction.
///
/// Must mirror the embedding parameters (except `strength`, which the
/// extractor does not need — demodulation is sign-based). The two crop
/// fields let a forensic caller reconcile a cropped image against the
/// original geometry; the codec itself performs a single deterministic pass
/// and leaves sweeping to the caller.
#[derive(Debug, Clone)]
pub struct DecodingConfig {
    /// Embedded copies per payload bit; odd integer in 3..=255.
    pub repetition_factor: usize,
    /// Fraction of width/height excluded at each edge, [0.0, 0.4].
    pub margin_fraction: f64,
    /// Channel carrying the signal.
    pub channel: Channel,
    /// Dimensions to derive positions from. `None` uses the input image's
    /// own dimensions; a forensic caller that knows the original asset
    /// passes its dimensions here so a cropped leak still lines up.
    pub assumed_dimensions: Option<(u32, u32)>,
    /// Columns/rows removed from the left/top edge of the original image.
    /// Positions map into the damaged image shifted by this offset.
    pub crop_offset: (u32, u32),
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            repetition_factor: DEFAULT_REPETITION_FACTOR,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            channel: Channel::default(),
            assumed_dimensions: None,
            crop_offset: (0, 0),
        }
    }
}

impl DecodingConfig {
    /// Check every constraint, including channel availability for a given
    /// image channel count.
    pub fn validate(&self, image_channels: u8) -> Result<(), ConfigError> {
        validate_repetition_factor(self.repetition_factor)?;
        validate_margin_fraction(self.margin_fraction)?;
        validate_channel(self.channel, image_channels)
    }

    /// Derive the decoding parameters matching an encoding configuration.
    pub fn matching(encoding: &EncodingConfig) -> Self {
        Self {
            repetition_factor: encoding.repetition_factor,
            margin_fraction: encoding.margin_fraction,
            channel: encoding.channel,
            assumed_dimensions: None,
            crop_offset: (0, 0),
        }
    }
}

fn validate_repetition_factor(factor: usize) -> Result<(), ConfigError> {
    if factor < 3 || factor > MAX_REPETITION_FACTOR || factor % 2 == 0 {
        return Err(ConfigError::RepetitionFactor(factor));
    }
    Ok(())
}

fn validate_margin_fraction(margin: f64) -> Result<(), ConfigError> {
    if !(0.0..=0.4).contains(&margin) {
        return Err(ConfigError::MarginFraction(margin));
    }
    Ok(())
}

fn validate_channel(channel: Channel, image_channels: u8) -> Result<(), ConfigError> {
    if channel.index() >= image_channels {
        return Err(ConfigError::ChannelUnavailable {
            channel,
            available: image_channels,
        });
    }
    Ok(())
}
