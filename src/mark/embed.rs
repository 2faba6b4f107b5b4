// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Watermark embedding pipeline.
//!
//! Serializes the payload, expands it with interleaved repetition, derives
//! the position sequence from the image dimensions, and nudges the selected
//! channel up (bit 1) or down (bit 0) by `strength x 255` at each position.
//! The input image is never mutated; the watermarked copy is a fresh
//! allocation, so concurrent encodes over shared inputs need no locking.

use crate::mark::capacity;
use crate::mark::config::EncodingConfig;
use crate::mark::error::EncodeError;
use crate::mark::frame;
use crate::mark::payload::WatermarkPayload;
use crate::mark::positions;
use crate::mark::repetition;
use crate::raster::RasterImage;

/// Embed `payload` into `image`, returning the watermarked copy.
///
/// # Errors
/// - [`EncodeError::ConfigInvalid`] if `config` violates its constraints or
///   names a channel the image does not have.
/// - [`EncodeError::ImageTooSmall`] below the 64x64 minimum.
/// - [`EncodeError::ImageTooLarge`] above 8192px per axis or 16MP total.
/// - [`EncodeError::PayloadTooLarge`] if the identity fields cannot be
///   represented, or the repetition-expanded frame exceeds the interior
///   capacity for this image and margin.
pub fn encode(
    image: &RasterImage,
    payload: &WatermarkPayload,
    config: &EncodingConfig,
) -> Result<RasterImage, EncodeError> {
    config.validate(image.channels())?;
    crate::mark::validate_encode_dimensions(image.width(), image.height())?;

    let frame_bytes = frame::serialize(payload)?;
    let bits = frame::bytes_to_bits(&frame_bytes);
    let expanded = repetition::expand(&bits, config.repetition_factor);

    let available =
        capacity::embeddable_positions(image.width(), image.height(), config.margin_fraction);
    if expanded.len() > available {
        return Err(EncodeError::PayloadTooLarge);
    }

    let positions = positions::generate(
        image.width(),
        image.height(),
        config.margin_fraction,
        expanded.len(),
    )
    .ok_or(EncodeError::PayloadTooLarge)?;

    let amplitude = (config.strength * 255.0).round() as i16;
    let channel = config.channel.index();

    let mut marked = image.clone();
    for (pos, &bit) in positions.iter().zip(expanded.iter()) {
        let old = i16::from(marked.get(pos.x, pos.y, channel));
        let nudged = if bit == 1 { old + amplitude } else { old - amplitude };
        marked.set(pos.x, pos.y, channel, nudged.clamp(0, 255) as u8);
    }

    Ok(marked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::config::Channel;
    use crate::mark::error::ConfigError;

    fn payload() -> WatermarkPayload {
        WatermarkPayload::new("uid_42", 1_700_000_000_000, "ss_0001")
    }

    #[test]
    fn input_image_is_untouched() {
        let image = RasterImage::filled(128, 128, 3, 128).unwrap();
        let before = image.clone();
        let marked = encode(&image, &payload(), &EncodingConfig::default()).unwrap();
        assert_eq!(image, before);
        assert_ne!(marked, image);
    }

    #[test]
    fn only_configured_channel_changes() {
        let image = RasterImage::filled(128, 128, 3, 128).unwrap();
        let marked = encode(&image, &payload(), &EncodingConfig::default()).unwrap();
        for y in 0..128 {
            for x in 0..128 {
                assert_eq!(marked.get(x, y, 0), 128, "red touched at {x},{y}");
                assert_eq!(marked.get(x, y, 2), 128, "blue touched at {x},{y}");
            }
        }
    }

    #[test]
    fn modulation_amplitude_is_bounded() {
        let image = RasterImage::filled(256, 256, 3, 128).unwrap();
        let config = EncodingConfig::default();
        let marked = encode(&image, &payload(), &config).unwrap();
        let amplitude = (config.strength * 255.0).round() as i16;
        let mut touched = 0usize;
        for y in 0..256 {
            for x in 0..256 {
                let delta = (i16::from(marked.get(x, y, 1)) - 128).abs();
                assert!(delta == 0 || delta == amplitude, "delta {delta} at {x},{y}");
                if delta != 0 {
                    touched += 1;
                }
            }
        }
        assert_eq!(touched, capacity::required_positions(config.repetition_factor));
    }

    #[test]
    fn margin_band_is_untouched() {
        let image = RasterImage::filled(256, 256, 3, 128).unwrap();
        let marked = encode(&image, &payload(), &EncodingConfig::default()).unwrap();
        // floor(256*0.10)=25 pixels per edge stay clean.
        for y in 0..256u32 {
            for x in 0..256u32 {
                if x < 25 || x >= 231 || y < 25 || y >= 231 {
                    assert_eq!(marked.get(x, y, 1), 128, "margin touched at {x},{y}");
                }
            }
        }
    }

    #[test]
    fn clamping_at_range_edges() {
        let white = RasterImage::filled(128, 128, 3, 255).unwrap();
        let marked = encode(&white, &payload(), &EncodingConfig::default()).unwrap();
        assert!(marked.data().iter().all(|&v| v >= 255 - 38));

        let black = RasterImage::filled(128, 128, 3, 0).unwrap();
        let marked = encode(&black, &payload(), &EncodingConfig::default()).unwrap();
        assert!(marked.data().iter().all(|&v| v <= 38));
    }

    #[test]
    fn too_small_image_rejected() {
        let image = RasterImage::filled(63, 64, 3, 128).unwrap();
        assert!(matches!(
            encode(&image, &payload(), &EncodingConfig::default()),
            Err(EncodeError::ImageTooSmall)
        ));
    }

    #[test]
    fn minimum_image_needs_reduced_repetition() {
        let image = RasterImage::filled(64, 64, 3, 128).unwrap();
        // Default r=5 needs 3000 positions; the 52x52 interior has 2704.
        assert!(matches!(
            encode(&image, &payload(), &EncodingConfig::default()),
            Err(EncodeError::PayloadTooLarge)
        ));
        let config = EncodingConfig {
            repetition_factor: 3,
            ..EncodingConfig::default()
        };
        assert!(encode(&image, &payload(), &config).is_ok());
    }

    #[test]
    fn invalid_config_rejected() {
        let image = RasterImage::filled(128, 128, 3, 128).unwrap();
        let config = EncodingConfig {
            repetition_factor: 4,
            ..EncodingConfig::default()
        };
        assert!(matches!(
            encode(&image, &payload(), &config),
            Err(EncodeError::ConfigInvalid(ConfigError::RepetitionFactor(4)))
        ));
    }

    #[test]
    fn missing_channel_rejected() {
        let gray = RasterImage::filled(128, 128, 1, 128).unwrap();
        assert!(matches!(
            encode(&gray, &payload(), &EncodingConfig::default()),
            Err(EncodeError::ConfigInvalid(ConfigError::ChannelUnavailable { .. }))
        ));
        let config = EncodingConfig {
            channel: Channel::Red,
            ..EncodingConfig::default()
        };
        assert!(encode(&gray, &payload(), &config).is_ok());
    }
}
