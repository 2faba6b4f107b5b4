// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Watermark extraction pipeline.
//!
//! Extraction is blind: the decoder re-derives the position sequence from
//! the image dimensions (or the caller-supplied original dimensions when the
//! leak was cropped), demodulates each sampled intensity against a local
//! baseline, majority-votes the repetition groups, and reconstructs the
//! payload frame with a confidence score.
//!
//! **Erasure recovery:** a repetition group with no readable samples (or a
//! tie) is an erasure. A handful of erased bits are recovered by exhaustive
//! assignment search validated against the frame magic and checksum — the
//! same decode-side search idea as a brute-force parameter sweep, bounded
//! to [`MAX_ERASURE_SEARCH`] bits so the search stays trivial.
//!
//! Extraction is a single deterministic pass. Re-running with different
//! assumed geometry is a caller policy, not a codec concern.

use std::collections::HashSet;

use crate::mark::config::DecodingConfig;
use crate::mark::error::DecodeError;
use crate::mark::frame::{self, FRAME_BITS, FRAME_LEN};
use crate::mark::payload::WatermarkPayload;
use crate::mark::positions::{self, PixelPos};
use crate::mark::repetition::{self, BitVote};
use crate::raster::RasterImage;

/// Maximum number of erased bits the checksum-guided search will recover.
/// 2^8 candidate assignments keep the search negligible while covering any
/// realistic crop damage; more erasures than this means there is no
/// coherent signal left.
pub const MAX_ERASURE_SEARCH: usize = 8;

/// Per-bit agreement below this marks the first corrupted bit when
/// localizing a partial extraction. A clean majority at the default factor
/// scores 1.0; a 3-of-5 flip scores 0.6.
const PARTIAL_AGREEMENT_MIN: f64 = 0.75;

/// Quality report accompanying every successful decode.
#[derive(Debug, Clone)]
pub struct DecodeQuality {
    /// Extraction confidence in 0.0..=1.0, combining checksum validity and
    /// mean per-bit agreement.
    pub confidence: f64,
    /// Whether the frame checksum validated.
    pub checksum_valid: bool,
    /// Mean per-bit agreement across all repetition groups.
    pub mean_agreement: f64,
    /// Samples that could be read and demodulated.
    pub samples_present: usize,
    /// Samples lost to cropping, missing baselines or exact ties.
    pub samples_missing: usize,
    /// Erased bits recovered by the checksum-guided search.
    pub erasures_recovered: usize,
}

/// Extract the watermark payload from `image`.
///
/// On success returns the payload and a [`DecodeQuality`] report. All
/// errors are recoverable forensic outcomes; see [`DecodeError`].
///
/// # Errors
/// - [`DecodeError::ConfigInvalid`] for constraint violations.
/// - [`DecodeError::NoWatermarkFound`] when no coherent signal exists:
///   wrong magic, unusable geometry, or more erasures than the search
///   bound.
/// - [`DecodeError::VersionUnsupported`] for an intact frame from an
///   unknown layout version.
/// - [`DecodeError::PartialExtraction`] / [`DecodeError::ChecksumMismatch`]
///   when the structure is present but corrupted.
pub fn decode(
    image: &RasterImage,
    config: &DecodingConfig,
) -> Result<(WatermarkPayload, DecodeQuality), DecodeError> {
    config.validate(image.channels())?;

    let (width, height) = config
        .assumed_dimensions
        .unwrap_or((image.width(), image.height()));
    if crate::mark::validate_encode_dimensions(width, height).is_err() {
        // The embedder never touches such geometry, so nothing can be there.
        return Err(DecodeError::NoWatermarkFound);
    }

    let count = FRAME_BITS * config.repetition_factor;
    let positions = positions::generate(width, height, config.margin_fraction, count)
        .ok_or(DecodeError::NoWatermarkFound)?;

    let samples = sample_positions(image, config, &positions);
    let samples_present = samples.iter().filter(|s| s.is_some()).count();
    let samples_missing = samples.len() - samples_present;

    let votes = repetition::collapse(&samples, FRAME_BITS);
    let mean_agreement = votes.iter().map(|v| v.agreement).sum::<f64>() / FRAME_BITS as f64;

    let resolved = resolve_frame(&votes)?;
    let quality = DecodeQuality {
        confidence: compute_confidence(mean_agreement, resolved.checksum_valid),
        checksum_valid: resolved.checksum_valid,
        mean_agreement,
        samples_present,
        samples_missing,
        erasures_recovered: resolved.erasures_recovered,
    };

    if resolved.checksum_valid {
        let payload = frame::deserialize(&resolved.frame)?;
        return Ok((payload, quality));
    }

    // Structure failed validation. Classify the failure.
    if !frame::has_magic(&resolved.frame) {
        return Err(DecodeError::NoWatermarkFound);
    }
    let partial = frame::deserialize_partial(&resolved.frame, intact_prefix_bytes(&votes));
    if partial.is_empty() {
        return Err(DecodeError::ChecksumMismatch);
    }
    Err(DecodeError::PartialExtraction {
        recovered: partial,
        confidence: quality.confidence,
    })
}

/// Confidence from mean per-bit agreement and checksum validity.
///
/// A valid checksum maps agreement linearly into 0.5..=1.0, so an agreement
/// ratio of 0.9 scores 0.95 and an untouched image scores 1.0. A checksum
/// failure caps confidence at 0.35 regardless of agreement.
fn compute_confidence(mean_agreement: f64, checksum_valid: bool) -> f64 {
    if checksum_valid {
        0.5 + 0.5 * mean_agreement.clamp(0.0, 1.0)
    } else {
        0.35 * mean_agreement.clamp(0.0, 1.0)
    }
}

/// Sample and demodulate every position into a bit guess.
fn sample_positions(
    image: &RasterImage,
    config: &DecodingConfig,
    positions: &[PixelPos],
) -> Vec<Option<u8>> {
    let channel = config.channel.index();
    let (off_x, off_y) = config.crop_offset;

    // Embedded coordinates in the damaged image, so baselines are computed
    // from carrier-free neighbors only.
    let embedded: HashSet<(u32, u32)> = positions
        .iter()
        .filter_map(|p| map_position(p, off_x, off_y, image))
        .collect();

    positions
        .iter()
        .map(|p| {
            let (x, y) = map_position(p, off_x, off_y, image)?;
            demodulate(image, x, y, channel, &embedded)
        })
        .collect()
}

/// Map an original-geometry position into the damaged image, if it survived.
fn map_position(
    pos: &PixelPos,
    off_x: u32,
    off_y: u32,
    image: &RasterImage,
) -> Option<(u32, u32)> {
    let x = pos.x.checked_sub(off_x)?;
    let y = pos.y.checked_sub(off_y)?;
    (x < image.width() && y < image.height()).then_some((x, y))
}

/// Demodulate one sample against its local baseline.
///
/// The baseline is the mean of the up-to-8 neighbors that are not
/// themselves embedding positions. The sign of the sample against the
/// baseline is the bit guess; an exact tie or an empty neighborhood yields
/// no vote.
fn demodulate(
    image: &RasterImage,
    x: u32,
    y: u32,
    channel: u8,
    embedded: &HashSet<(u32, u32)>,
) -> Option<u8> {
    let mut sum = 0.0f64;
    let mut used = 0u32;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(image.width()) || ny >= i64::from(image.height())
            {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if embedded.contains(&(nx, ny)) {
                continue;
            }
            sum += f64::from(image.get(nx, ny, channel));
            used += 1;
        }
    }
    if used == 0 {
        return None;
    }

    let baseline = sum / f64::from(used);
    let delta = f64::from(image.get(x, y, channel)) - baseline;
    if delta > 0.0 {
        Some(1)
    } else if delta < 0.0 {
        Some(0)
    } else {
        None
    }
}

struct ResolvedFrame {
    frame: [u8; FRAME_LEN],
    checksum_valid: bool,
    erasures_recovered: usize,
}

/// Assemble the frame from votes, recovering erased bits where possible.
///
/// With zero erasures this is a straight repack + verify. Otherwise every
/// assignment of the erased bits (the all-zero one included) is tried
/// against magic + checksum; the first consistent one wins. Failing that,
/// erasures stay zero and the caller classifies the invalid frame.
fn resolve_frame(votes: &[BitVote]) -> Result<ResolvedFrame, DecodeError> {
    let erased: Vec<usize> = votes
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.bit.is_none().then_some(i))
        .collect();
    if erased.len() > MAX_ERASURE_SEARCH {
        return Err(DecodeError::NoWatermarkFound);
    }

    let mut bits: Vec<u8> = votes.iter().map(|v| v.bit.unwrap_or(0)).collect();
    for assignment in 0u32..(1u32 << erased.len()) {
        for (slot, &bit_idx) in erased.iter().enumerate() {
            bits[bit_idx] = ((assignment >> slot) & 1) as u8;
        }
        let candidate = pack_frame(&bits);
        if frame::verify(&candidate) {
            return Ok(ResolvedFrame {
                frame: candidate,
                checksum_valid: true,
                erasures_recovered: erased.len(),
            });
        }
    }

    // No consistent assignment; report the zero-filled frame as corrupt.
    for &bit_idx in &erased {
        bits[bit_idx] = 0;
    }
    Ok(ResolvedFrame {
        frame: pack_frame(&bits),
        checksum_valid: false,
        erasures_recovered: 0,
    })
}

fn pack_frame(bits: &[u8]) -> [u8; FRAME_LEN] {
    let bytes = frame::bits_to_bytes(bits);
    let mut out = [0u8; FRAME_LEN];
    out.copy_from_slice(&bytes[..FRAME_LEN]);
    out
}

/// Number of leading frame bytes whose bits all carry solid agreement.
/// Locates the corruption point for best-effort partial extraction.
fn intact_prefix_bytes(votes: &[BitVote]) -> usize {
    let first_weak = votes
        .iter()
        .position(|v| v.agreement < PARTIAL_AGREEMENT_MIN)
        .unwrap_or(votes.len());
    first_weak / 8
}
