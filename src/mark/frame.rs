// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Payload frame construction and parsing.
//!
//! The frame is the fixed-layout binary container embedded into pixel
//! intensities:
//!
//! ```text
//! [4 bytes ] magic "TMRK"
//! [1 byte  ] frame version (currently 0x01)
//! [28 bytes] viewer id (UTF-8, NUL-padded)
//! [8 bytes ] view timestamp (big-endian i64, ms since epoch)
//! [32 bytes] screenshot id (UTF-8, NUL-padded)
//! [2 bytes ] CRC-32 over everything above, truncated to 16 bits (big-endian)
//! ```
//!
//! Total frame size = 75 bytes = 600 bits. The layout is fixed-width so the
//! decoder knows the exact bit count before sampling a single pixel, and
//! versioned so an unknown layout is detected instead of misparsed.

use crate::mark::error::{DecodeError, EncodeError};
use crate::mark::payload::{PartialPayload, WatermarkPayload, SCREENSHOT_ID_LEN, VIEWER_ID_LEN};

/// Frame magic bytes. A decode that cannot vote these out of the pixel data
/// reports "no watermark" rather than "corrupted watermark".
pub const MAGIC: [u8; 4] = *b"TMRK";

/// Current frame layout version.
pub const VERSION: u8 = 0x01;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 4;
const VIEWER_ID_OFFSET: usize = 5;
const TIMESTAMP_OFFSET: usize = VIEWER_ID_OFFSET + VIEWER_ID_LEN; // 33
const SCREENSHOT_ID_OFFSET: usize = TIMESTAMP_OFFSET + 8; // 41
const CRC_OFFSET: usize = SCREENSHOT_ID_OFFSET + SCREENSHOT_ID_LEN; // 73

/// Serialized frame length in bytes.
pub const FRAME_LEN: usize = CRC_OFFSET + 2; // 75

/// Serialized frame length in bits.
pub const FRAME_BITS: usize = FRAME_LEN * 8; // 600

/// Serialize a payload into the fixed frame layout.
///
/// Identity fields longer than their fixed width are truncated at a UTF-8
/// character boundary; shorter fields are NUL-padded. Truncation is a known
/// lossy tradeoff of the product, not an error.
///
/// # Errors
/// [`EncodeError::PayloadTooLarge`] if an identity field contains a NUL
/// byte — such a value cannot be represented in the NUL-padded layout.
pub fn serialize(payload: &WatermarkPayload) -> Result<[u8; FRAME_LEN], EncodeError> {
    let mut frame = [0u8; FRAME_LEN];
    frame[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&MAGIC);
    frame[VERSION_OFFSET] = VERSION;
    write_field(
        &payload.viewer_id,
        &mut frame[VIEWER_ID_OFFSET..VIEWER_ID_OFFSET + VIEWER_ID_LEN],
    )?;
    frame[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]
        .copy_from_slice(&payload.view_timestamp.to_be_bytes());
    write_field(
        &payload.screenshot_id,
        &mut frame[SCREENSHOT_ID_OFFSET..SCREENSHOT_ID_OFFSET + SCREENSHOT_ID_LEN],
    )?;

    let crc = checksum(&frame[..CRC_OFFSET]);
    frame[CRC_OFFSET..].copy_from_slice(&crc.to_be_bytes());
    Ok(frame)
}

/// Parse a frame, verifying magic, then checksum, then version.
///
/// The ordering distinguishes the failure modes: bad magic means "no
/// watermark present", a checksum mismatch means "watermark present but
/// corrupted", and an unknown version byte under a valid checksum means
/// "watermark from a newer build" rather than random damage.
pub fn deserialize(frame: &[u8; FRAME_LEN]) -> Result<WatermarkPayload, DecodeError> {
    if frame[MAGIC_OFFSET..MAGIC_OFFSET + 4] != MAGIC {
        return Err(DecodeError::NoWatermarkFound);
    }
    let stored = u16::from_be_bytes([frame[CRC_OFFSET], frame[CRC_OFFSET + 1]]);
    if stored != checksum(&frame[..CRC_OFFSET]) {
        return Err(DecodeError::ChecksumMismatch);
    }
    if frame[VERSION_OFFSET] != VERSION {
        return Err(DecodeError::VersionUnsupported(frame[VERSION_OFFSET]));
    }

    let viewer_id = read_field(&frame[VIEWER_ID_OFFSET..VIEWER_ID_OFFSET + VIEWER_ID_LEN])
        .ok_or(DecodeError::ChecksumMismatch)?;
    let ts_bytes: [u8; 8] = frame[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]
        .try_into()
        .expect("fixed slice");
    let screenshot_id =
        read_field(&frame[SCREENSHOT_ID_OFFSET..SCREENSHOT_ID_OFFSET + SCREENSHOT_ID_LEN])
            .ok_or(DecodeError::ChecksumMismatch)?;

    Ok(WatermarkPayload {
        viewer_id,
        view_timestamp: i64::from_be_bytes(ts_bytes),
        screenshot_id,
    })
}

/// Quick structural check used by the extractor's erasure search: magic
/// present and checksum consistent. Version is left to [`deserialize`] so an
/// unknown version still surfaces as such.
pub fn verify(frame: &[u8; FRAME_LEN]) -> bool {
    if frame[MAGIC_OFFSET..MAGIC_OFFSET + 4] != MAGIC {
        return false;
    }
    let stored = u16::from_be_bytes([frame[CRC_OFFSET], frame[CRC_OFFSET + 1]]);
    stored == checksum(&frame[..CRC_OFFSET])
}

/// True when the frame's magic bytes match. Used to classify a failed
/// extraction as "no watermark" vs "corrupted watermark".
pub fn has_magic(frame: &[u8; FRAME_LEN]) -> bool {
    frame[MAGIC_OFFSET..MAGIC_OFFSET + 4] == MAGIC
}

/// Best-effort partial parse for forensic use.
///
/// `intact_prefix` is the number of leading frame bytes believed
/// uncorrupted (derived from per-bit agreement by the extractor). A field is
/// returned only when it lies wholly inside the intact prefix and decodes as
/// UTF-8.
pub fn deserialize_partial(frame: &[u8; FRAME_LEN], intact_prefix: usize) -> PartialPayload {
    let mut partial = PartialPayload::default();
    if intact_prefix >= TIMESTAMP_OFFSET {
        partial.viewer_id = read_field(&frame[VIEWER_ID_OFFSET..VIEWER_ID_OFFSET + VIEWER_ID_LEN]);
    }
    if intact_prefix >= SCREENSHOT_ID_OFFSET {
        let ts_bytes: [u8; 8] = frame[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]
            .try_into()
            .expect("fixed slice");
        partial.view_timestamp = Some(i64::from_be_bytes(ts_bytes));
    }
    if intact_prefix >= CRC_OFFSET {
        partial.screenshot_id =
            read_field(&frame[SCREENSHOT_ID_OFFSET..SCREENSHOT_ID_OFFSET + SCREENSHOT_ID_LEN]);
    }
    partial
}

/// CRC-32 truncated to 16 bits — what fits the 2-byte checksum field.
fn checksum(bytes: &[u8]) -> u16 {
    (crc32fast::hash(bytes) & 0xFFFF) as u16
}

/// NUL-pad `value` into `out`, truncating at a UTF-8 character boundary.
/// Rejects values containing NUL (they cannot round-trip the padding).
fn write_field(value: &str, out: &mut [u8]) -> Result<(), EncodeError> {
    if value.as_bytes().contains(&0) {
        return Err(EncodeError::PayloadTooLarge);
    }
    let bytes = value.as_bytes();
    let fitted = if bytes.len() <= out.len() {
        bytes
    } else {
        // Truncate without splitting a multi-byte character.
        let mut end = 0;
        for (i, c) in value.char_indices() {
            if i + c.len_utf8() > out.len() {
                break;
            }
            end = i + c.len_utf8();
        }
        &bytes[..end]
    };
    out[..fitted.len()].copy_from_slice(fitted);
    for b in out[fitted.len()..].iter_mut() {
        *b = 0;
    }
    Ok(())
}

/// Read a NUL-padded UTF-8 field back to a `String`. `None` if the bytes up
/// to the first NUL are not valid UTF-8.
fn read_field(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).ok().map(str::to_owned)
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}
