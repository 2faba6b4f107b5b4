// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Embedding capacity estimation.
//!
//! Capacity is purely geometric: the margin-excluded interior supplies one
//! embedding position per pixel, and the fixed 600-bit frame times the
//! repetition factor must fit inside it.

use crate::mark::config::MAX_REPETITION_FACTOR;
use crate::mark::frame::FRAME_BITS;
use crate::mark::positions;

/// Number of embedding positions the margin-excluded interior provides.
pub fn embeddable_positions(width: u32, height: u32, margin_fraction: f64) -> usize {
    let (_, _, iw, ih) = positions::interior_rect(width, height, margin_fraction);
    iw as usize * ih as usize
}

/// Number of positions one embedding consumes at a given repetition factor.
pub fn required_positions(repetition_factor: usize) -> usize {
    FRAME_BITS * repetition_factor
}

/// Largest odd repetition factor >= 3 the image can hold, or 0 when even
/// the minimum does not fit. Useful for callers that want maximum
/// redundancy instead of a fixed factor.
pub fn max_repetition_factor(width: u32, height: u32, margin_fraction: f64) -> usize {
    let units = embeddable_positions(width, height, margin_fraction);
    let r = (units / FRAME_BITS).min(MAX_REPETITION_FACTOR);
    if r < 3 {
        return 0;
    }
    // Force odd for clean majority voting.
    if r % 2 == 0 {
        r - 1
    } else {
        r
    }
}
