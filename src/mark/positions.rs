// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Deterministic embedding position derivation.
//!
//! Enumerates the margin-excluded interior of the image in raster order and
//! applies a Fisher-Yates shuffle driven by a ChaCha20 PRNG. The seed is
//! derived only from the image dimensions and a fixed tag — never from the
//! payload — so the decoder regenerates the identical sequence without
//! knowing what was embedded. This is the load-bearing invariant behind
//! blind decoding; it is also a disclosed weakness against an adversary who
//! has the algorithm (the threat model is accidental-leak tracing, not
//! deliberate watermark removal).
//!
//! # Cross-platform portability
//!
//! The Fisher-Yates shuffle uses `u32` for `gen_range` (not `usize`) to
//! ensure identical permutations on all platforms. `usize` is 32-bit on WASM
//! but 64-bit on native, which causes `rand::Rng::gen_range` to consume
//! different amounts of PRNG entropy per step — producing completely
//! different shuffles. The interior position count is bounded by the 16MP
//! image limit, so `u32` indices always suffice.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Fixed seed tag. Versioned with the frame layout: changing either breaks
/// compatibility with previously watermarked images.
const SEED_TAG: &[u8; 16] = b"tracemark-pos-v1";

/// One embeddable pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPos {
    pub x: u32,
    pub y: u32,
}

/// Derive the 32-byte PRNG seed from image dimensions alone.
pub fn derive_seed(width: u32, height: u32) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..16].copy_from_slice(SEED_TAG);
    seed[16..24].copy_from_slice(&u64::from(width).to_be_bytes());
    seed[24..32].copy_from_slice(&u64::from(height).to_be_bytes());
    seed
}

/// The margin-excluded interior rectangle as `(x0, y0, width, height)`.
///
/// The margin is `floor(dimension * margin_fraction)` pixels per edge. Both
/// encoder and decoder compute it through the same IEEE 754 multiply and
/// truncation, so the rectangle is identical everywhere.
pub fn interior_rect(width: u32, height: u32, margin_fraction: f64) -> (u32, u32, u32, u32) {
    let margin_x = (f64::from(width) * margin_fraction) as u32;
    let margin_y = (f64::from(height) * margin_fraction) as u32;
    let iw = width.saturating_sub(2 * margin_x);
    let ih = height.saturating_sub(2 * margin_y);
    (margin_x, margin_y, iw, ih)
}

/// Generate `count` distinct embedding positions for an image.
///
/// For fixed `(width, height, margin_fraction, count)` the returned ordered
/// list is identical across calls, processes and platforms. Returns `None`
/// when the interior rectangle holds fewer than `count` pixels; the caller
/// surfaces that as `PayloadTooLarge` (encode) or "no watermark could fit"
/// (decode).
pub fn generate(
    width: u32,
    height: u32,
    margin_fraction: f64,
    count: usize,
) -> Option<Vec<PixelPos>> {
    let (x0, y0, iw, ih) = interior_rect(width, height, margin_fraction);
    let total = iw as usize * ih as usize;
    if count > total {
        return None;
    }

    let mut positions: Vec<PixelPos> = Vec::with_capacity(total);
    for y in y0..y0 + ih {
        for x in x0..x0 + iw {
            positions.push(PixelPos { x, y });
        }
    }

    // Portable Fisher-Yates over the full interior. Shuffling everything
    // (not just a prefix) keeps the sequence independent of `count`, so a
    // shorter request is always a prefix of a longer one.
    let mut rng = ChaCha20Rng::from_seed(derive_seed(width, height));
    for i in (1..total).rev() {
        let j = rng.gen_range(0..=(i as u32)) as usize;
        positions.swap(i, j);
    }

    positions.truncate(count);
    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let a = generate(256, 256, 0.10, 3000).unwrap();
        let b = generate(256, 256, 0.10, 3000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shorter_request_is_prefix_of_longer() {
        let short = generate(256, 256, 0.10, 100).unwrap();
        let long = generate(256, 256, 0.10, 3000).unwrap();
        assert_eq!(short.as_slice(), &long[..100]);
    }

    #[test]
    fn positions_are_unique() {
        let positions = generate(128, 128, 0.10, 5000).unwrap();
        let mut keys: Vec<u64> = positions
            .iter()
            .map(|p| (u64::from(p.y) << 32) | u64::from(p.x))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 5000);
    }

    #[test]
    fn margin_is_respected() {
        let positions = generate(200, 100, 0.10, 2000).unwrap();
        // floor(200*0.10)=20, floor(100*0.10)=10.
        for p in &positions {
            assert!(p.x >= 20 && p.x < 180, "x={} outside interior", p.x);
            assert!(p.y >= 10 && p.y < 90, "y={} outside interior", p.y);
        }
    }

    #[test]
    fn zero_margin_uses_full_image() {
        let positions = generate(16, 16, 0.0, 256).unwrap();
        assert_eq!(positions.len(), 256);
        let mut keys: Vec<u32> = positions.iter().map(|p| p.y * 16 + p.x).collect();
        keys.sort_unstable();
        let expected: Vec<u32> = (0..256).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn overcommitted_interior_fails() {
        // 16x16 at 10% margin: floor(1.6)=1 per edge, interior 14x14=196.
        assert!(generate(16, 16, 0.10, 196).is_some());
        assert!(generate(16, 16, 0.10, 197).is_none());
    }

    #[test]
    fn different_dimensions_differ() {
        let a = generate(256, 256, 0.10, 500).unwrap();
        let b = generate(257, 256, 0.10, 500).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn seed_encodes_both_dimensions() {
        assert_ne!(derive_seed(256, 128), derive_seed(128, 256));
        assert_eq!(derive_seed(640, 480), derive_seed(640, 480));
    }

    #[test]
    fn known_interior_rects() {
        assert_eq!(interior_rect(256, 256, 0.10), (25, 25, 206, 206));
        assert_eq!(interior_rect(64, 64, 0.10), (6, 6, 52, 52));
        assert_eq!(interior_rect(100, 100, 0.0), (0, 0, 100, 100));
        assert_eq!(interior_rect(100, 100, 0.4), (40, 40, 20, 20));
    }
}
