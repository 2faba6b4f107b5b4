// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! Repetition coding with majority voting.
//!
//! Each frame bit is embedded `factor` times. Copies are interleaved — copy
//! `j` of bit `i` lands at expanded index `j * bit_count + i` — so the
//! members of one repetition group are maximally separated in the position
//! stream and a localized image defect (a crop boundary, an overlaid
//! sticker) never wipes out a whole group at once.
//!
//! This seam is the intended extension point: a stronger error-correcting
//! code can replace [`expand`]/[`collapse`] without touching the embedder or
//! extractor.

/// One majority-voted output bit.
#[derive(Debug, Clone, Copy)]
pub struct BitVote {
    /// The voted bit, or `None` when the group had no usable samples or the
    /// present samples tied (an *erasure*).
    pub bit: Option<u8>,
    /// Fraction of the group's `factor` sample slots that agreed with the
    /// majority. Missing samples count against the group, so damage lowers
    /// agreement even when the surviving samples are unanimous.
    pub agreement: f64,
}

/// Expand frame bits into `factor` interleaved copies.
///
/// Output length is `bits.len() * factor`; copy `j` of bit `i` sits at
/// index `j * bits.len() + i`.
pub fn expand(bits: &[u8], factor: usize) -> Vec<u8> {
    let mut expanded = Vec::with_capacity(bits.len() * factor);
    for _ in 0..factor {
        expanded.extend_from_slice(bits);
    }
    expanded
}

/// Majority-vote interleaved sample groups back into `bit_count` bits.
///
/// `samples` holds one entry per expanded position, in the same interleaved
/// layout as [`expand`]; `None` marks a sample the extractor could not read
/// (position cropped away, no demodulation baseline, exact tie against the
/// baseline). The repetition factor is inferred as
/// `samples.len() / bit_count`.
pub fn collapse(samples: &[Option<u8>], bit_count: usize) -> Vec<BitVote> {
    if bit_count == 0 {
        return Vec::new();
    }
    let factor = samples.len() / bit_count;
    let mut votes = Vec::with_capacity(bit_count);

    for i in 0..bit_count {
        let mut ones = 0usize;
        let mut zeros = 0usize;
        for copy in 0..factor {
            match samples[copy * bit_count + i] {
                Some(1) => ones += 1,
                Some(_) => zeros += 1,
                None => {}
            }
        }
        let vote = if ones > zeros {
            BitVote {
                bit: Some(1),
                agreement: ones as f64 / factor as f64,
            }
        } else if zeros > ones {
            BitVote {
                bit: Some(0),
                agreement: zeros as f64 / factor as f64,
            }
        } else {
            // No samples, or a tie: the bit is an erasure.
            BitVote {
                bit: None,
                agreement: 0.0,
            }
        };
        votes.push(vote);
    }

    votes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(bits: &[u8]) -> Vec<Option<u8>> {
        bits.iter().map(|&b| Some(b)).collect()
    }

    fn voted_bits(votes: &[BitVote]) -> Vec<Option<u8>> {
        votes.iter().map(|v| v.bit).collect()
    }

    #[test]
    fn expand_interleaves_copies() {
        let bits = vec![1u8, 0, 1];
        let expanded = expand(&bits, 3);
        assert_eq!(expanded, vec![1, 0, 1, 1, 0, 1, 1, 0, 1]);
        // Copy j of bit i at j * bit_count + i.
        for copy in 0..3 {
            for (i, &bit) in bits.iter().enumerate() {
                assert_eq!(expanded[copy * bits.len() + i], bit);
            }
        }
    }

    #[test]
    fn clean_roundtrip() {
        let bits = vec![0u8, 1, 1, 0, 1, 0, 0, 1];
        let samples = present(&expand(&bits, 5));
        let votes = collapse(&samples, bits.len());
        assert_eq!(voted_bits(&votes), bits.iter().map(|&b| Some(b)).collect::<Vec<_>>());
        for v in &votes {
            assert_eq!(v.agreement, 1.0);
        }
    }

    #[test]
    fn two_of_five_corrupted_still_correct() {
        let bits = vec![0u8, 1, 0, 1];
        let mut samples = present(&expand(&bits, 5));
        // Flip 2 of the 5 copies of bit 0.
        samples[0] = Some(1);
        samples[4] = Some(1);
        let votes = collapse(&samples, 4);
        assert_eq!(votes[0].bit, Some(0));
        assert!((votes[0].agreement - 0.6).abs() < 1e-12);
        assert_eq!(voted_bits(&votes[1..]), vec![Some(1), Some(0), Some(1)]);
    }

    #[test]
    fn three_of_five_corrupted_flips() {
        // Expected boundary behavior of majority voting, not a defect.
        let bits = vec![0u8, 1];
        let mut samples = present(&expand(&bits, 5));
        for copy in 0..3 {
            samples[copy * 2] = Some(1);
        }
        let votes = collapse(&samples, 2);
        assert_eq!(votes[0].bit, Some(1));
        assert!((votes[0].agreement - 0.6).abs() < 1e-12);
        assert_eq!(votes[1].bit, Some(1));
    }

    #[test]
    fn missing_samples_lower_agreement() {
        let bits = vec![1u8, 0];
        let mut samples = present(&expand(&bits, 5));
        // Drop 2 of the 5 copies of bit 1.
        samples[3] = None;
        samples[5] = None;
        let votes = collapse(&samples, 2);
        assert_eq!(votes[1].bit, Some(0));
        assert!((votes[1].agreement - 0.6).abs() < 1e-12);
        assert_eq!(votes[0].bit, Some(1));
        assert_eq!(votes[0].agreement, 1.0);
    }

    #[test]
    fn all_missing_is_erasure() {
        let bits = vec![1u8, 0];
        let mut samples = present(&expand(&bits, 3));
        for copy in 0..3 {
            samples[copy * 2] = None;
        }
        let votes = collapse(&samples, 2);
        assert_eq!(votes[0].bit, None);
        assert_eq!(votes[0].agreement, 0.0);
        assert_eq!(votes[1].bit, Some(0));
    }

    #[test]
    fn tie_is_erasure() {
        // 2 vs 2 with one missing sample.
        let samples = vec![Some(1u8), Some(1), Some(0), Some(0), None];
        let votes = collapse(&samples, 1);
        assert_eq!(votes[0].bit, None);
    }

    #[test]
    fn contiguous_burst_hits_each_group_once() {
        // A burst spanning one whole copy block corrupts at most one sample
        // per group — the interleaving property the layout exists for.
        let bits: Vec<u8> = (0..16).map(|i| (i % 2) as u8).collect();
        let mut samples = present(&expand(&bits, 5));
        for s in samples.iter_mut().take(bits.len()) {
            *s = s.map(|b| b ^ 1);
        }
        let votes = collapse(&samples, bits.len());
        assert_eq!(
            voted_bits(&votes),
            bits.iter().map(|&b| Some(b)).collect::<Vec<_>>()
        );
        for v in &votes {
            assert!((v.agreement - 0.8).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_input() {
        assert!(collapse(&[], 0).is_empty());
    }
}
