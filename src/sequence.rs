// Canomaly - Sequence-level generators
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sequence-level anomaly generators
//!
//! The four transforms here perturb frame order and membership only;
//! payload bits are opaque to them. Each is a pure function returning a
//! complete new sequence plus its ground-truth label, or an error before
//! anything was built.

use crate::error::InjectError;
use crate::frame::{Frame, FrameSequence};
use crate::label::{AnomalyKind, AnomalyLabel};
use rand::prelude::*;
use std::collections::BTreeSet;
use std::ops::Range;

/// How [`interleave`] places frames of the second sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterleaveMode {
    /// Strict alternation a1 b1 a2 b2 …, longer tail appended
    Alternate,
    /// Merge positions drawn from the rng, per-source order preserved
    Random,
}

/// Merge frames of `other` into `seq`, breaking per-identifier periodicity
///
/// The merge is stable: the relative internal order of each source is
/// preserved in the output, whose length is the sum of both input lengths.
/// The label marks the output indices of frames originating from `other`.
pub fn interleave<R: Rng + ?Sized>(
    seq: &FrameSequence,
    other: &FrameSequence,
    mode: InterleaveMode,
    rng: &mut R,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    if seq.is_empty() || other.is_empty() {
        return Err(InjectError::InvalidInput(
            "interleave requires two non-empty sequences".to_string(),
        ));
    }

    let a = seq.frames();
    let b = other.frames();
    let mut out: Vec<Frame> = Vec::with_capacity(a.len() + b.len());
    let mut injected: BTreeSet<usize> = BTreeSet::new();

    match mode {
        InterleaveMode::Alternate => {
            for i in 0..a.len().max(b.len()) {
                if let Some(frame) = a.get(i) {
                    out.push(frame.clone());
                }
                if let Some(frame) = b.get(i) {
                    injected.insert(out.len());
                    out.push(frame.clone());
                }
            }
        }
        InterleaveMode::Random => {
            let (mut next_a, mut next_b) = (0usize, 0usize);
            while next_a < a.len() || next_b < b.len() {
                let remaining_a = a.len() - next_a;
                let remaining_b = b.len() - next_b;
                // draw proportionally to remaining counts: uniform over merges
                let take_a = remaining_b == 0
                    || (remaining_a > 0 && rng.gen_range(0..remaining_a + remaining_b) < remaining_a);
                if take_a {
                    out.push(a[next_a].clone());
                    next_a += 1;
                } else {
                    injected.insert(out.len());
                    out.push(b[next_b].clone());
                    next_b += 1;
                }
            }
        }
    }

    let label = AnomalyLabel::sequence(AnomalyKind::Interleave, injected);
    Ok((FrameSequence::from_frames(out), label))
}

/// Shift the timestamps of frames inside `window` by `magnitude`
///
/// Positive magnitudes open a gap, negative ones compress into a burst;
/// payloads and frame order are untouched and length is preserved.
/// Timestamps saturate at the `u64` bounds.
pub fn discontinuity(
    seq: &FrameSequence,
    window: Range<usize>,
    magnitude: i64,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    check_window(seq, &window)?;
    if window.is_empty() {
        return Err(InjectError::InvalidInput(
            "discontinuity window is empty".to_string(),
        ));
    }

    let frames: Vec<Frame> = seq
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            if window.contains(&i) {
                frame.with_timestamp(shift_timestamp(frame.timestamp(), magnitude))
            } else {
                frame.clone()
            }
        })
        .collect();

    let label = AnomalyLabel::sequence(AnomalyKind::Discontinuity, window);
    Ok((FrameSequence::from_frames(frames), label))
}

/// Reverse frame order inside `window`, frames outside untouched
///
/// A window of length ≤ 1 is a successful no-op: the output equals the
/// input and the label is empty.
pub fn reverse(
    seq: &FrameSequence,
    window: Range<usize>,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    check_window(seq, &window)?;

    if window.len() <= 1 {
        let label = AnomalyLabel::sequence(AnomalyKind::Reverse, []);
        return Ok((seq.clone(), label));
    }

    let mut frames = seq.frames().to_vec();
    frames[window.clone()].reverse();

    let label = AnomalyLabel::sequence(AnomalyKind::Reverse, window);
    Ok((FrameSequence::from_frames(frames), label))
}

/// Remove the frames at `indices`, preserving the order of the remainder
///
/// Duplicate indices are deduplicated, not an error; an empty index set
/// returns the input unchanged. The label marks, for each removal point,
/// the output position immediately after it (clamped to the last output
/// index) — where a detector should see the rate glitch.
pub fn drop_frames(
    seq: &FrameSequence,
    indices: &[usize],
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let removed: BTreeSet<usize> = indices.iter().copied().collect();
    if let Some(&out_of_bounds) = removed.iter().find(|&&i| i >= seq.len()) {
        return Err(InjectError::InvalidInput(format!(
            "drop index {} out of bounds for sequence of {} frames",
            out_of_bounds,
            seq.len()
        )));
    }

    if removed.is_empty() {
        let label = AnomalyLabel::sequence(AnomalyKind::Drop, []);
        return Ok((seq.clone(), label));
    }

    let frames: Vec<Frame> = seq
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, frame)| frame.clone())
        .collect();

    let mut affected: BTreeSet<usize> = BTreeSet::new();
    if !frames.is_empty() {
        for &index in &removed {
            let kept_before = index - removed.range(..index).count();
            affected.insert(kept_before.min(frames.len() - 1));
        }
    }

    let label = AnomalyLabel::sequence(AnomalyKind::Drop, affected);
    Ok((FrameSequence::from_frames(frames), label))
}

fn check_window(seq: &FrameSequence, window: &Range<usize>) -> Result<(), InjectError> {
    if window.start > window.end || window.end > seq.len() {
        return Err(InjectError::InvalidInput(format!(
            "window {}..{} exceeds sequence of {} frames",
            window.start,
            window.end,
            seq.len()
        )));
    }
    Ok(())
}

fn shift_timestamp(timestamp: u64, magnitude: i64) -> u64 {
    if magnitude >= 0 {
        timestamp.saturating_add(magnitude as u64)
    } else {
        timestamp.saturating_sub(magnitude.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Payload;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seq_of(identifier: u32, count: usize) -> FrameSequence {
        FrameSequence::from_frames(
            (0..count)
                .map(|i| {
                    Frame::new(
                        identifier,
                        i as u64 * 10,
                        Payload::from_bytes(vec![i as u8; 8]),
                    )
                })
                .collect(),
        )
    }

    fn timestamps_of(seq: &FrameSequence, identifier: u32) -> Vec<u64> {
        seq.iter()
            .filter(|f| f.identifier() == identifier)
            .map(Frame::timestamp)
            .collect()
    }

    #[test]
    fn test_interleave_alternate_stable() {
        let a = seq_of(0x100, 5);
        let b = seq_of(0x200, 3);
        let mut rng = StdRng::seed_from_u64(42);

        let (out, label) = interleave(&a, &b, InterleaveMode::Alternate, &mut rng).unwrap();

        assert_eq!(out.len(), 8);
        // per-source relative order preserved
        assert_eq!(timestamps_of(&out, 0x100), vec![0, 10, 20, 30, 40]);
        assert_eq!(timestamps_of(&out, 0x200), vec![0, 10, 20]);
        // alternation: a b a b a b a a
        assert_eq!(out.get(0).unwrap().identifier(), 0x100);
        assert_eq!(out.get(1).unwrap().identifier(), 0x200);
        assert_eq!(label.affected_indices, [1, 3, 5].into_iter().collect());
        assert_eq!(label.kind, AnomalyKind::Interleave);
    }

    #[test]
    fn test_interleave_random_stable_merge() {
        let a = seq_of(0x100, 20);
        let b = seq_of(0x200, 10);
        let mut rng = StdRng::seed_from_u64(7);

        let (out, label) = interleave(&a, &b, InterleaveMode::Random, &mut rng).unwrap();

        assert_eq!(out.len(), 30);
        assert_eq!(label.affected_indices.len(), 10);
        // both sources keep their internal order regardless of positions
        assert_eq!(
            timestamps_of(&out, 0x100),
            (0..20).map(|i| i * 10).collect::<Vec<u64>>()
        );
        assert_eq!(
            timestamps_of(&out, 0x200),
            (0..10).map(|i| i * 10).collect::<Vec<u64>>()
        );
        // label indices really point at injected frames
        for &i in &label.affected_indices {
            assert_eq!(out.get(i).unwrap().identifier(), 0x200);
        }
    }

    #[test]
    fn test_interleave_reproducible() {
        let a = seq_of(0x100, 12);
        let b = seq_of(0x200, 12);

        let mut rng1 = StdRng::seed_from_u64(99);
        let mut rng2 = StdRng::seed_from_u64(99);
        let (out1, _) = interleave(&a, &b, InterleaveMode::Random, &mut rng1).unwrap();
        let (out2, _) = interleave(&a, &b, InterleaveMode::Random, &mut rng2).unwrap();
        assert_eq!(out1, out2);
    }

    #[test]
    fn test_interleave_rejects_empty() {
        let a = seq_of(0x100, 5);
        let empty = FrameSequence::new();
        let mut rng = StdRng::seed_from_u64(42);

        assert!(matches!(
            interleave(&a, &empty, InterleaveMode::Alternate, &mut rng),
            Err(InjectError::InvalidInput(_))
        ));
        assert!(matches!(
            interleave(&empty, &a, InterleaveMode::Alternate, &mut rng),
            Err(InjectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_discontinuity_shifts_window_only() {
        let seq = seq_of(0x100, 10);

        let (out, label) = discontinuity(&seq, 3..6, 500).unwrap();

        assert_eq!(out.len(), 10);
        assert_eq!(out.get(2).unwrap().timestamp(), 20);
        assert_eq!(out.get(3).unwrap().timestamp(), 530);
        assert_eq!(out.get(5).unwrap().timestamp(), 550);
        assert_eq!(out.get(6).unwrap().timestamp(), 60);
        // payloads untouched
        assert_eq!(out.get(4).unwrap().payload(), seq.get(4).unwrap().payload());
        assert_eq!(label.affected_indices, (3..6).collect());
    }

    #[test]
    fn test_discontinuity_negative_magnitude_saturates() {
        let seq = seq_of(0x100, 4);
        let (out, _) = discontinuity(&seq, 0..2, -15).unwrap();
        assert_eq!(out.get(0).unwrap().timestamp(), 0); // 0 - 15 saturates
        assert_eq!(out.get(1).unwrap().timestamp(), 0); // 10 - 15 saturates
        assert_eq!(out.get(2).unwrap().timestamp(), 20);
    }

    #[test]
    fn test_discontinuity_window_errors() {
        let seq = seq_of(0x100, 5);
        assert!(matches!(
            discontinuity(&seq, 2..9, 100),
            Err(InjectError::InvalidInput(_))
        ));
        assert!(matches!(
            discontinuity(&seq, 3..3, 100),
            Err(InjectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_reverse_window() {
        let seq = seq_of(0x100, 6);

        let (out, label) = reverse(&seq, 1..5).unwrap();

        assert_eq!(out.len(), 6);
        assert_eq!(
            out.iter().map(Frame::timestamp).collect::<Vec<_>>(),
            vec![0, 40, 30, 20, 10, 50]
        );
        assert_eq!(label.affected_indices, (1..5).collect());
    }

    #[test]
    fn test_reverse_trivial_window_is_noop() {
        let seq = seq_of(0x100, 6);

        let (out, label) = reverse(&seq, 3..4).unwrap();
        assert_eq!(out, seq);
        assert!(label.is_empty());

        let (out, label) = reverse(&seq, 2..2).unwrap();
        assert_eq!(out, seq);
        assert!(label.is_empty());
    }

    #[test]
    fn test_reverse_out_of_bounds() {
        let seq = seq_of(0x100, 3);
        assert!(matches!(
            reverse(&seq, 1..7),
            Err(InjectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_drop_removes_and_preserves_order() {
        let seq = seq_of(0x100, 10);

        let (out, label) = drop_frames(&seq, &[4, 5, 6]).unwrap();

        assert_eq!(out.len(), 7);
        assert_eq!(
            out.iter().map(Frame::timestamp).collect::<Vec<_>>(),
            vec![0, 10, 20, 30, 70, 80, 90]
        );
        // all three removal points collapse onto output index 4
        assert_eq!(label.affected_indices, [4].into_iter().collect());
    }

    #[test]
    fn test_drop_duplicates_deduplicated() {
        let seq = seq_of(0x100, 5);
        let (out, _) = drop_frames(&seq, &[2, 2, 2]).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_drop_empty_indices_is_identity() {
        let seq = seq_of(0x100, 5);
        let (out, label) = drop_frames(&seq, &[]).unwrap();
        assert_eq!(out, seq);
        assert!(label.is_empty());
    }

    #[test]
    fn test_drop_out_of_bounds() {
        let seq = seq_of(0x100, 5);
        assert!(matches!(
            drop_frames(&seq, &[1, 5]),
            Err(InjectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_drop_tail_label_clamped() {
        let seq = seq_of(0x100, 5);
        let (out, label) = drop_frames(&seq, &[4]).unwrap();
        assert_eq!(out.len(), 4);
        // removal at the tail clamps to the last output index
        assert_eq!(label.affected_indices, [3].into_iter().collect());
    }

    #[test]
    fn test_drop_everything_yields_empty_label() {
        let seq = seq_of(0x100, 3);
        let (out, label) = drop_frames(&seq, &[0, 1, 2]).unwrap();
        assert!(out.is_empty());
        assert!(label.is_empty());
    }
}
