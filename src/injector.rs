// Canomaly - Anomaly orchestrator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Anomaly orchestrator
//!
//! [`AnomalySpec`] bundles the parameters of one anomaly type; the
//! stateless [`Injector`] validates what is common to all generators
//! (non-empty input, indices within bounds) and dispatches to the matching
//! transform, pairing its output with the ground-truth label. Individual
//! generators remain independently callable and still enforce their own
//! semantic constraints (bit-width fit, field existence).

use crate::catalog::FieldCatalog;
use crate::error::{InjectError, Result};
use crate::field;
use crate::frame::FrameSequence;
use crate::label::{AnomalyKind, AnomalyLabel};
use crate::sequence;
use rand::prelude::*;
use std::ops::Range;

pub use crate::sequence::InterleaveMode;

/// Parameter bundle for one anomaly invocation
#[derive(Debug, Clone)]
pub enum AnomalySpec {
    /// Merge `other` into the input sequence
    Interleave {
        /// Frames to inject; typically another identifier or time window
        other: FrameSequence,
        /// Placement of the injected frames
        mode: InterleaveMode,
    },
    /// Shift timestamps inside a window
    Discontinuity {
        /// Frames whose timing shifts
        window: Range<usize>,
        /// Signed shift; positive opens a gap, negative a burst
        magnitude: i64,
    },
    /// Reverse frame order inside a window
    Reverse {
        /// Frames whose order reverses
        window: Range<usize>,
    },
    /// Remove frames
    Drop {
        /// Indices to remove; duplicates are deduplicated
        indices: Vec<usize>,
    },
    /// Force a field to its type-appropriate maximum
    SetMaximum {
        identifier: u32,
        field: String,
        targets: Vec<usize>,
    },
    /// Force a field to its type-appropriate minimum
    SetMinimum {
        identifier: u32,
        field: String,
        targets: Vec<usize>,
    },
    /// Force a field to a constant
    SetConstant {
        identifier: u32,
        field: String,
        value: u64,
        targets: Vec<usize>,
    },
    /// Force a field to random plausible values
    SetRandom {
        identifier: u32,
        field: String,
        targets: Vec<usize>,
    },
    /// Freeze a field to another frame's value
    Replay {
        identifier: u32,
        field: String,
        source_index: usize,
        targets: Vec<usize>,
    },
}

impl AnomalySpec {
    /// The anomaly kind this spec produces
    pub fn kind(&self) -> AnomalyKind {
        match self {
            AnomalySpec::Interleave { .. } => AnomalyKind::Interleave,
            AnomalySpec::Discontinuity { .. } => AnomalyKind::Discontinuity,
            AnomalySpec::Reverse { .. } => AnomalyKind::Reverse,
            AnomalySpec::Drop { .. } => AnomalyKind::Drop,
            AnomalySpec::SetMaximum { .. } => AnomalyKind::SetMaximum,
            AnomalySpec::SetMinimum { .. } => AnomalyKind::SetMinimum,
            AnomalySpec::SetConstant { .. } => AnomalyKind::SetConstant,
            AnomalySpec::SetRandom { .. } => AnomalyKind::SetRandom,
            AnomalySpec::Replay { .. } => AnomalyKind::Replay,
        }
    }

    /// Target identifier for field-level specs
    pub fn identifier(&self) -> Option<u32> {
        match self {
            AnomalySpec::SetMaximum { identifier, .. }
            | AnomalySpec::SetMinimum { identifier, .. }
            | AnomalySpec::SetConstant { identifier, .. }
            | AnomalySpec::SetRandom { identifier, .. }
            | AnomalySpec::Replay { identifier, .. } => Some(*identifier),
            _ => None,
        }
    }
}

/// Stateless dispatcher pairing generator output with its label
///
/// Holds only a shared reference to the read-only catalog; independent
/// `inject` calls share no mutable state and may run from any number of
/// threads.
#[derive(Debug, Clone, Copy)]
pub struct Injector<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> Injector<'a> {
    /// Create an injector over a loaded catalog
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog this injector reads from
    pub fn catalog(&self) -> &FieldCatalog {
        self.catalog
    }

    /// Run the anomaly described by `spec` against `seq`
    ///
    /// The rng drives `SetRandom` and randomized `Interleave`; pass a
    /// seeded [`rand::rngs::StdRng`] for reproducible fixtures.
    pub fn inject<R: Rng + ?Sized>(
        &self,
        seq: &FrameSequence,
        spec: &AnomalySpec,
        rng: &mut R,
    ) -> Result<(FrameSequence, AnomalyLabel)> {
        if seq.is_empty() {
            return Err(InjectError::InvalidInput("input sequence is empty".to_string()).into());
        }
        self.check_bounds(seq, spec)?;

        let (out, label) = match spec {
            AnomalySpec::Interleave { other, mode } => {
                sequence::interleave(seq, other, *mode, rng)?
            }
            AnomalySpec::Discontinuity { window, magnitude } => {
                sequence::discontinuity(seq, window.clone(), *magnitude)?
            }
            AnomalySpec::Reverse { window } => sequence::reverse(seq, window.clone())?,
            AnomalySpec::Drop { indices } => sequence::drop_frames(seq, indices)?,
            AnomalySpec::SetMaximum {
                identifier,
                field,
                targets,
            } => field::set_maximum(seq, *identifier, field, targets, self.catalog)?,
            AnomalySpec::SetMinimum {
                identifier,
                field,
                targets,
            } => field::set_minimum(seq, *identifier, field, targets, self.catalog)?,
            AnomalySpec::SetConstant {
                identifier,
                field,
                value,
                targets,
            } => field::set_constant(seq, *identifier, field, *value, targets, self.catalog)?,
            AnomalySpec::SetRandom {
                identifier,
                field,
                targets,
            } => field::set_random(seq, *identifier, field, targets, self.catalog, rng)?,
            AnomalySpec::Replay {
                identifier,
                field,
                source_index,
                targets,
            } => field::replay(
                seq,
                *identifier,
                field,
                *source_index,
                targets,
                self.catalog,
            )?,
        };
        Ok((out, label))
    }

    /// Index/window validation shared by every anomaly type
    fn check_bounds(&self, seq: &FrameSequence, spec: &AnomalySpec) -> Result<()> {
        let len = seq.len();
        let check_indices = |indices: &[usize]| -> std::result::Result<(), InjectError> {
            match indices.iter().find(|&&i| i >= len) {
                Some(&bad) => Err(InjectError::InvalidInput(format!(
                    "index {} out of bounds for sequence of {} frames",
                    bad, len
                ))),
                None => Ok(()),
            }
        };

        match spec {
            AnomalySpec::Interleave { other, .. } => {
                if other.is_empty() {
                    return Err(InjectError::InvalidInput(
                        "interleave requires two non-empty sequences".to_string(),
                    )
                    .into());
                }
            }
            AnomalySpec::Discontinuity { window, .. } | AnomalySpec::Reverse { window } => {
                if window.start > window.end || window.end > len {
                    return Err(InjectError::InvalidInput(format!(
                        "window {}..{} exceeds sequence of {} frames",
                        window.start, window.end, len
                    ))
                    .into());
                }
            }
            AnomalySpec::Drop { indices } => check_indices(indices)?,
            AnomalySpec::SetMaximum { targets, .. }
            | AnomalySpec::SetMinimum { targets, .. }
            | AnomalySpec::SetConstant { targets, .. }
            | AnomalySpec::SetRandom { targets, .. } => check_indices(targets)?,
            AnomalySpec::Replay {
                source_index,
                targets,
                ..
            } => {
                check_indices(targets)?;
                check_indices(&[*source_index])?;
            }
        }
        Ok(())
    }
}

/// Pick a window for an anomaly of `anomaly_len` frames
///
/// The start lands no earlier than one third into the sequence and always
/// leaves room for the whole anomaly.
pub fn choose_window<R: Rng + ?Sized>(
    seq_len: usize,
    anomaly_len: usize,
    rng: &mut R,
) -> std::result::Result<Range<usize>, InjectError> {
    if anomaly_len == 0 {
        return Err(InjectError::InvalidInput(
            "anomaly length must be positive".to_string(),
        ));
    }
    let earliest = seq_len / 3;
    let latest = seq_len.checked_sub(anomaly_len).ok_or_else(|| {
        InjectError::InvalidInput(format!(
            "anomaly of {} frames does not fit in sequence of {}",
            anomaly_len, seq_len
        ))
    })?;
    if latest < earliest {
        return Err(InjectError::InvalidInput(format!(
            "anomaly of {} frames does not fit after one third of {} frames",
            anomaly_len, seq_len
        )));
    }
    let start = rng.gen_range(earliest..=latest);
    Ok(start..start + anomaly_len)
}
