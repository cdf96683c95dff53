// Canomaly - Field-level generators
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Field-level anomaly generators
//!
//! The five transforms here overwrite the bits of one named field within
//! the targeted frames, leaving every other bit untouched. Offsets, widths
//! and value types always come from the [`FieldCatalog`] — a "stuck at max"
//! fault must use the true bit-width maximum, never an arbitrary constant.
//!
//! Common failure rules: [`InjectError::UnknownIdentifier`] when the
//! catalog has no entry for the identifier, [`InjectError::UnknownField`]
//! when the field name is absent from that entry, and
//! [`InjectError::InvalidInput`] when a target index is out of bounds or
//! refers to a frame of a different identifier.

use crate::catalog::{FieldCatalog, FieldDescriptor};
use crate::error::InjectError;
use crate::frame::{Frame, FrameSequence, Payload};
use crate::label::{AnomalyKind, AnomalyLabel};
use rand::prelude::*;
use std::collections::BTreeSet;

/// Force the field to its type-appropriate maximum
///
/// Unsigned, bitflag and enum-like fields get the all-ones pattern
/// `2^w − 1`; signed fields get `2^(w−1) − 1` (`0111…1`).
pub fn set_maximum(
    seq: &FrameSequence,
    identifier: u32,
    field_name: &str,
    targets: &[usize],
    catalog: &FieldCatalog,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let field = catalog.field(identifier, field_name)?;
    let targets = check_targets(seq, identifier, targets)?;
    let raw = max_pattern(field);
    overwrite(seq, field, &targets, AnomalyKind::SetMaximum, |_, _| Ok(raw))
}

/// Force the field to its type-appropriate minimum
///
/// Unsigned, bitflag and enum-like fields get all-zero; signed fields get
/// the two's-complement minimum pattern `1000…0`.
pub fn set_minimum(
    seq: &FrameSequence,
    identifier: u32,
    field_name: &str,
    targets: &[usize],
    catalog: &FieldCatalog,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let field = catalog.field(identifier, field_name)?;
    let targets = check_targets(seq, identifier, targets)?;
    let raw = min_pattern(field);
    overwrite(seq, field, &targets, AnomalyKind::SetMinimum, |_, _| Ok(raw))
}

/// Force the field to a caller-chosen constant
///
/// Fails with [`InjectError::ValueOutOfRange`] when `value` cannot be
/// represented in the field's declared bit width.
pub fn set_constant(
    seq: &FrameSequence,
    identifier: u32,
    field_name: &str,
    value: u64,
    targets: &[usize],
    catalog: &FieldCatalog,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let field = catalog.field(identifier, field_name)?;
    if !Payload::fits(value, field.bit_width) {
        return Err(InjectError::ValueOutOfRange {
            value,
            bit_width: field.bit_width,
        });
    }
    let targets = check_targets(seq, identifier, targets)?;
    overwrite(seq, field, &targets, AnomalyKind::SetConstant, |_, _| {
        Ok(value)
    })
}

/// Force the field to fresh random values, one draw per target frame
///
/// Draws uniformly from the field's `observed_values` when the history is
/// non-empty — the anomaly stays "plausible but wrong" and is invisible to
/// plain range checks. With an empty history the draw falls back to the
/// full representable range of the field's width.
pub fn set_random<R: Rng + ?Sized>(
    seq: &FrameSequence,
    identifier: u32,
    field_name: &str,
    targets: &[usize],
    catalog: &FieldCatalog,
    rng: &mut R,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let field = catalog.field(identifier, field_name)?;
    let targets = check_targets(seq, identifier, targets)?;
    let observed: Vec<u64> = field.observed_values.iter().copied().collect();

    overwrite(seq, field, &targets, AnomalyKind::SetRandom, |_, _| {
        let raw = if let Some(&value) = observed.choose(rng) {
            value
        } else if field.bit_width == 64 {
            rng.gen()
        } else {
            rng.gen_range(0..=Payload::max_raw(field.bit_width))
        };
        Ok(raw)
    })
}

/// Freeze the field to the value it has in the frame at `source_index`
///
/// Copies the field's raw bits from the source frame into every target,
/// simulating a replay attack where a field stops updating. The source
/// frame must belong to the same identifier.
pub fn replay(
    seq: &FrameSequence,
    identifier: u32,
    field_name: &str,
    source_index: usize,
    targets: &[usize],
    catalog: &FieldCatalog,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let field = catalog.field(identifier, field_name)?;
    let source = seq.get(source_index).ok_or_else(|| {
        InjectError::InvalidInput(format!(
            "replay source index {} out of bounds for sequence of {} frames",
            source_index,
            seq.len()
        ))
    })?;
    if source.identifier() != identifier {
        return Err(InjectError::InvalidInput(format!(
            "replay source frame at {} has identifier 0x{:03X}, expected 0x{:03X}",
            source_index,
            source.identifier(),
            identifier
        )));
    }
    let targets = check_targets(seq, identifier, targets)?;
    let raw = source.field_value(field)?;
    overwrite(seq, field, &targets, AnomalyKind::Replay, |_, _| Ok(raw))
}

/// All-ones / signed-maximum bit pattern for a field
fn max_pattern(field: &FieldDescriptor) -> u64 {
    if field.value_type.is_signed() {
        Payload::max_raw(field.bit_width) >> 1
    } else {
        Payload::max_raw(field.bit_width)
    }
}

/// All-zero / signed-minimum bit pattern for a field
fn min_pattern(field: &FieldDescriptor) -> u64 {
    if field.value_type.is_signed() {
        1u64 << (field.bit_width - 1)
    } else {
        0
    }
}

/// Validate target indices: in bounds and referring to `identifier` frames
fn check_targets(
    seq: &FrameSequence,
    identifier: u32,
    targets: &[usize],
) -> Result<BTreeSet<usize>, InjectError> {
    let targets: BTreeSet<usize> = targets.iter().copied().collect();
    for &index in &targets {
        let frame = seq.get(index).ok_or_else(|| {
            InjectError::InvalidInput(format!(
                "target index {} out of bounds for sequence of {} frames",
                index,
                seq.len()
            ))
        })?;
        if frame.identifier() != identifier {
            return Err(InjectError::InvalidInput(format!(
                "target frame at {} has identifier 0x{:03X}, expected 0x{:03X}",
                index,
                frame.identifier(),
                identifier
            )));
        }
    }
    Ok(targets)
}

/// Rewrite the field in every target frame; all-or-nothing
fn overwrite(
    seq: &FrameSequence,
    field: &FieldDescriptor,
    targets: &BTreeSet<usize>,
    kind: AnomalyKind,
    mut value_for: impl FnMut(usize, &Frame) -> Result<u64, InjectError>,
) -> Result<(FrameSequence, AnomalyLabel), InjectError> {
    let mut frames = seq.frames().to_vec();
    for &index in targets {
        let raw = value_for(index, &frames[index])?;
        frames[index] = frames[index].with_field(field, raw)?;
    }
    let label = AnomalyLabel::field(kind, targets.iter().copied(), &field.name);
    Ok((FrameSequence::from_frames(frames), label))
}
