// Canomaly - Trace loading
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Trace loading
//!
//! The engine consumes pre-decoded frames, not raw bus dumps: capture and
//! payload decoding are an external collaborator's job. The contract is a
//! JSON array of records
//!
//! ```text
//! [{ "id": 256, "timestamp": 1694522000, "data": "05a1000000000000" }, …]
//! ```
//!
//! Loading validates every record against the catalog: unknown identifiers
//! and payload widths disagreeing with the declaration are rejected, never
//! silently defaulted.

use crate::catalog::FieldCatalog;
use crate::error::TraceError;
use crate::frame::{Frame, FrameSequence, Payload};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One pre-decoded frame record as persisted by the capture side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Bus identifier
    pub id: u32,
    /// Capture timestamp / sequence index
    pub timestamp: u64,
    /// Payload bytes as hex
    pub data: String,
}

impl TraceRecord {
    /// Record for a frame
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            id: frame.identifier(),
            timestamp: frame.timestamp(),
            data: frame.payload().to_hex(),
        }
    }
}

/// Build a frame sequence from records, validating against the catalog
pub fn frames_from_records(
    records: &[TraceRecord],
    catalog: &FieldCatalog,
) -> Result<FrameSequence, TraceError> {
    let mut frames: Vec<Frame> = Vec::with_capacity(records.len());
    let mut out_of_order = 0usize;

    for (index, record) in records.iter().enumerate() {
        let entry = catalog
            .entry(record.id)
            .map_err(|_| TraceError::UnknownIdentifier {
                index,
                identifier: record.id,
            })?;

        let bytes = hex::decode(&record.data).map_err(|e| TraceError::InvalidHex {
            index,
            reason: e.to_string(),
        })?;

        let expected_bits = entry.payload_bits;
        if bytes.len() != (expected_bits as usize + 7) / 8 {
            return Err(TraceError::PayloadWidthMismatch {
                index,
                identifier: record.id,
                expected_bits,
                actual_bits: bytes.len() * 8,
            });
        }
        let payload = Payload::with_bit_len(bytes, expected_bits as usize).map_err(|_| {
            TraceError::PayloadWidthMismatch {
                index,
                identifier: record.id,
                expected_bits,
                actual_bits: record.data.len() * 4,
            }
        })?;

        if let Some(previous) = frames.last() {
            if record.timestamp < previous.timestamp() {
                out_of_order += 1;
            }
        }
        frames.push(Frame::new(record.id, record.timestamp, payload));
    }

    if out_of_order > 0 {
        log::warn!(
            "trace has {} records with decreasing timestamps; insertion order kept",
            out_of_order
        );
    }
    Ok(FrameSequence::from_frames(frames))
}

/// Records for the frames of a sequence, in order
pub fn records_from_frames(seq: &FrameSequence) -> Vec<TraceRecord> {
    seq.iter().map(TraceRecord::from_frame).collect()
}

/// Load a frame sequence from a JSON trace file
pub fn load_trace(
    path: impl AsRef<Path>,
    catalog: &FieldCatalog,
) -> Result<FrameSequence, TraceError> {
    let json = std::fs::read_to_string(&path).map_err(|e| TraceError::Io(e.to_string()))?;
    let records: Vec<TraceRecord> =
        serde_json::from_str(&json).map_err(|e| TraceError::Json(e.to_string()))?;
    let seq = frames_from_records(&records, catalog)?;
    log::debug!(
        "loaded trace: {} frames, {} identifiers from {}",
        seq.len(),
        seq.identifiers().len(),
        path.as_ref().display()
    );
    Ok(seq)
}

/// Save a frame sequence as a JSON trace file
pub fn save_trace(seq: &FrameSequence, path: impl AsRef<Path>) -> Result<(), TraceError> {
    let records = records_from_frames(seq);
    let json =
        serde_json::to_string_pretty(&records).map_err(|e| TraceError::Json(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| TraceError::Io(e.to_string()))
}
