// Canomaly - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for Canomaly
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for Canomaly operations
pub type Result<T> = std::result::Result<T, CanomalyError>;

/// Main error type for Canomaly operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanomalyError {
    /// Injection error
    #[error("Injection error: {0}")]
    Inject(#[from] InjectError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Trace error
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),
}

/// Errors raised by anomaly generators
///
/// Every generator fails before building any output: a returned error
/// guarantees the input sequence was not partially transformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// Out-of-range index, empty sequence, or window exceeding bounds
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Field name not present in the catalog entry for the identifier
    #[error("Unknown field {field:?} for identifier 0x{identifier:03X}")]
    UnknownField { identifier: u32, field: String },

    /// Identifier absent from the catalog
    #[error("Identifier 0x{identifier:03X} not present in catalog")]
    UnknownIdentifier { identifier: u32 },

    /// Constant value exceeds the field's bit width
    #[error("Value {value} does not fit in {bit_width} bits")]
    ValueOutOfRange { value: u64, bit_width: u16 },
}

/// Errors raised while building or loading a field catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// File read/write failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed JSON
    #[error("Malformed catalog JSON: {0}")]
    Json(String),

    /// Field declared with zero or >64 bit width
    #[error("Field {field:?} of 0x{identifier:03X} has invalid width {bit_width}")]
    InvalidWidth {
        identifier: u32,
        field: String,
        bit_width: u16,
    },

    /// Field bit range exceeds the declared payload width
    #[error(
        "Field {field:?} of 0x{identifier:03X} spans bits {start}..{end}, \
         payload is {payload_bits} bits"
    )]
    FieldOutOfBounds {
        identifier: u32,
        field: String,
        start: u16,
        end: u32,
        payload_bits: u16,
    },

    /// Two fields of the same identifier overlap
    #[error("Fields {first:?} and {second:?} of 0x{identifier:03X} overlap")]
    OverlappingFields {
        identifier: u32,
        first: String,
        second: String,
    },

    /// Same field name declared twice for one identifier
    #[error("Duplicate field {field:?} for identifier 0x{identifier:03X}")]
    DuplicateField { identifier: u32, field: String },

    /// An observed value does not fit in the field's declared width
    #[error(
        "Observed value {value} of field {field:?} (0x{identifier:03X}) \
         does not fit in {bit_width} bits"
    )]
    ObservedValueTooWide {
        identifier: u32,
        field: String,
        value: u64,
        bit_width: u16,
    },
}

/// Errors raised while loading a pre-decoded frame trace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// File read/write failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed JSON
    #[error("Malformed trace JSON: {0}")]
    Json(String),

    /// Payload hex string could not be decoded
    #[error("Record {index}: invalid payload hex: {reason}")]
    InvalidHex { index: usize, reason: String },

    /// Record identifier absent from the catalog
    #[error("Record {index}: identifier 0x{identifier:03X} not present in catalog")]
    UnknownIdentifier { index: usize, identifier: u32 },

    /// Record payload width disagrees with the catalog declaration
    #[error(
        "Record {index}: payload of 0x{identifier:03X} is {actual_bits} bits, \
         catalog declares {expected_bits}"
    )]
    PayloadWidthMismatch {
        index: usize,
        identifier: u32,
        expected_bits: u16,
        actual_bits: usize,
    },
}
