// Canomaly - Field catalog
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Field catalog
//!
//! The catalog describes, per bus identifier, how the fixed-width payload
//! decomposes into named fields: bit offset, bit width, value type, whether
//! the field is static or variable across observed traffic, and the set of
//! distinct values seen historically.
//!
//! The catalog is built once at load time and read-only afterwards; every
//! lookup fails closed ([`InjectError::UnknownIdentifier`] /
//! [`InjectError::UnknownField`]) instead of returning a silent default.

use crate::error::{CatalogError, InjectError};
use crate::frame::Payload;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Value type of a payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Unsigned integer
    Unsigned,
    /// Two's-complement signed integer
    Signed,
    /// Individual flag bits
    Bitflag,
    /// Small closed set of discrete codes
    EnumLike,
}

impl ValueType {
    /// Check whether extremes must respect two's-complement encoding
    pub fn is_signed(&self) -> bool {
        matches!(self, ValueType::Signed)
    }
}

/// Observed variability of a field across traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variability {
    /// Value stays fixed in observed traffic
    Static,
    /// Value changes across observed traffic
    Variable,
}

/// Description of one named bit-range within an identifier's payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within the identifier
    pub name: String,
    /// First payload bit of the field (MSB-first numbering)
    pub bit_offset: u16,
    /// Field width in bits (1..=64)
    pub bit_width: u16,
    /// Value type
    pub value_type: ValueType,
    /// Observed variability
    pub variability: Variability,
    /// Distinct values seen historically; empty means unconstrained
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub observed_values: BTreeSet<u64>,
}

impl FieldDescriptor {
    /// Create a descriptor with an empty observed-value history
    pub fn new(
        name: &str,
        bit_offset: u16,
        bit_width: u16,
        value_type: ValueType,
        variability: Variability,
    ) -> Self {
        Self {
            name: name.to_string(),
            bit_offset,
            bit_width,
            value_type,
            variability,
            observed_values: BTreeSet::new(),
        }
    }

    /// Attach the historically observed values
    pub fn with_observed_values(mut self, values: impl IntoIterator<Item = u64>) -> Self {
        self.observed_values = values.into_iter().collect();
        self
    }

    /// One past the last payload bit of the field
    pub fn bit_end(&self) -> u32 {
        self.bit_offset as u32 + self.bit_width as u32
    }
}

/// Catalog entry for one identifier: payload width plus its ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Fixed payload width of this identifier, in bits
    pub payload_bits: u16,
    /// Field descriptors, ordered by declaration
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl CatalogEntry {
    /// Create an entry with no fields
    pub fn new(payload_bits: u16) -> Self {
        Self {
            payload_bits,
            fields: Vec::new(),
        }
    }

    /// Append a field descriptor
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Read-only mapping from identifier to its field layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalog {
    entries: BTreeMap<u32, CatalogEntry>,
}

impl FieldCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry after validating its structure
    ///
    /// Rejects zero/oversized widths, fields out of payload bounds,
    /// overlapping bit ranges, duplicate names and observed values wider
    /// than their field.
    pub fn insert(&mut self, identifier: u32, entry: CatalogEntry) -> Result<(), CatalogError> {
        Self::validate_entry(identifier, &entry)?;
        self.entries.insert(identifier, entry);
        Ok(())
    }

    /// Entry for `identifier`; fails closed when absent
    pub fn entry(&self, identifier: u32) -> Result<&CatalogEntry, InjectError> {
        self.entries
            .get(&identifier)
            .ok_or(InjectError::UnknownIdentifier { identifier })
    }

    /// Field `name` of `identifier`; fails closed when either is absent
    pub fn field(&self, identifier: u32, name: &str) -> Result<&FieldDescriptor, InjectError> {
        self.entry(identifier)?
            .field(name)
            .ok_or_else(|| InjectError::UnknownField {
                identifier,
                field: name.to_string(),
            })
    }

    /// Check whether the catalog knows `identifier`
    pub fn contains(&self, identifier: u32) -> bool {
        self.entries.contains_key(&identifier)
    }

    /// Identifiers in ascending order
    pub fn identifiers(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick a random field of `identifier` with the requested variability
    ///
    /// Returns `None` when the identifier declares no field of that
    /// variability.
    pub fn random_field<R: Rng + ?Sized>(
        &self,
        identifier: u32,
        variability: Variability,
        rng: &mut R,
    ) -> Result<Option<&FieldDescriptor>, InjectError> {
        let candidates: Vec<&FieldDescriptor> = self
            .entry(identifier)?
            .fields
            .iter()
            .filter(|f| f.variability == variability)
            .collect();
        Ok(candidates.choose(rng).copied())
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(self).map_err(|e| CatalogError::Json(e.to_string()))
    }

    /// Save to a JSON file
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| CatalogError::Io(e.to_string()))
    }

    /// Load from a JSON file, validating every entry
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json =
            std::fs::read_to_string(&path).map_err(|e| CatalogError::Io(e.to_string()))?;
        let parsed: FieldCatalog =
            serde_json::from_str(&json).map_err(|e| CatalogError::Json(e.to_string()))?;

        let mut catalog = FieldCatalog::new();
        for (identifier, entry) in parsed.entries {
            catalog.insert(identifier, entry)?;
        }
        log::debug!(
            "loaded field catalog: {} identifiers from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    fn validate_entry(identifier: u32, entry: &CatalogEntry) -> Result<(), CatalogError> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for field in &entry.fields {
            if field.bit_width == 0 || field.bit_width > 64 {
                return Err(CatalogError::InvalidWidth {
                    identifier,
                    field: field.name.clone(),
                    bit_width: field.bit_width,
                });
            }
            if field.bit_end() > entry.payload_bits as u32 {
                return Err(CatalogError::FieldOutOfBounds {
                    identifier,
                    field: field.name.clone(),
                    start: field.bit_offset,
                    end: field.bit_end(),
                    payload_bits: entry.payload_bits,
                });
            }
            if !seen.insert(&field.name) {
                return Err(CatalogError::DuplicateField {
                    identifier,
                    field: field.name.clone(),
                });
            }
            for &value in &field.observed_values {
                if !Payload::fits(value, field.bit_width) {
                    return Err(CatalogError::ObservedValueTooWide {
                        identifier,
                        field: field.name.clone(),
                        value,
                        bit_width: field.bit_width,
                    });
                }
            }
        }

        let mut ranges: Vec<(&FieldDescriptor, u32, u32)> = entry
            .fields
            .iter()
            .map(|f| (f, f.bit_offset as u32, f.bit_end()))
            .collect();
        ranges.sort_by_key(|&(_, start, _)| start);
        for pair in ranges.windows(2) {
            let (first, _, first_end) = pair[0];
            let (second, second_start, _) = pair[1];
            if second_start < first_end {
                return Err(CatalogError::OverlappingFields {
                    identifier,
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }
        Ok(())
    }
}
