// Canomaly - Ground-truth labels
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Ground-truth labels
//!
//! Every generator call pairs its output sequence with an [`AnomalyLabel`]
//! recording what was altered. Labels feed downstream supervised training
//! and are never consumed by the engine itself. [`InjectionManifest`]
//! collects the labels of a whole generated dataset into one JSON file so
//! a training pipeline can recover the ground truth without the process
//! that produced it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// The nine anomaly types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Frames of two sequences merged into one
    Interleave,
    /// Timing gap or burst inside a window
    Discontinuity,
    /// Frame order reversed inside a window
    Reverse,
    /// Frames removed from the sequence
    Drop,
    /// Field forced to its type-appropriate maximum
    SetMaximum,
    /// Field forced to its type-appropriate minimum
    SetMinimum,
    /// Field forced to a caller-chosen constant
    SetConstant,
    /// Field forced to random plausible values
    SetRandom,
    /// Field frozen to another frame's value
    Replay,
}

impl AnomalyKind {
    /// Stable lowercase name, as used in manifests
    pub fn name(&self) -> &'static str {
        match self {
            AnomalyKind::Interleave => "interleave",
            AnomalyKind::Discontinuity => "discontinuity",
            AnomalyKind::Reverse => "reverse",
            AnomalyKind::Drop => "drop",
            AnomalyKind::SetMaximum => "set_maximum",
            AnomalyKind::SetMinimum => "set_minimum",
            AnomalyKind::SetConstant => "set_constant",
            AnomalyKind::SetRandom => "set_random",
            AnomalyKind::Replay => "replay",
        }
    }

    /// Check whether this kind perturbs field contents rather than order
    pub fn is_field_level(&self) -> bool {
        matches!(
            self,
            AnomalyKind::SetMaximum
                | AnomalyKind::SetMinimum
                | AnomalyKind::SetConstant
                | AnomalyKind::SetRandom
                | AnomalyKind::Replay
        )
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ground truth for one generator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyLabel {
    /// Which anomaly was injected
    pub kind: AnomalyKind,
    /// Affected positions in the output sequence
    pub affected_indices: BTreeSet<usize>,
    /// Affected field name for field-level anomalies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_field: Option<String>,
}

impl AnomalyLabel {
    /// Label for a sequence-level anomaly
    pub fn sequence(kind: AnomalyKind, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            kind,
            affected_indices: indices.into_iter().collect(),
            affected_field: None,
        }
    }

    /// Label for a field-level anomaly
    pub fn field(
        kind: AnomalyKind,
        indices: impl IntoIterator<Item = usize>,
        field: &str,
    ) -> Self {
        Self {
            kind,
            affected_indices: indices.into_iter().collect(),
            affected_field: Some(field.to_string()),
        }
    }

    /// Check whether the invocation was a no-op
    pub fn is_empty(&self) -> bool {
        self.affected_indices.is_empty()
    }
}

/// One labeled injection within a generated dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionRecord {
    /// Index of the base window/sequence the injection was applied to
    pub sequence_index: usize,
    /// Target identifier for field-level anomalies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<u32>,
    /// The ground-truth label
    pub label: AnomalyLabel,
}

/// Ground-truth record of every injection performed over a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionManifest {
    /// Dataset name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Random seed used, for reproducibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Labeled injections in generation order
    #[serde(default)]
    pub injections: Vec<InjectionRecord>,
}

impl InjectionManifest {
    /// Create an empty manifest
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            seed: None,
            injections: Vec::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Record one injection
    pub fn record(&mut self, sequence_index: usize, identifier: Option<u32>, label: AnomalyLabel) {
        self.injections.push(InjectionRecord {
            sequence_index,
            identifier,
            label,
        });
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to a JSON file
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
