// Canomaly - Labeled anomaly injection for automotive bus traces
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Canomaly - CAN Anomaly Injection
//!
//! Synthesizes labeled anomalous sequences from recordings of automotive
//! bus traffic, for training and evaluating anomaly-detection models.
//!
//! ## Key Features
//!
//! - **Sequence-level anomalies**: Interleave, Discontinuity, Reverse, Drop
//! - **Field-level anomalies**: SetMaximum, SetMinimum, SetConstant,
//!   SetRandom, Replay — driven by a per-identifier field catalog
//! - **Ground truth**: every injection returns an [`AnomalyLabel`]
//! - **Reproducible**: all randomness flows through a caller-supplied,
//!   seedable rng
//!
//! ## Quick Start
//!
//! ```rust
//! use canomaly::{
//!     AnomalySpec, CatalogEntry, FieldCatalog, FieldDescriptor, Frame, FrameSequence,
//!     Injector, Payload, ValueType, Variability,
//! };
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! // Describe identifier 0x100: 64-bit payload with an 8-bit counter
//! let entry = CatalogEntry::new(64).with_field(FieldDescriptor::new(
//!     "counter", 0, 8, ValueType::Unsigned, Variability::Variable,
//! ));
//! let mut catalog = FieldCatalog::new();
//! catalog.insert(0x100, entry)?;
//!
//! // A clean periodic sequence of ten frames
//! let seq = FrameSequence::from_frames(
//!     (0..10u64)
//!         .map(|i| {
//!             let payload = Payload::from_bytes(vec![i as u8, 0, 0, 0, 0, 0, 0, 0]);
//!             Frame::new(0x100, i, payload)
//!         })
//!         .collect(),
//! );
//!
//! // Stuck-at-max fault on frames 3 and 7, with ground truth
//! let injector = Injector::new(&catalog);
//! let mut rng = StdRng::seed_from_u64(42);
//! let spec = AnomalySpec::SetMaximum {
//!     identifier: 0x100,
//!     field: "counter".to_string(),
//!     targets: vec![3, 7],
//! };
//! let (anomalous, label) = injector.inject(&seq, &spec, &mut rng)?;
//!
//! let counter = catalog.field(0x100, "counter")?;
//! assert_eq!(anomalous.get(3).unwrap().field_value(counter)?, 255);
//! assert_eq!(label.affected_indices, vec![3, 7].into_iter().collect());
//! # Ok::<(), canomaly::CanomalyError>(())
//! ```
//!
//! ## Modules
//!
//! - [`frame`]: Payload bit arrays, frames and frame sequences
//! - [`catalog`]: Per-identifier field layout descriptors
//! - [`sequence`]: Sequence-level generators (frame order/membership)
//! - [`field`]: Field-level generators (payload bits)
//! - [`injector`]: Parameter bundles and the dispatching orchestrator
//! - [`label`]: Ground-truth labels and dataset manifests
//! - [`trace`]: Loading pre-decoded frame traces
//!
//! ## Design
//!
//! Generators are pure functions over their inputs: no global state, no
//! I/O, no hidden randomness. The catalog is read-only after load and may
//! be shared across threads without locking, so a caller can parallelize
//! dataset generation by plain fan-out.

// Modules
pub mod catalog;
pub mod error;
pub mod field;
pub mod frame;
pub mod injector;
pub mod label;
pub mod sequence;
pub mod trace;

// Re-exports for convenient access
pub use catalog::{CatalogEntry, FieldCatalog, FieldDescriptor, ValueType, Variability};
pub use error::{CanomalyError, CatalogError, InjectError, Result, TraceError};
pub use field::{replay, set_constant, set_maximum, set_minimum, set_random};
pub use frame::{Frame, FrameSequence, Payload};
pub use injector::{choose_window, AnomalySpec, Injector, InterleaveMode};
pub use label::{AnomalyKind, AnomalyLabel, InjectionManifest, InjectionRecord};
pub use sequence::{discontinuity, drop_frames, interleave, reverse};
pub use trace::{frames_from_records, load_trace, records_from_frames, save_trace, TraceRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
