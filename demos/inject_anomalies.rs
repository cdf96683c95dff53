//! Anomaly injection walkthrough
//!
//! Builds a field catalog and a clean periodic trace for one CAN
//! identifier, then runs all nine anomaly generators over it and prints
//! the resulting ground-truth labels.
//!
//! Run with: `cargo run --example inject_anomalies`

use canomaly::{
    choose_window, AnomalySpec, CatalogEntry, FieldCatalog, FieldDescriptor, Frame,
    FrameSequence, InjectionManifest, Injector, InterleaveMode, Payload, ValueType, Variability,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SEED: u64 = 42;

fn main() {
    println!("=== Canomaly Injection Example ===\n");

    // Field layout of identifier 0x0DE: an 8-bit rolling counter, a
    // 12-bit signed torque, a 4-bit gear code and a 16-bit speed.
    let entry = CatalogEntry::new(64)
        .with_field(FieldDescriptor::new(
            "counter",
            0,
            8,
            ValueType::Unsigned,
            Variability::Variable,
        ))
        .with_field(FieldDescriptor::new(
            "torque",
            8,
            12,
            ValueType::Signed,
            Variability::Variable,
        ))
        .with_field(
            FieldDescriptor::new("gear", 20, 4, ValueType::EnumLike, Variability::Variable)
                .with_observed_values([0, 1, 2, 3, 4, 5]),
        )
        .with_field(FieldDescriptor::new(
            "speed",
            24,
            16,
            ValueType::Unsigned,
            Variability::Variable,
        ));

    let mut catalog = FieldCatalog::new();
    catalog.insert(0x0DE, entry).expect("valid catalog entry");

    // Clean periodic trace: 100 frames at 10ms, counter wrapping at 16,
    // speed ramping slowly.
    let trace = FrameSequence::from_frames(
        (0..100u64)
            .map(|i| {
                let speed = 0x0400 + (i * 3) as u16 as u64;
                let mut bytes = vec![0u8; 8];
                bytes[0] = (i % 16) as u8;
                bytes[3] = (speed >> 8) as u8;
                bytes[4] = (speed & 0xFF) as u8;
                Frame::new(0x0DE, i * 10, Payload::from_bytes(bytes))
            })
            .collect(),
    );
    println!(
        "Base trace: {} frames of identifier 0x{:03X}\n",
        trace.len(),
        0x0DE
    );

    let injector = Injector::new(&catalog);
    let mut rng = StdRng::seed_from_u64(SEED);

    // A burst of frames from a second identifier, for the interleave case
    let foreign = FrameSequence::from_frames(
        (0..20u64)
            .map(|i| Frame::new(0x0DF, 5 + i * 10, Payload::from_bytes(vec![0xFF; 8])))
            .collect(),
    );

    // Field anomalies land in a window chosen the way a dataset builder
    // would: no earlier than a third into the trace, long enough to matter.
    let window = choose_window(trace.len(), 25, &mut rng).expect("anomaly fits");
    let targets: Vec<usize> = window.clone().collect();

    let specs: Vec<(&str, AnomalySpec)> = vec![
        (
            "interleave",
            AnomalySpec::Interleave {
                other: foreign,
                mode: InterleaveMode::Random,
            },
        ),
        (
            "discontinuity",
            AnomalySpec::Discontinuity {
                window: window.clone(),
                magnitude: 2_000,
            },
        ),
        (
            "reverse",
            AnomalySpec::Reverse {
                window: window.clone(),
            },
        ),
        (
            "drop",
            AnomalySpec::Drop {
                indices: targets.clone(),
            },
        ),
        (
            "set_maximum",
            AnomalySpec::SetMaximum {
                identifier: 0x0DE,
                field: "speed".to_string(),
                targets: targets.clone(),
            },
        ),
        (
            "set_minimum",
            AnomalySpec::SetMinimum {
                identifier: 0x0DE,
                field: "torque".to_string(),
                targets: targets.clone(),
            },
        ),
        (
            "set_constant",
            AnomalySpec::SetConstant {
                identifier: 0x0DE,
                field: "gear".to_string(),
                value: 2,
                targets: targets.clone(),
            },
        ),
        (
            "set_random",
            AnomalySpec::SetRandom {
                identifier: 0x0DE,
                field: "gear".to_string(),
                targets: targets.clone(),
            },
        ),
        (
            "replay",
            AnomalySpec::Replay {
                identifier: 0x0DE,
                field: "counter".to_string(),
                source_index: window.start,
                targets: targets.clone(),
            },
        ),
    ];

    println!(
        "{:<15} {:<8} {:<10} {:<10} {}",
        "Anomaly", "Frames", "Affected", "Field", "First affected indices"
    );
    println!("{}", "-".repeat(70));

    let mut manifest = InjectionManifest::new("walkthrough")
        .with_description("one injection per anomaly type over a clean 100-frame trace")
        .with_seed(SEED);

    for (i, (name, spec)) in specs.iter().enumerate() {
        let (out, label) = injector
            .inject(&trace, spec, &mut rng)
            .expect("injection succeeds");

        let preview: Vec<String> = label
            .affected_indices
            .iter()
            .take(5)
            .map(|idx| idx.to_string())
            .collect();
        println!(
            "{:<15} {:<8} {:<10} {:<10} [{}{}]",
            name,
            out.len(),
            label.affected_indices.len(),
            label.affected_field.as_deref().unwrap_or("-"),
            preview.join(", "),
            if label.affected_indices.len() > 5 {
                ", …"
            } else {
                ""
            }
        );

        manifest.record(i, spec.identifier(), label);
    }

    println!("{}", "-".repeat(70));
    println!("\n=== Ground truth ===\n");
    println!(
        "{} labeled injections, seed {}",
        manifest.injections.len(),
        SEED
    );
    println!(
        "Manifest JSON:\n{}",
        manifest.to_json().expect("manifest serializes")
    );
}
