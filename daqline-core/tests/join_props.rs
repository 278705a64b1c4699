use std::collections::HashMap;

use daqline_core::{LoadRecord, MeterRecord, join_series};
use proptest::prelude::*;

fn meter(total_power: f64) -> MeterRecord {
    MeterRecord {
        date: "08/30/2026".to_string(),
        fields: vec![230.1, 1.2, total_power],
        total_power,
    }
}

fn load(power: f64) -> LoadRecord {
    LoadRecord {
        date: "08/30/2026".to_string(),
        fields: vec![48.0, power / 48.0, power],
        power,
    }
}

#[test]
fn matched_key_yields_ratio() {
    let left: HashMap<_, _> = [("10:00:00".to_string(), meter(100.0))].into();
    let right = vec![("10:00:00".to_string(), load(50.0))];

    let outcome = join_series(&left, &right);
    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.unmatched.is_empty());
    assert!((outcome.records[0].derived_metric - 0.5).abs() < 1e-12);
    assert_eq!(outcome.records[0].time_key, "10:00:00");
    assert_eq!(outcome.records[0].left_fields, vec![230.1, 1.2, 100.0]);
}

#[test]
fn zero_total_power_yields_explicit_zero() {
    let left: HashMap<_, _> = [("10:00:00".to_string(), meter(0.0))].into();
    let right = vec![("10:00:00".to_string(), load(50.0))];

    let outcome = join_series(&left, &right);
    assert_eq!(outcome.records.len(), 1);
    assert!((outcome.records[0].derived_metric).abs() < f64::EPSILON);
}

#[test]
fn missing_key_is_reported_not_emitted() {
    let left: HashMap<String, MeterRecord> = HashMap::new();
    let right = vec![("10:00:01".to_string(), load(50.0))];

    let outcome = join_series(&left, &right);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.unmatched, vec!["10:00:01".to_string()]);
}

#[test]
fn output_follows_driving_series_order() {
    let left: HashMap<_, _> = [
        ("10:00:02".to_string(), meter(10.0)),
        ("10:00:00".to_string(), meter(20.0)),
        ("10:00:01".to_string(), meter(30.0)),
    ]
    .into();
    // Deliberately not sorted: insertion order of the capture wins.
    let right = vec![
        ("10:00:02".to_string(), load(1.0)),
        ("10:00:00".to_string(), load(2.0)),
        ("10:00:01".to_string(), load(3.0)),
    ];

    let outcome = join_series(&left, &right);
    let keys: Vec<_> = outcome.records.iter().map(|r| r.time_key.as_str()).collect();
    assert_eq!(keys, vec!["10:00:02", "10:00:00", "10:00:01"]);
}

fn arb_key() -> impl Strategy<Value = String> {
    (0u32..24, 0u32..60, 0u32..60).prop_map(|(h, m, s)| format!("{h:02}:{m:02}:{s:02}"))
}

proptest! {
    /// Joining a series against itself yields one record per key with a
    /// derived metric of exactly 1.0 wherever the power is nonzero.
    #[test]
    fn self_join_is_identity(entries in proptest::collection::btree_map(arb_key(), 1.0f64..5000.0, 0..50)) {
        let right: Vec<(String, LoadRecord)> = entries
            .iter()
            .map(|(k, p)| (k.clone(), load(*p)))
            .collect();
        let left: HashMap<String, MeterRecord> = entries
            .iter()
            .map(|(k, p)| (k.clone(), meter(*p)))
            .collect();

        let outcome = join_series(&left, &right);
        prop_assert!(outcome.unmatched.is_empty());
        prop_assert_eq!(outcome.records.len(), right.len());
        for rec in &outcome.records {
            prop_assert!((rec.derived_metric - 1.0).abs() < 1e-12);
        }
    }

    /// Every driving key lands in exactly one of the two output lists.
    #[test]
    fn every_key_is_accounted_for(
        left_keys in proptest::collection::btree_set(arb_key(), 0..40),
        right_keys in proptest::collection::vec(arb_key(), 0..40),
    ) {
        let left: HashMap<String, MeterRecord> = left_keys
            .iter()
            .map(|k| (k.clone(), meter(100.0)))
            .collect();
        let right: Vec<(String, LoadRecord)> = right_keys
            .iter()
            .map(|k| (k.clone(), load(50.0)))
            .collect();

        let outcome = join_series(&left, &right);
        prop_assert_eq!(outcome.records.len() + outcome.unmatched.len(), right.len());
        for rec in &outcome.records {
            prop_assert!(left.contains_key(&rec.time_key));
        }
        for key in &outcome.unmatched {
            prop_assert!(!left.contains_key(key));
        }
    }
}
