use std::collections::HashMap;

/// One record from the driven (higher-cadence) series, keyed by canonical
/// time.
///
/// `fields` carries the record's numeric columns in their persisted order;
/// `total_power` is the column the derived metric divides by.
#[derive(Clone, Debug, PartialEq)]
pub struct MeterRecord {
    /// Capture date, as persisted.
    pub date: String,
    /// Numeric columns in persisted order.
    pub fields: Vec<f64>,
    /// Total input power for the matching instant.
    pub total_power: f64,
}

/// One record from the driving (lower-cadence) series, keyed by canonical
/// time.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRecord {
    /// Capture date, as persisted.
    pub date: String,
    /// Numeric columns in persisted order.
    pub fields: Vec<f64>,
    /// Output power for the matching instant.
    pub power: f64,
}

/// One correlated record per time key present in both series. Never
/// mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinedRecord {
    /// Date taken from the driving record.
    pub date: String,
    /// Canonical `HH:MM:SS` join key.
    pub time_key: String,
    /// Columns from the driven (meter) record, original order.
    pub left_fields: Vec<f64>,
    /// Columns from the driving (load) record, original order.
    pub right_fields: Vec<f64>,
    /// `power / total_power`, or `0.0` when `total_power` is zero.
    pub derived_metric: f64,
}

/// Result of a join pass: matched records plus the keys that had no
/// partner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoinOutcome {
    /// One record per matched key, in driving-series order.
    pub records: Vec<JoinedRecord>,
    /// Driving-series keys with no matching driven entry, in order.
    pub unmatched: Vec<String>,
}

/// Correlate two fully-materialized series on their canonical time keys.
///
/// The `right` series drives iteration in its original insertion order
/// (historically the lower-cadence capture); each key is looked up in
/// `left`. Matched keys produce a [`JoinedRecord`] whose derived metric is
/// `right.power / left.total_power` — an explicit `0.0` when the meter
/// reports zero total power, since dividing by an idle instrument is an
/// expected operating condition, not a fault. Unmatched keys are reported
/// back to the caller, never silently dropped and never fatal.
///
/// Single pass over `right` with O(1) average lookups into `left`.
#[must_use]
pub fn join_series(
    left: &HashMap<String, MeterRecord>,
    right: &[(String, LoadRecord)],
) -> JoinOutcome {
    let mut outcome = JoinOutcome::default();
    for (key, load) in right {
        let Some(meter) = left.get(key) else {
            outcome.unmatched.push(key.clone());
            continue;
        };
        let derived_metric = if meter.total_power == 0.0 {
            0.0
        } else {
            load.power / meter.total_power
        };
        outcome.records.push(JoinedRecord {
            date: load.date.clone(),
            time_key: key.clone(),
            left_fields: meter.fields.clone(),
            right_fields: load.fields.clone(),
            derived_metric,
        });
    }
    outcome
}
