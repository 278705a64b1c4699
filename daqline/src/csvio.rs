//! CSV encodings for run output and for the two historical capture
//! layouts feeding the offline join.
//!
//! The core never sees any of this: it talks to an [`OutputSink`] and to
//! fully-loaded record maps. This module is where the concrete file
//! formats live.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use daqline_core::{
    DaqError, JoinOutcome, LoadRecord, MeterRecord, OutputSink, normalize_time_key,
};
use tracing::debug;

/// Rows of instrument preamble before the power-meter export's data rows.
const METER_PREAMBLE_ROWS: usize = 11;
/// Minimum column count of a usable power-meter data row.
const METER_MIN_COLUMNS: usize = 27;
/// Minimum column count of a usable datalogger data row.
const LOAD_MIN_COLUMNS: usize = 6;

/// Per-phase and total-power column indices in the power-meter export.
const METER_COLUMNS: [usize; 10] = [3, 4, 5, 9, 10, 11, 15, 16, 17, 24];
const METER_DATE_COLUMN: usize = 1;
const METER_TIME_COLUMN: usize = 2;

/// Header of the combined output, efficiency last.
const JOINED_HEADER: [&str; 16] = [
    "Date",
    "Time",
    "V1 (V)",
    "A1 (A)",
    "P1 (kW)",
    "V2 (V)",
    "A2 (A)",
    "P2 (kW)",
    "V3 (V)",
    "A3 (A)",
    "P3 (kW)",
    "Total Power (kW)",
    "DC Volt (V)",
    "DC Current (A)",
    "DC Power (W)",
    "Efficiency",
];

/// [`OutputSink`] writing one CSV file per run.
pub struct CsvSink {
    writer: Writer<File>,
}

impl CsvSink {
    /// Create (truncating) the output file for a run.
    ///
    /// # Errors
    /// Returns `DaqError::Sink` if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DaqError> {
        let writer = Writer::from_path(path.as_ref()).map_err(|e| DaqError::sink(e.to_string()))?;
        Ok(Self { writer })
    }
}

impl OutputSink for CsvSink {
    fn write_header(&mut self, columns: &[String]) -> Result<(), DaqError> {
        self.writer
            .write_record(columns)
            .map_err(|e| DaqError::sink(e.to_string()))
    }

    fn write_record(&mut self, fields: &[String]) -> Result<(), DaqError> {
        self.writer
            .write_record(fields)
            .map_err(|e| DaqError::sink(e.to_string()))
    }

    fn flush(&mut self) -> Result<(), DaqError> {
        self.writer.flush().map_err(|e| DaqError::sink(e.to_string()))
    }
}

fn parse_field(record: &StringRecord, idx: usize) -> Result<f64, DaqError> {
    let raw = record.get(idx).unwrap_or_default();
    raw.parse::<f64>()
        .map_err(|_| DaqError::invalid_config(format!("unparseable numeric field: {raw:?}")))
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, DaqError> {
    let file = File::open(path).map_err(|e| {
        DaqError::invalid_config(format!("cannot open {}: {e}", path.display()))
    })?;
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file))
}

/// Load a power-meter export keyed by canonical time.
///
/// The export carries an 11-row instrument preamble and a wide column
/// layout; rows too short to hold the total-power column are skipped, as
/// the capture tool pads the file with partial rows. Later rows win on
/// duplicate time keys.
///
/// # Errors
/// Returns `DaqError::InvalidConfig` for unreadable files or unparseable
/// numeric fields and `DaqError::MalformedTime` for a bad timestamp.
pub fn read_meter_series(path: impl AsRef<Path>) -> Result<HashMap<String, MeterRecord>, DaqError> {
    let mut reader = open_reader(path.as_ref())?;
    let mut out = HashMap::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DaqError::invalid_config(e.to_string()))?;
        if row < METER_PREAMBLE_ROWS || record.len() < METER_MIN_COLUMNS {
            continue;
        }
        let key = normalize_time_key(record.get(METER_TIME_COLUMN).unwrap_or_default())?;
        let fields = METER_COLUMNS
            .iter()
            .map(|&idx| parse_field(&record, idx))
            .collect::<Result<Vec<f64>, _>>()?;
        let total_power = fields[METER_COLUMNS.len() - 1];
        out.insert(
            key,
            MeterRecord {
                date: record.get(METER_DATE_COLUMN).unwrap_or_default().to_string(),
                fields,
                total_power,
            },
        );
    }
    debug!(rows = out.len(), "meter series loaded");
    Ok(out)
}

/// Load a datalogger export in its original row order, one record per
/// second.
///
/// Layout: one header row, then `Date, Time, Voltage, Current, <shunt>,
/// Power`. Rows shorter than the power column are skipped. The logger
/// captures several rows per second but its timestamps only resolve to
/// the second, so rows sharing a key collapse to the latest one, at the
/// position the key first appeared.
///
/// # Errors
/// Returns `DaqError::InvalidConfig` for unreadable files or unparseable
/// numeric fields and `DaqError::MalformedTime` for a bad timestamp.
pub fn read_load_series(path: impl AsRef<Path>) -> Result<Vec<(String, LoadRecord)>, DaqError> {
    let mut reader = open_reader(path.as_ref())?;
    let mut out: Vec<(String, LoadRecord)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DaqError::invalid_config(e.to_string()))?;
        if row == 0 || record.len() < LOAD_MIN_COLUMNS {
            continue;
        }
        let key = normalize_time_key(record.get(1).unwrap_or_default())?;
        let volt = parse_field(&record, 2)?;
        let current = parse_field(&record, 3)?;
        let power = parse_field(&record, 5)?;
        let loaded = LoadRecord {
            date: record.get(0).unwrap_or_default().to_string(),
            fields: vec![volt, current, power],
            power,
        };
        if let Some(&at) = seen.get(&key) {
            out[at].1 = loaded;
        } else {
            seen.insert(key.clone(), out.len());
            out.push((key, loaded));
        }
    }
    debug!(rows = out.len(), "load series loaded");
    Ok(out)
}

/// Persist a join outcome with the combined header, efficiency last.
///
/// The DC voltage and current columns are fixed to three decimals, as the
/// historical merges have them; power keeps its loaded precision.
///
/// # Errors
/// Returns `DaqError::Sink` on any write failure.
pub fn write_joined(path: impl AsRef<Path>, outcome: &JoinOutcome) -> Result<(), DaqError> {
    let mut writer =
        Writer::from_path(path.as_ref()).map_err(|e| DaqError::sink(e.to_string()))?;
    writer
        .write_record(JOINED_HEADER)
        .map_err(|e| DaqError::sink(e.to_string()))?;

    for rec in &outcome.records {
        let mut fields = Vec::with_capacity(JOINED_HEADER.len());
        fields.push(rec.date.clone());
        fields.push(rec.time_key.clone());
        fields.extend(rec.left_fields.iter().map(ToString::to_string));
        fields.extend(rec.right_fields.iter().enumerate().map(|(i, v)| {
            if i < 2 {
                format!("{v:.3}")
            } else {
                v.to_string()
            }
        }));
        fields.push(format!("{:.4}", rec.derived_metric));
        writer
            .write_record(&fields)
            .map_err(|e| DaqError::sink(e.to_string()))?;
    }
    writer.flush().map_err(|e| DaqError::sink(e.to_string()))
}
