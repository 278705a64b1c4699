use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use daqline::{CsvSink, Poller, cancel_pair, read_load_series, read_meter_series, write_joined};
use daqline_core::{
    ChannelSpec, DerivedColumns, MeterRecord, OutputSink, ProbeMode, RunConfig, Unit, join_series,
};
use daqline_mock::MockInstrument;

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("daqline-test-{}-{name}", std::process::id()));
    path
}

/// Build a power-meter export row: 27 columns with the date, 12-hour
/// time, per-phase values, and total power in their historical slots.
fn meter_row(time: &str, total: f64) -> Vec<String> {
    let mut row = vec![String::new(); 27];
    row[1] = "08/30/2026".to_string();
    row[2] = time.to_string();
    for (i, idx) in [3usize, 4, 5, 9, 10, 11, 15, 16, 17].into_iter().enumerate() {
        row[idx] = format!("{}", 10 * (i + 1));
    }
    row[24] = total.to_string();
    row
}

fn write_meter_fixture(path: &PathBuf) {
    // Preamble and data rows have different widths.
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .unwrap();
    // The instrument writes 11 preamble rows before any data.
    for i in 0..11 {
        writer.write_record([format!("preamble {i}")]).unwrap();
    }
    writer.write_record(meter_row("10:00:00 AM", 100.0)).unwrap();
    writer.write_record(meter_row("10:00:01 AM", 0.0)).unwrap();
    // Truncated row, as the capture tool leaves behind on power loss.
    writer.write_record(["08/30/2026", "10:00:03 AM"]).unwrap();
    writer.flush().unwrap();
}

fn write_load_fixture(path: &PathBuf) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record([
            "Date",
            "Time",
            "Voltage (V)",
            "Current (A)",
            "Voltage of shunt (V)",
            "Power (kW)",
        ])
        .unwrap();
    for (time, power) in [("10:00:00", 50.0), ("10:00:01", 30.0), ("10:00:02", 20.0)] {
        writer
            .write_record([
                "08/30/2026",
                time,
                "48.1",
                "10.5",
                "0.0021",
                &power.to_string(),
            ])
            .unwrap();
    }
    writer.flush().unwrap();
}

#[test]
fn meter_loader_skips_preamble_and_short_rows() {
    let path = temp_path("meter.csv");
    write_meter_fixture(&path);

    let series = read_meter_series(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(series.len(), 2);
    let rec = &series["10:00:00"];
    assert_eq!(rec.date, "08/30/2026");
    assert_eq!(rec.fields.len(), 10);
    assert!((rec.total_power - 100.0).abs() < f64::EPSILON);
    // The 12-hour keys were canonicalized on load.
    assert!(series.contains_key("10:00:01"));
}

#[test]
fn load_loader_preserves_capture_order() {
    let path = temp_path("load.csv");
    write_load_fixture(&path);

    let series = read_load_series(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let keys: Vec<_> = series.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["10:00:00", "10:00:01", "10:00:02"]);
    assert!((series[0].1.power - 50.0).abs() < f64::EPSILON);
    assert_eq!(series[0].1.fields, vec![48.1, 10.5, 50.0]);
}

#[test]
fn rows_within_one_second_collapse_to_the_latest() {
    // The datalogger captures every 0.2 s, so a whole burst of rows can
    // share one HH:MM:SS key. Only the latest row of each burst counts.
    let path = temp_path("burst.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer
        .write_record(["Date", "Time", "V", "A", "Shunt", "P"])
        .unwrap();
    for power in [50.0, 51.0, 52.0, 53.0, 54.0] {
        writer
            .write_record([
                "08/30/2026",
                "10:00:00",
                "48.1",
                "10.5",
                "0.0021",
                &power.to_string(),
            ])
            .unwrap();
    }
    writer
        .write_record(["08/30/2026", "10:00:01", "48.0", "10.4", "0.0021", "49.9"])
        .unwrap();
    writer.flush().unwrap();

    let series = read_load_series(&path).unwrap();
    fs::remove_file(&path).unwrap();

    // One entry per key, at the position the key first appeared.
    let keys: Vec<_> = series.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["10:00:00", "10:00:01"]);
    assert!((series[0].1.power - 54.0).abs() < f64::EPSILON);

    let mut left = HashMap::new();
    left.insert(
        "10:00:00".to_string(),
        MeterRecord {
            date: "08/30/2026".to_string(),
            fields: vec![108.0],
            total_power: 108.0,
        },
    );
    let outcome = join_series(&left, &series);
    assert_eq!(outcome.records.len(), 1);
    assert!((outcome.records[0].derived_metric - 0.5).abs() < 1e-12);
}

#[test]
fn merge_round_trips_through_files() {
    let meter_path = temp_path("merge-meter.csv");
    let load_path = temp_path("merge-load.csv");
    let out_path = temp_path("merge-out.csv");
    write_meter_fixture(&meter_path);
    write_load_fixture(&load_path);

    let left = read_meter_series(&meter_path).unwrap();
    let right = read_load_series(&load_path).unwrap();
    let outcome = join_series(&left, &right);

    // 10:00:02 has no meter partner; the zero-total row still joins.
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.unmatched, vec!["10:00:02".to_string()]);
    assert!((outcome.records[0].derived_metric - 0.5).abs() < 1e-12);
    assert!(outcome.records[1].derived_metric.abs() < f64::EPSILON);

    write_joined(&out_path, &outcome).unwrap();

    let mut reader = csv::Reader::from_path(&out_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("Date"));
    assert_eq!(headers.get(15), Some("Efficiency"));
    let rows: Vec<_> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(15), Some("0.5000"));
    assert_eq!(rows[1].get(15), Some("0.0000"));
    // DC volt and current carry three decimals; power keeps its precision.
    assert_eq!(rows[0].get(12), Some("48.100"));
    assert_eq!(rows[0].get(13), Some("10.500"));
    assert_eq!(rows[0].get(14), Some("50"));

    for path in [&meter_path, &load_path, &out_path] {
        fs::remove_file(path).unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn dual_dmm_capture_feeds_the_load_loader() {
    // A shunt-power run writes the same layout the offline loader reads,
    // so a fresh capture can go straight into a merge.
    let path = temp_path("dmm.csv");
    let cfg = RunConfig {
        channels: vec![
            ChannelSpec {
                id: "dmm1".to_string(),
                name: "Voltage".to_string(),
                unit: Unit::Volt,
                mode: ProbeMode::VoltageDc {
                    range: 100.0,
                    resolution: 0.001,
                },
            },
            ChannelSpec {
                id: "dmm2".to_string(),
                name: "Voltage of shunt".to_string(),
                unit: Unit::Volt,
                mode: ProbeMode::VoltageDc {
                    range: 10.0,
                    resolution: 0.0001,
                },
            },
        ],
        interval: Duration::from_secs(60),
        derived: DerivedColumns::ShuntPower {
            voltage_channel: "Voltage".to_string(),
            shunt_channel: "Voltage of shunt".to_string(),
            amps_per_volt: 5000.0,
        },
    };

    let mut source = MockInstrument::new()
        .with_channel("dmm1", 48.0)
        .with_channel("dmm2", 0.002);
    let mut sink = CsvSink::create(&path).unwrap();
    let mut poller = Poller::new(cfg).unwrap();

    let (handle, token) = cancel_pair();
    let run = poller.run(&mut source, &mut sink, &token);
    let canceller = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    };
    let (report, ()) = tokio::join!(run, canceller);
    report.unwrap();

    let series = read_load_series(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(series.len(), 1);
    let rec = &series[0].1;
    assert_eq!(rec.fields, vec![48.0, 10.0, 0.48]);
    assert!((rec.power - 0.48).abs() < f64::EPSILON);
}

#[test]
fn csv_sink_writes_header_and_records() {
    let path = temp_path("sink.csv");
    let mut sink = CsvSink::create(&path).unwrap();
    sink.write_header(&["Date".to_string(), "Time".to_string(), "HS2 (C)".to_string()])
        .unwrap();
    sink.write_record(&[
        "08/30/2026".to_string(),
        "10:00:00".to_string(),
        "21.500000".to_string(),
    ])
    .unwrap();
    sink.flush().unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.headers().unwrap().get(2), Some("HS2 (C)"));
    let rows: Vec<_> = reader.records().map(Result::unwrap).collect();
    fs::remove_file(&path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(2), Some("21.500000"));
}
