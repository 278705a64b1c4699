use std::time::Duration;

use daqline::{CsvSink, Poller, run_until_stopped};
use daqline_core::{ChannelSpec, DerivedColumns, ProbeMode, RunConfig, Unit};
use daqline_mock::{MockInstrument, ScriptedControl};

/// Thermal-test channel table: device slots paired with the probe
/// placement names that become the CSV columns.
const CHANNELS: [(&str, &str); 6] = [
    ("105", "HS2"),
    ("102", "T3"),
    ("119", "L10"),
    ("112", "Output Fuse"),
    ("117", "Top"),
    ("101", "Exhaust Fan"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 1. A deterministic instrument standing in for the bench DAQ.
    let mut source = CHANNELS
        .iter()
        .enumerate()
        .fold(MockInstrument::new(), |mock, (i, &(id, _))| {
            mock.with_channel(id, 21.0 + i as f64)
        });

    // 2. One configuration-driven run instead of a per-test script.
    let cfg = RunConfig {
        channels: CHANNELS
            .iter()
            .map(|(id, name)| ChannelSpec {
                id: (*id).to_string(),
                name: (*name).to_string(),
                unit: Unit::Celsius,
                mode: ProbeMode::Thermocouple { tc_type: 'J' },
            })
            .collect(),
        interval: Duration::from_millis(500),
        derived: DerivedColumns::AverageTemp,
    };
    let mut poller = Poller::new(cfg)?;

    // 3. Stream records to a CSV file as they are captured.
    let mut sink = CsvSink::create("thermal_log.csv")?;

    // 4. A scripted stop after a few cycles; swap in
    //    `daqline::StdinControl::new()` to type `stop` interactively.
    let control = ScriptedControl::new(&["stop"]).with_delay(Duration::from_secs(3));

    let report = run_until_stopped(&mut poller, &mut source, &mut sink, Box::new(control)).await?;

    println!(
        "run finished: {} cycles, {} samples emitted, {} discarded",
        report.cycles_attempted, report.samples_emitted, report.cycles_discarded
    );
    for (name, series) in poller.aggregator().history() {
        if let Some((minutes, value)) = series.last() {
            println!("  {name}: {} points, last {value:.3} C at {minutes:.2} min", series.len());
        }
    }
    Ok(())
}
