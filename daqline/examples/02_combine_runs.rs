use daqline::{read_load_series, read_meter_series, write_joined};
use daqline_core::join_series;

/// Correlate a power-meter export with a datalogger export and write the
/// combined record stream with the efficiency column appended.
///
/// Usage: `cargo run --example 02_combine_runs -- meter.csv load.csv out.csv`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(meter), Some(load), Some(out)) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: 02_combine_runs <meter.csv> <load.csv> <out.csv>");
        std::process::exit(2);
    };

    let left = read_meter_series(&meter)?;
    let right = read_load_series(&load)?;

    let outcome = join_series(&left, &right);
    for key in &outcome.unmatched {
        println!("no matching meter record for time: {key}");
    }

    write_joined(&out, &outcome)?;
    println!(
        "wrote {} joined records ({} unmatched) to {out}",
        outcome.records.len(),
        outcome.unmatched.len()
    );
    Ok(())
}
