//! The cancellable acquisition loop.

use chrono::Local;
use daqline_core::{
    ChannelAggregator, DaqError, DerivedColumns, MeasurementSource, OutputSink, Reading, RunConfig,
    Sample, Unit, convert, date_stamp, elapsed_minutes, time_stamp,
};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;

/// Lifecycle of one acquisition run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Constructed, device not yet configured.
    Idle,
    /// Cycling: read all channels, emit, sleep, repeat.
    Running,
    /// Cancellation observed; no further reads, flushing output.
    Stopping,
    /// Device released, output flushed.
    Stopped,
}

/// Counters describing a finished (or aborted) run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Cycles the loop started.
    pub cycles_attempted: u64,
    /// Samples emitted to the sink; at most `cycles_attempted`.
    pub samples_emitted: u64,
    /// Cycles discarded after a transient channel-read failure.
    pub cycles_discarded: u64,
}

/// Drives sampling cycles against a [`MeasurementSource`] until cancelled.
///
/// Each cycle reads every configured channel in the fixed caller-specified
/// order, assembles one internally-consistent [`Sample`], records it into
/// the aggregator, and emits one record to the sink. The cancellation
/// token is checked only at cycle boundaries, so a stop request never
/// tears a cycle in half: the in-flight cycle completes (or is discarded
/// whole) and no further cycle starts.
#[derive(Debug)]
pub struct Poller {
    cfg: RunConfig,
    aggregator: ChannelAggregator,
    phase: RunPhase,
}

impl Poller {
    /// Build a poller for the given run configuration.
    ///
    /// # Errors
    /// Returns `DaqError::InvalidConfig` for an empty or inconsistent
    /// channel table; a structurally bad run never starts.
    pub fn new(cfg: RunConfig) -> Result<Self, DaqError> {
        cfg.validate()?;
        let aggregator = ChannelAggregator::new(&cfg.channels);
        Ok(Self {
            cfg,
            aggregator,
            phase: RunPhase::Idle,
        })
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Read-only view of the per-channel history accumulated so far.
    #[must_use]
    pub const fn aggregator(&self) -> &ChannelAggregator {
        &self.aggregator
    }

    /// Run the acquisition loop until the token is cancelled or a fatal
    /// error occurs.
    ///
    /// The device session is acquired once here and released exactly once
    /// on every exit path; buffered output is flushed on every exit path,
    /// so whatever was produced before a failure stays valid and usable.
    ///
    /// # Errors
    /// Returns `DaqError::DeviceConnection` if the device cannot be
    /// acquired, configured, or read at the session level, and
    /// `DaqError::Sink` if output cannot be written. Transient
    /// `ChannelRead` faults are absorbed: the cycle is discarded, logged,
    /// and the loop continues.
    pub async fn run(
        &mut self,
        source: &mut dyn MeasurementSource,
        sink: &mut dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<RunReport, DaqError> {
        source.connect().await?;

        let outcome = self.drive(source, sink, cancel).await;

        self.phase = RunPhase::Stopping;
        let flushed = sink.flush();
        let released = source.disconnect().await;
        self.phase = RunPhase::Stopped;
        info!(source = source.name(), "device released");

        let report = outcome?;
        flushed?;
        released?;
        Ok(report)
    }

    async fn drive(
        &mut self,
        source: &mut dyn MeasurementSource,
        sink: &mut dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<RunReport, DaqError> {
        let idn = source.identify().await?;
        info!(source = source.name(), device = %idn, "connected");

        for spec in &self.cfg.channels {
            source.configure_channel(spec).await?;
        }
        self.phase = RunPhase::Running;

        sink.write_header(&self.columns())?;

        let start = Local::now().time();
        let mut report = RunReport::default();
        let mut cancel_wait = cancel.clone();

        while !cancel.is_cancelled() {
            report.cycles_attempted += 1;
            match self.cycle(source, sink, start).await {
                Ok(()) => report.samples_emitted += 1,
                Err(e) if e.is_transient() => {
                    report.cycles_discarded += 1;
                    warn!(
                        cycle = report.cycles_attempted,
                        error = %e,
                        "cycle discarded"
                    );
                }
                Err(e) => return Err(e),
            }
            // Fixed inter-cycle delay, cut short only by cancellation. The
            // cycle itself is never interrupted.
            tokio::select! {
                () = tokio::time::sleep(self.cfg.interval) => {}
                () = cancel_wait.cancelled() => {}
            }
        }

        info!(
            cycles = report.cycles_attempted,
            emitted = report.samples_emitted,
            discarded = report.cycles_discarded,
            "run cancelled"
        );
        Ok(report)
    }

    /// One full pass over all channels. Any read error aborts the whole
    /// cycle before anything is recorded or emitted, so partial samples
    /// never leave this function.
    async fn cycle(
        &mut self,
        source: &mut dyn MeasurementSource,
        sink: &mut dyn OutputSink,
        start: chrono::NaiveTime,
    ) -> Result<(), DaqError> {
        let now = Local::now();

        let mut readings = Vec::with_capacity(self.cfg.channels.len());
        for spec in &self.cfg.channels {
            let value = source.read_channel(&spec.id).await?;
            debug!(channel = %spec.name, value, "read");
            readings.push(Reading {
                channel: spec.name.clone(),
                value,
                unit: spec.unit,
            });
        }

        let sample = Sample {
            date: date_stamp(&now),
            time_key: time_stamp(&now),
            readings,
        };
        self.aggregator
            .record(&sample, elapsed_minutes(start, now.time()));

        let mut fields = Vec::with_capacity(self.cfg.channels.len() + 4);
        fields.push(sample.date.clone());
        fields.push(sample.time_key.clone());
        match &self.cfg.derived {
            DerivedColumns::ShuntPower {
                voltage_channel,
                shunt_channel,
                amps_per_volt,
            } => {
                let volts = reading_value(&sample, voltage_channel)?;
                let shunt = reading_value(&sample, shunt_channel)?;
                let current = amps_per_volt * shunt;
                let power_kw = current * volts / 1000.0;
                fields.push(format!("{volts:.6}"));
                fields.push(format!("{current:.6}"));
                fields.push(format!("{shunt:.6}"));
                fields.push(format!("{power_kw:.6}"));
            }
            derived => {
                fields.extend(sample.readings.iter().map(|r| format!("{:.6}", r.value)));
                if matches!(derived, DerivedColumns::AverageTemp) {
                    let avg_c = self.aggregator.cycle_average(&sample)?;
                    let avg_f = convert(avg_c, Unit::Celsius, Unit::Fahrenheit)?;
                    fields.push(format!("{avg_c:.6}"));
                    fields.push(format!("{avg_f:.6}"));
                }
            }
        }
        sink.write_record(&fields)?;
        Ok(())
    }

    /// Output column order for the run: `Date`, `Time`, one column per
    /// channel in configuration order, then any derived columns. The
    /// shunt-power layout interleaves instead, keeping the derived current
    /// between the two measured voltages as the capture files have it.
    fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.cfg.channels.len() + 4);
        columns.push("Date".to_string());
        columns.push("Time".to_string());
        match &self.cfg.derived {
            DerivedColumns::ShuntPower {
                voltage_channel,
                shunt_channel,
                ..
            } => {
                columns.push(format!("{voltage_channel} (V)"));
                columns.push("Current (A)".to_string());
                columns.push(format!("{shunt_channel} (V)"));
                columns.push("Power (kW)".to_string());
            }
            derived => {
                columns.extend(
                    self.cfg
                        .channels
                        .iter()
                        .map(|c| format!("{} ({})", c.name, c.unit.suffix())),
                );
                if matches!(derived, DerivedColumns::AverageTemp) {
                    columns.push("Avg Temp (C)".to_string());
                    columns.push("Avg Temp (F)".to_string());
                }
            }
        }
        columns
    }
}

/// Value of the named channel within a complete sample.
fn reading_value(sample: &Sample, channel: &str) -> Result<f64, DaqError> {
    sample
        .readings
        .iter()
        .find(|r| r.channel == channel)
        .map(|r| r.value)
        .ok_or_else(|| {
            DaqError::invalid_config(format!(
                "derived column source is not a configured channel: {channel}"
            ))
        })
}
