//! Per-channel running history and per-cycle aggregate computations.

use std::collections::HashMap;

use tracing::warn;

use crate::DaqError;
use crate::types::{ChannelSpec, Sample, Unit};

/// Accumulates per-channel `(elapsed_minutes, value)` pairs over a run.
///
/// The aggregator is the sole owner of the history; the polling loop is
/// its only writer. Channels are fixed at construction from the run's
/// channel table, and the history preserves that configuration order for
/// export and plotting.
#[derive(Debug)]
pub struct ChannelAggregator {
    /// Channel names in configuration order.
    order: Vec<String>,
    /// Append-only history per channel name.
    history: HashMap<String, Vec<(f64, f64)>>,
}

impl ChannelAggregator {
    /// Build an aggregator for the given channel table.
    #[must_use]
    pub fn new(channels: &[ChannelSpec]) -> Self {
        let order: Vec<String> = channels.iter().map(|c| c.name.clone()).collect();
        let history = order.iter().map(|n| (n.clone(), Vec::new())).collect();
        Self { order, history }
    }

    /// Append every reading in `sample` to its channel's history.
    ///
    /// A reading whose channel name is not in the configured table points
    /// at a configuration mismatch, not a fatal condition: it is logged
    /// and skipped so a multi-hour run keeps going.
    pub fn record(&mut self, sample: &Sample, elapsed_minutes: f64) {
        for reading in &sample.readings {
            match self.history.get_mut(&reading.channel) {
                Some(series) => series.push((elapsed_minutes, reading.value)),
                None => {
                    warn!(channel = %reading.channel, "reading for unconfigured channel dropped");
                }
            }
        }
    }

    /// Mean of all reading values in the sample, units ignored.
    ///
    /// This deliberately preserves the historical behavior of averaging
    /// whatever is in the sample; a run mixing units gets a mixed-unit
    /// average.
    ///
    /// # Errors
    /// Returns `DaqError::EmptySample` for a zero-length reading set; an
    /// empty cycle is never reported as a zero-valued average.
    pub fn cycle_average(&self, sample: &Sample) -> Result<f64, DaqError> {
        if sample.readings.is_empty() {
            return Err(DaqError::EmptySample);
        }
        let sum: f64 = sample.readings.iter().map(|r| r.value).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = sample.readings.len() as f64;
        Ok(sum / count)
    }

    /// Number of history points recorded for `channel`, if configured.
    #[must_use]
    pub fn len(&self, channel: &str) -> Option<usize> {
        self.history.get(channel).map(Vec::len)
    }

    /// `true` if no channel has recorded any point yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.values().all(Vec::is_empty)
    }

    /// Read-only view of the history, in configuration order.
    pub fn history(&self) -> impl Iterator<Item = (&str, &[(f64, f64)])> {
        self.order.iter().map(|name| {
            let series = self
                .history
                .get(name)
                .map_or(&[] as &[(f64, f64)], Vec::as_slice);
            (name.as_str(), series)
        })
    }
}

/// Convert a value between units without touching stored data.
///
/// Temperature conversion uses `F = C * 1.8 + 32`. Converting a unit to
/// itself is the identity.
///
/// # Errors
/// Returns `DaqError::InvalidConfig` for a conversion with no defined
/// rule (e.g. volts to watts); a silently passed-through value would hide
/// a misconfigured channel table.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, DaqError> {
    match (from, to) {
        (a, b) if a == b => Ok(value),
        (Unit::Celsius, Unit::Fahrenheit) => Ok(value * 1.8 + 32.0),
        (Unit::Fahrenheit, Unit::Celsius) => Ok((value - 32.0) / 1.8),
        (from, to) => Err(DaqError::invalid_config(format!(
            "no conversion from {} to {}",
            from.suffix(),
            to.suffix()
        ))),
    }
}
