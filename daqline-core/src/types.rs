//! Configuration primitives and the per-cycle data model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DaqError;

/// Unit of a recorded value, as reported by the instrument.
///
/// Stored values always retain the unit they were captured in; conversions
/// are derived on demand (see [`crate::aggregate::convert`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
    /// Volts.
    Volt,
    /// Amperes.
    Amp,
    /// Watts.
    Watt,
}

impl Unit {
    /// Short display suffix used in column headers (`"C"`, `"V"`, ...).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
            Self::Volt => "V",
            Self::Amp => "A",
            Self::Watt => "W",
        }
    }
}

/// How the source should configure a channel before the run starts.
///
/// This stays device-agnostic: the [`crate::source::MeasurementSource`]
/// implementation translates it into instrument-specific commands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProbeMode {
    /// Thermocouple temperature measurement of the given type (`'J'`,
    /// `'K'`, ...).
    Thermocouple {
        /// Thermocouple type letter.
        tc_type: char,
    },
    /// DC voltage measurement with an explicit range and resolution, both
    /// in volts.
    VoltageDc {
        /// Full-scale range.
        range: f64,
        /// Measurement resolution.
        resolution: f64,
    },
}

/// One configured measurement point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Device-specific channel id (e.g. a card slot like `"105"`).
    pub id: String,
    /// Human-readable name; becomes the output column header and the
    /// history key.
    pub name: String,
    /// Unit the channel reports in.
    pub unit: Unit,
    /// Probe configuration applied at run start.
    pub mode: ProbeMode,
}

/// Columns derived from the cycle's readings, appended to (or interleaved
/// with) the channel columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DerivedColumns {
    /// Channel values only.
    None,
    /// Per-cycle mean in Celsius, then its Fahrenheit conversion, appended
    /// after the channel columns, as the thermal-test runs do.
    AverageTemp,
    /// Current and power derived from a shunt-voltage channel, in the
    /// dual-DMM capture layout: bus volts, amps, shunt volts, kilowatts.
    ShuntPower {
        /// Name of the channel carrying the bus voltage.
        voltage_channel: String,
        /// Name of the channel carrying the voltage across the shunt.
        shunt_channel: String,
        /// Shunt transfer ratio: amps through the shunt per volt across it.
        amps_per_volt: f64,
    },
}

/// Complete description of one acquisition run.
///
/// The channel order is significant: it fixes the read order within each
/// cycle and the output column order for the whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Channels to sample each cycle, in read/column order.
    pub channels: Vec<ChannelSpec>,
    /// Fixed delay between cycles. No dynamic backoff.
    pub interval: Duration,
    /// Derived columns to compute each cycle.
    pub derived: DerivedColumns,
}

impl RunConfig {
    /// Validate the configuration before a run starts.
    ///
    /// # Errors
    /// Returns `DaqError::InvalidConfig` for an empty channel table,
    /// duplicate channel names (duplicates would silently collide in the
    /// per-channel history), or a [`DerivedColumns::ShuntPower`] block
    /// whose channel table is not exactly the two named channels.
    pub fn validate(&self) -> Result<(), DaqError> {
        if self.channels.is_empty() {
            return Err(DaqError::invalid_config("no channels configured"));
        }
        for (i, ch) in self.channels.iter().enumerate() {
            if self.channels[..i].iter().any(|c| c.name == ch.name) {
                return Err(DaqError::invalid_config(format!(
                    "duplicate channel name: {}",
                    ch.name
                )));
            }
        }
        if let DerivedColumns::ShuntPower {
            voltage_channel,
            shunt_channel,
            ..
        } = &self.derived
        {
            // The shunt layout has exactly four value columns; a channel
            // outside the named pair would have no column to land in.
            if self.channels.len() != 2 {
                return Err(DaqError::invalid_config(
                    "shunt-power runs sample exactly the voltage and shunt channels",
                ));
            }
            for name in [voltage_channel, shunt_channel] {
                if !self.channels.iter().any(|c| &c.name == name) {
                    return Err(DaqError::invalid_config(format!(
                        "derived column source is not a configured channel: {name}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One value acquired from one channel. Immutable once produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// Channel name (not the device id).
    pub channel: String,
    /// Measured value, in `unit`.
    pub value: f64,
    /// Unit the value was captured in.
    pub unit: Unit,
}

/// One full pass over all configured channels.
///
/// Invariant: `readings` has exactly one entry per configured channel, in
/// configuration order. Partial cycles are discarded by the poller, never
/// emitted.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Capture date, `%m/%d/%Y`.
    pub date: String,
    /// Canonical 24-hour `HH:MM:SS` key.
    pub time_key: String,
    /// One reading per configured channel, in configuration order.
    pub readings: Vec<Reading>,
}
