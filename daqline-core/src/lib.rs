//! daqline-core
//!
//! Core types, traits, and utilities shared across the daqline workspace.
//!
//! - `types`: configuration primitives and the per-cycle data model.
//! - `source`: the `MeasurementSource`, `OutputSink`, and `ControlInput`
//!   capability traits the acquisition loop is built against.
//! - `timefmt`: clock-string canonicalization and stamping helpers.
//! - `aggregate`: per-channel history and per-cycle aggregates.
//! - `timeseries`: the offline keyed join across two captured series.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The capability traits in `source` are `async-trait` traits intended to
//! be driven from a Tokio runtime by the `daqline` crate; the pure
//! helpers (`timefmt`, `aggregate`, `timeseries`) are synchronous and
//! runtime-agnostic.
//!
#![warn(missing_docs)]

/// Per-channel history accumulation and cycle aggregates.
pub mod aggregate;
/// The unified `DaqError` taxonomy.
pub mod error;
/// Capability traits for instruments, record sinks, and control input.
pub mod source;
/// Clock-string canonicalization and wall-clock stamping.
pub mod timefmt;
/// Offline time-series join utilities.
pub mod timeseries;
/// Configuration primitives and the per-cycle data model.
pub mod types;

pub use aggregate::{ChannelAggregator, convert};
pub use error::DaqError;
pub use source::{ControlInput, MeasurementSource, OutputSink};
pub use timefmt::{date_stamp, elapsed_minutes, normalize_time_key, time_stamp};
pub use timeseries::join::{JoinOutcome, JoinedRecord, LoadRecord, MeterRecord, join_series};
pub use types::{ChannelSpec, DerivedColumns, ProbeMode, Reading, RunConfig, Sample, Unit};
