use async_trait::async_trait;

use crate::DaqError;
use crate::types::ChannelSpec;

/// Capability trait for anything that can be sampled like a bench
/// instrument.
///
/// Implementations own all device-specific syntax (SCPI command strings,
/// VISA resource handling, timeouts); the core only sees configured
/// channels and floating-point readings. The session lifecycle is
/// explicit: `connect` is called once at run start and `disconnect`
/// exactly once at run end, on every exit path.
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Short implementation name used in logs (e.g. `"daq970a"`).
    fn name(&self) -> &'static str;

    /// Acquire the device session.
    ///
    /// # Errors
    /// Returns `DaqError::DeviceConnection` if the device cannot be
    /// reached; the run does not start.
    async fn connect(&mut self) -> Result<(), DaqError>;

    /// Query the device identification string (`*IDN?` on SCPI
    /// instruments).
    ///
    /// # Errors
    /// Returns `DaqError::DeviceConnection` if the query fails.
    async fn identify(&mut self) -> Result<String, DaqError>;

    /// Configure one channel for the coming run.
    ///
    /// # Errors
    /// Returns `DaqError::DeviceConnection` if the device rejects the
    /// configuration; the run does not start.
    async fn configure_channel(&mut self, spec: &ChannelSpec) -> Result<(), DaqError>;

    /// Acquire one reading from the given channel id.
    ///
    /// The source itself bounds the duration of a single read (device
    /// timeout); the poller applies no additional per-read timeout.
    ///
    /// # Errors
    /// Returns `DaqError::ChannelRead` for a transient fault (the poller
    /// discards the cycle and continues) or `DaqError::DeviceConnection`
    /// if the session is gone (fatal).
    async fn read_channel(&mut self, id: &str) -> Result<f64, DaqError>;

    /// Release the device session.
    ///
    /// # Errors
    /// Returns `DaqError::DeviceConnection` if the release itself fails;
    /// the session is considered gone either way.
    async fn disconnect(&mut self) -> Result<(), DaqError>;
}

/// Capability trait for the per-run record sink.
///
/// The core does not know the persisted encoding; it hands over one header
/// and one flat record per cycle, pre-rendered as strings in a stable
/// column order.
pub trait OutputSink: Send {
    /// Write the column header. Called once, before the first record.
    ///
    /// # Errors
    /// Returns `DaqError::Sink` on write failure.
    fn write_header(&mut self, columns: &[String]) -> Result<(), DaqError>;

    /// Append one record.
    ///
    /// # Errors
    /// Returns `DaqError::Sink` on write failure.
    fn write_record(&mut self, fields: &[String]) -> Result<(), DaqError>;

    /// Flush buffered output. Called on every run exit path so partial
    /// output survives a failed run.
    ///
    /// # Errors
    /// Returns `DaqError::Sink` on flush failure.
    fn flush(&mut self) -> Result<(), DaqError>;
}

/// Capability trait for the control channel that delivers the stop
/// command.
#[async_trait]
pub trait ControlInput: Send {
    /// Wait for the next input line. Returns `None` once the input is
    /// exhausted (EOF). May suspend indefinitely.
    async fn read_line(&mut self) -> Option<String>;
}
