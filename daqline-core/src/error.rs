use thiserror::Error;

/// Unified error type for the daqline workspace.
///
/// This distinguishes transient per-cycle faults (a single channel read
/// failing) from structural errors (bad configuration, malformed input)
/// and fatal device failures so callers can apply the right recovery
/// policy at each layer.
#[derive(Debug, Error)]
pub enum DaqError {
    /// A timestamp carried a meridiem marker but did not parse as
    /// `<h>:<m>:<s> <AM|PM>`.
    #[error("malformed time string: {raw}")]
    MalformedTime {
        /// The offending input, verbatim.
        raw: String,
    },

    /// A cycle average was requested for a sample with no readings.
    #[error("cycle average requested for an empty sample")]
    EmptySample,

    /// A single channel read failed. Transient: the poller discards the
    /// current cycle and continues.
    #[error("channel {channel} read failed: {msg}")]
    ChannelRead {
        /// Device-specific channel id that failed.
        channel: String,
        /// Human-readable failure message from the source.
        msg: String,
    },

    /// The instrument connection failed or was lost. Fatal to the run.
    #[error("device connection failed: {0}")]
    DeviceConnection(String),

    /// Invalid run configuration or join input; surfaced before any work
    /// starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The output sink rejected a header, record, or flush.
    #[error("output sink failed: {0}")]
    Sink(String),
}

impl DaqError {
    /// Helper: build a `MalformedTime` error for the given raw input.
    pub fn malformed_time(raw: impl Into<String>) -> Self {
        Self::MalformedTime { raw: raw.into() }
    }

    /// Helper: build a `ChannelRead` error with the channel id and message.
    pub fn channel_read(channel: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ChannelRead {
            channel: channel.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `DeviceConnection` error.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::DeviceConnection(msg.into())
    }

    /// Helper: build an `InvalidConfig` error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Helper: build a `Sink` error.
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Return `true` for faults the acquisition loop absorbs by discarding
    /// the in-flight cycle rather than aborting the run.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ChannelRead { .. })
    }
}
