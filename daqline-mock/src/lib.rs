use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use daqline_core::{ChannelSpec, ControlInput, DaqError, MeasurementSource, OutputSink};

/// Mock instrument for CI-safe tests and examples. Produces deterministic
/// readings and offers forced-failure hooks for the poller's recovery
/// paths.
///
/// Each configured channel yields `base + 0.25 * n` on its n-th read, so
/// multi-cycle runs see a steady, predictable drift.
#[derive(Debug, Default)]
pub struct MockInstrument {
    bases: HashMap<String, f64>,
    read_counts: HashMap<String, u64>,
    fail_reads: HashMap<String, HashSet<u64>>,
    refuse_connect: bool,
    connected: bool,
    connects: u32,
    disconnects: u32,
    configured: Vec<ChannelSpec>,
}

impl MockInstrument {
    /// Empty instrument; add channels with [`with_channel`].
    ///
    /// [`with_channel`]: MockInstrument::with_channel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel id with its base reading value.
    #[must_use]
    pub fn with_channel(mut self, id: &str, base: f64) -> Self {
        self.bases.insert(id.to_string(), base);
        self
    }

    /// Force the n-th read (0-based, per channel) of `id` to fail with a
    /// transient `ChannelRead` error.
    #[must_use]
    pub fn with_read_failure(mut self, id: &str, nth_read: u64) -> Self {
        self.fail_reads
            .entry(id.to_string())
            .or_default()
            .insert(nth_read);
        self
    }

    /// Make `connect` fail with a `DeviceConnection` error.
    #[must_use]
    pub const fn with_refused_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Times `connect` succeeded.
    #[must_use]
    pub const fn connects(&self) -> u32 {
        self.connects
    }

    /// Times `disconnect` was called.
    #[must_use]
    pub const fn disconnects(&self) -> u32 {
        self.disconnects
    }

    /// `true` while a session is held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Channel specs configured since construction, in order.
    #[must_use]
    pub fn configured(&self) -> &[ChannelSpec] {
        &self.configured
    }

    /// Total reads served for `id`.
    #[must_use]
    pub fn reads(&self, id: &str) -> u64 {
        self.read_counts.get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl MeasurementSource for MockInstrument {
    fn name(&self) -> &'static str {
        "daqline-mock"
    }

    async fn connect(&mut self) -> Result<(), DaqError> {
        if self.refuse_connect {
            return Err(DaqError::device("mock refused connection"));
        }
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    async fn identify(&mut self) -> Result<String, DaqError> {
        if !self.connected {
            return Err(DaqError::device("identify before connect"));
        }
        Ok("Daqline Instruments,MOCK-1,0,0.1".to_string())
    }

    async fn configure_channel(&mut self, spec: &ChannelSpec) -> Result<(), DaqError> {
        if !self.connected {
            return Err(DaqError::device("configure before connect"));
        }
        self.configured.push(spec.clone());
        Ok(())
    }

    async fn read_channel(&mut self, id: &str) -> Result<f64, DaqError> {
        if !self.connected {
            return Err(DaqError::device("read before connect"));
        }
        let Some(base) = self.bases.get(id).copied() else {
            return Err(DaqError::channel_read(id, "unknown channel"));
        };
        let n = self.read_counts.entry(id.to_string()).or_insert(0);
        let nth = *n;
        *n += 1;
        if self
            .fail_reads
            .get(id)
            .is_some_and(|fails| fails.contains(&nth))
        {
            return Err(DaqError::channel_read(id, "forced read failure"));
        }
        #[allow(clippy::cast_precision_loss)]
        let drift = 0.25 * nth as f64;
        Ok(base + drift)
    }

    async fn disconnect(&mut self) -> Result<(), DaqError> {
        self.connected = false;
        self.disconnects += 1;
        Ok(())
    }
}

/// [`OutputSink`] capturing everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Header written by the run, if any.
    pub header: Option<Vec<String>>,
    /// Records in emission order.
    pub records: Vec<Vec<String>>,
    /// Number of flush calls observed.
    pub flushes: u32,
    fail_writes: bool,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with a `Sink` error.
    #[must_use]
    pub const fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl OutputSink for MemorySink {
    fn write_header(&mut self, columns: &[String]) -> Result<(), DaqError> {
        if self.fail_writes {
            return Err(DaqError::sink("forced header failure"));
        }
        self.header = Some(columns.to_vec());
        Ok(())
    }

    fn write_record(&mut self, fields: &[String]) -> Result<(), DaqError> {
        if self.fail_writes {
            return Err(DaqError::sink("forced record failure"));
        }
        self.records.push(fields.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DaqError> {
        self.flushes += 1;
        Ok(())
    }
}

/// [`ControlInput`] replaying a fixed line script, then EOF.
#[derive(Debug, Default)]
pub struct ScriptedControl {
    lines: VecDeque<String>,
    delay: Option<Duration>,
}

impl ScriptedControl {
    /// Script the given lines, delivered in order.
    #[must_use]
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(ToString::to_string).collect(),
            delay: None,
        }
    }

    /// Sleep this long before delivering each line, to let cycles run.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ControlInput for ScriptedControl {
    async fn read_line(&mut self) -> Option<String> {
        let line = self.lines.pop_front()?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Some(line)
    }
}
