//! daqline
//!
//! Cancellable multi-channel datalogging and offline series correlation
//! for bench instruments.
//!
//! The acquisition side drives a [`Poller`] against any
//! [`daqline_core::MeasurementSource`]: one sample per cycle across a
//! configured channel table, streamed to an output sink, with cooperative
//! cancellation observed only at cycle boundaries. The offline side loads
//! two independently captured CSV series, correlates them on canonical
//! time keys, and persists the joined records with a derived efficiency
//! column.
//!
//! Code that uses the poller or the stop listener must run under a Tokio
//! 1.x runtime.

/// Cancellation token, stop-command listener, and stdin control input.
pub mod cancel;
/// CSV sink and loaders for the persisted capture layouts.
pub mod csvio;
/// The cancellable acquisition loop.
pub mod poller;

pub use cancel::{CancelHandle, CancelToken, StdinControl, cancel_pair, spawn_stop_listener};
pub use csvio::{CsvSink, read_load_series, read_meter_series, write_joined};
pub use poller::{Poller, RunPhase, RunReport};

use daqline_core::{ControlInput, DaqError, MeasurementSource, OutputSink};

/// Wire a poller, a control input, and a cancellation pair together and
/// run until the stop command arrives (or a fatal error ends the run).
///
/// The listener task is aborted once the run ends; it holds nothing but
/// the control input.
///
/// # Errors
/// Propagates any fatal error from [`Poller::run`].
pub async fn run_until_stopped(
    poller: &mut Poller,
    source: &mut dyn MeasurementSource,
    sink: &mut dyn OutputSink,
    control: Box<dyn ControlInput>,
) -> Result<RunReport, DaqError> {
    let (handle, token) = cancel_pair();
    let listener = spawn_stop_listener(control, handle);

    let report = poller.run(source, sink, &token).await;

    if !listener.is_finished() {
        listener.abort();
    }
    report
}
