//! Run cancellation: a watch-channel token set exactly once, plus the
//! listener task that turns a typed `stop` command into a cancellation.

use async_trait::async_trait;
use daqline_core::ControlInput;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The command word the control listener reacts to. Any other input is
/// ignored.
const STOP_COMMAND: &str = "stop";

/// Signalling half of a cancellation pair. Consumed on use, so the flag
/// can only ever transition false -> true once.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation. Best-effort: if every token has been dropped
    /// there is nobody left to observe the flag, which is fine.
    pub fn cancel(self) {
        let _ = self.tx.send(true);
    }
}

/// Observing half of a cancellation pair. Cheap to clone; the polling
/// loop checks it only at cycle boundaries, never mid-reading.
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// `true` once [`CancelHandle::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is requested.
    ///
    /// Used to cut the inter-cycle sleep short; never awaited while a
    /// cycle is in flight. Pends forever if the handle is dropped without
    /// cancelling.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
        // Handle dropped without a cancel: nothing will ever arrive.
        std::future::pending::<()>().await;
    }
}

/// Create a linked cancellation handle/token pair.
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Spawn the control-input listener.
///
/// The task blocks on `read_line` and cancels the run when it sees the
/// stop command (trimmed, case-insensitive). Any other line is ignored.
/// EOF ends the listener without cancelling; the run then only stops on
/// its own terms.
pub fn spawn_stop_listener(
    mut control: Box<dyn ControlInput>,
    handle: CancelHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = control.read_line().await {
            if line.trim().eq_ignore_ascii_case(STOP_COMMAND) {
                info!("stop command received, cancelling run");
                handle.cancel();
                return;
            }
            debug!(input = %line.trim(), "ignoring control input");
        }
        debug!("control input closed without a stop command");
    })
}

/// [`ControlInput`] over the process's standard input.
///
/// This is the interactive setup the bench runs use: the operator types
/// `stop` into the terminal that launched the run.
pub struct StdinControl {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinControl {
    /// Attach to standard input.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinControl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlInput for StdinControl {
    async fn read_line(&mut self) -> Option<String> {
        self.lines.next_line().await.ok().flatten()
    }
}
