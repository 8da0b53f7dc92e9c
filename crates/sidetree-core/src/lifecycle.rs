use std::fmt;

use tokio::sync::watch;

/// Lifecycle state of the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreState {
    /// Constructed; download and batching loops armed; stores not yet online.
    Wired,
    /// Stores online and the observer armed.
    Ready,
    /// Initialization failed; background loops were cancelled.
    Failed,
    /// Shut down by the hosting process.
    Stopped,
}

impl fmt::Display for CoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Wired => "wired",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Read side of the core's readiness signal.
///
/// Only the core can create one, so a component holding a `Readiness` is
/// guaranteed to observe the core's real state.
#[derive(Clone, Debug)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the core is ready. Returns `false` if the core went away
    /// first.
    pub async fn wait_ready(&mut self) -> bool {
        self.rx.wait_for(|ready| *ready).await.is_ok()
    }
}

/// Write side of the readiness signal, held by the core.
#[derive(Debug)]
pub(crate) struct ReadinessSignal {
    tx: watch::Sender<bool>,
}

impl ReadinessSignal {
    pub(crate) fn set(&self, ready: bool) {
        self.tx.send_replace(ready);
    }
}

pub(crate) fn readiness_channel() -> (ReadinessSignal, Readiness) {
    let (tx, rx) = watch::channel(false);
    (ReadinessSignal { tx }, Readiness { rx })
}
