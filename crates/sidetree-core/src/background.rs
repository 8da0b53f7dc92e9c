use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Handle to a background loop armed by the core.
///
/// Every loop listens on its own shutdown channel. Dropping the handle also
/// stops the loop, since the channel closes with it.
pub struct LoopHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    /// Spawn a loop that receives the shutdown signal directly.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(body(rx));
        debug!(task = name, "background loop armed");
        Self {
            name,
            shutdown,
            task,
        }
    }

    /// Spawn a loop that runs `tick` once per `period`, starting immediately.
    ///
    /// A tick in progress is allowed to finish before shutdown is observed.
    pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::spawn(name, move |mut shutdown| async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = interval.tick() => tick().await,
                }
            }
            debug!(task = name, "background loop stopped");
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.shutdown.send_replace(true);
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel();
        if let Err(e) = self.task.await {
            warn!(task = self.name, error = %e, "background loop ended abnormally");
        }
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}
