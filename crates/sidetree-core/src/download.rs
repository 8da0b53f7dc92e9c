use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, info};

use sidetree_clients::{CasClient, ClientResult, FetchResult};
use sidetree_types::ConfigError;

use crate::background::LoopHandle;
use crate::error::{CoreError, CoreResult};

struct DownloadRequest {
    address: String,
    reply: oneshot::Sender<ClientResult<FetchResult>>,
}

/// Bounded-concurrency fetch pool in front of the CAS client.
///
/// Requests queue until [`DownloadManager::start`] arms the servicing loop.
/// At most `max_concurrent_downloads` fetches are in flight at once.
pub struct DownloadManager {
    max_concurrent_downloads: usize,
    cas: Arc<dyn CasClient>,
    permits: Arc<Semaphore>,
    sender: mpsc::UnboundedSender<DownloadRequest>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<DownloadRequest>>>,
}

impl DownloadManager {
    pub fn new(max_concurrent_downloads: usize, cas: Arc<dyn CasClient>) -> CoreResult<Self> {
        if max_concurrent_downloads == 0 {
            return Err(ConfigError::invalid("max_concurrent_downloads", "must be positive").into());
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            max_concurrent_downloads,
            cas,
            permits: Arc::new(Semaphore::new(max_concurrent_downloads)),
            sender,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    pub fn max_concurrent_downloads(&self) -> usize {
        self.max_concurrent_downloads
    }

    /// Number of fetches currently holding a slot.
    pub fn active_downloads(&self) -> usize {
        self.max_concurrent_downloads - self.permits.available_permits()
    }

    /// Arm the loop that services queued fetch requests.
    pub fn start(&self) -> CoreResult<LoopHandle> {
        let mut receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CoreError::AlreadyStarted("download manager"))?;
        let cas = Arc::clone(&self.cas);
        let permits = Arc::clone(&self.permits);
        info!(
            max_concurrent_downloads = self.max_concurrent_downloads,
            "download manager started"
        );

        Ok(LoopHandle::spawn("download-manager", move |mut shutdown| async move {
            loop {
                let request = tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    request = receiver.recv() => match request {
                        Some(request) => request,
                        None => break,
                    },
                };
                let permit = tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    permit = Arc::clone(&permits).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };
                let cas = Arc::clone(&cas);
                tokio::spawn(async move {
                    debug!(address = %request.address, "download started");
                    let result = cas.read(&request.address).await;
                    drop(permit);
                    // The requester may have gone away; nothing to do then.
                    let _ = request.reply.send(result);
                });
            }
            debug!("download manager stopped");
        }))
    }

    /// Fetch content through the pool.
    pub async fn download(&self, address: &str) -> CoreResult<FetchResult> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(DownloadRequest {
                address: address.to_string(),
                reply,
            })
            .map_err(|_| CoreError::DownloadManagerStopped)?;
        let result = response
            .await
            .map_err(|_| CoreError::DownloadManagerStopped)?;
        Ok(result?)
    }
}

impl std::fmt::Debug for DownloadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadManager")
            .field("max_concurrent_downloads", &self.max_concurrent_downloads)
            .field("active_downloads", &self.active_downloads())
            .finish()
    }
}
