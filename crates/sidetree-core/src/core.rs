use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, error, info};

use sidetree_store::{OperationStore, TransactionStore};
use sidetree_types::{Config, ProtocolParameters, ProtocolVersion};

use crate::background::LoopHandle;
use crate::batch_writer::BatchWriter;
use crate::download::DownloadManager;
use crate::error::{CoreError, CoreResult};
use crate::factory::{ComponentFactory, DefaultFactory};
use crate::lifecycle::{readiness_channel, CoreState, Readiness, ReadinessSignal};
use crate::observer::Observer;
use crate::processor::OperationProcessor;
use crate::request_handler::RequestHandler;

/// The orchestrator of a Sidetree node.
///
/// Startup happens in two phases:
///
/// 1. [`Core::new`] wires every collaborator synchronously and arms the
///    download and batch-writing loops. The request handler is available as
///    soon as it returns, but answers `NotReady`.
/// 2. [`Core::initialize`] brings the stores online and only then arms the
///    observer. On success the request handler starts serving.
///
/// A failed `initialize` stops every loop and leaves the core `Failed`; it
/// has to be rebuilt. Dropping the core stops its loops as well.
pub struct Core {
    transaction_store: Arc<dyn TransactionStore>,
    operation_store: Arc<dyn OperationStore>,
    observer: Arc<Observer>,
    request_handler: Arc<RequestHandler>,
    protocol: Arc<ProtocolParameters>,
    readiness: ReadinessSignal,
    /// Serializes `initialize` and `shutdown`.
    transition: tokio::sync::Mutex<()>,
    state: RwLock<CoreState>,
    loops: Mutex<Vec<LoopHandle>>,
}

impl Core {
    /// Construct the core with the built-in backends.
    ///
    /// Must be called from within a tokio runtime, since construction arms
    /// background loops.
    pub fn new(config: &Config, protocol_versions: Vec<ProtocolVersion>) -> CoreResult<Self> {
        Self::with_factory(config, protocol_versions, &DefaultFactory)
    }

    /// Construct the core with collaborators built by `factory`.
    pub fn with_factory(
        config: &Config,
        protocol_versions: Vec<ProtocolVersion>,
        factory: &dyn ComponentFactory,
    ) -> CoreResult<Self> {
        tokio::runtime::Handle::try_current().map_err(|_| CoreError::NoRuntime)?;
        let wiring = wire(config, protocol_versions, factory)?;

        let download_loop = wiring.download_manager.start()?;
        let batch_loop = match wiring.batch_writer.start_periodic_batch_writing() {
            Ok(handle) => handle,
            Err(e) => {
                download_loop.cancel();
                return Err(e);
            }
        };

        info!(
            did_method = %config.did_method_name,
            max_concurrent_downloads = config.max_concurrent_downloads,
            "core wired"
        );
        Ok(Self {
            transaction_store: wiring.transaction_store,
            operation_store: wiring.operation_store,
            observer: wiring.observer,
            request_handler: wiring.request_handler,
            protocol: wiring.protocol,
            readiness: wiring.readiness,
            transition: tokio::sync::Mutex::new(()),
            state: RwLock::new(CoreState::Wired),
            loops: Mutex::new(vec![download_loop, batch_loop]),
        })
    }

    /// Run every construction check with the built-in backends, without
    /// arming anything. Needs no runtime.
    pub fn validate(config: &Config, protocol_versions: Vec<ProtocolVersion>) -> CoreResult<()> {
        wire(config, protocol_versions, &DefaultFactory).map(drop)
    }

    /// Bring the stores online, then arm the observer.
    ///
    /// May succeed at most once. A second call fails with
    /// [`CoreError::AlreadyInitialized`] and arms nothing.
    pub async fn initialize(&self) -> CoreResult<()> {
        let _transition = self.transition.lock().await;
        match self.state() {
            CoreState::Wired => {}
            CoreState::Ready => return Err(CoreError::AlreadyInitialized),
            CoreState::Failed => return Err(CoreError::InitializationFailed),
            CoreState::Stopped => return Err(CoreError::Stopped),
        }

        match self.bring_online().await {
            Ok(observer_loop) => {
                self.loops().push(observer_loop);
                self.set_state(CoreState::Ready);
                self.readiness.set(true);
                info!("core ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "core initialization failed; stopping background loops");
                self.set_state(CoreState::Failed);
                self.stop_loops().await;
                Err(e)
            }
        }
    }

    async fn bring_online(&self) -> CoreResult<LoopHandle> {
        self.transaction_store.initialize().await?;
        debug!("transaction store online");
        self.operation_store.initialize().await?;
        debug!("operation store online");
        self.observer.start_periodic_processing().await
    }

    /// Stop every armed loop. The core cannot be initialized afterwards.
    pub async fn shutdown(&self) {
        let _transition = self.transition.lock().await;
        self.readiness.set(false);
        self.set_state(CoreState::Stopped);
        self.stop_loops().await;
        info!("core stopped");
    }

    async fn stop_loops(&self) {
        let loops = std::mem::take(&mut *self.loops());
        for handle in loops {
            debug!(task = handle.name(), "stopping background loop");
            handle.shutdown().await;
        }
    }

    fn loops(&self) -> MutexGuard<'_, Vec<LoopHandle>> {
        self.loops.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: CoreState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn state(&self) -> CoreState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The request surface. Available before `initialize`, but it answers
    /// `NotReady` until the core is ready.
    pub fn request_handler(&self) -> Arc<RequestHandler> {
        Arc::clone(&self.request_handler)
    }

    pub fn readiness(&self) -> Readiness {
        self.request_handler.readiness()
    }

    /// Names of the background loops currently running.
    pub fn background_tasks(&self) -> Vec<&'static str> {
        self.loops()
            .iter()
            .filter(|handle| handle.is_running())
            .map(LoopHandle::name)
            .collect()
    }

    pub fn is_observing(&self) -> bool {
        self.state() == CoreState::Ready && self.observer.is_running()
    }

    pub fn protocol_parameters(&self) -> &Arc<ProtocolParameters> {
        &self.protocol
    }
}

/// The collaborator graph, built but not yet running.
struct Wiring {
    protocol: Arc<ProtocolParameters>,
    download_manager: Arc<DownloadManager>,
    batch_writer: Arc<BatchWriter>,
    operation_store: Arc<dyn OperationStore>,
    transaction_store: Arc<dyn TransactionStore>,
    observer: Arc<Observer>,
    request_handler: Arc<RequestHandler>,
    readiness: ReadinessSignal,
}

fn wire(
    config: &Config,
    protocol_versions: Vec<ProtocolVersion>,
    factory: &dyn ComponentFactory,
) -> CoreResult<Wiring> {
    let protocol = ProtocolParameters::initialize(protocol_versions)?;
    debug!(versions = protocol.versions().len(), "protocol parameters installed");

    let blockchain = factory.blockchain_client(&config.blockchain_service_uri)?;
    let cas = factory.cas_client(&config.content_addressable_store_service_uri)?;
    debug!(
        blockchain = %config.blockchain_service_uri,
        cas = %config.content_addressable_store_service_uri,
        "service clients constructed"
    );

    let download_manager = Arc::new(DownloadManager::new(
        config.max_concurrent_downloads,
        Arc::clone(&cas),
    )?);
    let batch_writer = Arc::new(BatchWriter::new(
        Arc::clone(&blockchain),
        cas,
        config.batching_interval(),
        Arc::clone(&protocol),
    )?);

    let operation_store = factory.operation_store(&config.database_connection_string)?;
    let processor = Arc::new(OperationProcessor::new(
        &config.did_method_name,
        Arc::clone(&operation_store),
        Arc::clone(&protocol),
    )?);
    let transaction_store = factory.transaction_store(&config.database_connection_string)?;
    debug!(connection = %config.database_connection_string, "stores constructed");

    let observer = Arc::new(Observer::new(
        Arc::clone(&blockchain),
        Arc::clone(&download_manager),
        Arc::clone(&processor),
        Arc::clone(&transaction_store),
        config.observing_interval(),
    )?);

    let (readiness, readiness_rx) = readiness_channel();
    let request_handler = Arc::new(RequestHandler::new(
        processor,
        blockchain,
        Arc::clone(&batch_writer),
        &config.did_method_name,
        Arc::clone(&protocol),
        readiness_rx,
    )?);

    Ok(Wiring {
        protocol,
        download_manager,
        batch_writer,
        operation_store,
        transaction_store,
        observer,
        request_handler,
        readiness,
    })
}

impl Drop for Core {
    fn drop(&mut self) {
        self.readiness.set(false);
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("state", &self.state())
            .field("background_tasks", &self.background_tasks())
            .finish()
    }
}
