use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::error::NodeResult;
use crate::handler::AppState;
use crate::router::build_router;

/// HTTP host for the node's request handler.
pub struct NodeServer {
    bind_addr: SocketAddr,
    state: AppState,
}

impl NodeServer {
    pub fn new(bind_addr: SocketAddr, state: AppState) -> Self {
        Self { bind_addr, state }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Serve until `shutdown` completes.
    pub async fn serve<F>(self, shutdown: F) -> NodeResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state);
        let listener = TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "sidetree node listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
