//! Publisher lifecycle: a worker with a start/stop/join contract.
//!
//! The evidence publisher runs as one independent tokio task inside the
//! controller process. It is started once before the detection loop
//! begins and signalled to stop during shutdown with a bounded join
//! timeout, decoupled from the loop's own state.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::PublisherError;
use crate::routes::{create_router, AppState};

/// Handle to the running evidence publisher.
#[derive(Debug)]
pub struct EvidencePublisher {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl EvidencePublisher {
    /// Binds the listener and spawns the serving task.
    ///
    /// Binding happens before this returns, so a port conflict surfaces
    /// at startup rather than after the detection loop is already
    /// running. Pass port 0 to bind an ephemeral port (tests).
    ///
    /// # Errors
    ///
    /// Returns `PublisherError::Bind` if the port cannot be bound.
    pub async fn bind(root: PathBuf, port: u16) -> Result<Self, PublisherError> {
        let app = create_router(AppState::new(root));

        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| PublisherError::Bind { port, source })?;
        let addr = listener.local_addr().map_err(PublisherError::LocalAddr)?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let shutdown = async move {
                // Only fails if the sender is gone, which also means stop.
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "evidence publisher failed");
            }
        });

        info!(address = %addr, "evidence publisher listening");
        Ok(Self {
            addr,
            shutdown_tx,
            handle,
        })
    }

    /// Address the publisher is actually serving on.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals shutdown and waits for the task to finish, bounded by
    /// `timeout`. Returns `false` if the task had to be aborted.
    pub async fn stop(self, timeout: Duration) -> bool {
        let _ = self.shutdown_tx.send(true);
        let abort = self.handle.abort_handle();
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(_) => {
                info!("evidence publisher stopped");
                true
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "evidence publisher did not stop in time, aborting");
                abort.abort();
                false
            }
        }
    }
}
