pub(crate) mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use pmtiles::MmapBackend;
use pmtiles::async_reader::AsyncPmTilesReader;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{RwLock, oneshot};

pub type PmTilesReader = AsyncPmTilesReader<MmapBackend>;

#[derive(Debug, thiserror::Error)]
pub enum TileServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PMTiles error: {0}")]
    PmTiles(String),
}

/// Serves a pmtiles archive over localhost so the map library can fetch vector
/// tiles. Runs on its own runtime so it outlives whichever executor started it.
pub struct TileServer {
    runtime: Option<Runtime>,
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TileServer {
    pub async fn start(pmtiles_path: PathBuf) -> Result<Self, TileServerError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("tile-server")
            .enable_all()
            .build()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (result_tx, result_rx) = oneshot::channel::<Result<u16, TileServerError>>();

        runtime.spawn(async move {
            let result = Self::start_server(pmtiles_path, shutdown_rx).await;
            let _ = result_tx.send(result);
        });

        // from here on Drop takes care of the runtime, even on the error paths
        let mut server = Self {
            runtime: Some(runtime),
            port: 0,
            shutdown_tx: Some(shutdown_tx),
        };

        server.port = result_rx
            .await
            .map_err(|_| TileServerError::PmTiles("server task died unexpectedly".into()))??;

        tracing::info!(port = server.port, "tile server listening");
        Ok(server)
    }

    async fn start_server(
        pmtiles_path: PathBuf,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<u16, TileServerError> {
        let backend = MmapBackend::try_from(pmtiles_path.as_path())
            .await
            .map_err(|e| {
                TileServerError::PmTiles(format!(
                    "failed to open PMTiles file at {pmtiles_path:?}: {e}"
                ))
            })?;

        let reader = AsyncPmTilesReader::try_from_source(backend)
            .await
            .map_err(|e| TileServerError::PmTiles(format!("failed to read PMTiles archive: {e}")))?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        let reader = Arc::new(RwLock::new(reader));
        let app = routes::create_router(reader, port);

        tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                tracing::error!(%error, "tile server stopped");
            }
        });

        Ok(port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for TileServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // shutdown_background never blocks, so this is fine inside async code
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
