//! Test utilities for hearth-client
//!
//! Provides a scripted HTTP server for exercising the watch protocol in
//! integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::{HearthClient, Result};

/// A local watch endpoint with an embedded client pointed at it.
///
/// The server task is torn down when this handle is dropped.
///
/// # Example
///
/// ```ignore
/// use hearth_client::testing::TestServer;
///
/// let server = TestServer::start(router).await?;
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
/// server.client.watch(tx).await?;
/// ```
pub struct TestServer {
    pub addr: SocketAddr,
    /// Client pointed at the server root.
    pub client: HearthClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Start serving an axum router on an ephemeral local port.
    pub async fn start(router: axum::Router) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Let the listener task come up before handing out the client
        tokio::time::sleep(Duration::from_millis(10)).await;

        let base_url = format!("http://{}", addr);
        let client = HearthClient::with_config(&base_url, Duration::from_secs(2))?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL the embedded client points at.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Borrow the embedded client.
    pub fn client(&self) -> &HearthClient {
        &self.client
    }

    /// Stop the server and wait for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
