//! Hearth Client Library
//!
//! A streaming watch client for Hearth realtime data stores. The client
//! holds a persistent HTTP connection to one location in the remote JSON
//! tree and forwards typed change notifications over a channel.
//!
//! # Example
//!
//! ```rust,no_run
//! use hearth_client::{EventType, HearthClient};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HearthClient::new("https://db.hearth.example/notes")?
//!         .with_auth("my-token");
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     client.watch(tx).await?;
//!
//!     while let Some(event) = rx.recv().await {
//!         match event.event_type {
//!             EventType::Put | EventType::Patch => {
//!                 println!("{} changed: {:?}", event.path, event.data);
//!             }
//!             other => println!("control event: {}", other),
//!         }
//!     }
//!     // Channel closed: the watch has ended.
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a scripted local server for integration
//! tests:
//!
//! ```rust,ignore
//! use hearth_client::testing::TestServer;
//!
//! let server = TestServer::start(router).await?;
//! server.client.watch(tx).await?;
//! ```

mod client;
mod error;
pub mod streaming;
pub mod testing;

pub use client::HearthClient;
pub use error::{HearthError, Result};

// Re-export streaming types for convenience
pub use streaming::{Event, EventType, StreamError};
