//! Streaming support for watching a Hearth location
//!
//! The remote store pushes change notifications over a persistent HTTP
//! connection using SSE-style framing. `frame` tokenizes the byte stream,
//! `watcher` runs the read loop and owns the per-client watch state.
//!
//! # Example
//!
//! ```no_run
//! use hearth_client::HearthClient;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = HearthClient::new("https://db.hearth.example/notes")?;
//!
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! client.watch(tx).await?;
//!
//! // The channel closes when the watch ends for any reason.
//! while let Some(event) = rx.recv().await {
//!     println!("{} {} {:?}", event.event_type, event.path, event.data);
//! }
//!
//! client.stop_watch();
//! # Ok(())
//! # }
//! ```

mod frame;
mod types;
pub(crate) mod watcher;

pub use types::{Event, EventType, StreamError};
