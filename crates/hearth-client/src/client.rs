//! Hearth HTTP client implementation

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{HearthError, Result};
use crate::streaming::watcher::{self, WatchState};
use crate::streaming::Event;

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one location in a Hearth realtime data store.
///
/// A total request timeout is deliberately not configured: the watch
/// connection stays open for as long as the subscription lives.
#[derive(Debug, Clone)]
pub struct HearthClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    watch_state: Arc<WatchState>,
}

impl HearthClient {
    /// Create a client for the location at `base_url`
    /// (e.g., "https://db.hearth.example/notes").
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with a custom connection timeout.
    pub fn with_config(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            base_url,
            auth_token: None,
            watch_state: Arc::new(WatchState::default()),
        })
    }

    /// Send the store's `auth` query parameter with every request.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Whether a watch is currently active on this client.
    pub fn is_watching(&self) -> bool {
        self.watch_state.is_watching()
    }

    /// Start watching this location for changes.
    ///
    /// Decoded events are forwarded on `events` in network arrival order
    /// until the watch ends: by [`stop_watch`](Self::stop_watch), by the
    /// stream closing, or by a terminal `cancel`/`auth_revoked` event. The
    /// channel then closes, after which a new watch may be started.
    ///
    /// Only one watch per client can be active. A second call while one is
    /// in flight closes the given channel and returns `Ok(())` immediately;
    /// use two clients for two concurrent watches.
    ///
    /// Returns once the connection is open; the read loop runs on its own
    /// task and does not block the caller.
    pub async fn watch(&self, events: mpsc::UnboundedSender<Event>) -> Result<()> {
        let Some((generation, stop_rx)) = self.watch_state.try_reserve() else {
            // Redundant call: closing the channel is the only signal.
            drop(events);
            return Ok(());
        };

        let url = self.request_url();
        debug!(url = %url, "starting watch");

        let response = match self
            .client
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                // stop_watch may have cleared the slot and a new watch
                // claimed it while we were connecting; only roll back our
                // own reservation.
                self.watch_state.release_if_current(generation);
                return Err(err.into());
            }
        };

        if !response.status().is_success() {
            self.watch_state.release_if_current(generation);
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(HearthError::Server { status, message });
        }

        tokio::spawn(watcher::run_watch_loop(
            Box::pin(response.bytes_stream()),
            events,
            stop_rx,
            Arc::clone(&self.watch_state),
            generation,
        ));

        Ok(())
    }

    /// Stop the active watch, if any.
    ///
    /// Signals the read loop, which closes the connection, resets the watch
    /// state, and closes the consumer channel. Never blocks; calling it with
    /// no active watch, or repeatedly, is a no-op.
    pub fn stop_watch(&self) {
        if let Some(stop_tx) = self.watch_state.release() {
            // The loop may already have exited on its own; nobody listening
            // is fine.
            let _ = stop_tx.send(());
        }
    }

    /// REST URL for this location: path plus `.json`, with the auth token
    /// appended when configured.
    fn request_url(&self) -> Url {
        let mut url = self.base_url.clone();

        let path = url.path().trim_end_matches('/').to_string();
        if path.is_empty() {
            url.set_path("/.json");
        } else {
            url.set_path(&format!("{path}.json"));
        }

        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HearthClient::new("https://db.hearth.example/notes");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = HearthClient::new("not a url");
        assert!(client.is_err());
    }

    #[test]
    fn test_request_url_appends_json_suffix() {
        let client = HearthClient::new("https://db.hearth.example/notes").unwrap();
        assert_eq!(
            client.request_url().as_str(),
            "https://db.hearth.example/notes.json"
        );
    }

    #[test]
    fn test_request_url_at_store_root() {
        let client = HearthClient::new("https://db.hearth.example").unwrap();
        assert_eq!(
            client.request_url().as_str(),
            "https://db.hearth.example/.json"
        );
    }

    #[test]
    fn test_request_url_trims_trailing_slash() {
        let client = HearthClient::new("https://db.hearth.example/notes/").unwrap();
        assert_eq!(
            client.request_url().as_str(),
            "https://db.hearth.example/notes.json"
        );
    }

    #[test]
    fn test_request_url_carries_auth_token() {
        let client = HearthClient::new("https://db.hearth.example/notes")
            .unwrap()
            .with_auth("s3cret");
        assert_eq!(
            client.request_url().as_str(),
            "https://db.hearth.example/notes.json?auth=s3cret"
        );
    }

    #[test]
    fn test_fresh_client_is_not_watching() {
        let client = HearthClient::new("https://db.hearth.example/notes").unwrap();
        assert!(!client.is_watching());
        // No watch active: must be a silent no-op, twice over.
        client.stop_watch();
        client.stop_watch();
    }
}
