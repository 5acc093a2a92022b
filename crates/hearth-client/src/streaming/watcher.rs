//! Watch session state and read loop
//!
//! The read loop runs on a spawned task and talks to the rest of the world
//! through exactly two channels: the consumer event channel and the stop
//! signal held in [`WatchState`].

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::frame::FrameDecoder;
use super::types::{ChangePayload, Event, EventType, StreamError};

/// Per-client watch state: the slot holds the stop sender while a watch is
/// active and doubles as the "watching" flag.
///
/// Each reservation gets a fresh generation number. A read loop may only
/// clear the slot for its own generation: after `stop_watch` empties the
/// slot, a new watch can reserve it before the old loop has finished
/// tearing down, and the old loop's cleanup must not take the new watch's
/// stop sender with it.
#[derive(Debug, Default)]
pub(crate) struct WatchState {
    stop: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl WatchState {
    /// Claim the watch slot. Returns the new watch's generation and the
    /// stop receiver for its read loop, or `None` when a watch is already
    /// active.
    pub(crate) fn try_reserve(&self) -> Option<(u64, oneshot::Receiver<()>)> {
        let mut slot = self.stop.lock();
        if slot.stop_tx.is_some() {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        slot.generation = slot.generation.wrapping_add(1);
        slot.stop_tx = Some(tx);
        Some((slot.generation, rx))
    }

    /// Clear the slot unconditionally, handing back the stop sender if one
    /// was present. Caller-side teardown: whatever watch is current is the
    /// one being stopped.
    pub(crate) fn release(&self) -> Option<oneshot::Sender<()>> {
        self.stop.lock().stop_tx.take()
    }

    /// Clear the slot only while it still belongs to `generation`; a newer
    /// watch may have reserved it since.
    pub(crate) fn release_if_current(&self, generation: u64) -> Option<oneshot::Sender<()>> {
        let mut slot = self.stop.lock();
        if slot.generation == generation {
            slot.stop_tx.take()
        } else {
            None
        }
    }

    pub(crate) fn is_watching(&self) -> bool {
        self.stop.lock().stop_tx.is_some()
    }
}

enum Forwarded {
    Continue,
    Terminal,
    ConsumerGone,
}

/// Read frames off the response stream until cancellation, stream end, or a
/// terminal event, forwarding decoded events to the consumer.
///
/// Always clears the watch state (for this loop's generation) before
/// dropping the consumer sender, so by the time the channel reports closed
/// a new watch can be started.
pub(crate) async fn run_watch_loop<S, E>(
    mut stream: S,
    events: mpsc::UnboundedSender<Event>,
    mut stop_rx: oneshot::Receiver<()>,
    state: Arc<WatchState>,
    generation: u64,
) where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    let mut decoder = FrameDecoder::new();
    let mut stop_gone = false;

    'read: loop {
        tokio::select! {
            signal = &mut stop_rx, if !stop_gone => {
                match signal {
                    Ok(()) => {
                        // Dropping the stream closes the underlying
                        // connection, which is the only way to interrupt a
                        // pending read.
                        debug!("watch cancelled");
                        break 'read;
                    }
                    Err(_) => {
                        // Sender vanished without an explicit stop; keep
                        // reading. The receiver must not be polled again.
                        stop_gone = true;
                    }
                }
            }
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    let frames = match decoder.feed(&bytes) {
                        Ok(frames) => frames,
                        Err(err) => {
                            warn!(error = %err, "closing watch");
                            break 'read;
                        }
                    };
                    for frame in frames {
                        match forward_frame(&frame, &events) {
                            Forwarded::Continue => {}
                            Forwarded::Terminal | Forwarded::ConsumerGone => break 'read,
                        }
                    }
                }
                Some(Err(err)) => {
                    warn!(error = %err, "watch stream failed");
                    break 'read;
                }
                None => {
                    if let Some(frame) = decoder.finish() {
                        forward_frame(&frame, &events);
                    }
                    debug!("watch stream ended");
                    break 'read;
                }
            }
        }
    }

    state.release_if_current(generation);
    // The consumer sender drops here, closing the channel after every
    // forwarded event.
}

fn forward_frame(frame: &str, events: &mpsc::UnboundedSender<Event>) -> Forwarded {
    match decode_frame(frame) {
        Ok(Some(event)) => {
            let terminal = event.event_type.is_terminal();
            if events.send(event).is_err() {
                return Forwarded::ConsumerGone;
            }
            if terminal {
                Forwarded::Terminal
            } else {
                Forwarded::Continue
            }
        }
        Ok(None) => Forwarded::Continue,
        Err(err) => {
            warn!(error = %err, "discarding malformed frame");
            Forwarded::Continue
        }
    }
}

/// Decode one frame into an event. Returns `Ok(None)` for keep-alive frames,
/// which carry nothing to forward.
fn decode_frame(frame: &str) -> Result<Option<Event>, StreamError> {
    let mut lines = frame.lines();
    let first = lines.next().unwrap_or("");
    let event_type = EventType::parse(first.strip_prefix("event: ").unwrap_or(first));

    if event_type == EventType::KeepAlive {
        return Ok(None);
    }

    if !event_type.has_payload() {
        return Ok(Some(Event::bare(event_type)));
    }

    let data_line = lines
        .next()
        .ok_or_else(|| StreamError::Frame(format!("{event_type} frame is missing a data line")))?;
    let raw = data_line.strip_prefix("data: ").unwrap_or(data_line);
    let payload: ChangePayload = serde_json::from_str(raw)
        .map_err(|err| StreamError::Frame(format!("bad {event_type} payload: {err}")))?;

    Ok(Some(Event {
        event_type,
        path: payload.path,
        data: Some(payload.data),
    }))
}
