//! Frame tokenizer for the watch wire protocol
//!
//! A frame is a run of newline-terminated lines ended by a blank line, the
//! SSE-style "blank line separates events" convention.

use super::types::StreamError;

/// Ceiling for an in-progress frame. A stream that never produces a
/// blank-line terminator would otherwise grow the buffer without bound.
pub(crate) const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Split the next frame off the front of `data`.
///
/// Returns how many bytes were consumed and the frame, including its
/// terminating blank line. A boundary is two consecutive newline bytes.
/// When `data` holds no boundary: at end of stream the whole (non-empty)
/// slice is the final, possibly incomplete frame; otherwise `None` is
/// returned and the caller should retry with more bytes appended.
pub(crate) fn split_frame(data: &[u8], at_eof: bool) -> Option<(usize, &[u8])> {
    let mut line_ended = false;

    for (i, &byte) in data.iter().enumerate() {
        if byte == b'\n' {
            if line_ended {
                return Some((i + 1, &data[..i + 1]));
            }
            line_ended = true;
        } else {
            line_ended = false;
        }
    }

    if at_eof && !data.is_empty() {
        Some((data.len(), data))
    } else {
        None
    }
}

/// Buffers raw network chunks and drains complete frames.
#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and extract every complete frame it finishes.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Result<Vec<String>, StreamError> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        loop {
            let Some((consumed, frame)) = split_frame(&self.buffer, false) else {
                break;
            };
            let frame = String::from_utf8_lossy(frame).into_owned();
            self.buffer.drain(..consumed);
            frames.push(frame);
        }

        if self.buffer.len() > MAX_FRAME_LEN {
            return Err(StreamError::Overflow {
                limit: MAX_FRAME_LEN,
            });
        }

        Ok(frames)
    }

    /// Flush the trailing partial frame once the stream has ended.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let (consumed, frame) = split_frame(&self.buffer, true)?;
        let frame = String::from_utf8_lossy(frame).into_owned();
        self.buffer.drain(..consumed);
        Some(frame)
    }
}
