//! Incremental `multipart/x-mixed-replace` encoder.
//!
//! Each frame becomes one self-delimited part:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <raw JPEG bytes>\r\n
//! ```
//!
//! The HTTP layer asks for output in buffers of its own choosing, so part
//! boundaries and buffer boundaries are unrelated. [`MultipartEncoder::fill`]
//! writes as much as fits and keeps enough state to resume on the next call:
//!
//! ```text
//!            acquire() = Some              header fits
//! AwaitingFrame ───────────────▶ HeaderPending ───────────▶ BodyStreaming
//!       ▲                                                        │
//!       └──────── last body byte written, frame released ────────┘
//! ```
//!
//! Rules the encoder keeps:
//!
//! - The part header is written whole or not at all.
//! - The 2-byte trailer after a body is never dropped. Whatever does not fit
//!   is owed and written first thing on the next call, before any new header.
//! - A frame goes back to the source in the same call that writes its last
//!   body byte, and that call never starts the next frame.
//! - No acquisition is attempted unless a whole header would fit.

use crate::camera::{Frame, FrameSource};

/// Multipart boundary token.
pub const BOUNDARY: &str = "frame";

/// `Content-Type` of the stream response.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Per-part header: boundary line, content type, blank line.
pub const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

/// Delimiter written after each part body.
pub const PART_TRAILER: &[u8] = b"\r\n";

/// Where the encoder is within the current part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderState {
    /// No frame held; the next call may acquire one.
    #[default]
    AwaitingFrame,
    /// Frame held, part header not yet written.
    HeaderPending,
    /// Header written, body partially written.
    BodyStreaming,
}

/// Per-connection multipart encoder state.
#[derive(Debug, Default)]
pub struct MultipartEncoder {
    state: EncoderState,
    frame: Option<Frame>,
    /// Body bytes of `frame` already written.
    body_sent: usize,
    /// Trailer bytes still owed from the last completed part.
    trailer_owed: usize,
    bytes_emitted: u64,
    frames_completed: u64,
}

impl MultipartEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write as much of the stream as fits into `buf` and return the count.
    ///
    /// `offset` is the stream position the caller believes it is at (the
    /// sum of all previous return values). A return of 0 means "nothing to
    /// send right now"; the stream is not over and the caller should try
    /// again later. Never blocks and never writes past `buf.len()`.
    pub fn fill(&mut self, source: &mut dyn FrameSource, buf: &mut [u8], offset: u64) -> usize {
        if offset != self.bytes_emitted {
            tracing::warn!(
                offset,
                expected = self.bytes_emitted,
                "stream offset does not match bytes emitted"
            );
        }

        let mut written = self.flush_trailer(buf);

        loop {
            let room = buf.len() - written;
            match self.state {
                EncoderState::AwaitingFrame => {
                    if self.trailer_owed > 0 || room < PART_HEADER.len() {
                        break;
                    }
                    let Some(frame) = source.acquire() else {
                        break;
                    };
                    tracing::trace!(seq = frame.seq(), len = frame.len(), "frame acquired");
                    self.frame = Some(frame);
                    self.body_sent = 0;
                    self.state = EncoderState::HeaderPending;
                }
                EncoderState::HeaderPending => {
                    if room < PART_HEADER.len() {
                        break;
                    }
                    buf[written..written + PART_HEADER.len()].copy_from_slice(PART_HEADER);
                    written += PART_HEADER.len();
                    self.state = EncoderState::BodyStreaming;
                }
                EncoderState::BodyStreaming => {
                    let Some(frame) = self.frame.as_ref() else {
                        tracing::error!("body streaming without a held frame");
                        self.state = EncoderState::AwaitingFrame;
                        break;
                    };
                    let remaining = &frame.data()[self.body_sent..];
                    let n = remaining.len().min(room);
                    buf[written..written + n].copy_from_slice(&remaining[..n]);
                    written += n;
                    self.body_sent += n;

                    if self.body_sent < frame.len() {
                        break;
                    }

                    self.complete_frame(source);
                    written += self.flush_trailer(&mut buf[written..]);
                    break;
                }
            }
        }

        self.bytes_emitted += written as u64;
        written
    }

    /// Release any held frame and reset to [`EncoderState::AwaitingFrame`].
    ///
    /// Must be called when the connection goes away. Calling it again, or on
    /// an encoder that holds nothing, is a no-op.
    pub fn close(&mut self, source: &mut dyn FrameSource) {
        if let Some(frame) = self.frame.take() {
            let seq = frame.seq();
            if let Err(e) = source.release(frame) {
                tracing::warn!(seq, error = %e, "failed to release frame on close");
            } else {
                tracing::debug!(seq, body_sent = self.body_sent, "released in-flight frame on close");
            }
        }
        self.state = EncoderState::AwaitingFrame;
        self.body_sent = 0;
        self.trailer_owed = 0;
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn is_holding_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Total bytes handed out by [`fill`](Self::fill) so far.
    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    /// Number of parts whose body has been fully written.
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// Trailer bytes that will be written at the start of the next call.
    pub fn trailer_owed(&self) -> usize {
        self.trailer_owed
    }

    fn complete_frame(&mut self, source: &mut dyn FrameSource) {
        if let Some(frame) = self.frame.take() {
            let seq = frame.seq();
            if let Err(e) = source.release(frame) {
                tracing::warn!(seq, error = %e, "frame release failed");
            }
            tracing::trace!(seq, "part body complete");
        }
        self.state = EncoderState::AwaitingFrame;
        self.body_sent = 0;
        self.trailer_owed = PART_TRAILER.len();
        self.frames_completed += 1;
    }

    /// Write owed trailer bytes into the front of `out`.
    fn flush_trailer(&mut self, out: &mut [u8]) -> usize {
        let n = self.trailer_owed.min(out.len());
        if n > 0 {
            let start = PART_TRAILER.len() - self.trailer_owed;
            out[..n].copy_from_slice(&PART_TRAILER[start..start + n]);
            self.trailer_owed -= n;
        }
        n
    }
}
