//! MJPEG streaming over a chunked HTTP body.
//!
//! - [`multipart`]: the incremental part encoder, the only stateful piece of
//!   the pipeline.
//! - [`session`]: per-viewer wrapper that owns an encoder, paces frames and
//!   guarantees the held frame is released; plus the viewer slot limiter.

pub mod multipart;
pub mod session;

pub use multipart::{EncoderState, MultipartEncoder, STREAM_CONTENT_TYPE};
pub use session::{StreamSession, StreamSlot, StreamSlots};
