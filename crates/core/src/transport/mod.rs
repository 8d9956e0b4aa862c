//! Network transport for the HTTP surface.
//!
//! - [`tcp`]: non-blocking accept loop and one thread per client
//!   connection. A connection serves plain requests until one of them asks
//!   for `/stream`, at which point it becomes the chunked transfer driver for
//!   that viewer's [`StreamSession`](crate::stream::StreamSession).
//!
//! - [`chunked`]: HTTP/1.1 chunked transfer coding, and the close-delimited
//!   body used for HTTP/1.0 viewers.

pub mod chunked;
pub mod tcp;

pub use chunked::{ChunkedWriter, StreamBody};
