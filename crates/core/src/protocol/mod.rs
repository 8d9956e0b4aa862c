//! HTTP/1.1 surface of the camera.
//!
//! Parses requests, builds responses and routes:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | Browser UI with the stream and sensor controls |
//! | `GET /stream` | `multipart/x-mixed-replace; boundary=frame`, chunked, endless |
//! | `GET /control?var=<name>&val=<value>` | Apply one sensor setting |
//! | `GET /status` | Current sensor settings as `name=value` lines |
//!
//! `HEAD` is accepted wherever `GET` is. Streaming itself (the chunked body)
//! is driven by [`crate::transport::tcp`]; this module only decides that a
//! request becomes a stream.

pub mod control;
pub mod handler;
pub mod page;
pub mod request;
pub mod response;

pub use handler::{RequestHandler, Route};
pub use request::HttpRequest;
pub use response::HttpResponse;
