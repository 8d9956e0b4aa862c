//! Error types for the camera streaming library.

use std::fmt;

/// Errors that can occur in the camera streaming library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Transport**: [`Io`](Self::Io) for socket/network failures.
/// - **Protocol**: [`Parse`](Self::Parse) for malformed HTTP requests.
/// - **Frames**: [`FrameNotOutstanding`](Self::FrameNotOutstanding) when a
///   frame is handed back to a source that did not lend it.
/// - **Control**: [`MissingParameters`](Self::MissingParameters),
///   [`UnknownParameter`](Self::UnknownParameter),
///   [`InvalidValue`](Self::InvalidValue),
///   [`InvalidResolution`](Self::InvalidResolution),
///   [`SensorNotFound`](Self::SensorNotFound),
///   [`ParameterRejected`](Self::ParameterRejected).
/// - **Server**: [`AlreadyRunning`](Self::AlreadyRunning),
///   [`CameraInit`](Self::CameraInit).
#[derive(Debug, thiserror::Error)]
pub enum CamError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an HTTP request message.
    #[error("HTTP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// A frame was released that the source does not consider outstanding
    /// (already released, or never handed out by this source).
    #[error("frame {0} is not outstanding")]
    FrameNotOutstanding(u64),

    /// `/control` was called without both `var` and `val`.
    #[error("missing parameters")]
    MissingParameters,

    /// `var` does not name a known sensor parameter.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// `val` could not be parsed for the named parameter.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: String, value: String },

    /// `val` for `resolution` is not one of the supported frame sizes.
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    /// The camera has no sensor attached to configure.
    #[error("sensor not found")]
    SensorNotFound,

    /// The sensor refused the value (typically out of range).
    #[error("sensor rejected {name}={value}")]
    ParameterRejected { name: &'static str, value: i32 },

    /// The camera could not be brought up.
    #[error("camera init failed: {0}")]
    CameraInit(String),

    /// [`Server::start`](crate::Server::start) was called while already running.
    #[error("server already running")]
    AlreadyRunning,
}

/// Specific kind of HTTP parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Input was empty (no request line).
    EmptyRequest,
    /// Request line did not have the expected `Method Target Version` format.
    InvalidRequestLine,
    /// Version token was not `HTTP/1.x`.
    UnsupportedVersion,
    /// A header line did not contain a colon separator.
    InvalidHeader,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "empty request"),
            Self::InvalidRequestLine => write!(f, "invalid request line"),
            Self::UnsupportedVersion => write!(f, "unsupported HTTP version"),
            Self::InvalidHeader => write!(f, "invalid header"),
        }
    }
}

/// Convenience alias for `Result<T, CamError>`.
pub type Result<T> = std::result::Result<T, CamError>;
