pub mod camera;
pub mod error;
pub mod protocol;
pub mod server;
pub mod stream;
pub mod transport;

pub use camera::{Camera, CameraConfig, FrameSource, Sensor, SharedCamera, TestPatternCamera};
pub use error::{CamError, Result};
pub use server::{Server, ServerConfig};
pub use stream::{MultipartEncoder, StreamSession};
