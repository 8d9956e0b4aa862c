//! Camera capability: frame acquisition and sensor configuration.
//!
//! The capture hardware is modelled as two cooperating interfaces:
//!
//! - [`FrameSource`]: lends out one encoded image at a time. A lent
//!   [`Frame`] stays valid and unchanged until it is handed back through
//!   [`FrameSource::release`]; the source must not recycle its storage while
//!   it is held.
//! - [`Sensor`]: applies typed [`ControlParam`] mutations and reports the
//!   current [`SensorStatus`].
//!
//! A [`Camera`] combines both. The process shares one camera between stream
//! sessions and control requests through a [`SharedCamera`] handle, passed
//! explicitly to whoever needs it so tests can substitute a fake.
//!
//! ## Single-buffered pipeline
//!
//! ```text
//! acquire() -> Frame #n   (buffer lent out, acquire() now returns None)
//! release(Frame #n)       (buffer back in the pool)
//! acquire() -> Frame #n+1
//! ```

pub mod control;
pub mod test_pattern;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
pub use control::{ControlParam, FrameSize};
pub use test_pattern::{CameraConfig, TestPatternCamera};

/// One complete encoded (JPEG) image lent out by a [`FrameSource`].
///
/// Deliberately not `Clone`: a frame has exactly one owner at a time, and
/// releasing it moves it back into the source.
#[derive(Debug)]
pub struct Frame {
    seq: u64,
    data: Vec<u8>,
    size: FrameSize,
}

impl Frame {
    pub fn new(seq: u64, data: Vec<u8>, size: FrameSize) -> Self {
        Self { seq, data, size }
    }

    /// Acquisition sequence number, unique per source.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Frame size the image was captured at.
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Give up the frame and recover its backing buffer (used by sources on release).
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Producer of encoded frames.
pub trait FrameSource: Send {
    /// Take the next frame if one is ready. Never blocks.
    ///
    /// Returns `None` when no frame is ready yet, when the previous frame is
    /// still outstanding, or when the hardware is unavailable. Callers
    /// cannot tell these apart and simply retry later.
    fn acquire(&mut self) -> Option<Frame>;

    /// Hand a frame back to the source, ending the caller's access to it.
    ///
    /// Returns [`CamError::FrameNotOutstanding`](crate::CamError::FrameNotOutstanding)
    /// if the source did not lend out this frame.
    fn release(&mut self, frame: Frame) -> Result<()>;
}

/// Configuration side of the camera.
pub trait Sensor: Send {
    /// Apply one mutation. Out-of-range values are rejected with
    /// [`CamError::ParameterRejected`](crate::CamError::ParameterRejected).
    fn apply(&mut self, param: ControlParam) -> Result<()>;

    /// Snapshot of the current settings.
    fn status(&self) -> SensorStatus;
}

/// A frame source with an (optionally) attached sensor.
pub trait Camera: FrameSource {
    /// The sensor to configure, or `None` if it could not be probed.
    fn sensor(&mut self) -> Option<&mut dyn Sensor>;
}

/// Process-wide camera handle shared by stream sessions and control requests.
pub type SharedCamera = Arc<Mutex<Box<dyn Camera>>>;

/// Wrap a camera into a [`SharedCamera`].
pub fn shared(camera: impl Camera + 'static) -> SharedCamera {
    let camera: Box<dyn Camera> = Box::new(camera);
    Arc::new(Mutex::new(camera))
}

/// Current sensor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorStatus {
    pub frame_size: FrameSize,
    pub quality: u8,
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub sharpness: i32,
    pub aec_value: i32,
    pub agc_gain: i32,
    pub special_effect: i32,
    pub awb_gain: bool,
    pub aec: bool,
    pub agc: bool,
    pub awb: bool,
    pub vflip: bool,
    pub hmirror: bool,
    pub colorbar: bool,
}

impl Default for SensorStatus {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::Vga,
            quality: 10,
            brightness: 0,
            contrast: 0,
            saturation: 0,
            sharpness: 0,
            aec_value: 300,
            agc_gain: 0,
            special_effect: 0,
            awb_gain: true,
            aec: true,
            agc: true,
            awb: true,
            vflip: false,
            hmirror: false,
            colorbar: false,
        }
    }
}

impl SensorStatus {
    /// Settings as `(name, value)` pairs, using the `/control` parameter names.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let flag = |b: bool| u8::from(b).to_string();
        vec![
            ("resolution", self.frame_size.to_string()),
            ("quality", self.quality.to_string()),
            ("brightness", self.brightness.to_string()),
            ("contrast", self.contrast.to_string()),
            ("saturation", self.saturation.to_string()),
            ("sharpness", self.sharpness.to_string()),
            ("aec_value", self.aec_value.to_string()),
            ("agc_gain", self.agc_gain.to_string()),
            ("special_effect", self.special_effect.to_string()),
            ("awb_gain", flag(self.awb_gain)),
            ("aec", flag(self.aec)),
            ("agc", flag(self.agc)),
            ("awb", flag(self.awb)),
            ("vflip", flag(self.vflip)),
            ("hmirror", flag(self.hmirror)),
            ("colorbar", flag(self.colorbar)),
        ]
    }
}
