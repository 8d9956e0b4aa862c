use std::time::{Duration, Instant};

use super::{Camera, ControlParam, Frame, FrameSize, FrameSource, Sensor, SensorStatus};
use crate::error::{CamError, Result};

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Highest (worst) JPEG quality index accepted by OV2640-class sensors.
pub const MAX_JPEG_QUALITY: u8 = 63;

/// Capture settings for [`TestPatternCamera`].
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Initial resolution.
    pub frame_size: FrameSize,
    /// JPEG quality index, 0–63, lower is better (and larger).
    pub jpeg_quality: u8,
    /// Minimum time between two captures. A frame is "not ready" until
    /// this much time has passed since the previous one was taken.
    pub capture_interval: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::Vga,
            jpeg_quality: 10,
            capture_interval: Duration::from_millis(33),
        }
    }
}

/// Software stand-in for a single-buffered JPEG capture pipeline.
///
/// Owns exactly one frame buffer. [`acquire`](FrameSource::acquire) lends it
/// out filled with a pseudo-JPEG image (SOI marker, payload sized from the
/// resolution and quality, EOI marker) and refuses to capture again until the
/// buffer comes back through [`release`](FrameSource::release).
///
/// With `colorbar` enabled the payload is a deterministic ramp instead of
/// random bytes, which makes captures comparable across runs.
pub struct TestPatternCamera {
    sensor: SimulatedSensor,
    /// The single frame buffer; `None` while lent out.
    buffer: Option<Vec<u8>>,
    /// Sequence number of the frame currently lent out.
    outstanding: Option<u64>,
    next_seq: u64,
    capture_interval: Duration,
    last_capture: Option<Instant>,
}

impl TestPatternCamera {
    /// Bring up the simulated pipeline.
    ///
    /// Fails with [`CamError::CameraInit`] on a quality index outside 0–63.
    pub fn init(config: CameraConfig) -> Result<Self> {
        if config.jpeg_quality > MAX_JPEG_QUALITY {
            return Err(CamError::CameraInit(format!(
                "jpeg quality {} out of range 0-{MAX_JPEG_QUALITY}",
                config.jpeg_quality
            )));
        }

        // Startup tuning for legible text: high contrast and sharpness.
        let status = SensorStatus {
            frame_size: config.frame_size,
            quality: config.jpeg_quality,
            contrast: 2,
            sharpness: 2,
            ..SensorStatus::default()
        };
        let (width, height) = config.frame_size.dimensions();
        tracing::info!(
            width,
            height,
            quality = config.jpeg_quality,
            capture_interval_ms = config.capture_interval.as_millis() as u64,
            "test pattern camera initialized"
        );

        Ok(Self {
            sensor: SimulatedSensor { status },
            buffer: Some(Vec::new()),
            outstanding: None,
            next_seq: 0,
            capture_interval: config.capture_interval,
            last_capture: None,
        })
    }

    /// Whether a frame is currently lent out.
    pub fn is_frame_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Rough size of one compressed frame for the given settings.
    fn estimated_len(size: FrameSize, quality: u8) -> usize {
        let (w, h) = size.dimensions();
        let pixels = w as usize * h as usize;
        (pixels / (4 + quality as usize / 2)).max(JPEG_SOI.len() + JPEG_EOI.len())
    }

    fn render(buf: &mut Vec<u8>, status: &SensorStatus, seq: u64) {
        let len = Self::estimated_len(status.frame_size, status.quality);
        let body_len = len - JPEG_SOI.len() - JPEG_EOI.len();

        buf.clear();
        buf.reserve(len);
        buf.extend_from_slice(&JPEG_SOI);

        if status.colorbar {
            buf.extend((0..body_len).map(|i| ((i as u64 + seq) % 0xFF) as u8));
        } else {
            while buf.len() < JPEG_SOI.len() + body_len {
                let word = rand::random::<u64>().to_le_bytes();
                let take = word.len().min(JPEG_SOI.len() + body_len - buf.len());
                // 0xFF would start a marker inside entropy-coded data.
                buf.extend(word[..take].iter().map(|&b| if b == 0xFF { 0xFE } else { b }));
            }
        }

        buf.extend_from_slice(&JPEG_EOI);
    }
}

impl FrameSource for TestPatternCamera {
    fn acquire(&mut self) -> Option<Frame> {
        if let Some(seq) = self.outstanding {
            tracing::trace!(seq, "frame buffer still lent out");
            return None;
        }

        if let Some(last) = self.last_capture
            && last.elapsed() < self.capture_interval
        {
            return None;
        }

        let mut buf = self.buffer.take()?;
        let seq = self.next_seq;
        let status = &self.sensor.status;
        Self::render(&mut buf, status, seq);

        self.next_seq += 1;
        self.outstanding = Some(seq);
        self.last_capture = Some(Instant::now());

        tracing::trace!(seq, len = buf.len(), resolution = %status.frame_size, "frame captured");
        Some(Frame::new(seq, buf, status.frame_size))
    }

    fn release(&mut self, frame: Frame) -> Result<()> {
        let seq = frame.seq();
        if self.outstanding != Some(seq) {
            tracing::warn!(seq, "release of a frame that is not outstanding");
            return Err(CamError::FrameNotOutstanding(seq));
        }

        self.buffer = Some(frame.into_data());
        self.outstanding = None;
        tracing::trace!(seq, "frame released");
        Ok(())
    }
}

impl Camera for TestPatternCamera {
    fn sensor(&mut self) -> Option<&mut dyn Sensor> {
        Some(&mut self.sensor)
    }
}

/// Register model of an OV2640-class sensor with its accepted ranges.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    status: SensorStatus,
}

impl SimulatedSensor {
    pub fn new(status: SensorStatus) -> Self {
        Self { status }
    }
}

fn in_range(param: &ControlParam, value: i32, min: i32, max: i32) -> Result<i32> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(CamError::ParameterRejected {
            name: param.name(),
            value,
        })
    }
}

fn flag(param: &ControlParam, value: i32) -> Result<bool> {
    in_range(param, value, 0, 1).map(|v| v == 1)
}

impl Sensor for SimulatedSensor {
    fn apply(&mut self, param: ControlParam) -> Result<()> {
        let s = &mut self.status;
        match param {
            ControlParam::Brightness(v) => s.brightness = in_range(&param, v, -2, 2)?,
            ControlParam::Contrast(v) => s.contrast = in_range(&param, v, -2, 2)?,
            ControlParam::Saturation(v) => s.saturation = in_range(&param, v, -2, 2)?,
            ControlParam::Sharpness(v) => s.sharpness = in_range(&param, v, -2, 2)?,
            ControlParam::AecValue(v) => s.aec_value = in_range(&param, v, 0, 1200)?,
            ControlParam::AgcGain(v) => s.agc_gain = in_range(&param, v, 0, 30)?,
            ControlParam::SpecialEffect(v) => s.special_effect = in_range(&param, v, 0, 6)?,
            ControlParam::AwbGain(v) => s.awb_gain = flag(&param, v)?,
            ControlParam::Aec(v) => s.aec = flag(&param, v)?,
            ControlParam::Agc(v) => s.agc = flag(&param, v)?,
            ControlParam::Awb(v) => s.awb = flag(&param, v)?,
            ControlParam::VFlip(v) => s.vflip = flag(&param, v)?,
            ControlParam::HMirror(v) => s.hmirror = flag(&param, v)?,
            ControlParam::ColorBar(v) => s.colorbar = flag(&param, v)?,
            ControlParam::Resolution(size) => s.frame_size = size,
        }
        tracing::debug!(param = ?param, "sensor updated");
        Ok(())
    }

    fn status(&self) -> SensorStatus {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_camera() -> TestPatternCamera {
        TestPatternCamera::init(CameraConfig {
            frame_size: FrameSize::Qqvga,
            jpeg_quality: 12,
            capture_interval: Duration::ZERO,
        })
        .unwrap()
    }

    #[test]
    fn init_rejects_bad_quality() {
        let config = CameraConfig {
            jpeg_quality: 64,
            ..CameraConfig::default()
        };
        assert!(matches!(
            TestPatternCamera::init(config),
            Err(CamError::CameraInit(_))
        ));
    }

    #[test]
    fn init_applies_text_tuning() {
        let mut camera = make_camera();
        let status = camera.sensor().unwrap().status();
        assert_eq!(status.contrast, 2);
        assert_eq!(status.sharpness, 2);
        assert_eq!(status.brightness, 0);
        assert_eq!(status.saturation, 0);
    }

    #[test]
    fn frame_has_jpeg_markers() {
        let mut camera = make_camera();
        let frame = camera.acquire().unwrap();
        assert_eq!(&frame.data()[..2], &JPEG_SOI);
        assert_eq!(&frame.data()[frame.len() - 2..], &JPEG_EOI);
        assert_eq!(frame.size(), FrameSize::Qqvga);
        // No stray markers inside the payload.
        assert!(!frame.data()[2..frame.len() - 2].contains(&0xFF));
    }

    #[test]
    fn single_buffer_blocks_second_acquire() {
        let mut camera = make_camera();
        let frame = camera.acquire().unwrap();
        assert!(camera.is_frame_outstanding());
        assert!(camera.acquire().is_none());

        camera.release(frame).unwrap();
        assert!(!camera.is_frame_outstanding());
        let next = camera.acquire().unwrap();
        assert_eq!(next.seq(), 1);
    }

    #[test]
    fn release_of_foreign_frame_is_rejected() {
        let mut camera = make_camera();
        let frame = camera.acquire().unwrap();
        let seq = frame.seq();
        camera.release(frame).unwrap();

        // Same sequence number handed back a second time.
        let replay = Frame::new(seq, vec![0; 4], FrameSize::Qqvga);
        assert!(matches!(
            camera.release(replay),
            Err(CamError::FrameNotOutstanding(s)) if s == seq
        ));
    }

    #[test]
    fn capture_interval_delays_next_frame() {
        let mut camera = TestPatternCamera::init(CameraConfig {
            frame_size: FrameSize::Qqvga,
            jpeg_quality: 12,
            capture_interval: Duration::from_secs(60),
        })
        .unwrap();
        let frame = camera.acquire().unwrap();
        camera.release(frame).unwrap();
        assert!(camera.acquire().is_none());
    }

    #[test]
    fn resolution_change_applies_to_next_capture() {
        let mut camera = make_camera();
        let small = camera.acquire().unwrap();
        let small_len = small.len();
        camera.release(small).unwrap();

        camera
            .sensor()
            .unwrap()
            .apply(ControlParam::Resolution(FrameSize::Svga))
            .unwrap();

        let large = camera.acquire().unwrap();
        assert_eq!(large.size(), FrameSize::Svga);
        assert_eq!(large.size().dimensions(), (800, 600));
        assert!(large.len() > small_len);
    }

    #[test]
    fn colorbar_is_deterministic() {
        let mut camera = make_camera();
        camera
            .sensor()
            .unwrap()
            .apply(ControlParam::ColorBar(1))
            .unwrap();
        let frame = camera.acquire().unwrap();
        assert_eq!(frame.data()[2], 0);
        assert_eq!(frame.data()[3], 1);
    }

    #[test]
    fn sensor_rejects_out_of_range() {
        let mut sensor = SimulatedSensor::new(SensorStatus::default());
        assert!(matches!(
            sensor.apply(ControlParam::Brightness(9)),
            Err(CamError::ParameterRejected {
                name: "brightness",
                value: 9
            })
        ));
        assert!(sensor.apply(ControlParam::VFlip(2)).is_err());
        assert_eq!(sensor.status().brightness, 0);
    }

    #[test]
    fn sensor_applies_values() {
        let mut sensor = SimulatedSensor::new(SensorStatus::default());
        sensor.apply(ControlParam::Contrast(2)).unwrap();
        sensor.apply(ControlParam::Aec(0)).unwrap();
        sensor.apply(ControlParam::AecValue(1200)).unwrap();
        let status = sensor.status();
        assert_eq!(status.contrast, 2);
        assert!(!status.aec);
        assert_eq!(status.aec_value, 1200);
    }
}
