use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::{Camera, Frame, FrameSource, SharedCamera};
use crate::error::Result;
use crate::stream::multipart::MultipartEncoder;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One `/stream` viewer.
///
/// Owns the connection's [`MultipartEncoder`] and applies the inter-frame
/// pacing policy: after a part completes, no new frame is acquired until
/// `frame_interval` has elapsed. The camera lock is held only for the
/// duration of a single [`fill`](Self::fill) call.
///
/// [`close`](Self::close) hands back any frame still held. `Drop` calls it
/// too, so a driver that bails out early cannot leak the camera's buffer.
pub struct StreamSession {
    id: u64,
    camera: SharedCamera,
    encoder: MultipartEncoder,
    frame_interval: Duration,
    last_part_done: Option<Instant>,
    closed: bool,
}

impl StreamSession {
    pub fn new(camera: SharedCamera, frame_interval: Duration) -> Self {
        let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(session_id = id, frame_interval_ms = frame_interval.as_millis() as u64, "stream session created");
        Self {
            id,
            camera,
            encoder: MultipartEncoder::new(),
            frame_interval,
            last_part_done: None,
            closed: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Fill `buf` with the next stretch of the multipart body.
    ///
    /// Same contract as [`MultipartEncoder::fill`]. Always 0 after
    /// [`close`](Self::close).
    pub fn fill(&mut self, buf: &mut [u8], offset: u64) -> usize {
        if self.closed {
            return 0;
        }

        let ready = self
            .last_part_done
            .is_none_or(|done| done.elapsed() >= self.frame_interval);
        let completed = self.encoder.frames_completed();

        let written = {
            let mut camera = self.camera.lock();
            let mut source = Paced {
                inner: &mut **camera,
                ready,
            };
            self.encoder.fill(&mut source, buf, offset)
        };

        if self.encoder.frames_completed() != completed {
            self.last_part_done = Some(Instant::now());
        }
        written
    }

    /// Release any held frame. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut camera = self.camera.lock();
        self.encoder.close(&mut **camera);
        tracing::debug!(
            session_id = self.id,
            frames = self.encoder.frames_completed(),
            bytes = self.encoder.bytes_emitted(),
            "stream session closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn encoder(&self) -> &MultipartEncoder {
        &self.encoder
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Frame source view that withholds new frames until pacing allows.
struct Paced<'a> {
    inner: &'a mut dyn Camera,
    ready: bool,
}

impl FrameSource for Paced<'_> {
    fn acquire(&mut self) -> Option<Frame> {
        if self.ready {
            self.inner.acquire()
        } else {
            None
        }
    }

    fn release(&mut self, frame: Frame) -> Result<()> {
        self.inner.release(frame)
    }
}

/// Counting limiter for concurrent `/stream` viewers.
///
/// The camera lends out a single frame buffer, so two viewers would contend
/// for it on every frame. The server hands out at most `max` slots and turns
/// further viewers away.
#[derive(Clone)]
pub struct StreamSlots {
    active: Arc<AtomicUsize>,
    max: usize,
}

impl StreamSlots {
    pub fn new(max: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    /// Claim a slot, or `None` if all are taken.
    pub fn try_acquire(&self) -> Option<StreamSlot> {
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max).then_some(n + 1)
            })
            .ok()
            .map(|_| StreamSlot {
                active: self.active.clone(),
            })
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// A claimed stream slot, returned to the pool on drop.
pub struct StreamSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for StreamSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{self, CameraConfig, FrameSize, TestPatternCamera};
    use crate::stream::multipart::{EncoderState, PART_HEADER};

    fn make_camera() -> SharedCamera {
        camera::shared(
            TestPatternCamera::init(CameraConfig {
                frame_size: FrameSize::Qqvga,
                jpeg_quality: 20,
                capture_interval: Duration::ZERO,
            })
            .unwrap(),
        )
    }

    /// Pull bytes until `parts` parts have completed.
    fn pump(session: &mut StreamSession, parts: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; 512];
        while session.encoder().frames_completed() < parts {
            let n = session.fill(&mut buf, out.len() as u64);
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn session_streams_parts() {
        let mut session = StreamSession::new(make_camera(), Duration::ZERO);
        let out = pump(&mut session, 2);
        assert!(out.starts_with(PART_HEADER));
        let second = out
            .windows(PART_HEADER.len())
            .skip(1)
            .position(|w| w == PART_HEADER);
        assert!(second.is_some());
    }

    #[test]
    fn pacing_withholds_next_frame() {
        let mut session = StreamSession::new(make_camera(), Duration::from_secs(60));
        pump(&mut session, 1);

        let mut buf = vec![0u8; 4096];
        let offset = session.encoder().bytes_emitted();
        // Only the owed trailer (if any) can come out; no new part starts.
        let n = session.fill(&mut buf, offset);
        assert!(n <= 2);
        assert_eq!(session.encoder().state(), EncoderState::AwaitingFrame);
        assert!(!session.encoder().is_holding_frame());
    }

    #[test]
    fn close_returns_frame_to_camera() {
        let cam = make_camera();
        let mut session = StreamSession::new(cam.clone(), Duration::ZERO);

        let mut buf = vec![0u8; 64];
        session.fill(&mut buf, 0);
        assert!(session.encoder().is_holding_frame());
        assert!(cam.lock().acquire().is_none());

        session.close();
        assert!(session.is_closed());
        assert_eq!(session.fill(&mut buf, 64), 0);

        let frame = cam.lock().acquire();
        assert!(frame.is_some());
    }

    #[test]
    fn drop_returns_frame_to_camera() {
        let cam = make_camera();
        {
            let mut session = StreamSession::new(cam.clone(), Duration::ZERO);
            let mut buf = vec![0u8; 64];
            session.fill(&mut buf, 0);
            assert!(session.encoder().is_holding_frame());
        }
        assert!(cam.lock().acquire().is_some());
    }

    #[test]
    fn session_ids_are_unique() {
        let cam = make_camera();
        let a = StreamSession::new(cam.clone(), Duration::ZERO);
        let b = StreamSession::new(cam, Duration::ZERO);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn slots_limit_and_recycle() {
        let slots = StreamSlots::new(1);
        let first = slots.try_acquire();
        assert!(first.is_some());
        assert!(slots.try_acquire().is_none());
        assert_eq!(slots.active(), 1);

        drop(first);
        assert_eq!(slots.active(), 0);
        assert!(slots.try_acquire().is_some());
    }

    #[test]
    fn zero_slots_rejects_everyone() {
        let slots = StreamSlots::new(0);
        assert!(slots.try_acquire().is_none());
    }
}
