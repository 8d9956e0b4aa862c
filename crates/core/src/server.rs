use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::camera::SharedCamera;
use crate::error::{CamError, Result};
use crate::protocol::RequestHandler;
use crate::stream::StreamSlots;
use crate::transport::tcp;

/// Server-level configuration shared with every connection.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Capacity of each buffer the stream driver asks the encoder to fill,
    /// i.e. the largest chunk written to the socket. Values below the
    /// 37-byte part header are raised to it.
    pub chunk_size: usize,
    /// Pause between the end of one part and the acquisition of the next
    /// frame, per viewer. `Duration::ZERO` streams as fast as the camera
    /// delivers.
    pub frame_interval: Duration,
    /// How long the stream driver sleeps when the encoder had nothing to send.
    pub idle_poll: Duration,
    /// Concurrent `/stream` viewers admitted. Further viewers get 503.
    pub max_streams: usize,
    /// Socket read timeout; idle keep-alive connections are closed after it.
    pub read_timeout: Option<Duration>,
    /// Socket write timeout; a viewer that stops reading is dropped after it.
    pub write_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1436,
            frame_interval: Duration::from_millis(100),
            idle_poll: Duration::from_millis(5),
            max_streams: 1,
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// HTTP camera server.
///
/// Owns the request handler (camera handle plus stream slots) and the
/// listener thread. Delegates connection handling to [`transport::tcp`].
pub struct Server {
    running: Arc<AtomicBool>,
    bind_addr: String,
    local_addr: Option<SocketAddr>,
    handler: RequestHandler,
    slots: StreamSlots,
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn new(bind_addr: &str, camera: SharedCamera) -> Self {
        Self::with_config(bind_addr, camera, ServerConfig::default())
    }

    /// Create a server with custom streaming configuration.
    pub fn with_config(bind_addr: &str, camera: SharedCamera, config: ServerConfig) -> Self {
        let slots = StreamSlots::new(config.max_streams);
        Self {
            running: Arc::new(AtomicBool::new(false)),
            bind_addr: bind_addr.to_string(),
            local_addr: None,
            handler: RequestHandler::new(camera, slots.clone()),
            slots,
            config: Arc::new(config),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CamError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.bind_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);

        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let handler = self.handler.clone();
        let config = self.config.clone();

        tracing::info!(
            addr = %local_addr,
            chunk_size = config.chunk_size,
            frame_interval_ms = config.frame_interval.as_millis() as u64,
            max_streams = config.max_streams,
            "HTTP camera server listening"
        );

        thread::spawn(move || {
            tcp::accept_loop(listener, handler, config, running);
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("server stopping");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Number of viewers currently streaming.
    pub fn active_streams(&self) -> usize {
        self.slots.active()
    }

    pub fn camera(&self) -> &SharedCamera {
        self.handler.camera()
    }

    /// Returns the server's configuration.
    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
