use std::io;
use std::time::Duration;

use camstream::camera::{self, FrameSize};
use camstream::{CameraConfig, Server, ServerConfig, TestPatternCamera};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "camstream-server",
    about = "MJPEG camera server with a browser control page"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Largest chunk written to a viewer's socket, in bytes
    #[arg(long, default_value_t = 1436)]
    chunk_size: usize,

    /// Pause between frames sent to a viewer, in milliseconds
    #[arg(long, default_value_t = 100)]
    frame_interval_ms: u64,

    /// Minimum time between two camera captures, in milliseconds
    #[arg(long, default_value_t = 33)]
    capture_interval_ms: u64,

    /// Concurrent stream viewers admitted
    #[arg(long, default_value_t = 1)]
    max_streams: usize,

    /// Initial resolution (QQVGA, QVGA, VGA, SVGA)
    #[arg(long, default_value = "VGA", value_parser = parse_frame_size)]
    resolution: FrameSize,

    /// JPEG quality index, 0-63, lower is better
    #[arg(long, default_value_t = 10)]
    quality: u8,
}

fn parse_frame_size(s: &str) -> Result<FrameSize, String> {
    s.to_ascii_uppercase().parse().map_err(|e| format!("{e}"))
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let cam = match TestPatternCamera::init(CameraConfig {
        frame_size: args.resolution,
        jpeg_quality: args.quality,
        capture_interval: Duration::from_millis(args.capture_interval_ms),
    }) {
        Ok(cam) => cam,
        Err(e) => {
            tracing::error!(error = %e, "camera unavailable, not serving");
            return;
        }
    };

    let config = ServerConfig {
        chunk_size: args.chunk_size,
        frame_interval: Duration::from_millis(args.frame_interval_ms),
        max_streams: args.max_streams,
        ..ServerConfig::default()
    };
    let mut server = Server::with_config(&args.bind, camera::shared(cam), config);

    if let Err(e) = server.start() {
        tracing::error!(bind = %args.bind, error = %e, "failed to start server");
        return;
    }

    println!("Camera stream on http://{}/, press Enter to stop", args.bind);
    let mut input = String::new();
    let _ = io::stdin().read_line(&mut input);

    server.stop();
}
