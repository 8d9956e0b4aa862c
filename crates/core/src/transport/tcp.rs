use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::protocol::handler::stream_head;
use crate::protocol::{HttpRequest, HttpResponse, RequestHandler, Route};
use crate::server::ServerConfig;
use crate::stream::multipart::PART_HEADER;
use crate::stream::{StreamSession, StreamSlot};
use crate::transport::StreamBody;

/// Upper bound on a request head; larger heads drop the connection.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Non-blocking TCP accept loop.
///
/// Checks the `running` flag between accepts with a 50ms poll interval
/// so that [`crate::server::Server::stop`] can terminate it promptly.
pub fn accept_loop(
    listener: TcpListener,
    handler: RequestHandler,
    config: Arc<ServerConfig>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                let h = handler.clone();
                let c = config.clone();
                let r = running.clone();
                thread::spawn(move || {
                    Connection::handle(stream, h, c, r);
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// A single HTTP client connection with its own lifecycle.
struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    handler: RequestHandler,
    config: Arc<ServerConfig>,
    peer_addr: SocketAddr,
}

impl Connection {
    /// Entry point: set up a connection and run its request loop.
    pub fn handle(
        stream: TcpStream,
        handler: RequestHandler,
        config: Arc<ServerConfig>,
        running: Arc<AtomicBool>,
    ) {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(_) => return,
        };

        tracing::info!(%peer_addr, "client connected");

        if stream.set_read_timeout(config.read_timeout).is_err()
            || stream.set_write_timeout(config.write_timeout).is_err()
        {
            return;
        }

        let reader_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(_) => return,
        };

        let mut conn = Connection {
            reader: BufReader::new(reader_stream),
            writer: stream,
            handler,
            config,
            peer_addr,
        };

        let reason = conn.run(&running);

        tracing::info!(%peer_addr, reason, "client disconnected");
    }

    /// HTTP request/response loop. Returns the reason for exiting.
    fn run(&mut self, running: &Arc<AtomicBool>) -> &'static str {
        while running.load(Ordering::SeqCst) {
            let mut request_text = String::new();
            loop {
                let mut line = String::new();
                // One byte past the cap is enough to tell an oversize head.
                let budget = (MAX_HEAD_BYTES + 1 - request_text.len()) as u64;
                match (&mut self.reader).take(budget).read_line(&mut line) {
                    Ok(0) => return "connection closed by client",
                    Ok(_) => {
                        request_text.push_str(&line);
                        if request_text.len() > MAX_HEAD_BYTES {
                            tracing::warn!(peer = %self.peer_addr, "request head too large");
                            let response = HttpResponse::bad_request()
                                .add_header("Connection", "close")
                                .text("Request head too large");
                            let _ = self.writer.write_all(response.serialize().as_bytes());
                            return "request head too large";
                        }
                        if line == "\r\n" || line == "\n" {
                            break;
                        }
                    }
                    Err(ref e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        ) =>
                    {
                        return "idle timeout";
                    }
                    Err(_) => return "read error",
                }
            }

            if request_text.trim().is_empty() {
                continue;
            }

            let request = match HttpRequest::parse(&request_text) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "parse error");
                    let response = HttpResponse::bad_request()
                        .add_header("Connection", "close")
                        .text("Bad Request");
                    let _ = self.writer.write_all(response.serialize().as_bytes());
                    return "malformed request";
                }
            };

            tracing::debug!(
                peer = %self.peer_addr,
                method = %request.method,
                target = %request.target,
                version = %request.version,
                "request"
            );

            if self.discard_body(request.content_length()).is_err() {
                return "read error";
            }

            let head_only = request.method == "HEAD";
            let close = request.wants_close();

            match self.handler.handle(&request) {
                Route::Respond(mut response) => {
                    if close {
                        response = response.add_header("Connection", "close");
                    }

                    tracing::debug!(
                        peer = %self.peer_addr,
                        status = response.status_code,
                        "response"
                    );

                    let wire = if head_only {
                        response.serialize_head()
                    } else {
                        response.serialize()
                    };
                    if self.writer.write_all(wire.as_bytes()).is_err() {
                        return "write error";
                    }
                    if close {
                        return "client requested close";
                    }
                }
                Route::Stream(slot) => {
                    let chunked = request.version != "HTTP/1.0";
                    if head_only {
                        let head = stream_head(chunked).add_header("Connection", "close");
                        let _ = self.writer.write_all(head.serialize().as_bytes());
                        return "stream head sent";
                    }
                    return self.stream(slot, &request.version, running);
                }
            }
        }

        "server shutting down"
    }

    /// Drive one viewer's stream until the client goes away or the server stops.
    ///
    /// Acts as the transfer driver: asks the session for up to `chunk_size`
    /// bytes, sends whatever comes back as one chunk (raw for HTTP/1.0), and
    /// idles for `idle_poll` whenever the session has nothing to give. While
    /// idle it checks whether the viewer hung up. The blocking socket write
    /// is the backpressure.
    fn stream(&mut self, _slot: StreamSlot, version: &str, running: &Arc<AtomicBool>) -> &'static str {
        let chunked = version != "HTTP/1.0";
        let head = stream_head(chunked).add_header("Connection", "close");
        if self.writer.write_all(head.serialize().as_bytes()).is_err() {
            return "write error";
        }

        let mut session = StreamSession::new(
            self.handler.camera().clone(),
            self.config.frame_interval,
        );
        let session_id = session.id();
        tracing::info!(peer = %self.peer_addr, session_id, chunked, "stream started");

        let capacity = self.config.chunk_size.max(PART_HEADER.len());
        let mut buf = vec![0u8; capacity];
        let mut body = StreamBody::for_version(&mut self.writer, version);
        let mut offset = 0u64;

        let reason = loop {
            if !running.load(Ordering::SeqCst) {
                let _ = body.finish();
                break "server shutting down";
            }

            let n = session.fill(&mut buf, offset);
            if n == 0 {
                if peer_closed(self.reader.get_ref()) {
                    break "client disconnected";
                }
                thread::sleep(self.config.idle_poll);
                continue;
            }

            if let Err(e) = body.write_part(&buf[..n]) {
                tracing::debug!(peer = %self.peer_addr, error = %e, "stream write failed");
                break "client disconnected";
            }
            offset += n as u64;
        };

        session.close();
        tracing::info!(
            peer = %self.peer_addr,
            session_id,
            frames = session.encoder().frames_completed(),
            bytes = offset,
            chunks = body.chunks(),
            reason,
            "stream ended"
        );
        reason
    }

    fn discard_body(&mut self, len: usize) -> io::Result<()> {
        if len > 0 {
            io::copy(&mut (&mut self.reader).take(len as u64), &mut io::sink())?;
        }
        Ok(())
    }
}

/// Whether the peer has hung up, checked without blocking.
///
/// A viewer never sends anything after its request, so readable data is
/// ignored and only end-of-stream or a socket error count as closed.
fn peer_closed(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return true;
    }
    let mut byte = [0u8; 1];
    let closed = match stream.peek(&mut byte) {
        Ok(0) => true,
        Ok(_) => false,
        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => false,
        Err(_) => true,
    };
    stream.set_nonblocking(false).is_err() || closed
}
