use crate::camera::SharedCamera;
use crate::protocol::control;
use crate::protocol::page::INDEX_HTML;
use crate::protocol::request::HttpRequest;
use crate::protocol::response::HttpResponse;
use crate::stream::{STREAM_CONTENT_TYPE, StreamSlot, StreamSlots};

/// What a connection should do with a request.
pub enum Route {
    /// Send this response and keep serving the connection.
    Respond(HttpResponse),
    /// Switch the connection to the MJPEG stream. The slot is held for as
    /// long as the stream runs.
    Stream(StreamSlot),
}

/// Routes HTTP requests to the page, the stream, the control endpoint and
/// the status report.
///
/// Cheap to clone; one per connection.
#[derive(Clone)]
pub struct RequestHandler {
    camera: SharedCamera,
    slots: StreamSlots,
}

impl RequestHandler {
    pub fn new(camera: SharedCamera, slots: StreamSlots) -> Self {
        RequestHandler { camera, slots }
    }

    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    pub fn handle(&self, request: &HttpRequest) -> Route {
        if request.method != "GET" && request.method != "HEAD" {
            tracing::warn!(method = %request.method, path = %request.path, "unsupported HTTP method");
            return Route::Respond(HttpResponse::method_not_allowed().text("Method Not Allowed"));
        }

        match request.path.as_str() {
            "/" => Route::Respond(self.handle_index()),
            "/stream" => self.handle_stream(),
            "/control" => Route::Respond(self.handle_control(request)),
            "/status" => Route::Respond(self.handle_status()),
            _ => {
                tracing::debug!(path = %request.path, "no route");
                Route::Respond(HttpResponse::not_found().text("Not Found"))
            }
        }
    }

    fn handle_index(&self) -> HttpResponse {
        HttpResponse::ok()
            .add_header("Content-Type", "text/html; charset=utf-8")
            .with_body(INDEX_HTML.to_string())
    }

    fn handle_stream(&self) -> Route {
        match self.slots.try_acquire() {
            Some(slot) => Route::Stream(slot),
            None => {
                tracing::warn!(
                    active = self.slots.active(),
                    max = self.slots.max(),
                    "stream rejected, all slots taken"
                );
                Route::Respond(
                    HttpResponse::service_unavailable()
                        .add_header("Retry-After", "5")
                        .text("Stream busy"),
                )
            }
        }
    }

    fn handle_control(&self, request: &HttpRequest) -> HttpResponse {
        let var = request.query_param("var");
        let val = request.query_param("val");
        let outcome = control::apply(&self.camera, var, val);

        match &outcome {
            Ok(param) => tracing::info!(?param, "control applied"),
            Err(e) => tracing::warn!(var, val, error = %e, "control rejected"),
        }
        control::respond(&outcome)
    }

    fn handle_status(&self) -> HttpResponse {
        let status = match self.camera.lock().sensor() {
            Some(sensor) => sensor.status(),
            None => return HttpResponse::internal_error().text("Sensor not found"),
        };

        let body: String = status
            .fields()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect();
        HttpResponse::ok()
            .add_header("Content-Type", "text/plain")
            .add_header("Cache-Control", "no-cache")
            .with_body(body)
    }
}

/// Response head that opens the MJPEG stream.
///
/// Without chunked coding the body is delimited by closing the connection.
pub fn stream_head(chunked: bool) -> HttpResponse {
    let head = HttpResponse::ok()
        .add_header("Content-Type", STREAM_CONTENT_TYPE)
        .add_header("Cache-Control", "no-cache, no-store, must-revalidate")
        .add_header("Pragma", "no-cache");
    if chunked {
        head.add_header("Transfer-Encoding", "chunked")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{self, CameraConfig, FrameSize, TestPatternCamera};
    use std::time::Duration;

    fn make_handler(max_streams: usize) -> RequestHandler {
        let cam = camera::shared(
            TestPatternCamera::init(CameraConfig {
                frame_size: FrameSize::Qvga,
                jpeg_quality: 12,
                capture_interval: Duration::ZERO,
            })
            .unwrap(),
        );
        RequestHandler::new(cam, StreamSlots::new(max_streams))
    }

    fn get(path: &str) -> HttpRequest {
        HttpRequest::parse(&format!("GET {path} HTTP/1.1\r\nHost: cam\r\n\r\n")).unwrap()
    }

    fn respond(route: Route) -> HttpResponse {
        match route {
            Route::Respond(resp) => resp,
            Route::Stream(_) => panic!("expected a plain response"),
        }
    }

    #[test]
    fn index_serves_html() {
        let handler = make_handler(1);
        let resp = respond(handler.handle(&get("/")));
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.unwrap().contains("<img id=\"stream\" src=\"/stream\""));
    }

    #[test]
    fn stream_takes_a_slot() {
        let handler = make_handler(1);
        let first = handler.handle(&get("/stream"));
        assert!(matches!(first, Route::Stream(_)));

        let second = respond(handler.handle(&get("/stream")));
        assert_eq!(second.status_code, 503);
        assert_eq!(second.body.as_deref(), Some("Stream busy"));

        drop(first);
        assert!(matches!(handler.handle(&get("/stream")), Route::Stream(_)));
    }

    #[test]
    fn control_routes_to_sensor() {
        let handler = make_handler(1);
        let resp = respond(handler.handle(&get("/control?var=vflip&val=1")));
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body.as_deref(), Some("OK"));

        let status = respond(handler.handle(&get("/status")));
        assert!(status.body.unwrap().contains("vflip=1\n"));
    }

    #[test]
    fn control_without_params() {
        let handler = make_handler(1);
        let resp = respond(handler.handle(&get("/control")));
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.body.as_deref(), Some("Missing parameters"));
    }

    #[test]
    fn unknown_path() {
        let handler = make_handler(1);
        let resp = respond(handler.handle(&get("/capture")));
        assert_eq!(resp.status_code, 404);
    }

    #[test]
    fn post_not_allowed() {
        let handler = make_handler(1);
        let req = HttpRequest::parse("POST /control HTTP/1.1\r\n\r\n").unwrap();
        let resp = respond(handler.handle(&req));
        assert_eq!(resp.status_code, 405);
    }

    #[test]
    fn stream_head_is_chunked_multipart() {
        let head = stream_head(true).serialize();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: multipart/x-mixed-replace; boundary=frame\r\n"));
        assert!(head.contains("Transfer-Encoding: chunked\r\n"));
        assert!(!head.contains("Content-Length"));
    }

    #[test]
    fn unchunked_stream_head_has_no_length() {
        let head = stream_head(false).serialize();
        assert!(head.contains("Content-Type: multipart/x-mixed-replace; boundary=frame\r\n"));
        assert!(!head.contains("Transfer-Encoding"));
        assert!(!head.contains("Content-Length"));
    }
}
