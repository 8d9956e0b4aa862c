/// An HTTP/1.1 response head plus an optional body.
///
/// ```text
/// HTTP/1.1 200 OK\r\n
/// Server: camstream/0.1\r\n
/// Content-Type: text/plain\r\n
/// Content-Length: 2\r\n
/// \r\n
/// OK
/// ```
///
/// Builder style: chain [`add_header`](Self::add_header) and
/// [`with_body`](Self::with_body), then call [`serialize`](Self::serialize).
/// `Content-Length` is computed when a body is present. A response without a
/// body gets no `Content-Length`, which is what the chunked stream head needs.
#[must_use]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Server identification string included in every response.
pub const SERVER_AGENT: &str = "camstream/0.1";

impl HttpResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        HttpResponse {
            status_code,
            status_text: status_text.to_string(),
            headers: vec![
                ("Server".to_string(), SERVER_AGENT.to_string()),
                ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            ],
            body: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request")
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed").add_header("Allow", "GET, HEAD")
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }

    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable")
    }

    /// `text/plain` response with the given status and message body.
    pub fn text(self, message: &str) -> Self {
        self.add_header("Content-Type", "text/plain")
            .with_body(message.to_string())
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize to the HTTP wire format.
    pub fn serialize(&self) -> String {
        let mut response = self.serialize_head();
        if let Some(body) = &self.body {
            response.push_str(body);
        }
        response
    }

    /// Status line and headers only, as sent for `HEAD` requests.
    ///
    /// Still advertises the length of the body that would have been sent.
    pub fn serialize_head(&self) -> String {
        let mut response = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.status_text);

        for (name, value) in &self.headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }

        if let Some(body) = &self.body {
            response.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        response.push_str("\r\n");
        response
    }
}
