use crate::error::{CamError, ParseErrorKind};

/// A parsed HTTP/1.x request head.
///
/// ```text
/// Method SP Request-Target SP HTTP-Version CRLF
/// *(Header: Value CRLF)
/// CRLF
/// ```
///
/// The query string of the target is decoded with
/// `application/x-www-form-urlencoded` rules. Header lookup is
/// case-insensitive. Bodies are not parsed; the connection discards any
/// `Content-Length` bytes that follow.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    /// Raw request target (e.g. `/control?var=brightness&val=1`).
    pub target: String,
    /// Path portion of the target (e.g. `/control`).
    pub path: String,
    /// Decoded query pairs in order of appearance.
    pub query: Vec<(String, String)>,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Parse a request head from its text representation.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.lines();

        let request_line = lines
            .next()
            .filter(|l| !l.trim().is_empty())
            .ok_or(CamError::Parse {
                kind: ParseErrorKind::EmptyRequest,
            })?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(CamError::Parse {
                kind: ParseErrorKind::InvalidRequestLine,
            });
        }

        let method = parts[0].to_string();
        let target = parts[1].to_string();
        let version = parts[2].to_string();

        if !version.starts_with("HTTP/1.") {
            return Err(CamError::Parse {
                kind: ParseErrorKind::UnsupportedVersion,
            });
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (
                path.to_string(),
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            None => (target.clone(), Vec::new()),
        };

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }

            let (name, value) = line.split_once(':').ok_or(CamError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(HttpRequest {
            method,
            target,
            path,
            query,
            version,
            headers,
        })
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Declared body length, 0 when absent or unparseable.
    pub fn content_length(&self) -> usize {
        self.get_header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Whether the client asked for the connection to end after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 defaults to close.
    pub fn wants_close(&self) -> bool {
        match self.get_header("Connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => true,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => false,
            _ => self.version == "HTTP/1.0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_control_request() {
        let raw = "GET /control?var=brightness&val=-1&t=1700000000 HTTP/1.1\r\nHost: cam\r\n\r\n";
        let req = HttpRequest::parse(raw).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/control");
        assert_eq!(req.version, "HTTP/1.1");
        assert_eq!(req.query_param("var"), Some("brightness"));
        assert_eq!(req.query_param("val"), Some("-1"));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(req.get_header("host"), Some("cam"));
    }

    #[test]
    fn query_is_percent_decoded() {
        let raw = "GET /control?var=reso%6Cution&val=S+VGA HTTP/1.1\r\n\r\n";
        let req = HttpRequest::parse(raw).unwrap();
        assert_eq!(req.query_param("var"), Some("resolution"));
        assert_eq!(req.query_param("val"), Some("S VGA"));
    }

    #[test]
    fn path_without_query() {
        let req = HttpRequest::parse("GET /stream HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.path, "/stream");
        assert!(req.query.is_empty());
    }

    #[test]
    fn parse_empty_request() {
        assert!(matches!(
            HttpRequest::parse(""),
            Err(CamError::Parse {
                kind: ParseErrorKind::EmptyRequest
            })
        ));
    }

    #[test]
    fn parse_invalid_request_line() {
        assert!(HttpRequest::parse("GET\r\n\r\n").is_err());
    }

    #[test]
    fn parse_rejects_other_protocols() {
        assert!(matches!(
            HttpRequest::parse("OPTIONS rtsp://cam/stream RTSP/1.0\r\n\r\n"),
            Err(CamError::Parse {
                kind: ParseErrorKind::UnsupportedVersion
            })
        ));
    }

    #[test]
    fn parse_invalid_header() {
        assert!(HttpRequest::parse("GET / HTTP/1.1\r\nnot a header\r\n\r\n").is_err());
    }

    #[test]
    fn connection_close_semantics() {
        let keep = HttpRequest::parse("GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(!keep.wants_close());

        let close = HttpRequest::parse("GET / HTTP/1.1\r\nConnection: Close\r\n\r\n").unwrap();
        assert!(close.wants_close());

        let old = HttpRequest::parse("GET / HTTP/1.0\r\n\r\n").unwrap();
        assert!(old.wants_close());

        let old_keep =
            HttpRequest::parse("GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n").unwrap();
        assert!(!old_keep.wants_close());
    }

    #[test]
    fn content_length_header() {
        let req = HttpRequest::parse("GET / HTTP/1.1\r\ncontent-length: 12\r\n\r\n").unwrap();
        assert_eq!(req.content_length(), 12);
    }
}
