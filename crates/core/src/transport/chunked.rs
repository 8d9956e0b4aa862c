use std::io::{self, Write};

/// HTTP/1.1 chunked transfer coding over any writer.
///
/// ```text
/// <len in hex>\r\n
/// <len bytes>\r\n
/// ...
/// 0\r\n
/// \r\n
/// ```
///
/// Empty writes are skipped, since a zero-length chunk would end the body.
pub struct ChunkedWriter<W: Write> {
    inner: W,
    chunks: u64,
    payload_bytes: u64,
    finished: bool,
}

impl<W: Write> ChunkedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            chunks: 0,
            payload_bytes: 0,
            finished: false,
        }
    }

    /// Frame `data` as one chunk and flush it.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if self.finished {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "chunked body already terminated",
            ));
        }

        write!(self.inner, "{:X}\r\n", data.len())?;
        self.inner.write_all(data)?;
        self.inner.write_all(b"\r\n")?;
        self.inner.flush()?;

        self.chunks += 1;
        self.payload_bytes += data.len() as u64;
        Ok(())
    }

    /// Write the terminating zero-length chunk. Idempotent.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.inner.write_all(b"0\r\n\r\n")?;
        self.inner.flush()
    }

    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Payload bytes written, excluding chunk framing.
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Framing of an endless response body.
///
/// HTTP/1.1 clients get chunked transfer coding. HTTP/1.0 has no chunked
/// coding, so those clients get the raw bytes and the body ends when the
/// connection closes.
pub enum StreamBody<W: Write> {
    Chunked(ChunkedWriter<W>),
    CloseDelimited(W),
}

impl<W: Write> StreamBody<W> {
    /// Pick the framing for a request of the given HTTP version.
    pub fn for_version(inner: W, version: &str) -> Self {
        if version == "HTTP/1.0" {
            Self::CloseDelimited(inner)
        } else {
            Self::Chunked(ChunkedWriter::new(inner))
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Self::Chunked(_))
    }

    /// Send `data` as the next stretch of the body.
    pub fn write_part(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Chunked(w) => w.write_chunk(data),
            Self::CloseDelimited(w) => {
                w.write_all(data)?;
                w.flush()
            }
        }
    }

    /// End the body. A close-delimited body ends with the connection, so
    /// there is nothing to write.
    pub fn finish(&mut self) -> io::Result<()> {
        match self {
            Self::Chunked(w) => w.finish(),
            Self::CloseDelimited(_) => Ok(()),
        }
    }

    /// Chunks written, 0 for a close-delimited body.
    pub fn chunks(&self) -> u64 {
        match self {
            Self::Chunked(w) => w.chunks(),
            Self::CloseDelimited(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_chunks_in_hex() {
        let mut w = ChunkedWriter::new(Vec::new());
        w.write_chunk(b"hello").unwrap();
        w.write_chunk(&[b'x'; 26]).unwrap();
        w.finish().unwrap();
        assert_eq!(w.chunks(), 2);
        assert_eq!(w.payload_bytes(), 31);

        let mut expected = b"5\r\nhello\r\n1A\r\n".to_vec();
        expected.extend_from_slice(&[b'x'; 26]);
        expected.extend_from_slice(b"\r\n0\r\n\r\n");
        assert_eq!(w.into_inner(), expected);
    }

    #[test]
    fn empty_write_is_skipped() {
        let mut w = ChunkedWriter::new(Vec::new());
        w.write_chunk(&[]).unwrap();
        assert_eq!(w.chunks(), 0);
        assert!(w.into_inner().is_empty());
    }

    #[test]
    fn finish_is_idempotent_and_final() {
        let mut w = ChunkedWriter::new(Vec::new());
        w.finish().unwrap();
        w.finish().unwrap();
        assert!(w.write_chunk(b"late").is_err());
        assert_eq!(w.into_inner(), b"0\r\n\r\n".to_vec());
    }

    #[test]
    fn http10_body_is_raw() {
        let mut body = StreamBody::for_version(Vec::new(), "HTTP/1.0");
        assert!(!body.is_chunked());
        body.write_part(b"--frame").unwrap();
        body.finish().unwrap();
        assert_eq!(body.chunks(), 0);
        match body {
            StreamBody::CloseDelimited(out) => assert_eq!(out, b"--frame".to_vec()),
            StreamBody::Chunked(_) => panic!("expected a close-delimited body"),
        }
    }

    #[test]
    fn http11_body_is_chunked() {
        let mut body = StreamBody::for_version(Vec::new(), "HTTP/1.1");
        assert!(body.is_chunked());
        body.write_part(b"abc").unwrap();
        body.finish().unwrap();
        match body {
            StreamBody::Chunked(w) => assert_eq!(w.into_inner(), b"3\r\nabc\r\n0\r\n\r\n".to_vec()),
            StreamBody::CloseDelimited(_) => panic!("expected a chunked body"),
        }
    }
}
