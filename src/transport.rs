//! Line-delimited framing over a TCP or TLS stream.

use crate::cli::{ClientConfig, TlsVerification};
use crate::{debug_log, info_log};
use native_tls::{HandshakeError, TlsConnector, TlsStream};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use thiserror::Error;

/// Upper bound on a single record, so a server that never sends `\n` cannot exhaust memory.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// A byte stream the session can talk over and shut down when it is done.
pub trait Transport: Read + Write {
    fn close(&mut self) -> io::Result<()>;
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("record exceeds {MAX_FRAME_LEN} bytes without a line delimiter")]
    TooLong,
    #[error("connection closed in the middle of a record")]
    Truncated,
    #[error("record is not valid UTF-8")]
    NotUtf8,
}

/// Reads one `\n`-terminated record at a time.
///
/// Bytes after the delimiter stay in the buffer for the next call, so a single
/// socket read may carry several records or only part of one.
pub struct FrameReader<T: Transport> {
    inner: BufReader<T>,
}

impl<T: Transport> FrameReader<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: BufReader::new(transport),
        }
    }

    /// Returns `Ok(None)` when the peer closed the stream between records.
    pub fn read_frame(&mut self) -> Result<Option<String>, FrameError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let limit = (MAX_FRAME_LEN + 1) as u64;
            let read = (&mut self.inner).take(limit).read_until(b'\n', &mut buf)?;
            if read == 0 {
                return Ok(None);
            }
            if buf.last() != Some(&b'\n') {
                return Err(if buf.len() > MAX_FRAME_LEN {
                    FrameError::TooLong
                } else {
                    FrameError::Truncated
                });
            }
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let line = String::from_utf8(buf).map_err(|_| FrameError::NotUtf8)?;
            debug_log!("<- {line}");
            return Ok(Some(line));
        }
    }

    pub fn write_frame(&mut self, line: &str) -> io::Result<()> {
        debug_log!("-> {line}");
        let writer = self.inner.get_mut();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.inner.get_mut().close()
    }

    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }
}

pub enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

impl Transport for Connection {
    fn close(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.shutdown(Shutdown::Both),
            Self::Tls(stream) => {
                // close_notify may fail if the server already hung up; the socket still goes.
                if let Err(e) = stream.shutdown() {
                    debug_log!("TLS shutdown failed: {e}");
                }
                stream.get_ref().shutdown(Shutdown::Both)
            }
        }
    }
}

fn open_tcp(config: &ClientConfig) -> io::Result<TcpStream> {
    let addrs = (config.host.as_str(), config.port).to_socket_addrs()?;
    let mut last_error = None;
    for addr in addrs {
        debug_log!("connecting to {addr}");
        let attempt = match config.timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {}", config.host),
        )
    }))
}

pub fn tls_connector(verification: TlsVerification) -> Result<TlsConnector, native_tls::Error> {
    let mut builder = TlsConnector::builder();
    if verification == TlsVerification::AcceptAny {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }
    builder.build()
}

/// A blocking socket only reports `WouldBlock` once its read or write timeout has expired.
fn handshake_error(err: HandshakeError<TcpStream>) -> io::Error {
    match err {
        HandshakeError::WouldBlock(_) => {
            io::Error::new(io::ErrorKind::TimedOut, "TLS handshake timed out")
        }
        HandshakeError::Failure(e) => io::Error::other(format!("TLS handshake failed: {e}")),
    }
}

/// Opens the connection described by `config`, applying its timeouts to every read and write.
pub fn connect(config: &ClientConfig) -> io::Result<Connection> {
    let stream = open_tcp(config)?;
    stream.set_read_timeout(config.timeout)?;
    stream.set_write_timeout(config.timeout)?;
    stream.set_nodelay(true)?;

    let Some(verification) = config.tls else {
        info_log!("connected to {}:{}", config.host, config.port);
        return Ok(Connection::Plain(stream));
    };

    let connector = tls_connector(verification).map_err(io::Error::other)?;
    let stream = connector
        .connect(&config.host, stream)
        .map_err(handshake_error)?;
    info_log!(
        "connected to {}:{} over TLS ({verification})",
        config.host,
        config.port
    );
    Ok(Connection::Tls(Box::new(stream)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// In-memory transport: reads come from scripted chunks, writes are recorded.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub chunks: VecDeque<Vec<u8>>,
        pub written: Vec<u8>,
        /// Shared so it can still be read after the transport is dropped.
        pub closed: Rc<Cell<bool>>,
    }

    impl ScriptedTransport {
        pub fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                ..Self::default()
            }
        }

        pub fn sent_lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.written)
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    impl Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(mut chunk) = self.chunks.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.chunks.push_front(chunk.split_off(n));
            }
            Ok(n)
        }
    }

    impl Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for ScriptedTransport {
        fn close(&mut self) -> io::Result<()> {
            self.closed.set(true);
            Ok(())
        }
    }

    fn reader(chunks: &[&str]) -> FrameReader<ScriptedTransport> {
        FrameReader::new(ScriptedTransport::new(chunks))
    }

    #[test]
    fn test_record_split_across_reads() {
        let mut frames = reader(&["{\"type\":", "\"start\",\"id\"", ":\"x\"}\n"]);
        assert_eq!(
            frames.read_frame().unwrap().as_deref(),
            Some(r#"{"type":"start","id":"x"}"#)
        );
        assert!(frames.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_several_records_in_one_read() {
        let mut frames = reader(&["one\ntwo\nthr", "ee\n"]);
        assert_eq!(frames.read_frame().unwrap().as_deref(), Some("one"));
        assert_eq!(frames.read_frame().unwrap().as_deref(), Some("two"));
        assert_eq!(frames.read_frame().unwrap().as_deref(), Some("three"));
        assert!(frames.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let mut frames = reader(&["\r\n\nhello\r\n"]);
        assert_eq!(frames.read_frame().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_eof_mid_record() {
        let mut frames = reader(&["{\"type\":\"bye\""]);
        assert!(matches!(frames.read_frame(), Err(FrameError::Truncated)));
    }

    #[test]
    fn test_oversized_record() {
        let big = "a".repeat(MAX_FRAME_LEN + 10);
        let mut frames = reader(&[big.as_str(), "\n"]);
        assert!(matches!(frames.read_frame(), Err(FrameError::TooLong)));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut frames = FrameReader::new(ScriptedTransport {
            chunks: VecDeque::from([vec![0xff, 0xfe, b'\n']]),
            ..ScriptedTransport::default()
        });
        assert!(matches!(frames.read_frame(), Err(FrameError::NotUtf8)));
    }

    #[test]
    fn test_write_frame_appends_delimiter() {
        let mut frames = reader(&[]);
        frames.write_frame("{\"type\":\"hello\"}").unwrap();
        frames.close().unwrap();
        assert_eq!(frames.get_ref().written, b"{\"type\":\"hello\"}\n");
        assert!(frames.get_ref().closed.get());
    }

    #[test]
    fn test_tls_connector_builds_for_both_trust_modes() {
        assert!(tls_connector(TlsVerification::AcceptAny).is_ok());
        assert!(tls_connector(TlsVerification::Verify).is_ok());
    }
}
