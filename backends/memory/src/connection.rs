//! The scripted connection and its recording.

use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use monoreq_interface::{BodyWriter, Connection, TransportConfig};

use crate::Script;

/// Everything the facade did to one scripted connection.
///
/// A recording starts when the connection is opened and is filled in as the
/// facade configures the connection and streams the request body.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    /// The full URL the connection was opened for.
    pub url: String,
    /// The transport configuration handed to the factory.
    pub transport: TransportConfig,
    /// The request method.
    pub method: String,
    /// Request headers in set order, later sets replacing earlier values.
    pub headers: Vec<(String, String)>,
    /// Connect timeout, when one was applied.
    pub connect_timeout: Option<Duration>,
    /// Read timeout, when one was applied.
    pub read_timeout: Option<Duration>,
    /// Whether redirects were enabled.
    pub follow_redirects: bool,
    /// How the request body length was declared.
    pub length_mode: RecordedLength,
    /// Whether the outgoing body channel was opened.
    pub body_opened: bool,
    /// Whether the outgoing body channel was closed.
    pub body_closed: bool,
    /// The request body bytes accepted so far.
    pub body: Vec<u8>,
    /// Number of disconnect calls.
    pub disconnects: u32,
}

impl Recording {
    /// The recorded value of the named request header, matched ASCII case
    /// insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The body length declaration the facade made, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordedLength {
    /// No declaration; the backend would buffer.
    #[default]
    Buffered,
    /// An exact length was declared up front.
    Fixed(u64),
    /// Chunked transfer with the given chunk size.
    Chunked(usize),
}

pub(crate) struct MemoryConnection {
    script: Script,
    recording: Arc<Mutex<Recording>>,
}

impl MemoryConnection {
    pub(crate) fn new(script: Script, recording: Arc<Mutex<Recording>>) -> Self {
        Self { script, recording }
    }
}

impl Connection for MemoryConnection {
    fn set_method(&mut self, method: &str) -> io::Result<()> {
        self.recording.lock().unwrap().method = method.to_string();
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let mut recording = self.recording.lock().unwrap();
        match recording
            .headers
            .iter_mut()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value.to_string(),
            None => recording.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn set_connect_timeout(&mut self, timeout: Duration) {
        self.recording.lock().unwrap().connect_timeout = Some(timeout);
    }

    fn set_read_timeout(&mut self, timeout: Duration) {
        self.recording.lock().unwrap().read_timeout = Some(timeout);
    }

    fn set_follow_redirects(&mut self, follow: bool) {
        self.recording.lock().unwrap().follow_redirects = follow;
    }

    fn set_fixed_body_len(&mut self, len: u64) {
        self.recording.lock().unwrap().length_mode = RecordedLength::Fixed(len);
    }

    fn set_chunked_body(&mut self, chunk_size: usize) {
        self.recording.lock().unwrap().length_mode = RecordedLength::Chunked(chunk_size);
    }

    fn open_body(&mut self) -> io::Result<Box<dyn BodyWriter>> {
        self.recording.lock().unwrap().body_opened = true;
        Ok(Box::new(MemoryBodyWriter {
            recording: Arc::clone(&self.recording),
            accepted: 0,
            fail_write_at: self.script.fail_body_write_at,
            fail_close: self.script.fail_body_close,
        }))
    }

    fn status(&mut self) -> io::Result<(u16, String)> {
        Ok((self.script.status, self.script.reason.clone()))
    }

    fn response_headers(&mut self) -> io::Result<Vec<(String, Vec<String>)>> {
        Ok(self.script.headers.clone())
    }

    fn open_input(&mut self) -> io::Result<Box<dyn Read + Send>> {
        // Mirrors the platform stacks, which refuse the regular channel for
        // error statuses that carry an error body.
        if self.script.fail_input_open
            || (self.script.status >= 400 && self.script.error_body.is_some())
        {
            return Err(io::Error::other("response stream refused"));
        }
        Ok(Box::new(Cursor::new(self.script.body.clone())))
    }

    fn error_input(&mut self) -> Option<Box<dyn Read + Send>> {
        if self.script.status < 400 {
            return None;
        }
        self.script
            .error_body
            .clone()
            .map(|body| Box::new(Cursor::new(body)) as Box<dyn Read + Send>)
    }

    fn disconnect(&mut self) {
        self.recording.lock().unwrap().disconnects += 1;
    }
}

struct MemoryBodyWriter {
    recording: Arc<Mutex<Recording>>,
    accepted: u64,
    fail_write_at: Option<u64>,
    fail_close: bool,
}

impl io::Write for MemoryBodyWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if let Some(limit) = self.fail_write_at {
            if self.accepted + data.len() as u64 > limit {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted body write failure",
                ));
            }
        }
        self.accepted += data.len() as u64;
        self.recording.lock().unwrap().body.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BodyWriter for MemoryBodyWriter {
    fn close(&mut self) -> io::Result<()> {
        self.recording.lock().unwrap().body_closed = true;
        if self.fail_close {
            return Err(io::Error::other("scripted body close failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn connection(script: Script) -> MemoryConnection {
        MemoryConnection::new(script, Arc::default())
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut conn = connection(Script::ok());
        conn.set_header("X-Token", "first");
        conn.set_header("x-token", "second");
        conn.set_header("Other", "kept");

        let recording = conn.recording.lock().unwrap().clone();
        assert_eq!(
            recording.headers,
            vec![
                ("X-Token".to_string(), "second".to_string()),
                ("Other".to_string(), "kept".to_string()),
            ]
        );
        assert_eq!(recording.header("X-TOKEN"), Some("second"));
    }

    #[test]
    fn test_body_writer_fails_past_limit() {
        let mut conn = connection(Script::ok().fail_body_write_at(4));
        let mut writer = conn.open_body().unwrap();

        writer.write_all(b"abcd").unwrap();
        assert!(writer.write_all(b"e").is_err());
        assert_eq!(conn.recording.lock().unwrap().body, b"abcd");
    }

    #[test]
    fn test_error_channel_needs_error_status() {
        let mut conn = connection(Script::ok().error_body("nope"));
        assert!(conn.error_input().is_none());

        let mut conn = connection(Script::new(404, "Not Found").error_body("missing"));
        let mut body = String::new();
        conn.error_input().unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "missing");
    }
}
