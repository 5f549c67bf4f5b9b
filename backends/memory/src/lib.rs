//! In-memory scripted backend for monoreq.
//!
//! This backend never touches the network. Tests mount a [`Script`] per URL path,
//! run requests against it through the facade, and read back a [`Recording`] of
//! everything the facade did to the connection: method, headers, the exact body
//! bytes, length mode and lifecycle transitions.
//!
//! ```
//! let backend = monoreq_backend_memory::install();
//! backend.mount("/hello", monoreq_backend_memory::Script::ok().body("hi"));
//!
//! let mut request = monoreq::Request::get("http://test.local/hello")?;
//! assert_eq!(request.body()?, "hi");
//! assert_eq!(backend.recorded("/hello").unwrap().method, "GET");
//! # Ok::<(), monoreq::Error>(())
//! ```
//!
//! The registry the facade resolves backends through holds one factory per
//! process, so [`install`] registers on first use and hands out further handles
//! to the same backend afterwards. Parallel tests share it; mount each scenario
//! on its own path.

#![deny(missing_docs)]

mod connection;

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use monoreq_interface::{ConnectionFactory, TransportConfig};
use url::Url;

pub use connection::{Recording, RecordedLength};

use connection::MemoryConnection;

/// Installs the in-memory backend as the process-wide connection factory.
///
/// The first call registers; every call returns a handle to the same backend.
pub fn install() -> MemoryBackend {
    static INSTALLED: OnceLock<MemoryBackend> = OnceLock::new();
    INSTALLED
        .get_or_init(|| {
            let backend = MemoryBackend::default();
            monoreq_interface::register_connection_factory(MemoryFactory {
                state: Arc::clone(&backend.state),
            });
            backend
        })
        .clone()
}

/// Handle to the scripted backend.
///
/// Obtained from [`install`]. Cloning yields another handle to the same scripts
/// and recordings.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<BackendState>,
}

impl MemoryBackend {
    /// Mounts a script at the given URL path.
    ///
    /// Mounting a path again replaces the script and discards the previous
    /// recording.
    pub fn mount(&self, path: impl Into<String>, script: Script) {
        self.state.slots.lock().unwrap().insert(
            path.into(),
            Slot {
                script,
                recording: Arc::default(),
            },
        );
    }

    /// A snapshot of what the facade has done against the script at `path`.
    ///
    /// `None` when nothing is mounted there.
    pub fn recorded(&self, path: &str) -> Option<Recording> {
        self.state
            .slots
            .lock()
            .unwrap()
            .get(path)
            .map(|slot| slot.recording.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct BackendState {
    slots: Mutex<HashMap<String, Slot>>,
}

struct Slot {
    script: Script,
    recording: Arc<Mutex<Recording>>,
}

struct MemoryFactory {
    state: Arc<BackendState>,
}

impl ConnectionFactory for MemoryFactory {
    type Conn = MemoryConnection;

    fn open(&self, url: &Url, config: &TransportConfig) -> io::Result<MemoryConnection> {
        let slots = self.state.slots.lock().unwrap();
        let slot = slots.get(url.path()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no script mounted for {}", url.path()),
            )
        })?;
        let recording = Arc::clone(&slot.recording);
        {
            let mut recording = recording.lock().unwrap();
            recording.url = url.to_string();
            recording.transport = config.clone();
        }
        Ok(MemoryConnection::new(slot.script.clone(), recording))
    }
}

/// A canned HTTP exchange: the response to serve and the failures to inject.
#[derive(Clone, Debug)]
pub struct Script {
    pub(crate) status: u16,
    pub(crate) reason: String,
    pub(crate) headers: Vec<(String, Vec<String>)>,
    pub(crate) body: Vec<u8>,
    pub(crate) error_body: Option<Vec<u8>>,
    pub(crate) fail_input_open: bool,
    pub(crate) fail_body_write_at: Option<u64>,
    pub(crate) fail_body_close: bool,
}

impl Script {
    /// A script answering with the given status and reason phrase.
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: Vec::new(),
            body: Vec::new(),
            error_body: None,
            fail_input_open: false,
            fail_body_write_at: None,
            fail_body_close: false,
        }
    }

    /// A 200 OK script.
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// Adds a response header. Repeating a name adds another value to it.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(&name))
        {
            Some((_, values)) => values.push(value),
            None => self.headers.push((name, vec![value])),
        }
        self
    }

    /// Sets the response body served on the regular input channel.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body served on the error channel for error statuses.
    pub fn error_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.error_body = Some(body.into());
        self
    }

    /// Makes opening the regular input channel fail.
    pub fn fail_input_open(mut self) -> Self {
        self.fail_input_open = true;
        self
    }

    /// Makes request body writes fail once `at` bytes have been accepted.
    pub fn fail_body_write_at(mut self, at: u64) -> Self {
        self.fail_body_write_at = Some(at);
        self
    }

    /// Makes closing the request body channel fail.
    pub fn fail_body_close(mut self) -> Self {
        self.fail_body_close = true;
        self
    }
}
