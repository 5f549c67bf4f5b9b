//! Core connection interface traits.
//!
//! This module provides the trait definitions that backend implementations must
//! implement to carry a single HTTP exchange.
//!
//! Backend developers need to implement [`ConnectionFactory`], [`Connection`] and,
//! for the outgoing body channel, a [`BodyWriter`] type.

use std::io;
use std::time::Duration;

use url::Url;

use crate::config::TransportConfig;

/// A platform connection carrying one HTTP exchange.
///
/// The facade configures the connection before any I/O happens, then transmits the
/// request body (if any) through the writer returned by [`Connection::open_body`], and
/// finally reads the response. Backends may defer actual network activity until the
/// body channel is opened or the status line is requested.
///
/// A connection is used for exactly one request and is never reused. The facade
/// guarantees that no response method is called while the body channel is still open.
pub trait Connection: Send {
    /// Sets the HTTP method for this exchange.
    ///
    /// Called once, before any other request-side configuration.
    fn set_method(&mut self, method: &str) -> io::Result<()>;

    /// Sets a request header, replacing any previously set value for the same name.
    ///
    /// Header names are matched ASCII case insensitively.
    fn set_header(&mut self, name: &str, value: &str);

    /// Sets the timeout for establishing the underlying transport.
    fn set_connect_timeout(&mut self, timeout: Duration);

    /// Sets the timeout for individual read operations on the response.
    fn set_read_timeout(&mut self, timeout: Duration);

    /// Controls whether redirect responses are followed transparently.
    fn set_follow_redirects(&mut self, follow: bool);

    /// Declares the exact request body length upfront.
    ///
    /// When neither this nor [`Connection::set_chunked_body`] is called before the body
    /// channel opens, the backend may buffer the body to learn its length.
    fn set_fixed_body_len(&mut self, len: u64);

    /// Switches the request body to chunked transfer encoding with the given chunk size.
    fn set_chunked_body(&mut self, chunk_size: usize);

    /// Opens the outgoing body channel.
    ///
    /// Asking for the channel enables output on the connection. Called at most once.
    fn open_body(&mut self) -> io::Result<Box<dyn BodyWriter>>;

    /// Returns the response status code and reason phrase.
    ///
    /// Implies that the request has been fully transmitted.
    fn status(&mut self) -> io::Result<(u16, String)>;

    /// Returns the raw response header map, one entry per distinct header name with all
    /// of its values in the order they appeared.
    fn response_headers(&mut self) -> io::Result<Vec<(String, Vec<String>)>>;

    /// Opens the success channel for the response body.
    ///
    /// Backends fail this call for error statuses the same way the platform would; the
    /// facade then falls back to [`Connection::error_input`].
    fn open_input(&mut self) -> io::Result<Box<dyn io::Read + Send>>;

    /// Opens the error channel for the response body, when the platform has one.
    fn error_input(&mut self) -> Option<Box<dyn io::Read + Send>>;

    /// Releases the underlying transport.
    fn disconnect(&mut self);
}

/// The outgoing body channel of a [`Connection`].
///
/// Closing is separate from dropping because delivering the protocol terminator or
/// releasing the channel can fail, and the facade's close policy needs to observe that
/// failure.
pub trait BodyWriter: io::Write + Send {
    /// Finishes the body channel.
    ///
    /// Called exactly once after the final flush. The default does nothing.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A factory producing [`Connection`]s for URLs.
///
/// The factory receives the caller-owned [`TransportConfig`] on every open and applies
/// the parts of it the platform supports (proxying, TLS trust, keep-alive and cache
/// policy).
pub trait ConnectionFactory: Send + Sync + 'static {
    /// The connection type produced by this factory.
    type Conn: Connection + 'static;

    /// Opens a connection for the given URL.
    ///
    /// No network activity is required here; backends may defer connecting until the
    /// exchange actually starts.
    fn open(&self, url: &Url, config: &TransportConfig) -> io::Result<Self::Conn>;
}
