//! The single-use request builder: configuration, connection finalization and the
//! outgoing body lifecycle.

use std::fmt;
use std::mem;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use monoreq_interface::{connection_factory, Connection, Proxy, TransportConfig};
use url::Url;

use crate::body::{BodyMode, BOUNDARY, CRLF};
use crate::copy::Meter;
use crate::error::{Error, Result};
use crate::header;
use crate::method::Method;
use crate::params;
use crate::progress::{NoopProgress, UploadProgress};
use crate::sink::{BodySink, Charset};
use crate::status::StatusCode;

const DEFAULT_BUFFER_SIZE: usize = 8192;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// State of the outgoing body channel.
///
/// The channel opens at most once and never reopens after the close transition.
enum OutputState {
    Unopened,
    Open(BodySink),
    Closed,
}

/// How the body length is communicated to the connection.
enum LengthMode {
    Buffered,
    Fixed(u64),
    Chunked(usize),
}

/// A single-use HTTP request.
///
/// A `Request` accumulates configuration into plain fields, creates its platform
/// connection lazily on the first operation that needs one, streams the outgoing
/// body, and then exposes the response. One instance drives exactly one exchange.
///
/// # Examples
///
/// ```no_run
/// use monoreq::Request;
///
/// # fn main() -> Result<(), monoreq::Error> {
/// let mut request = Request::post("https://example.com/upload")?
///     .basic("user", "p4ss")?
///     .send_bytes(b"payload")?;
/// assert!(request.ok()?);
/// # Ok(())
/// # }
/// ```
pub struct Request {
    url: Url,
    method: Method,
    conn: Option<Box<dyn Connection>>,
    headers: Vec<(String, String)>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    follow_redirects: bool,
    length_mode: LengthMode,
    transport: TransportConfig,
    output: OutputState,
    mode: Option<BodyMode>,
    total_written: u64,
    total_expected: Option<u64>,
    progress: Box<dyn UploadProgress>,
    pub(crate) buffer_size: usize,
    pub(crate) ignore_close_errors: bool,
    pub(crate) decompress: bool,
    status: Option<(StatusCode, String)>,
    resp_headers: Option<Vec<(String, Vec<String>)>>,
}

impl Request {
    /// Creates a request for `url` with the given method.
    pub fn new(url: impl AsRef<str>, method: Method) -> Result<Self> {
        Ok(Self::from_url(Url::parse(url.as_ref())?, method))
    }

    /// Creates a GET request.
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Get)
    }

    /// Creates a POST request.
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Post)
    }

    /// Creates a PUT request.
    pub fn put(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Put)
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Delete)
    }

    /// Creates a HEAD request.
    pub fn head(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Head)
    }

    /// Creates an OPTIONS request.
    pub fn options(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Options)
    }

    /// Creates a TRACE request.
    pub fn trace(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Trace)
    }

    /// Creates a PATCH request.
    pub fn patch(url: impl AsRef<str>) -> Result<Self> {
        Self::new(url, Method::Patch)
    }

    /// Creates a GET request with the given pairs appended to the query string.
    pub fn get_with_query<I, K, V>(url: impl AsRef<str>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::with_query(url, Method::Get, pairs)
    }

    /// Creates a POST request with the given pairs appended to the query string.
    pub fn post_with_query<I, K, V>(url: impl AsRef<str>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::with_query(url, Method::Post, pairs)
    }

    fn with_query<I, K, V>(url: impl AsRef<str>, method: Method, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = Url::parse(url.as_ref())?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(Self::from_url(url, method))
    }

    fn from_url(url: Url, method: Method) -> Self {
        Self {
            url,
            method,
            conn: None,
            headers: Vec::new(),
            connect_timeout: None,
            read_timeout: None,
            follow_redirects: true,
            length_mode: LengthMode::Buffered,
            transport: TransportConfig::default(),
            output: OutputState::Unopened,
            mode: None,
            total_written: 0,
            total_expected: None,
            progress: Box::new(NoopProgress),
            buffer_size: DEFAULT_BUFFER_SIZE,
            ignore_close_errors: true,
            decompress: false,
            status: None,
            resp_headers: None,
        }
    }

    /// The request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Running count of body units written so far.
    ///
    /// Byte copies count bytes; the character copy path counts characters. The
    /// counter spans all body writes of this request, including any response
    /// download driven through [`receive`](Self::receive).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Combined size of the body sources whose length was known up front.
    ///
    /// `None` until the first known-length source (byte slice, file) is written.
    pub fn total_expected(&self) -> Option<u64> {
        self.total_expected
    }
}

/// Transport configuration. Everything here is consumed when the connection is
/// created; the two whole-config setters fail fast once that has happened.
impl Request {
    /// Routes the connection through an HTTP proxy.
    ///
    /// Fails once the connection has been created.
    pub fn use_proxy(mut self, host: impl Into<String>, port: u16) -> Result<Self> {
        self.transport_mut()?.proxy = Some(Proxy {
            host: host.into(),
            port,
        });
        Ok(self)
    }

    /// Replaces the whole transport configuration.
    ///
    /// Fails once the connection has been created.
    pub fn transport_config(mut self, config: TransportConfig) -> Result<Self> {
        *self.transport_mut()? = config;
        Ok(self)
    }

    fn transport_mut(&mut self) -> Result<&mut TransportConfig> {
        if self.conn.is_some() {
            return Err(Error::ConnectionAlreadyOpen);
        }
        Ok(&mut self.transport)
    }

    /// Accepts every TLS certificate on this connection.
    pub fn trust_all_certs(mut self) -> Self {
        self.transport.trust_all_certs = true;
        self
    }

    /// Accepts every TLS hostname on this connection.
    pub fn trust_all_hosts(mut self) -> Self {
        self.transport.trust_all_hosts = true;
        self
    }

    /// Requests keep-alive behavior from the transport.
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.transport.keep_alive = Some(keep_alive);
        self
    }

    /// Caps the number of connections the transport may hold per host.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.transport.max_connections = Some(max);
        self
    }

    /// Hosts the transport must reach directly even when a proxy is configured.
    pub fn non_proxy_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transport.non_proxy_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Controls whether the transport may answer this request from a cache.
    pub fn use_caches(mut self, use_caches: bool) -> Self {
        self.transport.use_caches = use_caches;
        self
    }
}

/// Request configuration applied when the connection is created.
impl Request {
    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Controls whether redirects are followed. On by default.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Declares the exact body length up front, enabling fixed-length streaming.
    pub fn content_length(mut self, length: u64) -> Self {
        self.length_mode = LengthMode::Fixed(length);
        self
    }

    /// Enables chunked streaming of the body with the given chunk size.
    pub fn chunk(mut self, size: usize) -> Self {
        self.length_mode = LengthMode::Chunked(size);
        self
    }

    /// Sets the buffer size used when copying between streams.
    ///
    /// The default is 8192 bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn buffer_size(mut self, size: usize) -> Self {
        assert!(size > 0, "size must be greater than zero");
        self.buffer_size = size;
        self
    }

    /// Controls whether close failures on body streams are swallowed.
    ///
    /// On by default. Flush failures always surface.
    pub fn ignore_close_errors(mut self, ignore: bool) -> Self {
        self.ignore_close_errors = ignore;
        self
    }

    /// Enables transparent gzip decompression of the response body.
    ///
    /// Off by default. Only takes effect when the response declares
    /// `Content-Encoding: gzip`.
    pub fn decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    /// Installs an upload progress callback.
    ///
    /// The callback observes the running upload total and the expected total when
    /// one is known. It is replaced by a no-op when the outgoing body closes.
    pub fn progress(mut self, progress: impl UploadProgress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }
}

/// Request headers.
impl Request {
    /// Sets a request header.
    ///
    /// Setting the same name again replaces the previous value on the wire. Fails
    /// once the connection has been created.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        if self.conn.is_some() {
            return Err(Error::ConnectionAlreadyOpen);
        }
        self.headers.push((name.into(), value.into()));
        Ok(self)
    }

    /// Sets every header in `headers`.
    pub fn headers<I, K, V>(mut self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.header(name, value)?;
        }
        Ok(self)
    }

    /// Sets a request header when `value` is present, does nothing otherwise.
    pub fn header_opt(
        self,
        name: impl Into<String>,
        value: Option<impl Into<String>>,
    ) -> Result<Self> {
        match value {
            Some(value) => self.header(name, value),
            None => Ok(self),
        }
    }

    /// The last value set for the named request header, if any.
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets the User-Agent header.
    pub fn user_agent(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::USER_AGENT, value)
    }

    /// Sets the Referer header.
    pub fn referer(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::REFERER, value)
    }

    /// Sets the Accept header.
    pub fn accept(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::ACCEPT, value)
    }

    /// Sets the Accept header to `application/json`.
    pub fn accept_json(self) -> Result<Self> {
        self.accept("application/json")
    }

    /// Sets the Accept-Charset header.
    pub fn accept_charset(self, charset: Charset) -> Result<Self> {
        self.header(header::ACCEPT_CHARSET, charset.name())
    }

    /// Sets the Accept-Encoding header.
    pub fn accept_encoding(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::ACCEPT_ENCODING, value)
    }

    /// Sets the Accept-Encoding header to `gzip`.
    ///
    /// Pair with [`decompress`](Self::decompress) to transparently inflate the
    /// response body.
    pub fn accept_gzip_encoding(self) -> Result<Self> {
        self.accept_encoding("gzip")
    }

    /// Sets the Authorization header.
    pub fn authorization(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::AUTHORIZATION, value)
    }

    /// Sets the Proxy-Authorization header.
    pub fn proxy_authorization(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::PROXY_AUTHORIZATION, value)
    }

    /// Sets the Authorization header to basic credentials.
    pub fn basic(self, user: &str, password: &str) -> Result<Self> {
        self.authorization(basic_value(user, password))
    }

    /// Sets the Proxy-Authorization header to basic credentials.
    pub fn proxy_basic(self, user: &str, password: &str) -> Result<Self> {
        self.proxy_authorization(basic_value(user, password))
    }

    /// Sets the If-None-Match header.
    pub fn if_none_match(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::IF_NONE_MATCH, value)
    }

    /// Sets the If-Modified-Since header.
    pub fn if_modified_since(self, since: DateTime<Utc>) -> Result<Self> {
        self.header(
            header::IF_MODIFIED_SINCE,
            since.format(HTTP_DATE_FORMAT).to_string(),
        )
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, value: impl Into<String>) -> Result<Self> {
        self.header(header::CONTENT_TYPE, value)
    }

    /// Sets the Content-Type header with an explicit charset parameter.
    pub fn content_type_with_charset(self, value: &str, charset: Charset) -> Result<Self> {
        self.header(
            header::CONTENT_TYPE,
            format!("{value}; charset={}", charset.name()),
        )
    }
}

/// Connection finalization and the output lifecycle.
impl Request {
    /// Disconnects the underlying connection, creating it first if it never
    /// existed.
    pub fn disconnect(&mut self) -> Result<()> {
        self.connection()?.disconnect();
        Ok(())
    }

    /// The platform connection, created and configured on first use.
    pub(crate) fn connection(&mut self) -> Result<&mut Box<dyn Connection>> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open_connection()?,
        };
        Ok(self.conn.insert(conn))
    }

    fn open_connection(&self) -> Result<Box<dyn Connection>> {
        let factory = connection_factory().ok_or(Error::NoConnectionFactory)?;
        tracing::debug!(url = %self.url, method = self.method.as_str(), "opening connection");
        let mut conn = factory.open_boxed(&self.url, &self.transport)?;
        conn.set_method(self.method.as_str())?;
        for (name, value) in &self.headers {
            conn.set_header(name, value);
        }
        if let Some(timeout) = self.connect_timeout {
            conn.set_connect_timeout(timeout);
        }
        if let Some(timeout) = self.read_timeout {
            conn.set_read_timeout(timeout);
        }
        conn.set_follow_redirects(self.follow_redirects);
        match self.length_mode {
            LengthMode::Buffered => {}
            LengthMode::Fixed(len) => conn.set_fixed_body_len(len),
            LengthMode::Chunked(size) => conn.set_chunked_body(size),
        }
        Ok(conn)
    }

    /// Commits the request to the given body mode.
    ///
    /// Returns true when this call committed the mode, false when the mode was
    /// already active. A different active mode or a closed output channel is an
    /// error.
    pub(crate) fn enter_mode(&mut self, requested: BodyMode) -> Result<bool> {
        if matches!(self.output, OutputState::Closed) {
            return Err(Error::OutputClosed);
        }
        match self.mode {
            None => {
                self.mode = Some(requested);
                Ok(true)
            }
            Some(active) if active == requested => Ok(false),
            Some(active) => Err(Error::ModeConflict { active, requested }),
        }
    }

    /// Opens the outgoing body channel. Idempotent while open.
    ///
    /// The sink charset comes from the charset parameter of the already-set
    /// request Content-Type, falling back to UTF-8.
    pub(crate) fn open_output(&mut self) -> Result<()> {
        match self.output {
            OutputState::Open(_) => Ok(()),
            OutputState::Closed => Err(Error::OutputClosed),
            OutputState::Unopened => {
                let charset = self.request_charset()?;
                let buffer_size = self.buffer_size;
                tracing::debug!(charset = charset.name(), "opening request body channel");
                let writer = self.connection()?.open_body()?;
                self.output = OutputState::Open(BodySink::new(writer, charset, buffer_size));
                Ok(())
            }
        }
    }

    fn request_charset(&self) -> Result<Charset> {
        let Some(content_type) = self.request_header(header::CONTENT_TYPE) else {
            return Ok(Charset::default());
        };
        match params::header_param(content_type, "charset") {
            Some(name) => {
                Charset::parse(name).ok_or_else(|| Error::UnsupportedCharset(name.to_string()))
            }
            None => Ok(Charset::default()),
        }
    }

    /// Closes the outgoing body channel. Idempotent.
    ///
    /// For multipart bodies the terminal boundary goes out first and a failure
    /// there surfaces regardless of `ignore_close_errors`; the flush-and-close of
    /// the sink reports failures per the flag. The progress callback is reset to a
    /// no-op in all cases, and the channel never reopens.
    pub(crate) fn close_output(&mut self) -> Result<()> {
        self.progress = Box::new(NoopProgress);
        match mem::replace(&mut self.output, OutputState::Closed) {
            OutputState::Unopened | OutputState::Closed => Ok(()),
            OutputState::Open(mut sink) => {
                tracing::debug!(total_written = self.total_written, "closing request body channel");
                if self.mode == Some(BodyMode::Multipart) {
                    sink.write_str(&format!("{CRLF}--{BOUNDARY}--{CRLF}"))
                        .map_err(Error::Io)?;
                }
                let closed = sink.finish();
                if self.ignore_close_errors {
                    Ok(())
                } else {
                    Ok(closed?)
                }
            }
        }
    }

    /// The open body sink, opening the channel first when needed.
    pub(crate) fn sink(&mut self) -> Result<&mut BodySink> {
        self.open_output()?;
        match &mut self.output {
            OutputState::Open(sink) => Ok(sink),
            _ => Err(Error::OutputClosed),
        }
    }

    /// The open body sink together with a meter over the upload counters.
    pub(crate) fn body_parts(&mut self) -> Result<(&mut BodySink, Meter<'_>)> {
        self.open_output()?;
        let OutputState::Open(sink) = &mut self.output else {
            return Err(Error::OutputClosed);
        };
        let meter = Meter {
            written: &mut self.total_written,
            expected: self.total_expected,
            progress: &mut *self.progress,
        };
        Ok((sink, meter))
    }

    /// A meter over the upload counters, for copies that bypass the sink.
    pub(crate) fn meter(&mut self) -> Meter<'_> {
        Meter {
            written: &mut self.total_written,
            expected: self.total_expected,
            progress: &mut *self.progress,
        }
    }

    /// Adds a known source length to the expected total.
    pub(crate) fn note_expected(&mut self, additional: u64) {
        *self.total_expected.get_or_insert(0) += additional;
    }

    /// The response status line, read once and cached.
    ///
    /// Drives the output-close transition before touching the response.
    pub(crate) fn status_line(&mut self) -> Result<&(StatusCode, String)> {
        self.close_output()?;
        let status = match self.status.take() {
            Some(status) => status,
            None => {
                let (code, message) = self.connection()?.status()?;
                (StatusCode::new(code), message)
            }
        };
        Ok(self.status.insert(status))
    }

    /// The raw response header map, read once and cached.
    pub(crate) fn response_header_map(&mut self) -> Result<&[(String, Vec<String>)]> {
        self.close_output()?;
        let headers = match self.resp_headers.take() {
            Some(headers) => headers,
            None => self.connection()?.response_headers()?,
        };
        Ok(self.resp_headers.insert(headers).as_slice())
    }
}

fn basic_value(user: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{user}:{password}")))
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            Request::get("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_query_pairs_appended() {
        let request =
            Request::get_with_query("http://localhost/echo", [("a", "1"), ("b", "two words")])
                .unwrap();
        assert_eq!(request.url().query(), Some("a=1&b=two+words"));
    }

    #[test]
    fn test_query_pairs_extend_existing_query() {
        let request = Request::get_with_query("http://localhost/echo?x=0", [("y", "1")]).unwrap();
        assert_eq!(request.url().query(), Some("x=0&y=1"));
    }

    #[test]
    fn test_request_header_last_value_wins() {
        let request = Request::get("http://localhost/")
            .unwrap()
            .header("X-Token", "first")
            .unwrap()
            .header("x-token", "second")
            .unwrap();
        assert_eq!(request.request_header("X-TOKEN"), Some("second"));
        assert_eq!(request.request_header("missing"), None);
    }

    #[test]
    fn test_basic_credentials_encoding() {
        let request = Request::get("http://localhost/")
            .unwrap()
            .basic("user", "p4ss")
            .unwrap();
        assert_eq!(
            request.request_header("authorization"),
            Some("Basic dXNlcjpwNHNz")
        );
    }

    #[test]
    fn test_if_modified_since_format() {
        let since = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let request = Request::get("http://localhost/")
            .unwrap()
            .if_modified_since(since)
            .unwrap();
        assert_eq!(
            request.request_header("if-modified-since"),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn test_display_is_method_and_url() {
        let request = Request::post("http://localhost/data").unwrap();
        assert_eq!(request.to_string(), "POST http://localhost/data");
    }

    #[test]
    #[should_panic(expected = "size must be greater than zero")]
    fn test_zero_buffer_size_panics() {
        let _ = Request::get("http://localhost/").unwrap().buffer_size(0);
    }

    // This test binary never registers a connection factory, so the first
    // operation that needs the platform connection reports exactly that.
    #[test]
    fn test_missing_connection_factory_reported() {
        let result = Request::post("http://localhost/resource")
            .unwrap()
            .send_bytes(b"data");
        assert!(matches!(result, Err(Error::NoConnectionFactory)));
    }
}
