//! Response consumption: status, header accessors and body streams.
//!
//! Every accessor here is a terminal operation on the request: the first one to
//! run drives the output-close transition, so the outgoing body is fully
//! delivered before any part of the response is touched.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::read::GzDecoder;

use crate::copy;
use crate::error::{Error, Result};
use crate::header;
use crate::op::{self, ReadSource, WriteSink};
use crate::params;
use crate::request::Request;
use crate::sink::Charset;
use crate::status::StatusCode;

/// Response status.
impl Request {
    /// The response status code.
    pub fn code(&mut self) -> Result<StatusCode> {
        Ok(self.status_line()?.0)
    }

    /// The response reason phrase.
    pub fn message(&mut self) -> Result<String> {
        Ok(self.status_line()?.1.clone())
    }

    /// Whether the response status is 200 OK.
    pub fn ok(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::OK)
    }

    /// Whether the response status is 201 Created.
    pub fn created(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::CREATED)
    }

    /// Whether the response status is 204 No Content.
    pub fn no_content(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::NO_CONTENT)
    }

    /// Whether the response status is 304 Not Modified.
    pub fn not_modified(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::NOT_MODIFIED)
    }

    /// Whether the response status is 400 Bad Request.
    pub fn bad_request(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::BAD_REQUEST)
    }

    /// Whether the response status is 404 Not Found.
    pub fn not_found(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::NOT_FOUND)
    }

    /// Whether the response status is 500 Internal Server Error.
    pub fn server_error(&mut self) -> Result<bool> {
        Ok(self.code()? == StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Response headers.
impl Request {
    /// All response headers, one entry per name with its values in arrival order.
    pub fn response_headers(&mut self) -> Result<Vec<(String, Vec<String>)>> {
        Ok(self.response_header_map()?.to_vec())
    }

    /// The value of the named response header.
    ///
    /// Names are matched ASCII case insensitively. When the header appeared more
    /// than once the last value wins, matching the platform header map where
    /// later fields shadow earlier ones.
    pub fn response_header(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.find_header(name)?.map(str::to_string))
    }

    /// Every value of the named response header, in arrival order.
    pub fn response_header_values(&mut self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .response_header_map()?
            .iter()
            .filter(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().cloned())
            .collect())
    }

    fn find_header(&mut self, name: &str) -> Result<Option<&str>> {
        Ok(self
            .response_header_map()?
            .iter()
            .filter(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter())
            .last()
            .map(String::as_str))
    }

    /// The named response header parsed as an integer.
    ///
    /// `None` when the header is missing or does not parse.
    pub fn int_header(&mut self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .find_header(name)?
            .and_then(|value| value.trim().parse().ok()))
    }

    /// The named response header parsed as an HTTP date.
    ///
    /// Accepts the IMF-fixdate, RFC 850 and asctime formats. `None` when the
    /// header is missing or does not parse.
    pub fn date_header(&mut self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.find_header(name)?.and_then(parse_http_date))
    }

    /// The named parameter of the named response header.
    pub fn header_parameter(&mut self, name: &str, param: &str) -> Result<Option<String>> {
        let Some(value) = self.find_header(name)? else {
            return Ok(None);
        };
        Ok(params::header_param(value, param).map(str::to_string))
    }

    /// Every parameter of the named response header, in order.
    pub fn header_parameters(&mut self, name: &str) -> Result<Vec<(String, String)>> {
        let Some(value) = self.find_header(name)? else {
            return Ok(Vec::new());
        };
        Ok(params::header_params(value)
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect())
    }

    /// The charset parameter of the response Content-Type, if any.
    pub fn charset(&mut self) -> Result<Option<String>> {
        self.header_parameter(header::CONTENT_TYPE, "charset")
    }

    /// The response Content-Type header.
    pub fn response_content_type(&mut self) -> Result<Option<String>> {
        self.response_header(header::CONTENT_TYPE)
    }

    /// The response Content-Length header.
    pub fn response_content_length(&mut self) -> Result<Option<i64>> {
        self.int_header(header::CONTENT_LENGTH)
    }

    /// The response Content-Encoding header.
    pub fn content_encoding(&mut self) -> Result<Option<String>> {
        self.response_header(header::CONTENT_ENCODING)
    }

    /// The Server response header.
    pub fn server(&mut self) -> Result<Option<String>> {
        self.response_header(header::SERVER)
    }

    /// The Date response header.
    pub fn date(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_header(header::DATE)
    }

    /// The Cache-Control response header.
    pub fn cache_control(&mut self) -> Result<Option<String>> {
        self.response_header(header::CACHE_CONTROL)
    }

    /// The ETag response header.
    pub fn etag(&mut self) -> Result<Option<String>> {
        self.response_header(header::ETAG)
    }

    /// The Expires response header.
    pub fn expires(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_header(header::EXPIRES)
    }

    /// The Last-Modified response header.
    pub fn last_modified(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_header(header::LAST_MODIFIED)
    }

    /// The Location response header.
    pub fn location(&mut self) -> Result<Option<String>> {
        self.response_header(header::LOCATION)
    }

    /// Whether the response declares a zero-length body.
    pub fn is_body_empty(&mut self) -> Result<bool> {
        Ok(self.response_content_length()? == Some(0))
    }
}

/// Response body.
impl Request {
    /// Opens the response body as a buffered reader.
    ///
    /// Error statuses read from the error channel when the platform provides one,
    /// falling back to the regular channel. When neither opens and the response
    /// declares no body, the reader is empty. The body is inflated transparently
    /// when [`decompress`](Self::decompress) is set and the response declares
    /// `Content-Encoding: gzip`.
    pub fn stream(&mut self) -> Result<ResponseReader> {
        let gzip = self.decompress && self.content_encoding()?.as_deref() == Some("gzip");
        let stream = self.open_stream()?;
        tracing::trace!(gzip, "opening response body stream");
        let reader = BufReader::with_capacity(self.buffer_size, stream);
        Ok(ResponseReader(if gzip {
            Decoder::Gzip(Box::new(GzDecoder::new(reader)))
        } else {
            Decoder::Plain(reader)
        }))
    }

    fn open_stream(&mut self) -> Result<Box<dyn Read + Send>> {
        if !self.code()?.is_error() {
            return Ok(self.connection()?.open_input()?);
        }
        if let Some(stream) = self.connection()?.error_input() {
            return Ok(stream);
        }
        match self.connection()?.open_input() {
            Ok(stream) => Ok(stream),
            Err(err) => {
                // A body-less error response reads as empty rather than failing.
                if matches!(self.response_content_length()?, Some(len) if len > 0) {
                    Err(Error::Io(err))
                } else {
                    Ok(Box::new(io::empty()))
                }
            }
        }
    }

    /// Reads the whole response body into a byte vector.
    pub fn bytes(&mut self) -> Result<Vec<u8>> {
        let capacity = match self.response_content_length()? {
            Some(len) if len > 0 => usize::try_from(len).unwrap_or(0),
            _ => 0,
        };
        let mut body = Vec::with_capacity(capacity);
        self.receive(&mut body)?;
        Ok(body)
    }

    /// Reads the whole response body as text.
    ///
    /// The text is decoded with the charset the response declares, falling back
    /// to UTF-8. Bytes invalid in that charset are replaced.
    pub fn body(&mut self) -> Result<String> {
        let charset = match self.charset()? {
            Some(name) => Charset::parse(&name).ok_or(Error::UnsupportedCharset(name))?,
            None => Charset::default(),
        };
        self.body_with_charset(charset)
    }

    /// Reads the whole response body as text in the given charset.
    pub fn body_with_charset(&mut self, charset: Charset) -> Result<String> {
        let bytes = self.bytes()?;
        Ok(charset.decode(&bytes))
    }

    /// Streams the response body into `dest`.
    ///
    /// The response stream is closed afterwards; `dest` stays open.
    pub fn receive(&mut self, dest: &mut dyn Write) -> Result<()> {
        let stream = self.stream()?;
        let buffer_size = self.buffer_size;
        let ignore = self.ignore_close_errors;
        let mut source = ReadSource(stream);
        let mut meter = self.meter();
        op::closing(&mut source, ignore, |source| {
            copy::copy_bytes(&mut source.0, dest, buffer_size, &mut meter)
        })
    }

    /// Streams the response body into the file at `path`, creating or truncating
    /// it.
    ///
    /// The file writer is buffered; its final flush failure surfaces regardless
    /// of [`ignore_close_errors`](Self::ignore_close_errors).
    pub fn receive_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        let ignore = self.ignore_close_errors;
        let mut dest = WriteSink(BufWriter::with_capacity(self.buffer_size, file));
        op::closing(&mut dest, ignore, |dest| self.receive(&mut dest.0))
    }
}

/// A buffered reader over the response body.
///
/// Returned by [`Request::stream`]. Inflates gzip content transparently when the
/// request asked for decompression.
pub struct ResponseReader(Decoder);

enum Decoder {
    Plain(BufReader<Box<dyn Read + Send>>),
    Gzip(Box<GzDecoder<BufReader<Box<dyn Read + Send>>>>),
}

impl Read for ResponseReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.0 {
            Decoder::Plain(reader) => reader.read(buf),
            Decoder::Gzip(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for ResponseReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match &self.0 {
            Decoder::Plain(_) => "ResponseReader::Plain",
            Decoder::Gzip(_) => "ResponseReader::Gzip",
        })
    }
}

/// Parses the three date formats HTTP allows.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    // RFC 850, e.g. "Sunday, 06-Nov-94 08:49:37 GMT".
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Some(date.and_utc());
    }
    // asctime, e.g. "Sun Nov  6 08:49:37 1994".
    NaiveDateTime::parse_from_str(value, "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|date| date.and_utc())
}
