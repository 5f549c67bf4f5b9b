//! Outgoing body writes: plain sends, form pairs and multipart framing.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::copy;
use crate::error::{Error, Result};
use crate::op::{self, ReadSource};
use crate::request::Request;
use crate::sink::Charset;

pub(crate) const CRLF: &str = "\r\n";

/// The boundary token separating multipart body parts.
pub(crate) const BOUNDARY: &str = "00content0boundary00";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data; boundary=00content0boundary00";

/// Byte values escaped by form encoding: everything except ASCII alphanumerics
/// and `. - * _`, with the space handled separately.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_')
    .remove(b' ');

/// The body-encoding discipline a request commits to on its first body write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyMode {
    /// Raw writes straight into the body.
    Plain,
    /// `application/x-www-form-urlencoded` pairs.
    Form,
    /// `multipart/form-data` framing.
    Multipart,
}

impl fmt::Display for BodyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BodyMode::Plain => "plain",
            BodyMode::Form => "form",
            BodyMode::Multipart => "multipart",
        })
    }
}

/// One part of a multipart body.
///
/// A part carries a form field name, an optional filename and content type, and
/// its payload. Text payloads are written through the request charset without
/// progress accounting; byte and file payloads contribute their length to the
/// expected upload total and are copied with progress reporting.
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    payload: PartPayload,
}

enum PartPayload {
    Text(String),
    Bytes(Vec<u8>),
    File(PathBuf),
    Stream(Box<dyn Read + Send>),
}

/// A part payload with any file already opened and sized.
enum OpenedPayload {
    Text(String),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
}

impl Part {
    /// A text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, PartPayload::Text(value.into()))
    }

    /// A text part rendered from any displayable value.
    pub fn display(name: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(name, PartPayload::Text(value.to_string()))
    }

    /// A binary part.
    pub fn bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, PartPayload::Bytes(bytes.into()))
    }

    /// A part streamed from the file at `path` when the part is written.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, PartPayload::File(path.into()))
    }

    /// A part streamed from an arbitrary reader.
    pub fn stream(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self::new(name, PartPayload::Stream(Box::new(reader)))
    }

    fn new(name: impl Into<String>, payload: PartPayload) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            payload,
        }
    }

    /// Sets the filename advertised in the part's Content-Disposition line.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the part's own Content-Type line.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Plain body writes.
impl Request {
    /// Writes a string to the request body.
    ///
    /// The text is encoded through the request charset. This write does not count
    /// toward upload progress.
    pub fn send_text(mut self, text: impl AsRef<str>) -> Result<Self> {
        self.enter_mode(BodyMode::Plain)?;
        self.sink()?.write_str(text.as_ref()).map_err(Error::Io)?;
        Ok(self)
    }

    /// Writes a byte slice to the request body.
    ///
    /// The slice length joins the expected upload total before the metered copy
    /// runs.
    pub fn send_bytes(mut self, body: impl AsRef<[u8]>) -> Result<Self> {
        self.enter_mode(BodyMode::Plain)?;
        let body = body.as_ref();
        self.note_expected(body.len() as u64);
        self.write_metered(&mut &body[..])?;
        Ok(self)
    }

    /// Streams the file at `path` into the request body.
    ///
    /// The file size joins the expected upload total before the metered copy runs.
    pub fn send_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.enter_mode(BodyMode::Plain)?;
        let file = File::open(path.as_ref()).map_err(Error::Io)?;
        self.note_expected(file.metadata().map_err(Error::Io)?.len());
        self.write_metered(&mut BufReader::new(file))?;
        Ok(self)
    }

    /// Streams a reader into the request body.
    ///
    /// The source length is unknown, so the expected total is left as is. The
    /// source is closed when the copy finishes, honoring `ignore_close_errors`.
    pub fn send_stream(mut self, mut source: impl Read) -> Result<Self> {
        self.enter_mode(BodyMode::Plain)?;
        self.write_metered(&mut source)?;
        Ok(self)
    }

    /// Streams UTF-8 text into the request body, re-encoding it through the
    /// request charset.
    ///
    /// Progress counts characters and always reports the total as unknown. The
    /// sink is flushed once the copy finishes; the source is closed either way.
    pub fn send_reader(mut self, source: impl Read) -> Result<Self> {
        self.enter_mode(BodyMode::Plain)?;
        let buffer_size = self.buffer_size;
        let ignore = self.ignore_close_errors;
        let (sink, mut meter) = self.body_parts()?;
        let mut source = ReadSource(source);
        op::flushing(sink, |sink| {
            op::closing(&mut source, ignore, |source| {
                copy::copy_text(&mut source.0, sink, buffer_size, &mut meter)
            })
        })?;
        Ok(self)
    }

    /// Copies `source` into the open sink, closing the source afterwards.
    pub(crate) fn write_metered(&mut self, source: &mut dyn Read) -> Result<()> {
        let buffer_size = self.buffer_size;
        let ignore = self.ignore_close_errors;
        let (sink, mut meter) = self.body_parts()?;
        let mut source = ReadSource(source);
        op::closing(&mut source, ignore, |source| {
            copy::copy_bytes(&mut *source.0, sink, buffer_size, &mut meter)
        })
    }
}

/// Form bodies.
impl Request {
    /// Writes a form name/value pair, UTF-8 encoded.
    ///
    /// The first pair sets the `application/x-www-form-urlencoded` content type
    /// and opens the body; later pairs are separated by `&`. Pass `None` as the
    /// value to send the name with an empty value.
    pub fn form<'v>(self, name: &str, value: impl Into<Option<&'v str>>) -> Result<Self> {
        self.form_with_charset(name, value, Charset::Utf8)
    }

    /// Writes a form name/value pair encoded in the given charset.
    ///
    /// The charset of the first pair also becomes the charset parameter of the
    /// content type and with it the sink encoding; later pairs only control their
    /// own escaping.
    pub fn form_with_charset<'v>(
        mut self,
        name: &str,
        value: impl Into<Option<&'v str>>,
        charset: Charset,
    ) -> Result<Self> {
        let first = self.enter_mode(BodyMode::Form)?;
        if first {
            self = self.content_type_with_charset(FORM_CONTENT_TYPE, charset)?;
        }
        let name = form_escape(name, charset)?;
        let value = match value.into() {
            Some(value) => Some(form_escape(value, charset)?),
            None => None,
        };
        let sink = self.sink()?;
        if !first {
            sink.write_str("&").map_err(Error::Io)?;
        }
        sink.write_str(&name).map_err(Error::Io)?;
        sink.write_str("=").map_err(Error::Io)?;
        if let Some(value) = value {
            sink.write_str(&value).map_err(Error::Io)?;
        }
        Ok(self)
    }

    /// Writes every pair in `pairs` as form data.
    pub fn form_pairs<I, K, V>(mut self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in pairs {
            self = self.form(name.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }
}

/// Multipart bodies.
impl Request {
    /// Writes one part of a multipart body.
    ///
    /// The first part sets the multipart content type and opens the body with the
    /// opening boundary line; every later part is preceded by a boundary line. The
    /// terminal boundary goes out when the body closes.
    pub fn part(mut self, part: Part) -> Result<Self> {
        let first = self.enter_mode(BodyMode::Multipart)?;
        if first {
            self = self.content_type(MULTIPART_CONTENT_TYPE)?;
        }
        let Part {
            name,
            filename,
            content_type,
            payload,
        } = part;
        // Known-size payloads join the expected total before any body bytes go out.
        let payload = match payload {
            PartPayload::Text(text) => OpenedPayload::Text(text),
            PartPayload::Bytes(bytes) => {
                self.note_expected(bytes.len() as u64);
                OpenedPayload::Bytes(bytes)
            }
            PartPayload::File(path) => {
                let file = File::open(&path).map_err(Error::Io)?;
                self.note_expected(file.metadata().map_err(Error::Io)?.len());
                OpenedPayload::Reader(Box::new(BufReader::new(file)))
            }
            PartPayload::Stream(reader) => OpenedPayload::Reader(reader),
        };
        self.start_part(first)?;
        self.write_part_header(&name, filename.as_deref(), content_type.as_deref())?;
        match payload {
            OpenedPayload::Text(text) => {
                self.sink()?.write_str(&text).map_err(Error::Io)?;
            }
            OpenedPayload::Bytes(bytes) => self.write_metered(&mut bytes.as_slice())?,
            OpenedPayload::Reader(mut reader) => self.write_metered(&mut reader)?,
        }
        Ok(self)
    }

    fn start_part(&mut self, first: bool) -> Result<()> {
        let line = if first {
            format!("--{BOUNDARY}{CRLF}")
        } else {
            format!("{CRLF}--{BOUNDARY}{CRLF}")
        };
        self.sink()?.write_str(&line).map_err(Error::Io)
    }

    // Part names and filenames go onto the wire as given, without quoting or
    // escaping.
    fn write_part_header(
        &mut self,
        name: &str,
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let mut block = String::from("Content-Disposition: form-data; name=\"");
        block.push_str(name);
        block.push('"');
        if let Some(filename) = filename {
            block.push_str("; filename=\"");
            block.push_str(filename);
            block.push('"');
        }
        block.push_str(CRLF);
        if let Some(content_type) = content_type {
            block.push_str("Content-Type: ");
            block.push_str(content_type);
            block.push_str(CRLF);
        }
        block.push_str(CRLF);
        self.sink()?.write_str(&block).map_err(Error::Io)
    }
}

/// Escapes `text` for a form pair: the charset's bytes percent-encoded, keeping
/// ASCII alphanumerics and `. - * _`, with spaces rendered as `+`.
fn form_escape(text: &str, charset: Charset) -> Result<String> {
    let mut bytes = Vec::new();
    charset.encode(text, &mut bytes).map_err(Error::Io)?;
    Ok(percent_encode(&bytes, FORM_ENCODE_SET)
        .to_string()
        .replace(' ', "+"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_escape_keeps_unreserved() {
        assert_eq!(
            form_escape("abc-XYZ_0.9*", Charset::Utf8).unwrap(),
            "abc-XYZ_0.9*"
        );
    }

    #[test]
    fn test_form_escape_space_becomes_plus() {
        assert_eq!(form_escape("two words", Charset::Utf8).unwrap(), "two+words");
    }

    #[test]
    fn test_form_escape_reserved_ascii() {
        assert_eq!(form_escape("a&b=c", Charset::Utf8).unwrap(), "a%26b%3Dc");
    }

    #[test]
    fn test_form_escape_follows_charset_bytes() {
        assert_eq!(form_escape("héllo", Charset::Utf8).unwrap(), "h%C3%A9llo");
        assert_eq!(form_escape("héllo", Charset::Latin1).unwrap(), "h%E9llo");
    }

    #[test]
    fn test_form_escape_unmappable_character() {
        assert!(form_escape("h€llo", Charset::Latin1).is_err());
    }

    #[test]
    fn test_part_builders() {
        let part = Part::file("upload", "/tmp/data.bin")
            .filename("data.bin")
            .content_type("application/octet-stream");
        assert_eq!(part.name, "upload");
        assert_eq!(part.filename.as_deref(), Some("data.bin"));
        assert_eq!(part.content_type.as_deref(), Some("application/octet-stream"));
    }

    #[test]
    fn test_part_display_renders_numbers() {
        let part = Part::display("count", 42);
        assert_eq!(part.name, "count");
        assert!(matches!(part.payload, PartPayload::Text(ref text) if text == "42"));
    }
}
