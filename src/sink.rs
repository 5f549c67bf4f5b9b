//! Buffered, charset-aware writer over a connection's body channel.

use std::io::{self, Write};

use monoreq_interface::BodyWriter;

/// Character encodings a request body can carry.
///
/// The set is closed on purpose: these are the encodings the facade can produce and
/// decode without a conversion library, and the only ones the form and multipart
/// wire formats need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8, the default for every text operation.
    #[default]
    Utf8,
    /// US-ASCII.
    Ascii,
    /// ISO-8859-1.
    Latin1,
}

impl Charset {
    /// Parses a charset name as found in a `content-type` parameter.
    ///
    /// Matching is ASCII case insensitive and accepts the common aliases. Returns
    /// `None` for names outside the supported set.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("utf-8") || name.eq_ignore_ascii_case("utf8") {
            Some(Self::Utf8)
        } else if name.eq_ignore_ascii_case("us-ascii") || name.eq_ignore_ascii_case("ascii") {
            Some(Self::Ascii)
        } else if name.eq_ignore_ascii_case("iso-8859-1")
            || name.eq_ignore_ascii_case("iso8859-1")
            || name.eq_ignore_ascii_case("latin1")
            || name.eq_ignore_ascii_case("l1")
        {
            Some(Self::Latin1)
        } else {
            None
        }
    }

    /// Returns the canonical charset name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Ascii => "US-ASCII",
            Self::Latin1 => "ISO-8859-1",
        }
    }

    /// Encodes `text` into `out`, failing on characters the charset cannot represent.
    pub(crate) fn encode(self, text: &str, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Self::Utf8 => out.extend_from_slice(text.as_bytes()),
            Self::Ascii => {
                for ch in text.chars() {
                    if !ch.is_ascii() {
                        return Err(unmappable(ch, self));
                    }
                    out.push(ch as u8);
                }
            }
            Self::Latin1 => {
                for ch in text.chars() {
                    let code = ch as u32;
                    if code > 0xFF {
                        return Err(unmappable(ch, self));
                    }
                    out.push(code as u8);
                }
            }
        }
        Ok(())
    }

    /// Decodes `bytes` into a string, replacing unrepresentable input.
    pub(crate) fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

fn unmappable(ch: char, charset: Charset) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("character {ch:?} is not representable in {}", charset.name()),
    )
}

/// The open output channel of a request.
///
/// Buffers writes up to the request's buffer size and encodes text through the charset
/// fixed when the channel was opened.
pub(crate) struct BodySink {
    writer: Box<dyn BodyWriter>,
    buf: Vec<u8>,
    capacity: usize,
    charset: Charset,
}

impl BodySink {
    pub(crate) fn new(writer: Box<dyn BodyWriter>, charset: Charset, capacity: usize) -> Self {
        Self {
            writer,
            buf: Vec::with_capacity(capacity),
            capacity,
            charset,
        }
    }

    /// Encodes `text` in the sink charset and writes the bytes.
    pub(crate) fn write_str(&mut self, text: &str) -> io::Result<()> {
        let mut encoded = Vec::with_capacity(text.len());
        self.charset.encode(text, &mut encoded)?;
        self.write_all(&encoded)
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Flushes buffered bytes and closes the underlying body channel.
    ///
    /// The close is attempted even when the flush fails; the flush error wins.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        let flushed = self.flush();
        let closed = self.writer.close();
        flushed.and(closed)
    }
}

impl Write for BodySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() + data.len() > self.capacity {
            self.flush_buf()?;
        }
        if data.len() >= self.capacity {
            self.writer.write_all(data)?;
        } else {
            self.buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.writer.flush()
    }
}
