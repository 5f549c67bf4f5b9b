//! Streaming body copy engine.
//!
//! Both variants read a buffer at a time and report the running total after every
//! chunk written. The byte variant carries the request's expected total through to the
//! callback; the text variant counts characters and always reports the total as
//! unknown, because a character count cannot be predicted from a byte length.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};
use crate::progress::UploadProgress;
use crate::sink::BodySink;

/// The running-total side of a copy: the request's written counter plus its progress
/// callback, borrowed together so a copy can advance them while the sink is borrowed
/// separately.
pub(crate) struct Meter<'a> {
    pub(crate) written: &'a mut u64,
    pub(crate) expected: Option<u64>,
    pub(crate) progress: &'a mut dyn UploadProgress,
}

impl Meter<'_> {
    fn add(&mut self, count: usize) {
        *self.written += count as u64;
        self.progress.on_upload(*self.written, self.expected);
    }
}

/// Copies `source` into `dest` a buffer at a time, metering bytes.
pub(crate) fn copy_bytes(
    source: &mut dyn Read,
    dest: &mut dyn Write,
    buffer_size: usize,
    meter: &mut Meter<'_>,
) -> Result<()> {
    let mut buf = vec![0u8; buffer_size];
    loop {
        let read = source.read(&mut buf).map_err(Error::Io)?;
        if read == 0 {
            return Ok(());
        }
        dest.write_all(&buf[..read]).map_err(Error::Io)?;
        meter.add(read);
    }
}

/// Copies UTF-8 text from `source` into the sink, re-encoding through the sink
/// charset and metering characters.
///
/// Code points split across reads are carried into the next buffer. The reported
/// total is always unknown on this path.
pub(crate) fn copy_text(
    source: &mut dyn Read,
    sink: &mut BodySink,
    buffer_size: usize,
    meter: &mut Meter<'_>,
) -> Result<()> {
    meter.expected = None;
    let mut buf = vec![0u8; buffer_size.max(4)];
    let mut pending = 0usize;
    loop {
        let read = source.read(&mut buf[pending..]).map_err(Error::Io)?;
        if read == 0 {
            if pending > 0 {
                return Err(Error::Io(invalid_utf8()));
            }
            return Ok(());
        }
        let available = pending + read;
        let valid = match std::str::from_utf8(&buf[..available]) {
            Ok(_) => available,
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::Io(invalid_utf8())),
        };
        if valid > 0 {
            // The prefix is known valid, so the lossy conversion never replaces.
            let text = String::from_utf8_lossy(&buf[..valid]);
            sink.write_str(&text).map_err(Error::Io)?;
            meter.add(text.chars().count());
        }
        buf.copy_within(valid..available, 0);
        pending = available - valid;
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "text body is not valid UTF-8")
}
