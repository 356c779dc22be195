//! Byte-oriented line reading
//!
//! SFM files are not guaranteed to be valid UTF-8. Lines are split on `\n`
//! at the byte level, so a stray byte affects only the line it sits on.

use std::borrow::Cow;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Splits a raw line into its body and its `\n` / `\r\n` terminator
pub fn split_terminator(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = raw.strip_suffix(b"\r\n") {
        (body, &raw[body.len()..])
    } else if let Some(body) = raw.strip_suffix(b"\n") {
        (body, &raw[body.len()..])
    } else {
        (raw, &raw[raw.len()..])
    }
}

/// Line reader over an async buffered source
///
/// Reuses one buffer for every line.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next line body as raw bytes, without its terminator
    pub async fn next_bytes(&mut self) -> io::Result<Option<&[u8]>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        Ok(Some(split_terminator(&self.buf).0))
    }

    /// Next line as text; invalid UTF-8 sequences become U+FFFD
    pub async fn next_line(&mut self) -> io::Result<Option<Cow<'_, str>>> {
        Ok(self.next_bytes().await?.map(String::from_utf8_lossy))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
