//! Sort-on-close write buffer
//!
//! [`SortBuffer`] makes the on-disk line order independent of traversal
//! order: everything written is held back until [`SortBuffer::close`], which
//! sorts the lines and only then forwards them downstream.

use std::io::{self, Write};

/// Write sink that emits its lines in ascending byte order on close
///
/// Nothing reaches the downstream writer before `close`; `flush` is a no-op
/// because a premature flush would split unfinished lines. Dropping the
/// buffer without closing it discards the buffered content. Callers that
/// need bytes as they are produced must write to the downstream sink
/// directly instead.
#[derive(Debug)]
pub struct SortBuffer<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> SortBuffer<W> {
    /// Wrap a downstream sink
    #[inline]
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Bytes buffered so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing was written
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Downstream sink
    #[inline]
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Sort the buffered lines, write each followed by `\n`, flush
    /// downstream and hand the sink back
    ///
    /// # Errors
    /// Returns the downstream write or flush error
    pub fn close(mut self) -> io::Result<W> {
        for line in sorted_lines(&self.buffer) {
            self.inner.write_all(line)?;
            self.inner.write_all(b"\n")?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for SortBuffer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Split on `\n`, drop trailing empty lines, sort bytewise
///
/// Bytewise order of UTF-8 equals code point order.
fn sorted_lines(buffer: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = buffer.split(|b| *b == b'\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.sort_unstable();
    lines
}
