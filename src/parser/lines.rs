use std::io::{BufRead, Cursor, Read};

use bytes::Bytes;

use crate::{
    config::STREAM_LINE_MAX_SIZE,
    error::{MlError, ParseError},
};

/// Forward-only source of body lines with terminators stripped.
///
/// A source is read at most once; the demultiplexer stops pulling as soon
/// as it sees the terminal boundary.
pub trait LineSource {
    /// Returns the next line, `None` once the body is exhausted.
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>>;
}

impl<L> LineSource for &mut L
where
    L: LineSource + ?Sized,
{
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>> {
        (**self).next_line()
    }
}

impl<L> LineSource for Box<L>
where
    L: LineSource + ?Sized,
{
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>> {
        (**self).next_line()
    }
}

/// Reads `\n`-terminated lines from a [`BufRead`], refusing lines over a bound.
///
/// A trailing `\r` is stripped along with the `\n`.
#[derive(Debug)]
pub struct BoundedLines<R> {
    reader: R,
    max_line_size: usize,
    done: bool,
}

impl<R> BoundedLines<R> {
    /// Wraps a reader using [`STREAM_LINE_MAX_SIZE`] as line bound.
    pub fn new(reader: R) -> Self {
        Self::with_max_line_size(reader, STREAM_LINE_MAX_SIZE)
    }

    /// Wraps a reader with an explicit line bound in bytes.
    pub fn with_max_line_size(reader: R, max_line_size: usize) -> Self {
        Self {
            reader,
            max_line_size,
            done: false,
        }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl BoundedLines<Cursor<Bytes>> {
    /// Reads lines out of an already buffered body.
    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        Self::new(Cursor::new(body.into()))
    }
}

impl<R> LineSource for BoundedLines<R>
where
    R: BufRead,
{
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>> {
        if self.done {
            return None;
        }

        // Room for the longest accepted line plus "\r\n".
        let limit = self.max_line_size.saturating_add(2) as u64;
        let mut line = Vec::new();

        match self.reader.by_ref().take(limit).read_until(b'\n', &mut line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                strip_line_terminator(&mut line);
                if line.len() > self.max_line_size {
                    self.done = true;
                    return Some(Err(ParseError::LineTooLong {
                        max: self.max_line_size,
                    }
                    .into()));
                }
                Some(Ok(Bytes::from(line)))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err.into()))
            }
        }
    }
}

/// Line source over an in-memory iterator of lines.
#[derive(Debug, Clone)]
pub struct IterLines<I> {
    inner: I,
}

impl<I, T> LineSource for IterLines<I>
where
    I: Iterator<Item = T>,
    T: Into<Bytes>,
{
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>> {
        self.inner.next().map(|line| Ok(line.into()))
    }
}

/// Wraps anything iterable over lines as a [`LineSource`].
pub fn lines_from_iter<I>(lines: I) -> IterLines<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
{
    IterLines {
        inner: lines.into_iter(),
    }
}

pub(crate) fn strip_line_terminator(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}
