use std::{
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use pin_project::pin_project;

use crate::{
    config::MultipartConfig,
    error::{MlError, ParseError},
    parser::scanner::{PartScanner, Scan},
    part::MultipartPart,
};

/// Incremental multipart/mixed parser over a chunked byte stream.
///
/// Chunks are split into lines as they arrive, so only the current part
/// and one partial line are held in memory.
#[pin_project]
#[derive(Debug)]
pub struct MultipartStream<S> {
    #[pin]
    stream: S,
    buffer: BytesMut,
    scanner: Option<PartScanner>,
    pending_error: Option<ParseError>,
    upstream_done: bool,
}

impl<S> MultipartStream<S> {
    /// Creates a streaming parser for a known multipart boundary.
    pub fn new(boundary: &str, stream: S, config: &MultipartConfig) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            scanner: Some(PartScanner::new(boundary, config)),
            pending_error: None,
            upstream_done: false,
        }
    }

    /// Creates a stream that yields nothing and never polls `stream`.
    pub fn empty(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            scanner: None,
            pending_error: None,
            upstream_done: false,
        }
    }

    /// Creates a stream that yields `error` once, without polling `stream`.
    pub fn failed(stream: S, error: ParseError) -> Self {
        Self {
            pending_error: Some(error),
            ..Self::empty(stream)
        }
    }
}

/// Byte chunks read from an [`AsyncRead`](tokio::io::AsyncRead).
#[cfg(feature = "tokio-rt")]
pub type ReaderChunks<R> = futures::stream::MapErr<
    tokio_util::io::ReaderStream<R>,
    fn(std::io::Error) -> MlError,
>;

#[cfg(feature = "tokio-rt")]
impl<R> MultipartStream<ReaderChunks<R>>
where
    R: tokio::io::AsyncRead,
{
    /// Creates a streaming parser reading the body from an async reader.
    pub fn from_reader(boundary: &str, reader: R, config: &MultipartConfig) -> Self {
        use futures::TryStreamExt;

        let chunks = tokio_util::io::ReaderStream::new(reader)
            .map_err(<MlError as From<std::io::Error>>::from as fn(std::io::Error) -> MlError);
        Self::new(boundary, chunks, config)
    }
}

impl<S> Stream for MultipartStream<S>
where
    S: Stream<Item = Result<Bytes, MlError>>,
{
    type Item = Result<MultipartPart, MlError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if let Some(err) = this.pending_error.take() {
            return Poll::Ready(Some(Err(err.into())));
        }

        let Some(scanner) = this.scanner.as_mut() else {
            return Poll::Ready(None);
        };

        loop {
            if scanner.is_finished() {
                return Poll::Ready(None);
            }

            match take_line(this.buffer, scanner.max_line_size(), *this.upstream_done) {
                Ok(Some(line)) => {
                    match scanner.scan_line(&line) {
                        Ok(Scan::Pending) => {}
                        Ok(Scan::Part(part)) => return Poll::Ready(Some(Ok(part))),
                        Ok(Scan::Finished) => return Poll::Ready(None),
                        Err(err) => return Poll::Ready(Some(Err(err.into()))),
                    }
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    scanner.abort();
                    return Poll::Ready(Some(Err(err.into())));
                }
            }

            if *this.upstream_done {
                return Poll::Ready(scanner.finish().err().map(|err| Err(err.into())));
            }

            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if !chunk.is_empty() {
                        this.buffer.extend_from_slice(&chunk);
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    scanner.abort();
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    *this.upstream_done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Takes one complete line off the buffer, terminator stripped.
///
/// Once upstream is done, an unterminated remainder counts as the last line.
fn take_line(
    buffer: &mut BytesMut,
    max_line_size: usize,
    upstream_done: bool,
) -> Result<Option<Bytes>, ParseError> {
    let line = match buffer.iter().position(|byte| *byte == b'\n') {
        Some(index) => {
            let mut line = buffer.split_to(index + 1);
            line.truncate(index);
            if line.last() == Some(&b'\r') {
                line.truncate(index - 1);
            }
            line.freeze()
        }
        // Longest accepted line plus a pending "\r".
        None if buffer.len() > max_line_size.saturating_add(1) => {
            return Err(ParseError::LineTooLong { max: max_line_size });
        }
        None if upstream_done && !buffer.is_empty() => {
            let mut line = buffer.split();
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            line.freeze()
        }
        None => return Ok(None),
    };

    if line.len() > max_line_size {
        return Err(ParseError::LineTooLong { max: max_line_size });
    }
    Ok(Some(line))
}
