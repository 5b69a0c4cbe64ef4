use bytes::{BufMut, BytesMut};

use crate::{
    config::{IncompletePolicy, MultipartConfig},
    error::ParseError,
    limits::Limits,
    parser::{
        boundary::{trim_ascii, trimmed_range, BoundaryMarkers},
        headers::{parse_header_line, PartHeaders},
    },
    part::MultipartPart,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    AwaitingBoundary,
    InHeaders,
    InBody,
    End,
}

/// Outcome of feeding one line to the scanner.
#[derive(Debug)]
pub(crate) enum Scan {
    Pending,
    Part(MultipartPart),
    Finished,
}

/// Line-driven multipart/mixed state machine shared by the sync and async drivers.
#[derive(Debug)]
pub(crate) struct PartScanner {
    markers: BoundaryMarkers,
    state: ScanState,
    headers: PartHeaders,
    body: BytesMut,
    body_lines: usize,
    limits: Limits,
    policy: IncompletePolicy,
}

impl PartScanner {
    pub(crate) fn new(boundary: &str, config: &MultipartConfig) -> Self {
        Self {
            markers: BoundaryMarkers::new(boundary),
            state: ScanState::AwaitingBoundary,
            headers: PartHeaders::new(),
            body: BytesMut::new(),
            body_lines: 0,
            limits: config.limits.clone(),
            policy: config.incomplete_policy,
        }
    }

    pub(crate) fn max_line_size(&self) -> usize {
        self.limits.max_line_size
    }

    /// No further line must be read once this returns `true`.
    pub(crate) fn is_finished(&self) -> bool {
        self.state == ScanState::End
    }

    pub(crate) fn scan_line(&mut self, line: &[u8]) -> Result<Scan, ParseError> {
        match self.state {
            ScanState::AwaitingBoundary => {
                if self.markers.is_part(line) {
                    self.start_headers();
                }
                Ok(Scan::Pending)
            }
            ScanState::InHeaders => {
                let trimmed = trim_ascii(line);
                if trimmed.is_empty() {
                    self.state = ScanState::InBody;
                    self.body.clear();
                    self.body_lines = 0;
                    return Ok(Scan::Pending);
                }

                match parse_header_line(trimmed) {
                    Ok((name, value)) => {
                        self.headers.insert(name, value);
                        Ok(Scan::Pending)
                    }
                    Err(err) => {
                        self.abort();
                        Err(err)
                    }
                }
            }
            ScanState::InBody => {
                if self.markers.is_part(line) {
                    let part = self.take_part();
                    self.start_headers();
                    return Ok(Scan::Part(part));
                }

                if self.markers.is_terminal(line) {
                    let part = self.take_part();
                    self.state = ScanState::End;
                    return Ok(Scan::Part(part));
                }

                self.append_body_line(line)?;
                Ok(Scan::Pending)
            }
            ScanState::End => Ok(Scan::Finished),
        }
    }

    /// Called when the line source is exhausted.
    pub(crate) fn finish(&mut self) -> Result<(), ParseError> {
        let previous = std::mem::replace(&mut self.state, ScanState::End);

        match (previous, self.policy) {
            (ScanState::End, _) => Ok(()),
            (_, IncompletePolicy::Lenient) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    state = ?previous,
                    "scanner: line source ended before the terminal boundary"
                );
                Ok(())
            }
            (_, IncompletePolicy::Strict) => Err(ParseError::IncompleteStream),
        }
    }

    /// Stops scanning after an upstream failure.
    pub(crate) fn abort(&mut self) {
        self.state = ScanState::End;
    }

    fn start_headers(&mut self) {
        self.state = ScanState::InHeaders;
        self.headers = PartHeaders::new();
    }

    fn append_body_line(&mut self, line: &[u8]) -> Result<(), ParseError> {
        let separator = usize::from(self.body_lines > 0);
        if !self
            .limits
            .is_part_size_allowed(self.body.len() + separator + line.len())
        {
            self.abort();
            return Err(ParseError::PartTooLarge {
                max: self.limits.max_part_size.unwrap_or_default(),
            });
        }

        if separator == 1 {
            self.body.put_u8(b'\n');
        }
        self.body.extend_from_slice(line);
        self.body_lines += 1;
        Ok(())
    }

    fn take_part(&mut self) -> MultipartPart {
        let body = self.body.split().freeze();
        let (start, end) = trimmed_range(&body);
        self.body_lines = 0;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            headers = self.headers.len(),
            body_len = end - start,
            "scanner: part completed"
        );

        MultipartPart::new(std::mem::take(&mut self.headers), body.slice(start..end))
    }
}
