use crate::{
    config::MultipartConfig,
    error::{MlError, ParseError},
    parser::{
        lines::LineSource,
        scanner::{PartScanner, Scan},
    },
    part::MultipartPart,
};

/// Lazy, single-pass iterator over the parts of a multipart/mixed body.
///
/// Lines before the first boundary and after the terminal boundary are
/// discarded. After an error the iterator yields `None`.
#[derive(Debug)]
pub struct Parts<L> {
    source: L,
    scanner: Option<PartScanner>,
    pending_error: Option<ParseError>,
}

impl<L> Parts<L> {
    /// Creates an iterator reading parts delimited by `boundary` from `source`.
    pub fn new(boundary: &str, source: L, config: &MultipartConfig) -> Self {
        Self {
            source,
            scanner: Some(PartScanner::new(boundary, config)),
            pending_error: None,
        }
    }

    /// Creates an iterator that yields nothing and never reads `source`.
    pub fn empty(source: L) -> Self {
        Self {
            source,
            scanner: None,
            pending_error: None,
        }
    }

    /// Creates an iterator that yields `error` once, without reading `source`.
    pub fn failed(source: L, error: ParseError) -> Self {
        Self {
            source,
            scanner: None,
            pending_error: Some(error),
        }
    }

    /// Returns the underlying line source.
    pub fn into_source(self) -> L {
        self.source
    }
}

impl<L> Iterator for Parts<L>
where
    L: LineSource,
{
    type Item = Result<MultipartPart, MlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending_error.take() {
            return Some(Err(err.into()));
        }

        let scanner = self.scanner.as_mut()?;
        loop {
            if scanner.is_finished() {
                return None;
            }

            match self.source.next_line() {
                Some(Ok(line)) => match scanner.scan_line(&line) {
                    Ok(Scan::Pending) => {}
                    Ok(Scan::Part(part)) => return Some(Ok(part)),
                    Ok(Scan::Finished) => return None,
                    Err(err) => return Some(Err(err.into())),
                },
                Some(Err(err)) => {
                    scanner.abort();
                    return Some(Err(err));
                }
                None => return scanner.finish().err().map(|err| Err(err.into())),
            }
        }
    }
}
