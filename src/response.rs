use std::io::Cursor;

use bytes::Bytes;
use futures::Stream;
use http::{header, HeaderMap, Response, StatusCode};

use crate::{
    config::{IncompletePolicy, MultipartConfig, UNKNOWN_MIMETYPE},
    error::{ConfigError, MlError, ParseError},
    mimetype::{parse_mimetype, ContentTypeDescriptor},
    parser::{BoundedLines, LineSource, MultipartStream, Parts},
};

/// Application oriented helper over an [`http::Response`].
///
/// The adapter reads `Content-Type` and `Content-Length` once, at
/// construction. Iterating the parts consumes the adapter, so a body is
/// traversed at most once.
#[derive(Debug)]
pub struct ResponseAdapter<B> {
    response: Response<B>,
    content_type: ContentTypeDescriptor,
    boundary: Option<String>,
    content_length: Option<u64>,
    config: MultipartConfig,
}

impl<B> ResponseAdapter<B> {
    /// Wraps a response using the default multipart configuration.
    pub fn new(response: Response<B>) -> Self {
        Self::build(response, MultipartConfig::default())
    }

    /// Wraps a response with an explicit, validated configuration.
    pub fn with_config(response: Response<B>, config: MultipartConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(response, config))
    }

    fn build(response: Response<B>, config: MultipartConfig) -> Self {
        let headers = response.headers();
        let raw_content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(UNKNOWN_MIMETYPE);
        let content_type = parse_mimetype(raw_content_type);
        let boundary = content_type
            .boundary()
            .filter(|boundary| !boundary.is_empty())
            .map(ToOwned::to_owned);
        let content_length = declared_content_length(headers);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            content_type = raw_content_type,
            boundary = boundary.as_deref().unwrap_or("<none>"),
            content_length = ?content_length,
            "response: adapter created"
        );

        Self {
            response,
            content_type,
            boundary,
            content_length,
            config,
        }
    }

    /// Returns the main media type, e.g. `multipart`.
    pub fn main_type(&self) -> &str {
        &self.content_type.main_type
    }

    /// Returns the media sub type, e.g. `mixed`.
    pub fn sub_type(&self) -> &str {
        &self.content_type.sub_type
    }

    /// Returns the parsed content type.
    pub fn content_type(&self) -> &ContentTypeDescriptor {
        &self.content_type
    }

    /// Returns the multipart boundary, if the content type declares one.
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    /// Returns the declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Returns `true` for a `multipart/mixed` response.
    pub fn is_multipart_mixed(&self) -> bool {
        self.content_type.is_multipart_mixed()
    }

    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Returns the wrapped response.
    pub fn into_inner(self) -> Response<B> {
        self.response
    }

    /// Splits the adapter into its body and the boundary to scan for.
    ///
    /// `Ok(None)` means the body must not be read at all.
    fn into_scan_plan(self) -> (B, Result<Option<String>, ParseError>, MultipartConfig) {
        let plan = if self.content_length == Some(0) {
            Ok(None)
        } else {
            match (self.boundary, self.config.incomplete_policy) {
                (Some(boundary), _) => Ok(Some(boundary)),
                (None, IncompletePolicy::Lenient) => Ok(None),
                (None, IncompletePolicy::Strict) => Err(ParseError::MissingBoundary),
            }
        };
        (self.response.into_body(), plan, self.config)
    }
}

impl<B> ResponseAdapter<B>
where
    B: LineSource,
{
    /// Yields one [`MultipartPart`](crate::MultipartPart) per MIME part of the body.
    ///
    /// A declared `Content-Length: 0` yields nothing without reading the
    /// body, and so does a missing boundary under the lenient policy.
    pub fn iter_parts(self) -> Parts<B> {
        let (body, plan, config) = self.into_scan_plan();
        match plan {
            Ok(Some(boundary)) => Parts::new(&boundary, body, &config),
            Ok(None) => Parts::empty(body),
            Err(err) => Parts::failed(body, err),
        }
    }
}

impl<B> ResponseAdapter<B>
where
    B: Stream<Item = Result<Bytes, MlError>>,
{
    /// Async counterpart of [`ResponseAdapter::iter_parts`] over a chunk stream.
    pub fn stream_parts(self) -> MultipartStream<B> {
        let (body, plan, config) = self.into_scan_plan();
        match plan {
            Ok(Some(boundary)) => MultipartStream::new(&boundary, body, &config),
            Ok(None) => MultipartStream::empty(body),
            Err(err) => MultipartStream::failed(body, err),
        }
    }
}

impl ResponseAdapter<BoundedLines<Cursor<Bytes>>> {
    /// Wraps a fully buffered response, reading its body line by line.
    pub fn from_buffered(response: Response<Bytes>) -> Self {
        Self::new(response.map(BoundedLines::from_bytes))
    }
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(header::CONTENT_LENGTH)?;
    let parsed = raw
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok());

    #[cfg(feature = "tracing")]
    if parsed.is_none() {
        tracing::debug!(
            content_length = ?raw,
            "response: ignoring unparseable Content-Length"
        );
    }

    parsed
}
