use bytes::Bytes;

use crate::{
    error::{MlError, ParseError},
    mimetype::ContentTypeDescriptor,
    parser::headers::PartHeaders,
};

/// One part of a multipart/mixed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Part headers, case-insensitive on lookup.
    pub headers: PartHeaders,
    /// Part body with line terminators joined by `\n` and edges trimmed.
    pub body: Bytes,
}

impl MultipartPart {
    /// Creates a part from headers and body bytes.
    pub fn new(headers: PartHeaders, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Returns part headers.
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// Returns raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the part `Content-Type`; absent headers give an empty descriptor.
    pub fn content_type(&self) -> ContentTypeDescriptor {
        crate::mimetype::parse_mimetype_opt(self.headers.content_type())
    }

    /// Decodes the body as UTF-8 text.
    pub fn text(&self) -> Result<String, MlError> {
        String::from_utf8(self.body.to_vec()).map_err(|_| ParseError::NonUtf8Body.into())
    }

    /// Splits the part into its headers and body.
    pub fn into_parts(self) -> (PartHeaders, Bytes) {
        (self.headers, self.body)
    }
}
