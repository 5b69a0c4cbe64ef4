#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! REST client for MarkLogic 8 with a streaming multipart/mixed response parser.
//!
//! ```
//! use http::Response;
//! use mlrest::{lines_from_iter, ResponseAdapter};
//!
//! let response = Response::builder()
//!     .header("content-type", "multipart/mixed; boundary=B")
//!     .body(lines_from_iter(["--B", "Content-Type: text/plain", "", "hello", "--B--"]))
//!     .expect("response should build");
//!
//! let adapter = ResponseAdapter::new(response);
//! assert!(adapter.is_multipart_mixed());
//!
//! let parts: Vec<_> = adapter
//!     .iter_parts()
//!     .collect::<Result<_, _>>()
//!     .expect("body should parse");
//! assert_eq!(parts[0].headers.get("CONTENT-TYPE"), Some("text/plain"));
//! assert_eq!(&parts[0].body[..], b"hello");
//! ```

/// Transport-agnostic REST client.
pub mod client;
/// Connection and multipart configuration.
pub mod config;
/// Error types exposed by this crate.
pub mod error;
/// Demultiplexer size limits.
pub mod limits;
/// Content-type parsing and media type helpers.
pub mod mimetype;
/// Query parameter validation and serialization.
pub mod params;
/// Low-level multipart parser components.
pub mod parser;
/// Parsed multipart part.
pub mod part;
/// Multipart-aware HTTP response adapter.
pub mod response;

pub use client::{RestClient, Transport, ERROR_ACCEPT};
pub use config::{
    AuthType, ClientConfig, IncompletePolicy, MultipartConfig, DEFAULT_CHARSET,
    STREAM_LINE_MAX_SIZE, UNKNOWN_MIMETYPE,
};
pub use error::{ConfigError, MlError, ParamError, ParseError, ServerError};
pub use limits::Limits;
pub use mimetype::{
    guess_mimetype, is_mimetype, parse_mimetype, parse_mimetype_opt, ContentTypeDescriptor,
};
pub use params::{
    is_identifier, is_ncname, is_path, is_positive_or_zero_int, is_uri_reference, Cardinality,
    ParamSpec, ParamValue, QueryParams,
};
pub use parser::{
    lines_from_iter, BoundedLines, IterLines, LineSource, MultipartStream, PartHeaders, Parts,
};
pub use part::MultipartPart;
pub use response::ResponseAdapter;
