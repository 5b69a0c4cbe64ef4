use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Configuration-time validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A connection string did not have the `host:port:user:password[:authtype]` shape.
    #[error("connection string must look like `host:port:user:password[:authtype]`, got {fields} field(s)")]
    MalformedConnectionString {
        /// Number of `:`-separated fields found.
        fields: usize,
    },
    /// The configured port is not a valid TCP port.
    #[error("invalid port `{value}`")]
    InvalidPort {
        /// Raw port value.
        value: String,
    },
    /// The configured host name was empty.
    #[error("hostname cannot be empty")]
    EmptyHostname,
    /// The environment variable holding the connection string is not set.
    #[error("environment variable `{name}` is not set")]
    MissingEnvVar {
        /// Name of the environment variable.
        name: String,
    },
    /// A configured numeric limit must be strictly greater than zero.
    #[error("limit `{limit}` must be greater than 0")]
    InvalidLimitValue {
        /// Name of the limit.
        limit: &'static str,
    },
}

/// Multipart parser failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A part header line had no `:` separator.
    #[error("invalid part header line `{line}`")]
    InvalidHeaderLine {
        /// Offending line, lossily decoded.
        line: String,
    },
    /// A body line exceeded the configured line bound.
    #[error("line exceeded max line size of {max} bytes")]
    LineTooLong {
        /// Maximum accepted line size in bytes.
        max: usize,
    },
    /// A part body exceeded the configured part size limit.
    #[error("part body exceeded max part size of {max} bytes")]
    PartTooLarge {
        /// Maximum accepted part body size in bytes.
        max: usize,
    },
    /// The line source ended before the terminal boundary.
    #[error("multipart stream ended before the terminal boundary")]
    IncompleteStream,
    /// The response content type carries no `boundary` parameter.
    #[error("missing multipart boundary parameter")]
    MissingBoundary,
    /// A part body was read as text but is not UTF-8.
    #[error("part body is not valid UTF-8")]
    NonUtf8Body,
}

/// Query parameter validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParamError {
    /// A required parameter (`!` or `+`) was not provided.
    #[error("{name} keyword argument must be provided")]
    Missing {
        /// Parameter name.
        name: String,
    },
    /// Several values were given to a parameter that accepts at most one.
    #[error("{name} accepts a single value, got {count}")]
    TooManyValues {
        /// Parameter name.
        name: String,
        /// Number of values provided.
        count: usize,
    },
    /// A value was rejected by the parameter validator.
    #[error("invalid value for {name}, got: {value}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: String,
    },
    /// Key/value pairs were given to a parameter that accepts at most one value.
    #[error("{name} accepts a single value, got a mapping")]
    MapNotAllowed {
        /// Parameter name.
        name: String,
    },
    /// An unknown cardinality marker was used in a parameter declaration.
    #[error("invalid cardinality marker for {name}: {marker}")]
    InvalidCardinality {
        /// Parameter name.
        name: String,
        /// Marker character found.
        marker: char,
    },
}

/// Error reported by the MarkLogic server for a 4xx or 5xx response.
///
/// Requests carry `X-Error-Accept: application/json`, so the body is
/// expected to hold an `errorResponse` object. Other bodies fall back to
/// placeholder code and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP code {} ({ml_code}): {ml_message}", .status.as_u16())]
pub struct ServerError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// MarkLogic message code, e.g. `RESTAPI-NODOCUMENT`.
    pub ml_code: String,
    /// Human readable server message.
    pub ml_message: String,
}

const UNKNOWN_CODE: &str = "(Unknown code)";
const UNKNOWN_MESSAGE: &str = "(Unknown message)";

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "errorResponse", default)]
    error_response: ErrorResponse,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "messageCode")]
    message_code: Option<String>,
    message: Option<String>,
}

impl ServerError {
    /// Builds a server error from a response status, content type and body.
    pub fn from_parts(status: StatusCode, content_type: Option<&str>, body: &[u8]) -> Self {
        let is_json = content_type
            .map(|value| value.trim().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false);

        let response = if is_json {
            serde_json::from_slice::<ErrorEnvelope>(body)
                .map(|envelope| envelope.error_response)
                .unwrap_or_default()
        } else {
            ErrorResponse::default()
        };

        Self {
            status,
            ml_code: response
                .message_code
                .unwrap_or_else(|| UNKNOWN_CODE.to_owned()),
            ml_message: response
                .message
                .unwrap_or_else(|| UNKNOWN_MESSAGE.to_owned()),
        }
    }

    /// Builds a server error from a buffered response.
    pub fn from_response(response: &http::Response<bytes::Bytes>) -> Self {
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        Self::from_parts(response.status(), content_type, response.body())
    }
}

/// Runtime error type used by `mlrest`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MlError {
    /// Configuration error surfaced at runtime.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Multipart parser failure.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Query parameter validation failure.
    #[error(transparent)]
    Param(#[from] ParamError),
    /// Non-success response from the server.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// I/O failure while reading a response body.
    #[error("i/o error while reading response body: {0}")]
    Io(#[from] std::io::Error),
    /// An HTTP request could not be built.
    #[error(transparent)]
    Http(#[from] http::Error),
    /// The transport failed to deliver a request.
    #[error("transport error: {message}")]
    Transport {
        /// Transport failure message.
        message: String,
    },
}

impl MlError {
    /// Creates a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}
