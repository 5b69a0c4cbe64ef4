use crate::{error::ConfigError, limits::Limits};

/// Charset assumed for text payloads.
pub const DEFAULT_CHARSET: &str = "utf-8";
/// Media type used when a response or file has none.
pub const UNKNOWN_MIMETYPE: &str = "application/octet-stream";
/// Max allowed size for each line when reading a multipart/mixed response.
pub const STREAM_LINE_MAX_SIZE: usize = 100_000;

/// Authentication scheme expected by the REST server.
///
/// The scheme is carried for the transport; this crate never computes
/// credentials itself.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// HTTP digest authentication.
    #[default]
    Digest,
    /// HTTP basic authentication.
    Basic,
}

impl AuthType {
    /// Parses an auth type name, falling back to [`AuthType::Digest`].
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("basic") {
            Self::Basic
        } else {
            Self::Digest
        }
    }
}

/// Connection settings for a MarkLogic REST server.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or IP address of the REST server.
    pub hostname: String,
    /// Listening port of the REST server.
    pub port: u16,
    /// User granted the privileges required by the called services.
    pub username: String,
    /// Password for `username`.
    pub password: String,
    /// Authentication scheme of the server.
    pub auth: AuthType,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth", &self.auth)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a configuration with digest authentication.
    pub fn new(
        hostname: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            username: username.into(),
            password: password.into(),
            auth: AuthType::default(),
        }
    }

    /// Sets the authentication scheme.
    pub fn with_auth(mut self, auth: AuthType) -> Self {
        self.auth = auth;
        self
    }

    /// Parses `hostname:port:username:password[:authtype]`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = raw.trim().split(':').collect();
        if !(4..=5).contains(&fields.len()) {
            return Err(ConfigError::MalformedConnectionString {
                fields: fields.len(),
            });
        }

        let port = fields[1]
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort {
                value: fields[1].to_owned(),
            })?;

        let config = Self {
            hostname: fields[0].trim().to_owned(),
            port,
            username: fields[2].to_owned(),
            password: fields[3].to_owned(),
            auth: fields
                .get(4)
                .map(|name| AuthType::from_name(name))
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the connection string held by an environment variable.
    pub fn from_env_var(name: &str) -> Result<Self, ConfigError> {
        let raw = std::env::var(name).map_err(|_| ConfigError::MissingEnvVar {
            name: name.to_owned(),
        })?;
        Self::parse(&raw)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::EmptyHostname);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort {
                value: self.port.to_string(),
            });
        }
        Ok(())
    }

    /// Returns the server root URL, e.g. `http://localhost:8000`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }
}

/// Policy applied when a multipart body ends without its terminal boundary.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncompletePolicy {
    /// End the part sequence silently, dropping any pending part.
    #[default]
    Lenient,
    /// Report [`ParseError::IncompleteStream`](crate::ParseError::IncompleteStream)
    /// or [`ParseError::MissingBoundary`](crate::ParseError::MissingBoundary).
    Strict,
}

/// Multipart demultiplexer configuration.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartConfig {
    /// Line and part size bounds.
    pub limits: Limits,
    /// Behavior for truncated or boundary-less bodies.
    pub incomplete_policy: IncompletePolicy,
}

impl MultipartConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a strict configuration with default limits.
    pub fn strict() -> Self {
        Self {
            incomplete_policy: IncompletePolicy::Strict,
            ..Self::default()
        }
    }

    /// Sets the limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()
    }
}
