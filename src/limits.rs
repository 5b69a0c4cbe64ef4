use crate::{config::STREAM_LINE_MAX_SIZE, error::ConfigError};

/// Size bounds enforced while demultiplexing a response body.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum accepted size in bytes for one line, terminator excluded.
    pub max_line_size: usize,
    /// Maximum accepted body size in bytes for a single part.
    pub max_part_size: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_size: STREAM_LINE_MAX_SIZE,
            max_part_size: None,
        }
    }
}

impl Limits {
    /// Creates the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates that every configured bound is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_size == 0 {
            return Err(ConfigError::InvalidLimitValue {
                limit: "max_line_size",
            });
        }
        if self.max_part_size == Some(0) {
            return Err(ConfigError::InvalidLimitValue {
                limit: "max_part_size",
            });
        }
        Ok(())
    }

    /// Returns `true` when a body of `size` bytes stays within bounds.
    pub fn is_part_size_allowed(&self, size: usize) -> bool {
        let allowed = self.max_part_size.map_or(true, |max| size <= max);

        #[cfg(feature = "tracing")]
        if !allowed {
            tracing::debug!(
                size = size,
                max_part_size = ?self.max_part_size,
                "limits: part body rejected by max_part_size"
            );
        }

        allowed
    }
}
