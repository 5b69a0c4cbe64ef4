use crate::mimetype::parse_mimetype;

/// Delimiter lines derived from a multipart boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMarkers {
    part: Vec<u8>,
    terminal: Vec<u8>,
}

impl BoundaryMarkers {
    /// Builds `--boundary` and `--boundary--` markers.
    pub fn new(boundary: &str) -> Self {
        let part = format!("--{boundary}").into_bytes();
        let terminal = format!("--{boundary}--").into_bytes();
        Self { part, terminal }
    }

    /// Returns the line opening each part.
    pub fn part(&self) -> &[u8] {
        &self.part
    }

    /// Returns the line closing the last part.
    pub fn terminal(&self) -> &[u8] {
        &self.terminal
    }

    /// Returns `true` when `line`, once trimmed, opens a part.
    pub fn is_part(&self, line: &[u8]) -> bool {
        trim_ascii(line) == self.part.as_slice()
    }

    /// Returns `true` when `line`, once trimmed, closes the body.
    pub fn is_terminal(&self, line: &[u8]) -> bool {
        trim_ascii(line) == self.terminal.as_slice()
    }
}

/// Extracts a non-empty `boundary` parameter from a `Content-Type` value.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    parse_mimetype(content_type)
        .boundary()
        .filter(|boundary| !boundary.is_empty())
        .map(ToOwned::to_owned)
}

/// Returns the `start..end` range of `bytes` without surrounding whitespace.
pub(crate) fn trimmed_range(bytes: &[u8]) -> (usize, usize) {
    let start = bytes
        .iter()
        .position(|byte| !is_strippable(*byte))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|byte| !is_strippable(*byte))
        .map_or(start, |index| index + 1);
    (start, end)
}

pub(crate) fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let (start, end) = trimmed_range(bytes);
    &bytes[start..end]
}

// ASCII whitespace plus vertical tab.
fn is_strippable(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == 0x0b
}
