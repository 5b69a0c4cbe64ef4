use std::collections::HashMap;

use crate::config::UNKNOWN_MIMETYPE;

/// Structured result of parsing a `Content-Type` value.
///
/// Every field is lowercase except parameter values, which keep their case.
/// Parsing never fails: malformed input degrades into empty fields.
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentTypeDescriptor {
    /// Main type, e.g. `multipart`.
    pub main_type: String,
    /// Sub type without suffix, e.g. `mixed` or `json` in `json+hal`.
    pub sub_type: String,
    /// Structured syntax suffix, e.g. `hal` in `json+hal`.
    pub suffix: String,
    /// Parameters keyed by lowercase name.
    pub parameters: HashMap<String, String>,
}

impl ContentTypeDescriptor {
    /// Returns `true` when every field is empty.
    pub fn is_empty(&self) -> bool {
        self.main_type.is_empty()
            && self.sub_type.is_empty()
            && self.suffix.is_empty()
            && self.parameters.is_empty()
    }

    /// Returns a parameter value by case-insensitive name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the `boundary` parameter, if any.
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the `charset` parameter, if any.
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns `main/sub`, without suffix nor parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns `true` for `multipart/mixed`.
    pub fn is_multipart_mixed(&self) -> bool {
        self.main_type == "multipart" && self.sub_type == "mixed"
    }

    /// Converts into a [`mime::Mime`] when the type is well formed.
    pub fn to_mime(&self) -> Option<mime::Mime> {
        if self.main_type.is_empty() || self.sub_type.is_empty() {
            return None;
        }

        let mut raw = self.essence();
        if !self.suffix.is_empty() {
            raw.push('+');
            raw.push_str(&self.suffix);
        }
        raw.parse().ok()
    }
}

/// Parses a MIME type into main type, sub type, suffix and parameters.
///
/// ```
/// use mlrest::parse_mimetype;
///
/// let parsed = parse_mimetype("text/html; charset=utf-8");
/// assert_eq!(parsed.main_type, "text");
/// assert_eq!(parsed.sub_type, "html");
/// assert_eq!(parsed.suffix, "");
/// assert_eq!(parsed.charset(), Some("utf-8"));
/// ```
pub fn parse_mimetype(raw: &str) -> ContentTypeDescriptor {
    if raw.is_empty() {
        return ContentTypeDescriptor::default();
    }

    let mut segments = raw.split(';');
    let full_type = segments
        .next()
        .map(|segment| segment.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let parameters = segments
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            (
                key.trim().to_ascii_lowercase(),
                value.trim_matches(|c| c == ' ' || c == '"').to_owned(),
            )
        })
        .collect();

    let full_type = if full_type == "*" {
        "*/*".to_owned()
    } else {
        full_type
    };

    let (main_type, rest) = full_type.split_once('/').unwrap_or((full_type.as_str(), ""));
    let (sub_type, suffix) = rest.split_once('+').unwrap_or((rest, ""));

    ContentTypeDescriptor {
        main_type: main_type.to_owned(),
        sub_type: sub_type.to_owned(),
        suffix: suffix.to_owned(),
        parameters,
    }
}

/// Parses an optional header value; `None` yields the empty descriptor.
pub fn parse_mimetype_opt(raw: Option<&str>) -> ContentTypeDescriptor {
    raw.map(parse_mimetype).unwrap_or_default()
}

/// Guesses a media type from a file name extension.
///
/// Unknown extensions map to `application/octet-stream`. MarkLogic module
/// files (`.xqy`) map to `application/xquery`.
pub fn guess_mimetype(filename: &str) -> mime::Mime {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let guessed = match extension.as_str() {
        "xml" => "application/xml",
        "json" => "application/json",
        "xqy" | "xq" | "xquery" => "application/xquery",
        "sjs" | "js" => "application/javascript",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "css" => "text/css",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        _ => UNKNOWN_MIMETYPE,
    };

    guessed.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Returns `true` when `value` names a media type this crate knows about.
pub fn is_mimetype(value: &str) -> bool {
    if value == UNKNOWN_MIMETYPE {
        return true;
    }

    let parsed = parse_mimetype(value);
    if parsed.sub_type.is_empty() {
        return false;
    }

    matches!(
        parsed.main_type.as_str(),
        "application" | "text" | "image" | "audio" | "video" | "font" | "model" | "multipart" | "message"
    )
}
