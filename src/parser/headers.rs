use crate::error::ParseError;

/// Ordered header mapping with case-insensitive lookup.
///
/// Names keep the case they were written with by the server. Inserting a
/// name that is already present (ignoring case) keeps its position but
/// takes the new spelling and value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    entries: Vec<(String, String)>,
}

impl PartHeaders {
    /// Creates an empty header mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, overwriting a previous value with the same name.
    ///
    /// Returns the replaced value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        match self.position(&name) {
            Some(index) => {
                let (_, previous) = std::mem::replace(&mut self.entries[index], (name, value));
                Some(previous)
            }
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Returns the value for `name`, compared ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|index| self.entries[index].1.as_str())
    }

    /// Returns `true` when a header named `name` exists.
    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the part `Content-Type`, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<N, V> FromIterator<(N, V)> for PartHeaders
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Splits a trimmed header line on its first `:` into trimmed name and value.
pub fn parse_header_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let text = String::from_utf8_lossy(line);
    let Some((raw_name, raw_value)) = text.split_once(':') else {
        return Err(ParseError::InvalidHeaderLine {
            line: text.into_owned(),
        });
    };

    Ok((raw_name.trim().to_owned(), raw_value.trim().to_owned()))
}
