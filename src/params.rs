use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use url::Url;

use crate::error::ParamError;

const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How many values a named parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one value (`!`).
    ExactlyOne,
    /// Zero or one value (`?`).
    Optional,
    /// Zero or more values (`*`).
    Any,
    /// One or more values (`+`).
    AtLeastOne,
}

impl Cardinality {
    /// Parses a cardinality marker: `!`, `?`, `*` or `+`.
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '!' => Some(Self::ExactlyOne),
            '?' => Some(Self::Optional),
            '*' => Some(Self::Any),
            '+' => Some(Self::AtLeastOne),
            _ => None,
        }
    }

    /// Returns the marker character.
    pub fn marker(self) -> char {
        match self {
            Self::ExactlyOne => '!',
            Self::Optional => '?',
            Self::Any => '*',
            Self::AtLeastOne => '+',
        }
    }

    /// Returns `true` when the parameter must be provided.
    pub fn is_required(self) -> bool {
        matches!(self, Self::ExactlyOne | Self::AtLeastOne)
    }

    /// Returns `true` when several values are accepted.
    pub fn is_repeatable(self) -> bool {
        matches!(self, Self::Any | Self::AtLeastOne)
    }
}

/// Value supplied for a named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A single value.
    One(String),
    /// Several values.
    Many(Vec<String>),
    /// Key/value pairs, sent as `name:key=value` (e.g. `perm:admin=read`).
    Map(Vec<(String, String)>),
}

impl ParamValue {
    /// Builds a mapping value.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(ToOwned::to_owned).collect())
    }
}

/// Predicate applied to every scalar value of a parameter.
pub type Validator = fn(&str) -> bool;

#[derive(Debug, Clone)]
struct ParamRule {
    name: String,
    cardinality: Cardinality,
    validator: Option<Validator>,
}

/// Declares the parameters accepted by a REST call.
#[derive(Debug, Clone, Default)]
pub struct ParamSpec {
    rules: Vec<ParamRule>,
}

/// Arguments that are not declared by a [`ParamSpec`].
pub type IgnoredParams = Vec<(String, ParamValue)>;

impl ParamSpec {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares parameters from `(name, marker)` pairs such as `("uri", '!')`.
    pub fn from_markers<N>(markers: impl IntoIterator<Item = (N, char)>) -> Result<Self, ParamError>
    where
        N: Into<String>,
    {
        let mut spec = Self::new();
        for (name, marker) in markers {
            let name = name.into();
            let Some(cardinality) = Cardinality::from_marker(marker) else {
                return Err(ParamError::InvalidCardinality { name, marker });
            };
            spec = spec.param(name, cardinality);
        }
        Ok(spec)
    }

    /// Declares a parameter without value validation.
    pub fn param(mut self, name: impl Into<String>, cardinality: Cardinality) -> Self {
        self.upsert(ParamRule {
            name: name.into(),
            cardinality,
            validator: None,
        });
        self
    }

    /// Declares a parameter whose values must satisfy `validator`.
    pub fn validated(
        mut self,
        name: impl Into<String>,
        cardinality: Cardinality,
        validator: Validator,
    ) -> Self {
        self.upsert(ParamRule {
            name: name.into(),
            cardinality,
            validator: Some(validator),
        });
        self
    }

    /// Returns the cardinality declared for `name`.
    pub fn cardinality(&self, name: &str) -> Option<Cardinality> {
        self.rule(name).map(|rule| rule.cardinality)
    }

    /// Validates arguments and turns them into query parameters.
    ///
    /// Returns the query parameters and the arguments that are not
    /// declared, which are left out of the query.
    pub fn request_params<N, V>(
        &self,
        args: impl IntoIterator<Item = (N, V)>,
    ) -> Result<(QueryParams, IgnoredParams), ParamError>
    where
        N: Into<String>,
        V: Into<ParamValue>,
    {
        let args: Vec<(String, ParamValue)> = args
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();

        for rule in self.rules.iter().filter(|rule| rule.cardinality.is_required()) {
            if !args.iter().any(|(name, _)| *name == rule.name) {
                return Err(ParamError::Missing {
                    name: rule.name.clone(),
                });
            }
        }

        let mut params = QueryParams::new();
        let mut ignored = Vec::new();

        for (name, value) in args {
            let Some(rule) = self.rule(&name) else {
                ignored.push((name, value));
                continue;
            };

            match value {
                ParamValue::One(value) => {
                    rule.check(&value)?;
                    params.push(name, value);
                }
                ParamValue::Many(values) => {
                    if !rule.cardinality.is_repeatable() {
                        match values.len() {
                            0 if rule.cardinality.is_required() => {
                                return Err(ParamError::Missing { name });
                            }
                            0 | 1 => {}
                            count => return Err(ParamError::TooManyValues { name, count }),
                        }
                    }
                    for value in values {
                        rule.check(&value)?;
                        params.push(name.clone(), value);
                    }
                }
                ParamValue::Map(entries) => {
                    if entries.is_empty() && rule.cardinality.is_required() {
                        return Err(ParamError::Missing { name });
                    }
                    if !rule.cardinality.is_repeatable() {
                        return Err(ParamError::MapNotAllowed { name });
                    }
                    for (key, value) in entries {
                        rule.check(&value)?;
                        params.push(format!("{name}:{key}"), value);
                    }
                }
            }
        }

        Ok((params, ignored))
    }

    fn rule(&self, name: &str) -> Option<&ParamRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    fn upsert(&mut self, rule: ParamRule) {
        match self.rules.iter_mut().find(|existing| existing.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }
}

impl ParamRule {
    fn check(&self, value: &str) -> Result<(), ParamError> {
        match self.validator {
            Some(validator) if !validator(value) => Err(ParamError::InvalidValue {
                name: self.name.clone(),
                value: value.to_owned(),
            }),
            _ => Ok(()),
        }
    }
}

/// Ordered query parameters; a name may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Appends a parameter unless one with the same name exists.
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push((name, value.into()));
        }
    }

    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` when `name` has at least one value.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of `name=value` pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Renders `name=value&...` with percent-encoded components.
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(name, QUERY_COMPONENT),
                    utf8_percent_encode(value, QUERY_COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<N, V> FromIterator<(N, V)> for QueryParams
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

/// Identifier: a letter or `_`, then word characters.
pub fn is_identifier(value: &str) -> bool {
    matches_pattern(&IDENTIFIER, r"^[_A-Za-z]\w*$", value)
}

/// Identifier without a `:` (XML NCName subset).
pub fn is_ncname(value: &str) -> bool {
    is_identifier(value) && !value.contains(':')
}

/// Relative path made of identifier directories and a `name[.ext]` file name.
pub fn is_path(value: &str) -> bool {
    if value.starts_with('/') {
        return false;
    }

    let mut segments: Vec<&str> = value.split('/').collect();
    let Some(file_name) = segments.pop() else {
        return false;
    };

    segments
        .iter()
        .all(|segment| segment.is_empty() || is_identifier(segment))
        && matches_pattern(&FILE_NAME, r"^([_\w](\w|\-)*)(\.(\w*))?$", file_name)
}

/// Absolute URI or reference relative to a server root, e.g. `/doc.xml`.
pub fn is_uri_reference(value: &str) -> bool {
    let Some(base) = URI_BASE
        .get_or_init(|| Url::parse("http://localhost/").ok())
        .as_ref()
    else {
        return false;
    };
    Url::options().base_url(Some(base)).parse(value).is_ok()
}

/// Integer greater than or equal to zero.
pub fn is_positive_or_zero_int(value: &str) -> bool {
    value
        .trim()
        .parse::<i64>()
        .map(|number| number >= 0)
        .unwrap_or(false)
}

static IDENTIFIER: OnceLock<Option<Regex>> = OnceLock::new();
static FILE_NAME: OnceLock<Option<Regex>> = OnceLock::new();
static URI_BASE: OnceLock<Option<Url>> = OnceLock::new();

fn matches_pattern(cell: &OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(value))
}
