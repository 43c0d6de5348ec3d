//! Document value types
//!
//! A template is parsed into a closed tree of four node kinds: mappings,
//! sequences, strings (the only nodes placeholders can live in) and every
//! other scalar (null, booleans, numbers), which are carried through as-is.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;

use crate::error::{Error, Result};

/// A node in a YAML document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Mapping of string keys to values
    Mapping(IndexMap<String, Value>),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// String value (may contain placeholders like {VAR})
    String(String),
    /// Any other scalar, never substituted
    Scalar(Scalar),
}

/// A non-string scalar
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Scalar {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer or floating point value, kept in its parsed representation
    Number(serde_yaml::Number),
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(Scalar::Null)
    }
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    /// Check if this value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this value is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    /// Check if this value is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Get as boolean if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer Number
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Get as f64 if this is a Number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as mapping if this is a Mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Get a value by path (e.g., "global.scrape_interval" or "scrape_configs[0].job_name")
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }

        let segments = parse_path(path)?;
        let mut current = self;

        for segment in &segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Mapping(map)) => map.get(key.as_str())?,
                (PathSegment::Index(idx), Value::Sequence(seq)) => seq.get(*idx)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Mapping(_) => "mapping",
            Value::Sequence(_) => "sequence",
            Value::String(_) => "string",
            Value::Scalar(Scalar::Null) => "null",
            Value::Scalar(Scalar::Bool(_)) => "boolean",
            Value::Scalar(Scalar::Number(_)) => "number",
        }
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = Error;

    fn try_from(raw: serde_yaml::Value) -> Result<Self> {
        Ok(match raw {
            serde_yaml::Value::Null => Value::Scalar(Scalar::Null),
            serde_yaml::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_yaml::Value::Number(n) => Value::Scalar(Scalar::Number(n)),
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(seq) => Value::Sequence(
                seq.into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    let key = mapping_key(key)?;
                    if out.contains_key(&key) {
                        return Err(Error::parse(format!("duplicate mapping key '{}'", key)));
                    }
                    out.insert(key, Value::try_from(value)?);
                }
                Value::Mapping(out)
            }
            // Tags carry no meaning for substitution; keep the tagged content
            serde_yaml::Value::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

/// Render a YAML mapping key as a string key
///
/// Scalar keys are stringified the way they are spelled in YAML; a mapping
/// or sequence used as a key cannot be represented and is rejected.
fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => mapping_key(tagged.value),
        other => {
            let kind = if other.is_sequence() {
                "sequence"
            } else {
                "mapping"
            };
            Err(Error::parse(format!(
                "mapping keys must be scalars, found a {} key",
                kind
            )))
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        Value::try_from(raw).map_err(de::Error::custom)
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Number(i.into()))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Number(f.into()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Mapping(m)
    }
}

/// A segment in a path expression
#[derive(Debug, Clone, PartialEq)]
enum PathSegment {
    /// A key in a mapping (e.g., "global" in "global.scrape_interval")
    Key(String),
    /// An index in a sequence (e.g., 0 in "scrape_configs[0]")
    Index(usize),
}

/// Parse a path string into segments
/// Supports: "key", "key.subkey", "key[0]", "key[0].subkey"
fn parse_path(path: &str) -> Option<Vec<PathSegment>> {
    let mut segments = Vec::new();
    let mut current_key = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current_key.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current_key)));
                }
            }
            '[' => {
                if !current_key.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current_key)));
                }
                let index_str: String = chars.by_ref().take_while(|&c| c != ']').collect();
                segments.push(PathSegment::Index(index_str.parse().ok()?));
            }
            ']' => return None,
            _ => current_key.push(c),
        }
    }

    if !current_key.is_empty() {
        segments.push(PathSegment::Key(current_key));
    }

    Some(segments)
}
