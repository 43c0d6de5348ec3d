//! Recursive placeholder resolution
//!
//! [`resolve`] walks a document tree and rebuilds it with every placeholder
//! in every string scalar substituted. Mapping keys and non-string scalars
//! are never touched. The first placeholder that cannot be resolved aborts
//! the whole document.

use indexmap::IndexMap;

use crate::error::Result;
use crate::interpolation::{self, Token};
use crate::value::Value;

/// Maps a placeholder name to its value
///
/// Implemented by [`crate::Policy`] and by any `Fn(&str) -> Result<String>`.
pub trait TokenResolver {
    /// Resolve a single placeholder name (without braces)
    fn resolve_token(&self, name: &str) -> Result<String>;
}

impl<F> TokenResolver for F
where
    F: Fn(&str) -> Result<String>,
{
    fn resolve_token(&self, name: &str) -> Result<String> {
        self(name)
    }
}

/// Resolve every placeholder in `value` with `policy`
///
/// Returns a new tree of the same shape. Errors name the failing
/// placeholder and the document path of the string it appeared in.
pub fn resolve<R>(value: &Value, policy: &R) -> Result<Value>
where
    R: TokenResolver + ?Sized,
{
    resolve_at(value, "", policy)
}

fn resolve_at<R>(value: &Value, path: &str, policy: &R) -> Result<Value>
where
    R: TokenResolver + ?Sized,
{
    match value {
        Value::Mapping(map) => {
            let mut resolved = IndexMap::with_capacity(map.len());
            for (key, val) in map {
                let key_path = child_key_path(path, key);
                resolved.insert(key.clone(), resolve_at(val, &key_path, policy)?);
            }
            Ok(Value::Mapping(resolved))
        }
        Value::Sequence(seq) => {
            let mut resolved = Vec::with_capacity(seq.len());
            for (i, item) in seq.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                resolved.push(resolve_at(item, &item_path, policy)?);
            }
            Ok(Value::Sequence(resolved))
        }
        Value::String(s) if !interpolation::contains_placeholder(s) => Ok(value.clone()),
        Value::String(s) => {
            let substituted = interpolation::substitute(s, |name| {
                let resolved = policy
                    .resolve_token(name)
                    .map_err(|e| e.for_token(name).with_path(path))?;
                log::debug!("Resolved placeholder {{{}}} at {}", name, display_path(path));
                Ok(resolved)
            })?;
            Ok(Value::String(substituted))
        }
        Value::Scalar(_) => Ok(value.clone()),
    }
}

/// A placeholder found in a document, with the path of its string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// Document path of the string scalar (empty for the root)
    pub path: String,
    /// The placeholder occurrence
    pub token: Token,
}

/// List every placeholder occurrence in `value`, in document order
///
/// Nothing is resolved; this is the inspection counterpart of [`resolve`].
pub fn find_placeholders(value: &Value) -> Vec<PlaceholderRef> {
    let mut found = Vec::new();
    collect_placeholders(value, "", &mut found);
    found
}

fn collect_placeholders(value: &Value, path: &str, found: &mut Vec<PlaceholderRef>) {
    match value {
        Value::Mapping(map) => {
            for (key, val) in map {
                collect_placeholders(val, &child_key_path(path, key), found);
            }
        }
        Value::Sequence(seq) => {
            for (i, item) in seq.iter().enumerate() {
                collect_placeholders(item, &format!("{}[{}]", path, i), found);
            }
        }
        Value::String(s) => {
            found.extend(
                interpolation::find_tokens(s)
                    .into_iter()
                    .map(|token| PlaceholderRef {
                        path: path.to_string(),
                        token,
                    }),
            );
        }
        Value::Scalar(_) => {}
    }
}

fn child_key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
