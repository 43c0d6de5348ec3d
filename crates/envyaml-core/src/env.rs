//! Read-only access to environment variables
//!
//! The process environment is the only process-wide state envyaml reads.
//! It is passed around as an [`Environment`] so that policies and loaders
//! can be exercised against a fixed set of variables.

use std::collections::HashMap;

/// A read-only key/value lookup of environment variables
pub trait Environment: Send + Sync {
    /// Get the value of a variable, `None` if unset
    fn var(&self, name: &str) -> Option<String>;

    /// Get the value of a variable, treating an empty value as unset
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|v| !v.is_empty())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        // A name that is empty or contains '=' or NUL can never be set
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        std::env::var(name).ok()
    }
}

/// A fixed set of variables
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_lookup() {
        let env = MapEnv::new().with("A", "1").with("EMPTY", "");

        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("EMPTY").as_deref(), Some(""));
        assert_eq!(env.non_empty("EMPTY"), None);
        assert_eq!(env.var("MISSING"), None);
    }

    #[test]
    fn test_map_env_from_iter() {
        let mut env: MapEnv = [("X", "x"), ("Y", "y")].into_iter().collect();
        env.set("Z", "z");

        assert_eq!(env.non_empty("X").as_deref(), Some("x"));
        assert_eq!(env.non_empty("Z").as_deref(), Some("z"));
    }

    #[test]
    fn test_process_env_rejects_invalid_names() {
        assert_eq!(ProcessEnv.var(""), None);
        assert_eq!(ProcessEnv.var("A=B"), None);
    }

    #[test]
    fn test_process_env_reads_variables() {
        // PATH is present in any environment cargo test runs in
        assert!(ProcessEnv.non_empty("PATH").is_some());
        assert_eq!(ProcessEnv.var("ENVYAML_SURELY_UNSET_VARIABLE_42"), None);
    }
}
