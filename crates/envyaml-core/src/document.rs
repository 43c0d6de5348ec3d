//! Loading templates from the environment and writing resolved documents

use std::path::Path;

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::value::Value;

/// Parse YAML text into a document tree
pub fn parse_yaml(text: &str) -> Result<Value> {
    serde_yaml::from_str(text).map_err(|e| Error::parse(e.to_string()))
}

/// Read the template held by `source_var` and parse it
///
/// Fails if the variable is unset or empty, or if its text is not a single
/// well-formed YAML document.
pub fn load_document(env: &dyn Environment, source_var: &str) -> Result<Value> {
    let text = env
        .non_empty(source_var)
        .ok_or_else(|| Error::source_missing(source_var))?;
    log::debug!("Read {} bytes of template from {}", text.len(), source_var);
    parse_yaml(&text).map_err(|e| e.with_source_var(source_var))
}

/// Render a document tree as YAML text
pub fn to_yaml(value: &Value) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| Error::serialize(e.to_string()))
}

/// Write resolved YAML text to `path`
///
/// The file is created or truncated; on Unix it is left with mode 0644.
pub fn write_document(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)
        .map_err(|e| Error::persist(path.display().to_string(), e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::persist(path.display().to_string(), e.to_string()))?;
    }

    log::info!("Wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}
