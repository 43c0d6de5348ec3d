//! Error types for envyaml
//!
//! Every failure is fatal to a run. Errors carry enough context (the
//! offending variable or placeholder, the document path, the template
//! source) for an operator to fix the deployment without reading code.

use std::fmt;

/// Result type alias for envyaml operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for envyaml operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the document where the error occurred (e.g., "scrape_configs[0].job_name")
    pub path: Option<String>,
    /// Environment variable the document template was read from
    pub source_var: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Template variable is unset or empty
    SourceMissing { var_name: String },
    /// Template text is not a well-formed YAML document
    Parse,
    /// A placeholder could not be resolved by the active policy
    UnresolvedToken {
        token: String,
        reason: TokenErrorKind,
    },
    /// Resolved tree could not be rendered back to YAML
    Serialize,
    /// Resolved text could not be written to its destination
    Persist { path: String },
    /// Internal error (bug in envyaml)
    Internal,
}

/// Why a single placeholder failed to resolve
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenErrorKind {
    /// The placeholder names a protected template variable
    #[error("cannot use {name} as placeholder")]
    SelfReference { name: String },
    /// Fallback environment lookup found nothing
    #[error("environment variable '{var_name}' not found")]
    EnvNotFound { var_name: String },
    /// Hostname lookup failed or returned something unusable
    #[error("error getting hostname")]
    HostnameUnavailable,
    /// The designated network interface does not exist
    #[error("interface {interface} not found")]
    InterfaceNotFound { interface: String },
    /// The designated network interface has no IPv4 address
    #[error("no IPv4 address found for {interface}")]
    NoIpv4Address { interface: String },
    /// A custom provider or policy reported a failure
    #[error("provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },
}

impl Error {
    /// Create a source-missing error
    pub fn source_missing(var_name: impl Into<String>) -> Self {
        let var = var_name.into();
        Self {
            kind: ErrorKind::SourceMissing {
                var_name: var.clone(),
            },
            path: None,
            source_var: Some(var.clone()),
            help: Some(format!(
                "Set {} to the YAML document that should be rendered",
                var
            )),
            cause: None,
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            path: None,
            source_var: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create an unresolved placeholder error
    pub fn unresolved(token: impl Into<String>, reason: TokenErrorKind) -> Self {
        let token = token.into();
        let help = match &reason {
            TokenErrorKind::SelfReference { .. } => Some(
                "Template variables cannot reference themselves; use a different variable name"
                    .to_string(),
            ),
            TokenErrorKind::EnvNotFound { var_name } => Some(format!(
                "Set the {} environment variable to a non-empty value",
                var_name
            )),
            TokenErrorKind::InterfaceNotFound { .. } | TokenErrorKind::NoIpv4Address { .. } => {
                Some("Check the container network attachments".to_string())
            }
            TokenErrorKind::HostnameUnavailable | TokenErrorKind::Provider { .. } => None,
        };
        Self {
            kind: ErrorKind::UnresolvedToken { token, reason },
            path: None,
            source_var: None,
            help,
            cause: None,
        }
    }

    /// Create a self-reference error for a protected placeholder
    pub fn self_reference(token: impl Into<String>) -> Self {
        let token = token.into();
        Self::unresolved(
            token.clone(),
            TokenErrorKind::SelfReference { name: token },
        )
    }

    /// Create an env var not found error
    pub fn env_not_found(var_name: impl Into<String>) -> Self {
        let var = var_name.into();
        Self::unresolved(var.clone(), TokenErrorKind::EnvNotFound { var_name: var })
    }

    /// Create a serialize error
    pub fn serialize(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Serialize,
            path: None,
            source_var: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create a persist error for the given destination
    pub fn persist(path: impl Into<String>, message: impl Into<String>) -> Self {
        let p = path.into();
        Self {
            kind: ErrorKind::Persist { path: p.clone() },
            path: None,
            source_var: None,
            help: Some(format!("Check that the directory containing {} is writable", p)),
            cause: Some(message.into()),
        }
    }

    /// Create an internal error (bug in envyaml)
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            path: None,
            source_var: None,
            help: Some("This is likely a bug in envyaml. Please report it.".into()),
            cause: Some(message.into()),
        }
    }

    /// Attribute an arbitrary failure to the placeholder being resolved
    ///
    /// Errors that already describe an unresolved placeholder keep their
    /// reason but are re-keyed to `token`; anything else becomes a provider
    /// failure for `token`.
    pub fn for_token(mut self, token: &str) -> Self {
        if let ErrorKind::UnresolvedToken { token: failed, .. } = &mut self.kind {
            if failed.as_str() != token {
                *failed = token.to_string();
            }
            return self;
        }
        let Error {
            kind,
            path,
            source_var,
            cause,
            ..
        } = self;
        let message = match cause {
            Some(c) => format!("{}: {}", kind_label(&kind), c),
            None => kind_label(&kind).to_string(),
        };
        Self {
            path,
            source_var,
            ..Self::unresolved(
                token,
                TokenErrorKind::Provider {
                    provider: "policy".into(),
                    message,
                },
            )
        }
    }

    /// The placeholder name, if this is an unresolved-token error
    pub fn token(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::UnresolvedToken { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let p = path.into();
        self.path = if p.is_empty() { None } else { Some(p) };
        self
    }

    /// Add the template source variable to the error
    pub fn with_source_var(mut self, var: impl Into<String>) -> Self {
        self.source_var = Some(var.into());
        self
    }

}

fn kind_label(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::SourceMissing { .. } => "source missing",
        ErrorKind::Parse => "parse error",
        ErrorKind::UnresolvedToken { .. } => "unresolved placeholder",
        ErrorKind::Serialize => "serialize error",
        ErrorKind::Persist { .. } => "write error",
        ErrorKind::Internal => "internal error",
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::SourceMissing { var_name } => {
                write!(f, "{} environment variable not set", var_name)?
            }
            ErrorKind::Parse => write!(f, "Error unmarshalling YAML")?,
            ErrorKind::UnresolvedToken { token, reason } => {
                write!(f, "Error replacing place holder {}: {}", token, reason)?
            }
            ErrorKind::Serialize => write!(f, "Error marshaling YAML")?,
            ErrorKind::Persist { path } => write!(f, "Error writing to file {}", path)?,
            ErrorKind::Internal => write!(f, "Internal error")?,
        }

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(var) = &self.source_var {
            if !matches!(self.kind, ErrorKind::SourceMissing { .. }) {
                write!(f, "\n  Source: {}", var)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
