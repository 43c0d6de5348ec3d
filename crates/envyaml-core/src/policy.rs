//! Placeholder resolution policies
//!
//! A [`Policy`] decides what a placeholder name resolves to, checking in
//! order:
//!
//! 1. protected names (the variables templates are read from) always fail,
//! 2. names bound to a computed [`Provider`] use that provider,
//! 3. anything else is read from the environment and must be non-empty.
//!
//! The two stock policies match the documents envyaml renders:
//! [`Policy::prometheus`] and [`Policy::mimir`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::provider::{HostnameProvider, InterfaceAddrProvider, Provider};
use crate::resolver::TokenResolver;

/// Variable holding the Prometheus template
pub const PROMETHEUS_SOURCE: &str = "PROMETHEUS_YML";
/// Variable holding the Mimir template
pub const MIMIR_SOURCE: &str = "MIMIR_YAML";
/// Variable holding the Alertmanager template
pub const ALERTMANAGER_SOURCE: &str = "ALERTMANAGER_YAML";
/// Placeholder answered with the host's name
pub const HOSTNAME_TOKEN: &str = "HOSTNAME";
/// Placeholder answered with the advertised interface address
pub const ADVERTISE_ADDR_TOKEN: &str = "ADVERTISE_ADDR_REPLACE";
/// Interface whose address is advertised by default
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Resolution policy for one kind of document
#[derive(Clone)]
pub struct Policy {
    protected: BTreeSet<String>,
    providers: HashMap<String, Arc<dyn Provider>>,
    env: Arc<dyn Environment>,
}

impl Policy {
    /// Create a policy that only reads the environment
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self {
            protected: BTreeSet::new(),
            providers: HashMap::new(),
            env,
        }
    }

    /// Policy for Prometheus node documents
    ///
    /// `PROMETHEUS_YML` is protected and `{HOSTNAME}` is the host's name.
    pub fn prometheus(env: Arc<dyn Environment>) -> Self {
        Self::new(env)
            .protect(PROMETHEUS_SOURCE)
            .with_provider(HOSTNAME_TOKEN, Arc::new(HostnameProvider))
    }

    /// Policy for Mimir and its Alertmanager companion
    ///
    /// Both template variables are protected and `{ADVERTISE_ADDR_REPLACE}`
    /// is the first IPv4 address of `interface`.
    pub fn mimir(env: Arc<dyn Environment>, interface: impl Into<String>) -> Self {
        Self::new(env)
            .protect(MIMIR_SOURCE)
            .protect(ALERTMANAGER_SOURCE)
            .with_provider(
                ADVERTISE_ADDR_TOKEN,
                Arc::new(InterfaceAddrProvider::new(interface)),
            )
    }

    /// Forbid a placeholder name
    pub fn protect(mut self, name: impl Into<String>) -> Self {
        self.protected.insert(name.into());
        self
    }

    /// Answer a placeholder name with a computed provider
    pub fn with_provider(mut self, token: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(token.into(), provider);
        self
    }

    /// Check if a placeholder name is forbidden
    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(name)
    }

    /// Names this policy forbids, sorted
    pub fn protected(&self) -> impl Iterator<Item = &str> {
        self.protected.iter().map(String::as_str)
    }

    /// Check if a placeholder name is answered by a provider
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Resolve a placeholder name to its value
    pub fn resolve(&self, name: &str) -> Result<String> {
        if self.is_protected(name) {
            return Err(Error::self_reference(name));
        }

        if let Some(provider) = self.providers.get(name) {
            log::trace!("Asking {} provider for {{{}}}", provider.name(), name);
            return provider
                .provide()
                .map_err(|reason| Error::unresolved(name, reason));
        }

        self.env
            .non_empty(name)
            .ok_or_else(|| Error::env_not_found(name))
    }
}

impl TokenResolver for Policy {
    fn resolve_token(&self, name: &str) -> Result<String> {
        self.resolve(name)
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<_> = self
            .providers
            .iter()
            .map(|(token, p)| format!("{}={}", token, p.name()))
            .collect();
        providers.sort();
        f.debug_struct("Policy")
            .field("protected", &self.protected)
            .field("providers", &providers)
            .finish_non_exhaustive()
    }
}
