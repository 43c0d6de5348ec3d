//! Render profiles
//!
//! A [`Profile`] describes one run: which documents to render, where each
//! template comes from, which policy resolves it and where the result goes.
//! Documents are rendered one after another; a companion document can be
//! gated on a variable so that it is only rendered when configured.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::document::{load_document, to_yaml, write_document};
use crate::env::Environment;
use crate::error::Result;
use crate::policy::{
    Policy, ALERTMANAGER_SOURCE, DEFAULT_INTERFACE, MIMIR_SOURCE, PROMETHEUS_SOURCE,
};
use crate::resolver::resolve;
use crate::value::Value;

/// Where the Prometheus configuration is written by default
pub const PROMETHEUS_OUTPUT: &str = "/etc/prometheus/prometheus.yml";
/// Where the Mimir configuration is written by default
pub const MIMIR_OUTPUT: &str = "/etc/mimir.yaml";
/// Where the Alertmanager configuration is written by default
///
/// The spelling matches what existing Mimir images read at startup.
pub const ALERTMANAGER_OUTPUT: &str = "/etc/alertamanager.yaml";

/// One document to render
#[derive(Debug, Clone)]
pub struct DocumentSpec {
    /// Short name used in messages (e.g. "mimir")
    pub label: String,
    /// Variable the template is read from
    pub source_var: String,
    /// Variable that must be non-empty for this document to be rendered
    pub gate_var: Option<String>,
    /// Destination of the resolved document
    pub output: PathBuf,
    /// Policy resolving this document's placeholders
    pub policy: Policy,
}

impl DocumentSpec {
    /// Create an ungated document spec
    pub fn new(
        label: impl Into<String>,
        source_var: impl Into<String>,
        output: impl Into<PathBuf>,
        policy: Policy,
    ) -> Self {
        Self {
            label: label.into(),
            source_var: source_var.into(),
            gate_var: None,
            output: output.into(),
            policy,
        }
    }

    /// Only render this document when `var` is set and non-empty
    pub fn gated_by(mut self, var: impl Into<String>) -> Self {
        self.gate_var = Some(var.into());
        self
    }

    /// Check the gate against `env`
    pub fn is_enabled(&self, env: &dyn Environment) -> bool {
        match &self.gate_var {
            Some(gate) => env.non_empty(gate).is_some(),
            None => true,
        }
    }
}

/// A fully resolved document, ready to print or persist
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Label of the spec this was rendered from
    pub label: String,
    /// Destination path
    pub output: PathBuf,
    /// Resolved document tree
    pub value: Value,
    /// Resolved document as YAML text
    pub yaml: String,
}

/// Progress of a [`Profile::render_all`] run
#[derive(Debug, Clone, Copy)]
pub enum RenderEvent<'a> {
    /// The document is about to be loaded and resolved
    Started(&'a DocumentSpec),
    /// The document resolved completely
    Rendered(&'a RenderedDocument),
    /// The document was written to its output
    Written(&'a RenderedDocument),
}

impl RenderedDocument {
    /// Write the YAML text to the destination path
    pub fn persist(&self) -> Result<()> {
        write_document(&self.output, &self.yaml)
    }
}

/// Options for the Mimir profile
#[derive(Debug, Clone)]
pub struct MimirOptions {
    /// Destination of the Mimir configuration
    pub output: PathBuf,
    /// Destination of the Alertmanager configuration
    pub alertmanager_output: PathBuf,
    /// Interface whose IPv4 address answers `{ADVERTISE_ADDR_REPLACE}`
    pub interface: String,
}

impl Default for MimirOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from(MIMIR_OUTPUT),
            alertmanager_output: PathBuf::from(ALERTMANAGER_OUTPUT),
            interface: DEFAULT_INTERFACE.to_string(),
        }
    }
}

/// An ordered set of documents rendered against one environment
#[derive(Clone)]
pub struct Profile {
    name: String,
    env: Arc<dyn Environment>,
    documents: Vec<DocumentSpec>,
}

impl Profile {
    /// Create an empty profile
    pub fn new(name: impl Into<String>, env: Arc<dyn Environment>) -> Self {
        Self {
            name: name.into(),
            env,
            documents: Vec::new(),
        }
    }

    /// Append a document
    pub fn with_document(mut self, spec: DocumentSpec) -> Self {
        self.documents.push(spec);
        self
    }

    /// Prometheus ring node: `PROMETHEUS_YML` rendered to `output`
    pub fn prometheus(env: Arc<dyn Environment>, output: impl Into<PathBuf>) -> Self {
        let policy = Policy::prometheus(Arc::clone(&env));
        Self::new("prometheus", env).with_document(DocumentSpec::new(
            "prometheus",
            PROMETHEUS_SOURCE,
            output,
            policy,
        ))
    }

    /// Mimir, plus Alertmanager when `ALERTMANAGER_YAML` is provided
    ///
    /// Both documents share the Mimir policy.
    pub fn mimir(env: Arc<dyn Environment>, options: MimirOptions) -> Self {
        let policy = Policy::mimir(Arc::clone(&env), options.interface);
        Self::new("mimir", env)
            .with_document(DocumentSpec::new(
                "mimir",
                MIMIR_SOURCE,
                options.output,
                policy.clone(),
            ))
            .with_document(
                DocumentSpec::new(
                    "alertmanager",
                    ALERTMANAGER_SOURCE,
                    options.alertmanager_output,
                    policy,
                )
                .gated_by(ALERTMANAGER_SOURCE),
            )
    }

    /// Profile name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All documents, gated or not
    pub fn documents(&self) -> &[DocumentSpec] {
        &self.documents
    }

    /// Documents whose gate is open, in order
    pub fn active_documents(&self) -> impl Iterator<Item = &DocumentSpec> {
        self.documents.iter().filter(|spec| {
            let enabled = spec.is_enabled(self.env.as_ref());
            if !enabled {
                log::info!(
                    "Skipping {}: {} is not set",
                    spec.label,
                    spec.gate_var.as_deref().unwrap_or_default()
                );
            }
            enabled
        })
    }

    /// Load, resolve and serialize one document
    ///
    /// Nothing is written; call [`RenderedDocument::persist`] on success.
    pub fn render(&self, spec: &DocumentSpec) -> Result<RenderedDocument> {
        log::info!("Rendering {} from {}", spec.label, spec.source_var);
        let raw = load_document(self.env.as_ref(), &spec.source_var)?;
        let value =
            resolve(&raw, &spec.policy).map_err(|e| e.with_source_var(&spec.source_var))?;
        let yaml = to_yaml(&value).map_err(|e| e.with_source_var(&spec.source_var))?;
        Ok(RenderedDocument {
            label: spec.label.clone(),
            output: spec.output.clone(),
            value,
            yaml,
        })
    }

    /// Render every active document, persisting each one when `write` is set
    ///
    /// `on_event` is told about each step as it happens. Stops at the first
    /// failure. A document is only written after it resolved completely;
    /// documents before the failing one stay written.
    pub fn render_all<F>(&self, write: bool, mut on_event: F) -> Result<Vec<RenderedDocument>>
    where
        F: FnMut(RenderEvent<'_>),
    {
        let mut rendered_docs = Vec::new();
        for spec in self.active_documents() {
            on_event(RenderEvent::Started(spec));
            let rendered = self.render(spec)?;
            on_event(RenderEvent::Rendered(&rendered));
            if write {
                rendered
                    .persist()
                    .map_err(|e| e.with_source_var(&spec.source_var))?;
                on_event(RenderEvent::Written(&rendered));
            }
            rendered_docs.push(rendered);
        }
        Ok(rendered_docs)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}
