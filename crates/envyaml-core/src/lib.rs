//! envyaml-core: Placeholder resolution for environment-supplied YAML
//!
//! Containers receive their configuration as a YAML template in an
//! environment variable. Templates reference runtime values with `{NAME}`
//! placeholders inside string scalars; this crate resolves them against the
//! environment and a few computed values (hostname, interface address) and
//! produces a fully resolved document.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use envyaml_core::{parse_yaml, resolve, MapEnv, Policy};
//!
//! let env = Arc::new(MapEnv::new().with("REMOTE_HOST", "10.0.0.5"));
//! let policy = Policy::new(env);
//!
//! let doc = parse_yaml("remote_write:\n  - url: http://{REMOTE_HOST}:9009/api/v1/push\n").unwrap();
//! let resolved = resolve(&doc, &policy).unwrap();
//! assert_eq!(
//!     resolved.get_path("remote_write[0].url").unwrap().as_str(),
//!     Some("http://10.0.0.5:9009/api/v1/push")
//! );
//! ```

pub mod document;
pub mod env;
pub mod error;
pub mod interpolation;
pub mod policy;
pub mod provider;
pub mod resolver;
pub mod value;

mod profile;

pub use document::{load_document, parse_yaml, to_yaml, write_document};
pub use env::{Environment, MapEnv, ProcessEnv};
pub use error::{Error, ErrorKind, Result, TokenErrorKind};
pub use policy::Policy;
pub use profile::{
    DocumentSpec, MimirOptions, Profile, RenderEvent, RenderedDocument, ALERTMANAGER_OUTPUT,
    MIMIR_OUTPUT, PROMETHEUS_OUTPUT,
};
pub use provider::{FnProvider, HostnameProvider, InterfaceAddrProvider, Provider};
pub use resolver::{find_placeholders, resolve, PlaceholderRef, TokenResolver};
pub use value::{Scalar, Value};
