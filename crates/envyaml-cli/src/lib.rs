//! envyaml CLI library
//!
//! This module exposes the CLI entry point so the binary and any wrapper
//! images can share it.

mod cli;

pub use cli::run;
