//! Structural fingerprints for static-analysis warnings.
//!
//! A warning is identified by the syntax around it rather than by its line
//! number: the category picks a scope kind, the scope is cut out of the
//! file's syntax tree, reduced to its sequence of node kinds and hashed.
//! The same defect keeps its fingerprint while unrelated edits move it
//! around the file.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod digest;
pub mod engine;
pub mod error;
pub mod fulltext;
pub mod grammar;
pub mod hasher;
pub mod registry;
pub mod scope;
pub mod source;
pub mod syntax;
pub mod types;

pub use engine::{BatchReport, BatchSummary, FingerprintEngine, Fingerprinted, Outcome, ParsedFile, WarningOutcome};
pub use error::Error;
pub use registry::CategoryRegistry;
pub use types::{Fingerprint, ScopeKind, Warning};
