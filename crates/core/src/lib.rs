//! cmoverride core library.
//!
//! This crate reconciles locally edited Kubernetes ConfigMap manifests
//! against the versions committed at HEAD: configuration, baseline retrieval,
//! manifest parsing, the key-level merge engine, and the override writer.

pub mod config;
pub mod errors;
pub mod git;
pub mod manifest;
pub mod merge;
pub mod models;
pub mod output;
pub mod reconcile;

// Re-exports for convenience.
pub use config::ReconcileConfig;
pub use errors::CoreError;
pub use models::{OverrideSet, OverrideValue, Service};
pub use reconcile::{ReconcileReport, Reconciler};
