//! Error types for the cmoverride core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Baseline(#[from] BaselineError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// The manifests root does not exist or is not a directory.
    #[error("manifests root '{0}' does not exist or is not a directory")]
    RootNotFound(String),

    /// No home directory could be determined for the default root.
    #[error("could not determine the home directory; set MANIFESTS_PATH")]
    NoHomeDir,

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Baseline (version control) errors
// ---------------------------------------------------------------------------

/// Errors from retrieving committed baseline content.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// No git repository contains the manifests root.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// HEAD does not point at a commit (e.g. a fresh repository).
    #[error("HEAD does not resolve to a commit: {0}")]
    NoHead(String),

    /// The path is not tracked at HEAD.
    #[error("'{0}' does not exist at HEAD")]
    PathNotFound(String),

    /// The path exists at HEAD but is not a file.
    #[error("'{0}' at HEAD is not a file")]
    NotAFile(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),
}

// ---------------------------------------------------------------------------
// Manifest errors
// ---------------------------------------------------------------------------

/// Errors from reading and parsing ConfigMap manifest streams.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The working-copy manifest file does not exist.
    #[error("local manifest not found: {0}")]
    LocalFileNotFound(String),

    /// Malformed YAML.
    #[error("YAML parse error in {source_name}: {detail}")]
    Yaml { source_name: String, detail: String },

    /// The baseline blob is not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(String),

    /// A document has no string `metadata.name`.
    #[error("document {index} in {source_name} has no string metadata.name")]
    MissingName { source_name: String, index: usize },

    /// `data` is present but is not a mapping.
    #[error("ConfigMap '{name}' in {source_name}: data is not a mapping")]
    DataNotMapping { source_name: String, name: String },

    /// A `data` key is not a string.
    #[error("ConfigMap '{name}' in {source_name}: data key is not a string")]
    NonStringKey { source_name: String, name: String },

    /// A `data` value is a sequence or mapping.
    #[error("ConfigMap '{name}' in {source_name}: value of '{key}' is not a scalar")]
    NonScalarValue {
        source_name: String,
        name: String,
        key: String,
    },

    /// Baseline retrieval failed.
    #[error("baseline for {path}: {source}")]
    Baseline {
        path: String,
        #[source]
        source: BaselineError,
    },

    /// Generic I/O wrapper.
    #[error("manifest I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Naming errors
// ---------------------------------------------------------------------------

/// A ConfigMap identifier does not follow `<service>-<name>-cm`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("ConfigMap '{name}' does not start with '{service}-'")]
    MissingPrefix { service: String, name: String },

    #[error("ConfigMap '{name}' does not end with '-cm'")]
    MissingSuffix { name: String },

    #[error("ConfigMap '{name}' has an empty short name")]
    EmptyShortName { name: String },
}

// ---------------------------------------------------------------------------
// Output errors
// ---------------------------------------------------------------------------

/// Errors from serializing and writing the override file.
#[derive(Debug, Error)]
pub enum OutputError {
    /// YAML serialization failed.
    #[error("failed to serialize overrides: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The temporary file could not be moved over the target.
    #[error("failed to replace '{path}': {detail}")]
    Persist { path: String, detail: String },

    /// Generic I/O wrapper.
    #[error("output I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = NamingError::MissingPrefix {
            service: "identity".into(),
            name: "backend-cm".into(),
        };
        assert_eq!(
            err.to_string(),
            "ConfigMap 'backend-cm' does not start with 'identity-'"
        );

        let err = BaselineError::PathNotFound("audius/identity/identity-cm.yaml".into());
        assert_eq!(
            err.to_string(),
            "'audius/identity/identity-cm.yaml' does not exist at HEAD"
        );

        let err = ManifestError::NonScalarValue {
            source_name: "local.yaml".into(),
            name: "identity-backend-cm".into(),
            key: "PORT".into(),
        };
        assert!(err.to_string().contains("value of 'PORT' is not a scalar"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let err = NamingError::MissingSuffix { name: "x".into() };
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Naming(_)));

        let err = ConfigError::NoHomeDir;
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Config(_)));
    }
}
