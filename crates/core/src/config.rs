//! Run configuration for cmoverride.
//!
//! Values are resolved in order of precedence: explicit overrides (CLI),
//! an optional TOML file, the `MANIFESTS_PATH` environment variable, and
//! finally built-in defaults.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::models::Service;

/// Environment variable naming the manifests checkout.
pub const MANIFESTS_PATH_ENV: &str = "MANIFESTS_PATH";

/// Checkout directory under `$HOME` used when `MANIFESTS_PATH` is unset.
pub const DEFAULT_MANIFESTS_DIR: &str = "audius-k8s-manifests";

/// Override file written below the manifests root by default.
pub const OUTPUT_FILE_NAME: &str = "config.yaml";

// ---------------------------------------------------------------------------
// TOML file
// ---------------------------------------------------------------------------

/// Optional settings read from a TOML file. Every field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Root of the manifests checkout.
    #[serde(default)]
    pub manifests_path: Option<PathBuf>,

    /// Services to reconcile, in order.
    #[serde(default)]
    pub services: Option<Vec<Service>>,

    /// Override file location; relative paths are taken from the root.
    #[serde(default)]
    pub output_file: Option<PathBuf>,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Load a [`ConfigFile`] from the TOML file at `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(file)
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub manifests_path: PathBuf,
    pub services: Vec<Service>,
    pub output_file: Option<PathBuf>,
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl ReconcileConfig {
    /// Defaults rooted at `manifests_path`.
    pub fn new(manifests_path: impl Into<PathBuf>) -> Self {
        Self {
            manifests_path: manifests_path.into(),
            services: Service::defaults(),
            output_file: None,
            log_level: default_log_level(),
        }
    }

    /// Defaults rooted at `$MANIFESTS_PATH` or `~/audius-k8s-manifests`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = resolve_manifests_path(std::env::var_os(MANIFESTS_PATH_ENV), dirs::home_dir())?;
        Ok(Self::new(root))
    }

    /// Layer the values present in `file` over the current ones.
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(path) = file.manifests_path {
            self.manifests_path = path;
        }
        if let Some(services) = file.services {
            self.services = services;
        }
        if file.output_file.is_some() {
            self.output_file = file.output_file;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.manifests_path.is_dir() {
            return Err(ConfigError::RootNotFound(
                self.manifests_path.display().to_string(),
            ));
        }
        if self.services.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "services".into(),
                detail: "at least one service is required".into(),
            });
        }
        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(service.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "services".into(),
                    detail: format!("service '{service}' is listed more than once"),
                });
            }
        }
        if !matches!(
            self.log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidValue {
                field: "log_level".into(),
                detail: format!("unknown level '{}'", self.log_level),
            });
        }
        Ok(())
    }

    /// Where the override file is written.
    pub fn output_path(&self) -> PathBuf {
        match &self.output_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.manifests_path.join(path),
            None => self.manifests_path.join(OUTPUT_FILE_NAME),
        }
    }
}

/// Pick the manifests root from the environment value or the home directory.
///
/// An empty variable counts as unset.
pub fn resolve_manifests_path(
    env_value: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    match env_value {
        Some(value) if !value.is_empty() => {
            debug!(env = MANIFESTS_PATH_ENV, "using manifests root from environment");
            Ok(PathBuf::from(value))
        }
        _ => home
            .map(|h| h.join(DEFAULT_MANIFESTS_DIR))
            .ok_or(ConfigError::NoHomeDir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
manifests_path = "/srv/manifests"
services = ["identity", "creator-node"]
output_file = "out/overrides.yaml"
log_level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let file: ConfigFile = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(file.manifests_path, Some(PathBuf::from("/srv/manifests")));
        let services = file.services.unwrap();
        assert_eq!(services[0].as_str(), "identity");
        assert_eq!(services[1].as_str(), "creator-node");
        assert_eq!(file.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_services() {
        assert!(toml::from_str::<ConfigFile>("poll_interval_secs = 3").is_err());
        assert!(toml::from_str::<ConfigFile>("services = [\"a/b\"]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmoverride.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let file = ConfigFile::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(file.output_file, Some(PathBuf::from("out/overrides.yaml")));
    }

    #[test]
    fn test_file_not_found() {
        let result = ConfigFile::load_from_file("/nonexistent/cmoverride.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_apply_file_overrides_only_present_values() {
        let mut config = ReconcileConfig::new("/env/root");
        config.apply_file(ConfigFile {
            log_level: Some("info".into()),
            ..ConfigFile::default()
        });
        assert_eq!(config.manifests_path, PathBuf::from("/env/root"));
        assert_eq!(config.services, Service::defaults());
        assert_eq!(config.log_level, "info");

        config.apply_file(toml::from_str(sample_toml()).unwrap());
        assert_eq!(config.manifests_path, PathBuf::from("/srv/manifests"));
        assert_eq!(config.services.len(), 2);
    }

    #[test]
    fn test_output_path() {
        let mut config = ReconcileConfig::new("/root/m");
        assert_eq!(config.output_path(), PathBuf::from("/root/m/config.yaml"));
        config.output_file = Some("nested/o.yaml".into());
        assert_eq!(config.output_path(), PathBuf::from("/root/m/nested/o.yaml"));
        config.output_file = Some("/tmp/o.yaml".into());
        assert_eq!(config.output_path(), PathBuf::from("/tmp/o.yaml"));
    }

    #[test]
    fn test_resolve_manifests_path() {
        let home = Some(PathBuf::from("/home/dev"));
        assert_eq!(
            resolve_manifests_path(None, home.clone()).unwrap(),
            PathBuf::from("/home/dev/audius-k8s-manifests")
        );
        assert_eq!(
            resolve_manifests_path(Some(OsString::new()), home.clone()).unwrap(),
            PathBuf::from("/home/dev/audius-k8s-manifests")
        );
        assert_eq!(
            resolve_manifests_path(Some("/srv/m".into()), home).unwrap(),
            PathBuf::from("/srv/m")
        );
        assert!(matches!(
            resolve_manifests_path(None, None),
            Err(ConfigError::NoHomeDir)
        ));
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReconcileConfig::new(dir.path());
        assert!(config.validate().is_ok());

        config.services.push(Service::new("identity").unwrap());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "services"
        ));

        config.services.clear();
        assert!(config.validate().is_err());

        config.services = Service::defaults();
        config.log_level = "loud".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "log_level"
        ));

        let missing = ReconcileConfig::new(dir.path().join("missing"));
        assert!(matches!(missing.validate(), Err(ConfigError::RootNotFound(_))));
    }
}
