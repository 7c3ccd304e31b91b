//! Loads the baseline and working-copy ConfigMaps of a service.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::errors::ManifestError;
use crate::git::BaselineSource;
use crate::manifest::layout;
use crate::manifest::parser::parse_config_map_stream;
use crate::models::{ConfigMapSet, Service, ServiceConfigMaps};

/// Reads manifests below a fixed root, taking committed content from `B`.
pub struct ManifestLoader<B> {
    root: PathBuf,
    baseline: B,
}

impl<B: BaselineSource> ManifestLoader<B> {
    pub fn new(root: impl Into<PathBuf>, baseline: B) -> Self {
        Self {
            root: root.into(),
            baseline,
        }
    }

    /// Load both sides for `service`.
    pub fn load(&self, service: &Service) -> Result<ServiceConfigMaps, ManifestError> {
        info!(service = %service, "loading config maps");
        let local = self.load_local(service)?;
        let baseline = self.load_baseline(service)?;
        if local.is_empty() {
            warn!(service = %service, "local manifest contains no config maps");
        }
        Ok(ServiceConfigMaps { baseline, local })
    }

    /// Parse the working-copy manifest only.
    pub fn load_local(&self, service: &Service) -> Result<ConfigMapSet, ManifestError> {
        let path = layout::local_path(&self.root, service);
        debug!(path = %path.display(), "reading local manifest");
        if !path.is_file() {
            return Err(ManifestError::LocalFileNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(&path)?;
        parse_config_map_stream(&text, &path.display().to_string())
    }

    /// Parse the manifest as committed at HEAD.
    pub fn load_baseline(&self, service: &Service) -> Result<ConfigMapSet, ManifestError> {
        let rel = layout::baseline_path(service);
        let source_name = format!("HEAD:{}", rel.display());
        let bytes = self
            .baseline
            .fetch_baseline_content(&self.root, &rel)
            .map_err(|source| ManifestError::Baseline {
                path: rel.display().to_string(),
                source,
            })?;
        let text =
            String::from_utf8(bytes).map_err(|_| ManifestError::InvalidUtf8(source_name.clone()))?;
        parse_config_map_stream(&text, &source_name)
    }
}
