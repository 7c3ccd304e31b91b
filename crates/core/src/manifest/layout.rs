//! Where each service's ConfigMap manifest lives inside the manifests root.

use std::path::{Path, PathBuf};

use crate::models::Service;

/// Directory under the root that holds one subdirectory per service.
pub const SERVICES_DIR: &str = "audius";

/// `audius/<service>/<service>-cm.yaml`, relative to the manifests root.
pub fn config_map_path(service: &Service) -> PathBuf {
    Path::new(SERVICES_DIR)
        .join(service.as_str())
        .join(format!("{service}-cm.yaml"))
}

/// Absolute location of the working-copy manifest.
pub fn local_path(root: &Path, service: &Service) -> PathBuf {
    root.join(config_map_path(service))
}

/// Path form used in `HEAD:<path>` lookups: always `/`-separated.
pub fn baseline_path(service: &Service) -> PathBuf {
    PathBuf::from(format!("{SERVICES_DIR}/{service}/{service}-cm.yaml"))
}
