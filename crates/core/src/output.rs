//! Serializing the aggregated [`OverrideSet`] to the override file.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::OutputError;
use crate::models::OverrideSet;

/// Render the overrides as a YAML document with sorted keys.
pub fn to_yaml_string(overrides: &OverrideSet) -> Result<String, OutputError> {
    Ok(serde_yaml::to_string(overrides)?)
}

/// Replace `path` with the YAML form of `overrides`.
///
/// The document is fully rendered and written to a sibling temporary file
/// before being renamed over `path`, so a failure leaves any existing file
/// untouched. The replaced file keeps the permissions of the one it replaces;
/// a new file is created world-readable.
pub fn write_override_file(path: &Path, overrides: &OverrideSet) -> Result<(), OutputError> {
    let yaml = to_yaml_string(overrides)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(yaml.as_bytes())?;
    tmp.flush()?;
    match std::fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(_) => set_default_permissions(tmp.as_file())?,
    }
    tmp.persist(path).map_err(|e| OutputError::Persist {
        path: path.display().to_string(),
        detail: e.error.to_string(),
    })?;

    info!(path = %path.display(), services = overrides.len(), "wrote override file");
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}
