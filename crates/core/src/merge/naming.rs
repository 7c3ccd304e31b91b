//! ConfigMap identifier → short name used in the override file.
//!
//! Manifests name their ConfigMaps `<service>-<name>-cm`; the override file
//! keys them by `<name>` alone.

use crate::errors::NamingError;
use crate::models::Service;

/// Suffix every ConfigMap identifier carries.
pub const CONFIG_MAP_SUFFIX: &str = "-cm";

/// Strip the `<service>-` prefix and `-cm` suffix from `full_name`.
pub fn short_name<'a>(service: &Service, full_name: &'a str) -> Result<&'a str, NamingError> {
    let without_prefix = full_name
        .strip_prefix(service.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(|| NamingError::MissingPrefix {
            service: service.to_string(),
            name: full_name.to_string(),
        })?;

    let short = without_prefix
        .strip_suffix(CONFIG_MAP_SUFFIX)
        .ok_or_else(|| NamingError::MissingSuffix {
            name: full_name.to_string(),
        })?;

    if short.is_empty() {
        return Err(NamingError::EmptyShortName {
            name: full_name.to_string(),
        });
    }
    Ok(short)
}
