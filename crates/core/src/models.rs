//! Domain model types used throughout cmoverride.
//!
//! These types bridge the manifest loader, the merge engine, and the
//! override writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Services reconciled when no explicit list is configured.
pub const DEFAULT_SERVICES: [&str; 3] = ["creator-node", "discovery-provider", "identity"];

/// A backend service whose ConfigMap manifest is reconciled.
///
/// The name selects both the manifest directory and the ConfigMap naming
/// prefix, so it must be non-empty and free of path separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Service(String);

impl Service {
    /// Validate and wrap a service name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "services".into(),
                detail: "service name must not be empty".into(),
            });
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::InvalidValue {
                field: "services".into(),
                detail: format!("service name '{name}' is not a plain directory name"),
            });
        }
        Ok(Self(name))
    }

    /// The built-in service list.
    pub fn defaults() -> Vec<Service> {
        DEFAULT_SERVICES
            .iter()
            .map(|name| Service((*name).to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Service {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Service::new(value)
    }
}

impl From<Service> for String {
    fn from(service: Service) -> Self {
        service.0
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ConfigMap contents
// ---------------------------------------------------------------------------

/// Flat key/value contents of one ConfigMap.
pub type ConfigMapData = BTreeMap<String, String>;

/// ConfigMaps of one manifest stream, keyed by `metadata.name`.
pub type ConfigMapSet = BTreeMap<String, ConfigMapData>;

/// Baseline and working-copy ConfigMaps for a single service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfigMaps {
    /// Content committed at HEAD.
    pub baseline: ConfigMapSet,
    /// Content currently on disk.
    pub local: ConfigMapSet,
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// The value recorded for one key in the override file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideValue {
    /// The local value replaces (or adds to) the baseline.
    Set(String),
    /// The key was removed locally; written as an empty string.
    Tombstone,
}

impl OverrideValue {
    /// The string written to the override file.
    pub fn as_output_str(&self) -> &str {
        match self {
            Self::Set(value) => value,
            Self::Tombstone => "",
        }
    }
}

impl Serialize for OverrideValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_output_str())
    }
}

/// Key overrides for one ConfigMap.
pub type ConfigMapOverrides = BTreeMap<String, OverrideValue>;

/// Overrides for one service, keyed by short ConfigMap name.
pub type ServiceOverrides = BTreeMap<String, ConfigMapOverrides>;

/// The complete override document: service → short name → key → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OverrideSet {
    services: BTreeMap<String, ServiceOverrides>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fragment produced for `service`, replacing any earlier one.
    pub fn insert_service(&mut self, service: &Service, overrides: ServiceOverrides) {
        self.services.insert(service.as_str().to_string(), overrides);
    }

    pub fn service(&self, service: &str) -> Option<&ServiceOverrides> {
        self.services.get(service)
    }

    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceOverrides)> {
        self.services.iter().map(|(name, o)| (name.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_validation() {
        assert!(Service::new("identity").is_ok());
        assert!(Service::new("").is_err());
        assert!(Service::new("a/b").is_err());
        assert!(Service::new("..").is_err());
    }

    #[test]
    fn test_default_services() {
        let names: Vec<String> = Service::defaults()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["creator-node", "discovery-provider", "identity"]);
    }

    #[test]
    fn test_tombstone_serializes_as_empty_string() {
        let mut overrides = ConfigMapOverrides::new();
        overrides.insert("GONE".into(), OverrideValue::Tombstone);
        overrides.insert("PORT".into(), OverrideValue::Set("8080".into()));
        let yaml = serde_yaml::to_string(&overrides).unwrap();
        let parsed: BTreeMap<String, String> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["GONE"], "");
        assert_eq!(parsed["PORT"], "8080");
    }

    #[test]
    fn test_empty_value_is_not_a_tombstone() {
        let value = OverrideValue::Set(String::new());
        assert_ne!(value, OverrideValue::Tombstone);
        assert_eq!(value.as_output_str(), OverrideValue::Tombstone.as_output_str());
    }

    #[test]
    fn test_override_set_is_keyed_by_service() {
        let service = Service::new("identity").unwrap();
        let mut set = OverrideSet::new();
        assert!(set.is_empty());
        set.insert_service(&service, ServiceOverrides::new());
        assert_eq!(set.len(), 1);
        assert!(set.service("identity").unwrap().is_empty());
    }
}
