//! Folding a multi-document ConfigMap YAML stream into a [`ConfigMapSet`].

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::errors::ManifestError;
use crate::models::{ConfigMapData, ConfigMapSet};

/// Parse a YAML stream of ConfigMap documents keyed by `metadata.name`.
///
/// `source_name` only appears in error messages. Empty documents are skipped
/// and a document without `data` contributes an empty ConfigMap. Merge keys
/// (`<<: *anchor`) are resolved and scalar values are kept as their string
/// form. A name defined twice keeps its last document.
pub fn parse_config_map_stream(text: &str, source_name: &str) -> Result<ConfigMapSet, ManifestError> {
    let mut set = ConfigMapSet::new();

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let yaml_error = |e: serde_yaml::Error| ManifestError::Yaml {
            source_name: source_name.to_string(),
            detail: e.to_string(),
        };
        let mut doc = Value::deserialize(document).map_err(yaml_error)?;
        doc.apply_merge().map_err(yaml_error)?;
        if doc.is_null() {
            continue;
        }

        let name = doc
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| ManifestError::MissingName {
                source_name: source_name.to_string(),
                index,
            })?
            .to_string();

        let data = parse_data(doc.get("data"), source_name, &name)?;
        if set.contains_key(&name) {
            warn!(
                source = source_name,
                config_map = %name,
                "config map defined more than once, keeping the last"
            );
        }
        debug!(source = source_name, config_map = %name, keys = data.len(), "parsed config map");
        set.insert(name, data);
    }

    Ok(set)
}

fn parse_data(
    data: Option<&Value>,
    source_name: &str,
    name: &str,
) -> Result<ConfigMapData, ManifestError> {
    let mapping = match data {
        None | Some(Value::Null) => return Ok(ConfigMapData::new()),
        Some(Value::Mapping(mapping)) => mapping,
        Some(_) => {
            return Err(ManifestError::DataNotMapping {
                source_name: source_name.to_string(),
                name: name.to_string(),
            })
        }
    };

    let mut out = ConfigMapData::new();
    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| ManifestError::NonStringKey {
            source_name: source_name.to_string(),
            name: name.to_string(),
        })?;
        let value = scalar_to_string(value).ok_or_else(|| ManifestError::NonScalarValue {
            source_name: source_name.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })?;
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
