//! Key-level diff between baseline and local ConfigMaps.
//!
//! For a ConfigMap present on both sides, every key in the union of both key
//! sets is classified once; only keys that differ from the baseline produce an
//! override. ConfigMaps that exist only locally are copied verbatim.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::errors::NamingError;
use crate::merge::naming::short_name;
use crate::models::{
    ConfigMapData, ConfigMapOverrides, ConfigMapSet, OverrideValue, Service, ServiceOverrides,
};

/// How a single key differs between baseline and local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChange {
    /// Only present locally.
    Added,
    /// Only present in the baseline.
    Removed,
    /// Present on both sides with different values.
    Changed,
    /// Present on both sides with equal values.
    Unchanged,
}

/// Classify a key from its baseline and local values.
///
/// Returns `None` only when the key is absent on both sides.
pub fn classify_key(baseline: Option<&str>, local: Option<&str>) -> Option<KeyChange> {
    match (baseline, local) {
        (None, Some(_)) => Some(KeyChange::Added),
        (Some(_), None) => Some(KeyChange::Removed),
        (Some(b), Some(l)) if b != l => Some(KeyChange::Changed),
        (Some(_), Some(_)) => Some(KeyChange::Unchanged),
        (None, None) => None,
    }
}

/// Per-ConfigMap change counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub unchanged: usize,
    /// Keys copied from a ConfigMap that has no baseline counterpart.
    pub passthrough: usize,
}

impl MergeStats {
    fn record(&mut self, change: KeyChange) {
        match change {
            KeyChange::Added => self.added += 1,
            KeyChange::Removed => self.removed += 1,
            KeyChange::Changed => self.changed += 1,
            KeyChange::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of keys written to the override file.
    pub fn emitted(&self) -> usize {
        self.added + self.removed + self.changed + self.passthrough
    }

    pub fn absorb(&mut self, other: &MergeStats) {
        self.added += other.added;
        self.removed += other.removed;
        self.changed += other.changed;
        self.unchanged += other.unchanged;
        self.passthrough += other.passthrough;
    }
}

/// Overrides for one ConfigMap together with how they were derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedConfigMap {
    pub overrides: ConfigMapOverrides,
    /// Change kind of every key in `overrides`.
    pub changes: BTreeMap<String, KeyChange>,
    pub stats: MergeStats,
    /// `true` when the ConfigMap had no baseline and was copied verbatim.
    pub is_new: bool,
}

/// Diff `local` against `baseline` for a ConfigMap present on both sides.
pub fn merge_config_map(baseline: &ConfigMapData, local: &ConfigMapData) -> MergedConfigMap {
    let keys: BTreeSet<&String> = baseline.keys().chain(local.keys()).collect();

    let mut merged = MergedConfigMap::default();
    for key in keys {
        let base_value = baseline.get(key).map(String::as_str);
        let local_value = local.get(key).map(String::as_str);
        let Some(change) = classify_key(base_value, local_value) else {
            continue;
        };
        merged.stats.record(change);

        let value = match change {
            KeyChange::Added | KeyChange::Changed => {
                OverrideValue::Set(local_value.unwrap_or_default().to_string())
            }
            KeyChange::Removed => OverrideValue::Tombstone,
            KeyChange::Unchanged => continue,
        };
        merged.changes.insert(key.clone(), change);
        merged.overrides.insert(key.clone(), value);
    }
    merged
}

/// Copy a ConfigMap that has no baseline counterpart.
pub fn passthrough_config_map(local: &ConfigMapData) -> MergedConfigMap {
    let overrides: ConfigMapOverrides = local
        .iter()
        .map(|(k, v)| (k.clone(), OverrideValue::Set(v.clone())))
        .collect();
    MergedConfigMap {
        changes: local.keys().map(|k| (k.clone(), KeyChange::Added)).collect(),
        stats: MergeStats {
            passthrough: overrides.len(),
            ..MergeStats::default()
        },
        overrides,
        is_new: true,
    }
}

/// Result of merging every local ConfigMap of one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMerge {
    pub overrides: ServiceOverrides,
    /// Per short ConfigMap name, in name order.
    pub config_maps: Vec<ConfigMapSummary>,
}

/// Summary line for one ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMapSummary {
    pub short_name: String,
    pub changes: BTreeMap<String, KeyChange>,
    pub stats: MergeStats,
    pub is_new: bool,
}

impl ServiceMerge {
    pub fn totals(&self) -> MergeStats {
        total_stats(&self.config_maps)
    }
}

/// Sum of the per-ConfigMap counters.
pub fn total_stats(config_maps: &[ConfigMapSummary]) -> MergeStats {
    config_maps.iter().fold(MergeStats::default(), |mut total, cm| {
        total.absorb(&cm.stats);
        total
    })
}

/// Produce the override fragment for one service.
///
/// Iterates the ConfigMaps of `local`; ConfigMaps that exist only in
/// `baseline` are not reported. Every local ConfigMap gets an entry, even if
/// it ends up empty.
pub fn merge_service(
    service: &Service,
    baseline: &ConfigMapSet,
    local: &ConfigMapSet,
) -> Result<ServiceMerge, NamingError> {
    let mut result = ServiceMerge::default();

    for (name, local_data) in local {
        let short = short_name(service, name)?;
        let merged = match baseline.get(name) {
            Some(base_data) => merge_config_map(base_data, local_data),
            None => passthrough_config_map(local_data),
        };
        debug!(
            service = %service,
            config_map = %name,
            new = merged.is_new,
            added = merged.stats.added,
            removed = merged.stats.removed,
            changed = merged.stats.changed,
            unchanged = merged.stats.unchanged,
            "merged config map"
        );

        result.config_maps.push(ConfigMapSummary {
            short_name: short.to_string(),
            changes: merged.changes,
            stats: merged.stats,
            is_new: merged.is_new,
        });
        result.overrides.insert(short.to_string(), merged.overrides);
    }

    let totals = result.totals();
    info!(
        service = %service,
        config_maps = result.config_maps.len(),
        overrides = totals.emitted(),
        "service merged"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> ConfigMapData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn set(value: &str) -> OverrideValue {
        OverrideValue::Set(value.into())
    }

    #[test]
    fn test_classify_key() {
        assert_eq!(classify_key(None, Some("a")), Some(KeyChange::Added));
        assert_eq!(classify_key(Some("a"), None), Some(KeyChange::Removed));
        assert_eq!(classify_key(Some("a"), Some("b")), Some(KeyChange::Changed));
        assert_eq!(classify_key(Some("a"), Some("a")), Some(KeyChange::Unchanged));
        assert_eq!(classify_key(None, None), None);
    }

    #[test]
    fn test_example_scenario() {
        let baseline = data(&[("LOG_LEVEL", "info"), ("PORT", "80")]);
        let local = data(&[("LOG_LEVEL", "debug"), ("TIMEOUT", "30")]);
        let merged = merge_config_map(&baseline, &local);

        let expected: ConfigMapOverrides = [
            ("LOG_LEVEL".to_string(), set("debug")),
            ("PORT".to_string(), OverrideValue::Tombstone),
            ("TIMEOUT".to_string(), set("30")),
        ]
        .into_iter()
        .collect();
        assert_eq!(merged.overrides, expected);
        assert_eq!(merged.changes["LOG_LEVEL"], KeyChange::Changed);
        assert_eq!(merged.changes["PORT"], KeyChange::Removed);
        assert_eq!(merged.changes["TIMEOUT"], KeyChange::Added);
        assert_eq!(
            merged.stats,
            MergeStats {
                added: 1,
                removed: 1,
                changed: 1,
                unchanged: 0,
                passthrough: 0,
            }
        );
        assert!(!merged.is_new);
    }

    #[test]
    fn test_identical_maps_produce_no_overrides() {
        let baseline = data(&[("A", "1"), ("B", "2")]);
        let merged = merge_config_map(&baseline, &baseline.clone());
        assert!(merged.overrides.is_empty());
        assert_eq!(merged.stats.unchanged, 2);
        assert_eq!(merged.stats.emitted(), 0);
    }

    #[test]
    fn test_removed_key_with_empty_baseline_value_is_tombstoned() {
        let baseline = data(&[("EMPTY", "")]);
        let merged = merge_config_map(&baseline, &ConfigMapData::new());
        assert_eq!(merged.overrides["EMPTY"], OverrideValue::Tombstone);
    }

    #[test]
    fn test_local_empty_value_is_kept_as_set() {
        let baseline = data(&[("KEY", "value")]);
        let local = data(&[("KEY", "")]);
        let merged = merge_config_map(&baseline, &local);
        assert_eq!(merged.overrides["KEY"], set(""));
    }

    #[test]
    fn test_passthrough_copies_everything() {
        let local = data(&[("A", "1"), ("B", ""), ("C", "3")]);
        let merged = passthrough_config_map(&local);
        assert!(merged.is_new);
        assert_eq!(merged.stats.passthrough, 3);
        assert_eq!(merged.overrides.len(), 3);
        assert_eq!(merged.overrides["B"], set(""));
    }

    #[test]
    fn test_merge_service() {
        let service = Service::new("identity").unwrap();
        let mut baseline = ConfigMapSet::new();
        baseline.insert("identity-backend-cm".into(), data(&[("PORT", "80"), ("A", "x")]));
        baseline.insert("identity-retired-cm".into(), data(&[("OLD", "1")]));

        let mut local = ConfigMapSet::new();
        local.insert("identity-backend-cm".into(), data(&[("PORT", "80"), ("A", "y")]));
        local.insert("identity-extra-cm".into(), data(&[("NEW", "1")]));

        let merged = merge_service(&service, &baseline, &local).unwrap();
        assert_eq!(merged.overrides.len(), 2);
        assert_eq!(merged.overrides["backend"].len(), 1);
        assert_eq!(merged.overrides["backend"]["A"], set("y"));
        assert_eq!(merged.overrides["extra"]["NEW"], set("1"));
        // Baseline-only ConfigMaps are not reported.
        assert!(!merged.overrides.contains_key("retired"));

        let names: Vec<&str> = merged
            .config_maps
            .iter()
            .map(|cm| cm.short_name.as_str())
            .collect();
        assert_eq!(names, vec!["backend", "extra"]);
        assert_eq!(merged.totals().emitted(), 2);
    }

    #[test]
    fn test_total_stats_sums_every_config_map() {
        let service = Service::new("identity").unwrap();
        let mut baseline = ConfigMapSet::new();
        baseline.insert("identity-a-cm".into(), data(&[("K", "1"), ("GONE", "x"), ("SAME", "s")]));
        let mut local = ConfigMapSet::new();
        local.insert("identity-a-cm".into(), data(&[("K", "2"), ("NEW", "n"), ("SAME", "s")]));
        local.insert("identity-b-cm".into(), data(&[("P", "1"), ("Q", "2")]));

        let merged = merge_service(&service, &baseline, &local).unwrap();
        let total = total_stats(&merged.config_maps);
        assert_eq!(total.added, 1);
        assert_eq!(total.removed, 1);
        assert_eq!(total.changed, 1);
        assert_eq!(total.unchanged, 1);
        assert_eq!(total.passthrough, 2);
        assert_eq!(total, merged.totals());
        assert_eq!(total_stats(&[]), MergeStats::default());
    }

    #[test]
    fn test_unchanged_config_map_still_gets_an_entry() {
        let service = Service::new("identity").unwrap();
        let mut baseline = ConfigMapSet::new();
        baseline.insert("identity-backend-cm".into(), data(&[("PORT", "80")]));
        let local = baseline.clone();

        let merged = merge_service(&service, &baseline, &local).unwrap();
        assert!(merged.overrides["backend"].is_empty());
    }

    #[test]
    fn test_merge_service_rejects_bad_name() {
        let service = Service::new("identity").unwrap();
        let mut local = ConfigMapSet::new();
        local.insert("other-backend-cm".into(), data(&[("A", "1")]));
        let err = merge_service(&service, &ConfigMapSet::new(), &local).unwrap_err();
        assert!(matches!(err, NamingError::MissingPrefix { .. }));
    }
}
