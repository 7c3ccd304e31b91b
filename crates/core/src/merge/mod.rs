//! Baseline-vs-local merging of ConfigMaps.
//!
//! 1. **Naming** -- mapping `<service>-<name>-cm` identifiers to short names.
//! 2. **Merging** -- reducing each ConfigMap to the keys that differ from the
//!    committed baseline.

pub mod merger;
pub mod naming;

pub use merger::{
    classify_key, merge_config_map, merge_service, passthrough_config_map, ConfigMapSummary,
    KeyChange, MergeStats, MergedConfigMap, ServiceMerge,
    total_stats,
};
pub use naming::short_name;
