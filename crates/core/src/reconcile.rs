//! Drives load → merge → aggregate over the configured services.

use tracing::{info, instrument};

use crate::config::ReconcileConfig;
use crate::errors::CoreError;
use crate::git::{BaselineSource, GitBaselineSource};
use crate::manifest::ManifestLoader;
use crate::merge::{merge_service, total_stats, ConfigMapSummary, MergeStats};
use crate::models::{OverrideSet, Service};
use crate::output::write_override_file;

/// What was merged for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub service: Service,
    pub config_maps: Vec<ConfigMapSummary>,
}

impl ServiceSummary {
    pub fn totals(&self) -> MergeStats {
        total_stats(&self.config_maps)
    }
}

/// Outcome of a complete run, before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub overrides: OverrideSet,
    pub summaries: Vec<ServiceSummary>,
}

/// Runs the reconcile for every configured service, one after another.
pub struct Reconciler<B> {
    config: ReconcileConfig,
    loader: ManifestLoader<B>,
}

impl Reconciler<GitBaselineSource> {
    /// Reconciler reading baselines from the repository at the manifests root.
    pub fn with_git(config: ReconcileConfig) -> Self {
        Self::new(config, GitBaselineSource::new())
    }
}

impl<B: BaselineSource> Reconciler<B> {
    pub fn new(config: ReconcileConfig, baseline: B) -> Self {
        let loader = ManifestLoader::new(config.manifests_path.clone(), baseline);
        Self { config, loader }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn loader(&self) -> &ManifestLoader<B> {
        &self.loader
    }

    /// Build the override set. The first failure aborts the whole run.
    #[instrument(skip(self), fields(root = %self.config.manifests_path.display()))]
    pub fn run(&self) -> Result<ReconcileReport, CoreError> {
        let mut report = ReconcileReport::default();

        for service in &self.config.services {
            let maps = self.loader.load(service)?;
            let merged = merge_service(service, &maps.baseline, &maps.local)?;
            report.overrides.insert_service(service, merged.overrides);
            report.summaries.push(ServiceSummary {
                service: service.clone(),
                config_maps: merged.config_maps,
            });
        }

        info!(services = report.summaries.len(), "reconcile complete");
        Ok(report)
    }

    /// [`run`](Self::run), then write the result to the configured output path.
    pub fn run_and_write(&self) -> Result<ReconcileReport, CoreError> {
        let report = self.run()?;
        write_override_file(&self.config.output_path(), &report.overrides)?;
        Ok(report)
    }
}
