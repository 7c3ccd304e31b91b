//! cmoverride command-line tool.
//!
//! Compares each service's ConfigMap manifest in the working copy with the
//! version committed at HEAD and writes the differences to a single override
//! file. Also provides a read-only `diff` view and a `check` of the checkout
//! layout.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

use cmoverride_core::config::{ConfigFile, ReconcileConfig};
use cmoverride_core::git::BaselineSource;
use cmoverride_core::manifest::ManifestLoader;
use cmoverride_core::merge::{short_name, KeyChange};
use cmoverride_core::output::{to_yaml_string, write_override_file};
use cmoverride_core::{ReconcileReport, Reconciler, Service};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Reconcile locally edited ConfigMap manifests into an override file.
#[derive(Parser, Debug)]
#[command(
    name = "cmoverride",
    version,
    about = "Record local ConfigMap edits as overrides on top of the committed manifests"
)]
struct Cli {
    /// Root of the manifests checkout (defaults to $MANIFESTS_PATH or ~/audius-k8s-manifests).
    #[arg(long, global = true)]
    manifests_path: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Service to reconcile; repeat to list several (defaults to all known services).
    #[arg(short, long = "service", global = true)]
    services: Vec<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the override file (default).
    Generate {
        /// Output path, relative to the current directory (defaults to <root>/config.yaml).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the overrides to stdout instead of writing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which keys differ from the committed manifests.
    Diff,

    /// Check that every service's manifest is present and well-formed.
    Check,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    init_logging(&config, cli.verbose);
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Generate {
        output: None,
        dry_run: false,
    }) {
        Commands::Generate { output, dry_run } => cmd_generate(config, output, dry_run),
        Commands::Diff => cmd_diff(config),
        Commands::Check => cmd_check(config),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn resolve_config(cli: &Cli) -> Result<ReconcileConfig> {
    let mut config = ReconcileConfig::from_env().context("failed to resolve manifests root")?;

    if let Some(path) = &cli.config {
        let file = ConfigFile::load_from_file(path).context("failed to load configuration file")?;
        config.apply_file(file);
    }
    if let Some(root) = &cli.manifests_path {
        config.manifests_path = root.clone();
    }
    if !cli.services.is_empty() {
        config.services = cli
            .services
            .iter()
            .map(|name| Service::new(name.as_str()))
            .collect::<Result<_, _>>()
            .context("invalid --service")?;
    }
    Ok(config)
}

fn init_logging(config: &ReconcileConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

/// An `--output` flag names a path the way the shell sees it, so relative
/// paths are taken from `cwd` rather than from the manifests root.
fn output_from_flag(path: PathBuf, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn cmd_generate(mut config: ReconcileConfig, output: Option<PathBuf>, dry_run: bool) -> Result<()> {
    if let Some(path) = output {
        let cwd = std::env::current_dir().context("failed to read the current directory")?;
        config.output_file = Some(output_from_flag(path, &cwd));
    }
    let output_path = config.output_path();
    let reconciler = Reconciler::with_git(config);
    let report = reconciler.run().context("reconcile failed")?;

    if dry_run {
        let yaml = to_yaml_string(&report.overrides).context("failed to render overrides")?;
        print!("{yaml}");
        return Ok(());
    }

    write_override_file(&output_path, &report.overrides)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    for summary in &report.summaries {
        let totals = summary.totals();
        println!(
            "{}",
            style::success(&format!(
                "{:<20} {} override(s) across {} ConfigMap(s)",
                summary.service,
                totals.emitted(),
                summary.config_maps.len()
            ))
        );
    }
    println!();
    println!("Overrides written to {}", output_path.display());
    Ok(())
}

fn cmd_diff(config: ReconcileConfig) -> Result<()> {
    let report = Reconciler::with_git(config)
        .run()
        .context("reconcile failed")?;
    print_diff(&report);
    Ok(())
}

/// One key of the `diff` table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DiffRow {
    service: String,
    config_map: String,
    key: String,
    change: KeyChange,
    /// What the override file will carry for the key (`""` for a tombstone).
    value: String,
}

fn diff_rows(report: &ReconcileReport) -> Vec<DiffRow> {
    let mut rows = Vec::new();
    for summary in &report.summaries {
        let Some(overrides) = report.overrides.service(summary.service.as_str()) else {
            continue;
        };
        for cm in &summary.config_maps {
            let config_map = if cm.is_new {
                format!("{} (new)", cm.short_name)
            } else {
                cm.short_name.clone()
            };
            for (key, change) in &cm.changes {
                let value = overrides
                    .get(&cm.short_name)
                    .and_then(|o| o.get(key))
                    .map(|v| v.as_output_str().to_string())
                    .unwrap_or_default();
                rows.push(DiffRow {
                    service: summary.service.to_string(),
                    config_map: config_map.clone(),
                    key: key.clone(),
                    change: *change,
                    value,
                });
            }
        }
    }
    rows
}

fn print_diff(report: &ReconcileReport) {
    let rows = diff_rows(report);
    if rows.is_empty() {
        println!("{}", style::success("No differences from the committed manifests"));
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Service", "ConfigMap", "Key", "Change", "Override"]);
    for row in &rows {
        let change = match row.change {
            KeyChange::Added => style::added("added"),
            KeyChange::Removed => style::removed("removed"),
            KeyChange::Changed => style::changed("changed"),
            KeyChange::Unchanged => style::dim("unchanged"),
        };
        table.add_row(vec![
            Cell::new(&row.service),
            Cell::new(&row.config_map),
            Cell::new(&row.key),
            Cell::new(change),
            Cell::new(&row.value),
        ]);
    }

    println!("{}", style::header(&format!("Overrides ({})", rows.len())));
    println!();
    println!("{table}");
}

/// Load both sides of `service` and validate every local ConfigMap name.
/// Returns the number of local ConfigMaps.
fn check_service<B: BaselineSource>(loader: &ManifestLoader<B>, service: &Service) -> Result<usize> {
    let maps = loader.load(service)?;
    for name in maps.local.keys() {
        short_name(service, name)?;
    }
    Ok(maps.local.len())
}

fn cmd_check(config: ReconcileConfig) -> Result<()> {
    println!("{}", style::header("Manifest check"));
    println!("{}", style::dim(&config.manifests_path.display().to_string()));
    println!();

    let reconciler = Reconciler::with_git(config);
    let mut failures = 0;

    for service in &reconciler.config().services {
        match check_service(reconciler.loader(), service) {
            Ok(count) => println!(
                "  {}",
                style::success(&format!("{:<20} {} ConfigMap(s)", service, count))
            ),
            Err(e) => {
                failures += 1;
                println!("  {}", style::error(&format!("{:<20} {:#}", service, e)));
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{failures} service(s) failed the check");
    }
    println!("All manifests are ready to reconcile.");
    Ok(())
}
