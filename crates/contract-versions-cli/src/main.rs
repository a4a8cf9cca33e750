//! Contract Versions CLI
//!
//! The `contract-versions` command rebuilds historical contract releases and
//! stores their metadata and typed bindings in per-version directories.
//!
//! ## Commands
//!
//! - `snapshot`: Build every manifest version into the output root
//! - `list`: Show the version manifest and advisory warnings
//! - `bindings`: Generate bindings for a single artifact directory

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use contract_versions_core::{
    generate_bindings, init_tracing, CheckoutFailurePolicy, GateVerdict, RunMode, RunReport,
    SnapshotConfig, SnapshotGate, SnapshotRunner, StepOutcome, TypechainGenerator, VersionManifest,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "contract-versions")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Snapshot historical contract builds with typed bindings", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every version in the manifest into its own output directory
    Snapshot(SnapshotArgs),

    /// List manifest versions and lint warnings
    List(ConfigArgs),

    /// Generate typed bindings for one artifact directory
    Bindings {
        /// Directory containing compiled artifact JSON files
        #[arg(long)]
        src: PathBuf,

        /// Output directory for generated bindings
        #[arg(long)]
        dest: PathBuf,

        /// Binding generator executable
        #[arg(long, default_value = "typechain")]
        program: String,

        /// Generator target
        #[arg(long, default_value = "ethers-v5")]
        target: String,

        /// Timeout in seconds (0 = none)
        #[arg(long, default_value = "0")]
        timeout_secs: u64,
    },
}

/// Options shared by every command that reads the snapshot config.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// TOML config file
    #[arg(short, long, env = "CONTRACT_VERSIONS_CONFIG")]
    config: Option<PathBuf>,

    /// Monorepo root (relative paths below are resolved against it)
    #[arg(long, env = "CONTRACT_VERSIONS_REPO_ROOT")]
    repo_root: Option<PathBuf>,

    /// Contracts package directory (git + build run here)
    #[arg(long, env = "CONTRACT_VERSIONS_CONTRACTS_DIR")]
    contracts_dir: Option<PathBuf>,

    /// Version manifest JSON
    #[arg(short, long, env = "CONTRACT_VERSIONS_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Output root for version directories
    #[arg(short, long, env = "CONTRACT_VERSIONS_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct SnapshotArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Exit non-zero if any step fails
    #[arg(long)]
    strict: bool,

    /// Skip copy and generation for versions whose checkout failed
    #[arg(long)]
    skip_on_checkout_failure: bool,

    /// Timeout for each external command in seconds (0 = none)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Only snapshot these versions (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Snapshot(args) => cmd_snapshot(&args).await,
        Commands::List(args) => cmd_list(&args),
        Commands::Bindings {
            src,
            dest,
            program,
            target,
            timeout_secs,
        } => cmd_bindings(&src, &dest, &program, &target, timeout_secs).await,
    }
}

/// Defaults, then the config file, then flags and env vars.
fn resolve_config(args: &ConfigArgs) -> Result<SnapshotConfig> {
    let mut config = match &args.config {
        Some(path) => SnapshotConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SnapshotConfig::default(),
    };

    if let Some(repo_root) = &args.repo_root {
        config.repo_root = repo_root.clone();
    }
    if let Some(contracts_dir) = &args.contracts_dir {
        config.contracts_dir = contracts_dir.clone();
    }
    if let Some(manifest) = &args.manifest {
        config.manifest = manifest.clone();
    }
    if let Some(output_root) = &args.output_root {
        config.output_root = output_root.clone();
    }

    Ok(config.anchored())
}

fn resolve_snapshot_config(args: &SnapshotArgs) -> Result<SnapshotConfig> {
    let mut config = resolve_config(&args.config)?;

    if args.strict {
        config.mode = RunMode::Strict;
    }
    if args.skip_on_checkout_failure {
        config.on_checkout_failure = CheckoutFailurePolicy::SkipVersion;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    config.validate()?;
    Ok(config)
}

async fn cmd_snapshot(args: &SnapshotArgs) -> Result<()> {
    let config = resolve_snapshot_config(args)?;

    let manifest = VersionManifest::load(&config.manifest)
        .with_context(|| format!("Failed to load manifest {}", config.manifest.display()))?;
    let versions = if args.only.is_empty() {
        manifest.versions.clone()
    } else {
        manifest.select(&args.only)?
    };

    info!(
        manifest = %config.manifest.display(),
        output_root = %config.output_root.display(),
        versions = versions.len(),
        mode = ?config.mode,
        "Snapshotting contract versions"
    );

    let strict = config.is_strict();
    let runner = SnapshotRunner::from_config(config);
    let report = runner
        .run(&versions)
        .await
        .context("Snapshot run aborted")?;

    print_report(&report);

    if let Some(path) = &args.report {
        write_report(&report, path)?;
        println!("Report written to {}", path.display());
    }

    let verdict = SnapshotGate::evaluate(&report);
    println!("Gate: {}", if verdict.passed { "✓ PASSED" } else { "✗ FAILED" });
    if !verdict.violations.is_empty() {
        println!("Violations:");
        for violation in &verdict.violations {
            println!("  - {}", violation);
        }
    }

    gate_exit(&verdict, strict)
}

/// Strict mode turns a failed gate into an error; lenient mode only warns.
fn gate_exit(verdict: &GateVerdict, strict: bool) -> Result<()> {
    if verdict.passed {
        Ok(())
    } else if strict {
        anyhow::bail!("{}", verdict.message)
    } else {
        warn!("{} (lenient mode, exiting successfully)", verdict.message);
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    println!("Run ID: {}", report.run_id);
    println!("Original revision: {}", report.original_revision);
    println!("Duration: {}ms", report.duration_ms);
    println!();

    for version in &report.versions {
        let status = if version.succeeded() { "✓" } else { "✗" };
        println!("  {} {} ({})", status, version.name, version.commit);
        for record in &version.steps {
            let detail = match &record.outcome {
                StepOutcome::Succeeded => "ok".to_string(),
                StepOutcome::Failed { reason } => format!("failed: {reason}"),
                StepOutcome::Skipped { reason } => format!("skipped: {reason}"),
            };
            println!(
                "      {:<18} {:>6}ms  {}",
                record.step.name(),
                record.duration_ms,
                detail
            );
        }
    }

    if let Some(err) = &report.restore_error {
        println!();
        println!("✗ Failed to restore {}: {}", report.original_revision, err);
    }

    println!();
    println!(
        "Summary: {}/{} versions clean",
        report.versions.len() - report.failed_versions().len(),
        report.versions.len()
    );
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}

fn cmd_list(args: &ConfigArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let manifest = VersionManifest::load(&config.manifest)
        .with_context(|| format!("Failed to load manifest {}", config.manifest.display()))?;

    println!("Manifest: {}", config.manifest.display());
    for version in &manifest.versions {
        println!(
            "  {:<12} {}  -> {}",
            version.name,
            version.commit,
            config.version_dir(&version.name).display()
        );
    }
    println!("{} version(s)", manifest.len());

    for warning in manifest.lint() {
        warn!("{}", warning);
    }
    Ok(())
}

async fn cmd_bindings(
    src: &Path,
    dest: &Path,
    program: &str,
    target: &str,
    timeout_secs: u64,
) -> Result<()> {
    let generator = TypechainGenerator::new(program, target).with_timeout(timeout_secs);
    let count = generate_bindings(&generator, src, dest)
        .await
        .with_context(|| format!("Failed to generate bindings from {}", src.display()))?;
    println!("Generated bindings for {} artifact(s) into {}", count, dest.display());
    Ok(())
}
