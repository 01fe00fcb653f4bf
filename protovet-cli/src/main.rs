mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use clap::{Parser, Subcommand};
use fs_err as fs;
use protovet_manifest::{ManifestDoc, extract_issues, reset_verification};
use protovet_render::{render_issues, render_sync, render_verify};
use protovet_scan::{ScanOptions, build_index};
use protovet_schema::{AcquireOptions, acquire_spec, extract_facts, load_schema};
use protovet_sync::{SyncContext, sync_manifest};
use protovet_types::issue::VerificationStatus;
use protovet_types::report::{ReportEnvelope, RunInfo, ToolInfo, VerifyOutcome};
use protovet_verify::{VerifyContext, verify};
use std::collections::BTreeSet;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "protovet",
    version,
    about = "Three-way protocol coverage verification: schema vs manifest vs implementation."
)]
struct Cli {
    /// Repository root of the SDK under verification.
    #[arg(long, default_value = ".", global = true)]
    repo_root: Utf8PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile schema, manifest, and implementation; exit 1 on any gap.
    Verify(VerifyArgs),
    /// Extend the manifest with facts the schema gained (additive only).
    Sync(SyncArgs),
    /// Reset every verification block to pending with empty notes.
    Reset(ResetArgs),
    /// List noteworthy verification entries from the manifest.
    Issues(IssuesArgs),
}

#[derive(Debug, Parser)]
struct VerifyArgs {
    /// Use the cached spec copy instead of cloning fresh.
    #[arg(long, default_value_t = false)]
    skip_clone: bool,

    /// Also write the structured coverage report to this path.
    #[arg(long)]
    json: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct SyncArgs {
    /// Show what would be changed without modifying the manifest.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct ResetArgs {
    /// Show what would be changed without modifying the manifest.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Skip running verification after the reset.
    #[arg(long, default_value_t = false)]
    skip_verify: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StatusArg {
    Fixed,
    Info,
    Warning,
    Critical,
    All,
}

#[derive(Debug, Parser)]
struct IssuesArgs {
    /// Filter by status (default: warning and critical).
    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    /// Filter by module id.
    #[arg(long)]
    module: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let repo_root = cli.repo_root.clone();
    let result = match cli.cmd {
        Command::Verify(args) => cmd_verify(&repo_root, args),
        Command::Sync(args) => cmd_sync(&repo_root, args),
        Command::Reset(args) => cmd_reset(&repo_root, args),
        Command::Issues(args) => cmd_issues(&repo_root, args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn scan_options(config: &config::ProtovetConfig, repo_root: &Utf8Path) -> ScanOptions {
    ScanOptions {
        ast_command: config.scan.ast_command.clone(),
        ast_workdir: config
            .scan
            .ast_workdir
            .as_deref()
            .map(|dir| config::resolve(repo_root, dir)),
        timeout: Duration::from_secs(config.scan.timeout_secs),
    }
}

/// Run the whole reconciliation pipeline: config, manifest, spec, facts,
/// index, verify.
fn run_verification(repo_root: &Utf8Path, skip_clone: bool) -> anyhow::Result<VerifyOutcome> {
    let config = config::load_or_default(repo_root)?;

    let manifest_path = config::resolve(repo_root, &config.paths.manifest);
    let manifest = ManifestDoc::load(&manifest_path)?;

    let version = config
        .spec
        .version
        .clone()
        .unwrap_or_else(|| manifest.target_protocol_version().to_string());

    let spec_root = acquire_spec(&AcquireOptions {
        repo_url: config.spec.repo_url.clone(),
        cache_dir: config::spec_cache_dir(&config.spec, repo_root),
        local_root: config
            .spec
            .local_root
            .as_deref()
            .map(|p| config::resolve(repo_root, p)),
        skip_clone,
    })?;
    let schema = load_schema(&spec_root, &version)?;
    let facts = extract_facts(&schema, &spec_root, &version);
    debug!(
        types = facts.types.len(),
        methods = facts.methods.len(),
        notifications = facts.notifications.len(),
        "extracted schema facts"
    );

    let sources = config::resolve(repo_root, &config.paths.sources);
    let index = build_index(repo_root, &sources, &scan_options(&config, repo_root));

    let ctx = VerifyContext {
        repo_root,
        sources_dir: &sources,
        client_source: &config::resolve(repo_root, &config.paths.client_source),
        server_source: &config::resolve(repo_root, &config.paths.server_source),
        error_source: &config::resolve(repo_root, &config.paths.error_source),
        facts: &facts,
        manifest: &manifest,
        index: &index,
    };
    Ok(verify(&ctx))
}

fn cmd_verify(repo_root: &Utf8Path, args: VerifyArgs) -> anyhow::Result<ExitCode> {
    let started_at = Utc::now();
    let outcome = run_verification(repo_root, args.skip_clone)?;
    print!("{}", render_verify(&outcome));

    if let Some(path) = &args.json {
        let report = ReportEnvelope {
            schema: protovet_types::schema::PROTOVET_REPORT_V1.to_string(),
            tool: tool_info(),
            run: RunInfo {
                started_at: Some(started_at),
                ended_at: Some(Utc::now()),
            },
            summary: outcome.summary(),
            outcome: outcome.clone(),
        };
        write_json(path, &report)?;
        info!("wrote report to {path}");
    }

    Ok(exit_code(outcome.passed()))
}

fn cmd_sync(repo_root: &Utf8Path, args: SyncArgs) -> anyhow::Result<ExitCode> {
    let config = config::load_or_default(repo_root)?;

    let manifest_path = config::resolve(repo_root, &config.paths.manifest);
    let mut manifest = ManifestDoc::load(&manifest_path)?;

    let version = config
        .spec
        .version
        .clone()
        .unwrap_or_else(|| manifest.target_protocol_version().to_string());

    // Sync prefers an existing checkout or cache; it only clones when
    // neither exists.
    let spec_root = acquire_spec(&AcquireOptions {
        repo_url: config.spec.repo_url.clone(),
        cache_dir: config::spec_cache_dir(&config.spec, repo_root),
        local_root: config
            .spec
            .local_root
            .as_deref()
            .map(|p| config::resolve(repo_root, p)),
        skip_clone: true,
    })?;
    let schema = load_schema(&spec_root, &version)?;
    let facts = extract_facts(&schema, &spec_root, &version);

    let sources = config::resolve(repo_root, &config.paths.sources);
    let index = build_index(repo_root, &sources, &scan_options(&config, repo_root));
    println!("Indexed {} implementation symbols\n", index.len());

    let outcome = sync_manifest(&mut manifest, &SyncContext {
        facts: &facts,
        index: &index,
    })?;

    print!("{}", render_sync(&outcome, args.dry_run));

    if !args.dry_run && outcome.total() > 0 {
        manifest.save()?;
        info!("wrote manifest to {manifest_path}");
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_reset(repo_root: &Utf8Path, args: ResetArgs) -> anyhow::Result<ExitCode> {
    let config = config::load_or_default(repo_root)?;

    let manifest_path = config::resolve(repo_root, &config.paths.manifest);
    let mut manifest = ManifestDoc::load(&manifest_path)?;

    let items = reset_verification(&mut manifest, args.dry_run);

    if args.dry_run {
        println!("Dry run - showing changes:\n");
        for item in &items {
            match &item.previous_status {
                Some(status) => println!("  {}: {status} -> pending", item.location),
                None => println!("  {}: clearing notes", item.location),
            }
        }
        if items.is_empty() {
            println!("No changes needed.");
        } else {
            println!("\nWould reset {} items.", items.len());
        }
        return Ok(ExitCode::SUCCESS);
    }

    manifest.save()?;
    println!("Reset {} items.", items.len());

    if args.skip_verify {
        return Ok(ExitCode::SUCCESS);
    }

    println!("\nRunning protocol coverage verification...");
    let outcome = run_verification(repo_root, true)?;
    print!("{}", render_verify(&outcome));
    if !outcome.passed() {
        println!("\n⚠ Verification failed - manifest may have issues from a previous pass");
        return Ok(ExitCode::from(1));
    }
    println!("\n✓ Verification passed");
    Ok(ExitCode::SUCCESS)
}

fn cmd_issues(repo_root: &Utf8Path, args: IssuesArgs) -> anyhow::Result<ExitCode> {
    let config = config::load_or_default(repo_root)?;

    let manifest_path = config::resolve(repo_root, &config.paths.manifest);
    let manifest = ManifestDoc::load(&manifest_path)?;

    let show: BTreeSet<VerificationStatus> = match args.status {
        None => BTreeSet::from([VerificationStatus::Warning, VerificationStatus::Critical]),
        Some(StatusArg::All) => BTreeSet::from([
            VerificationStatus::Fixed,
            VerificationStatus::Info,
            VerificationStatus::Warning,
            VerificationStatus::Critical,
        ]),
        Some(StatusArg::Fixed) => BTreeSet::from([VerificationStatus::Fixed]),
        Some(StatusArg::Info) => BTreeSet::from([VerificationStatus::Info]),
        Some(StatusArg::Warning) => BTreeSet::from([VerificationStatus::Warning]),
        Some(StatusArg::Critical) => BTreeSet::from([VerificationStatus::Critical]),
    };

    let mut issues = extract_issues(&manifest);
    if let Some(module) = &args.module {
        issues.retain(|i| &i.module_id == module);
    }
    issues.retain(|i| show.contains(&i.status));

    print!("{}", render_issues(&issues));
    Ok(ExitCode::SUCCESS)
}

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {path}"))?;
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "protovet".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
