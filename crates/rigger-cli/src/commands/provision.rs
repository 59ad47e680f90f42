//! Implementation of the `rigger provision` command.
//!
//! Responsibility: turn flags and an optional plan file into service records,
//! run the core provisioning pipeline, and display results. No provisioning
//! logic lives here.

use std::collections::BTreeMap;
use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use rigger_adapters::{
    BuiltinManifestRenderer, FileConfigWriter, LocalFilesystem, SystemProcessRunner,
    ThreadSleeper,
};
use rigger_core::{
    application::{
        ConfigService, InfrastructurePlan, PipelineReport, ProvisioningPipeline,
        ProvisioningService, ServiceSummary,
    },
    domain::{
        CacheConfig, DatabaseConfig, FieldMap, QueueConfig, RelativePath, SearchConfig,
        ServiceConfig, StorageConfig,
    },
};

use crate::{
    cli::{GlobalArgs, OutputFormat, ProvisionArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

const KINDS: [&str; 5] = ["database", "cache", "queue", "search", "storage"];

/// Field maps keyed by backend kind.
type PlanMaps = BTreeMap<String, FieldMap>;

/// Execute the `rigger provision` command.
///
/// Dispatch sequence:
/// 1. Check the application directory exists
/// 2. Build the plan (plan file, then flags, then container default)
/// 3. Show the plan; stop there on `--dry-run`
/// 4. Confirm before starting containers unless `--yes`
/// 5. Run the pipeline behind a spinner
/// 6. Print each resolved endpoint
#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn execute(
    args: ProvisionArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    if !args.dir.is_dir() {
        return Err(CliError::DirectoryNotFound { path: args.dir });
    }

    let plan = build_plan(&args, &config)?;
    if plan.is_empty() {
        return Err(CliError::EmptyPlan);
    }
    let env_file = resolve_env_file(&args, &config)?;

    debug!(
        backends = plan.summaries().len(),
        env_file = env_file.as_ref().map(|f| f.to_string()).as_deref().unwrap_or("none"),
        "Plan resolved"
    );

    if args.dry_run {
        return show_dry_run(&plan, &args.dir, env_file.as_ref(), &output);
    }

    let starts_containers = plan.summaries().iter().any(|s| s.container);
    if starts_containers && needs_confirmation(&args, &global, &output) {
        show_plan(&plan, &args.dir, &output)?;
        if !confirm()? {
            return Err(CliError::Cancelled);
        }
    }

    let pipeline = build_pipeline(&config, args.stubs.as_deref(), env_file);

    info!(dir = %args.dir.display(), "Provisioning started");
    let spinner = output.spinner("Provisioning backends...");
    let result = pipeline.run(plan, &args.dir);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result.with_cli_context(|| "provisioning")?;

    show_report(&report, &output)
}

// ── Plan construction ─────────────────────────────────────────────────────────

/// Records per kind: plan file first, then flags, then the container default.
fn build_plan(args: &ProvisionArgs, config: &AppConfig) -> CliResult<InfrastructurePlan> {
    let mut maps = match &args.plan {
        Some(path) => read_plan_file(path)?,
        None => PlanMaps::new(),
    };

    let flags = [
        ("database", &args.database),
        ("cache", &args.cache),
        ("queue", &args.queue),
        ("search", &args.search),
        ("storage", &args.storage),
    ];
    for (kind, driver) in flags {
        if let Some(driver) = driver {
            maps.entry(kind.to_string())
                .or_default()
                .insert("driver".into(), driver.clone());
        }
    }

    for map in maps.values_mut() {
        if args.no_docker {
            map.insert("docker".into(), "false".into());
        } else if config.provisioning.use_containers {
            map.entry("docker".into()).or_insert_with(|| "true".into());
        }
    }

    Ok(InfrastructurePlan {
        database: record::<DatabaseConfig>(&maps, "database")?,
        cache: record::<CacheConfig>(&maps, "cache")?,
        queue: record::<QueueConfig>(&maps, "queue")?,
        search: record::<SearchConfig>(&maps, "search")?,
        storage: record::<StorageConfig>(&maps, "storage")?,
    })
}

fn record<C: ServiceConfig>(maps: &PlanMaps, kind: &str) -> CliResult<Option<C>> {
    maps.get(kind)
        .map(|map| C::from_mapping(map).map_err(|e| CliError::Core(e.into())))
        .transpose()
}

/// Read `{"<kind>": {"driver": ..., ...} | "<driver>"}`.
fn read_plan_file(path: &Path) -> CliResult<PlanMaps> {
    let text = std::fs::read_to_string(path)
        .with_cli_context(|| format!("Failed to read plan file '{}'", path.display()))?;

    let document: Map<String, Value> =
        serde_json::from_str(&text).map_err(|e| CliError::InvalidInput {
            message: format!("plan file '{}' is not a JSON object", path.display()),
            source: Some(Box::new(e)),
        })?;

    document
        .into_iter()
        .map(|(kind, value)| {
            if !KINDS.contains(&kind.as_str()) {
                return Err(invalid(format!(
                    "unknown backend kind '{kind}' (expected one of {})",
                    KINDS.join(", ")
                )));
            }
            let map = field_map_from_json(&kind, value)?;
            Ok((kind, map))
        })
        .collect()
}

fn field_map_from_json(kind: &str, value: Value) -> CliResult<FieldMap> {
    match value {
        Value::String(driver) => Ok(FieldMap::from([("driver".to_string(), driver)])),
        Value::Object(fields) => {
            let mut map = FieldMap::new();
            for (key, value) in fields {
                let text = match value {
                    Value::Null => continue,
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(invalid(format!(
                            "'{kind}.{key}' must be a string, number or boolean"
                        )));
                    }
                };
                map.insert(key, text);
            }
            Ok(map)
        }
        _ => Err(invalid(format!(
            "'{kind}' must be a driver name or an object of fields"
        ))),
    }
}

fn invalid(message: String) -> CliError {
    CliError::InvalidInput {
        message,
        source: None,
    }
}

/// `None` means the environment file is left alone.
fn resolve_env_file(args: &ProvisionArgs, config: &AppConfig) -> CliResult<Option<RelativePath>> {
    if args.no_env || !config.env.write {
        return Ok(None);
    }

    let file = args.env_file.as_deref().unwrap_or(&config.env.file);
    RelativePath::try_new(file)
        .map(Some)
        .map_err(|e| CliError::Core(e.into()))
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn build_pipeline(
    config: &AppConfig,
    stubs: Option<&Path>,
    env_file: Option<RelativePath>,
) -> ProvisioningPipeline {
    let stubs_dir: Option<PathBuf> = stubs
        .map(Path::to_path_buf)
        .or_else(|| config.provisioning.stubs_dir.clone());

    let renderer = match stubs_dir {
        Some(dir) => BuiltinManifestRenderer::new().with_stubs_dir(dir),
        None => BuiltinManifestRenderer::new(),
    };

    let provisioning = ProvisioningService::new(
        Box::new(SystemProcessRunner::new()),
        Box::new(LocalFilesystem::new()),
        Box::new(renderer),
        Box::new(ThreadSleeper::new()),
    )
    .with_settings(config.provision_settings());

    let writer = ConfigService::new(Box::new(FileConfigWriter::new(LocalFilesystem::new())));

    ProvisioningPipeline::new(provisioning, writer).with_env_file(env_file)
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn needs_confirmation(args: &ProvisionArgs, global: &GlobalArgs, output: &OutputManager) -> bool {
    !args.yes
        && !global.quiet
        && output.format() == OutputFormat::Human
        && std::io::stdin().is_terminal()
}

#[cfg(feature = "interactive")]
fn confirm() -> CliResult<bool> {
    dialoguer::Confirm::new()
        .with_prompt("Start these containers?")
        .default(true)
        .interact()
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation".into(),
            source: std::io::Error::other(e),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm() -> CliResult<bool> {
    Err(CliError::FeatureNotAvailable {
        feature: "interactive",
    })
}

fn summary_line(summary: &ServiceSummary) -> String {
    let mode = if summary.container {
        "container"
    } else {
        "local"
    };
    format!("{} ({mode}) {}", summary.driver, summary.endpoint)
}

fn show_plan(plan: &InfrastructurePlan, dir: &Path, out: &OutputManager) -> CliResult<()> {
    out.header("Backends")?;
    for summary in plan.summaries() {
        out.field(summary.kind.as_str(), &summary_line(&summary))?;
    }
    out.field("location", &dir.display().to_string())?;
    out.print("")?;
    Ok(())
}

fn show_dry_run(
    plan: &InfrastructurePlan,
    dir: &Path,
    env_file: Option<&RelativePath>,
    out: &OutputManager,
) -> CliResult<()> {
    let operations = env_file
        .map(|file| plan.env_operations(file))
        .unwrap_or_default();

    if out.format() == OutputFormat::Json {
        out.json(&json!({
            "dry_run": true,
            "backends": plan_json(plan),
            "operations": operations,
        }))?;
        return Ok(());
    }

    out.info(&format!("Dry run: would provision into {}", dir.display()))?;
    show_plan(plan, dir, out)?;
    for operation in &operations {
        out.print(&format!("  {operation}"))?;
    }
    Ok(())
}

fn show_report(report: &PipelineReport, out: &OutputManager) -> CliResult<()> {
    if out.format() == OutputFormat::Json {
        out.json(&json!({
            "backends": plan_json(&report.resolved),
            "operations": report.env_operations,
            "applied": report.applied,
        }))?;
        return Ok(());
    }

    for summary in report.resolved.summaries() {
        let line = format!("{}: {}", summary.kind, summary.endpoint);
        if summary.container {
            out.success(&format!("{line} (container, {})", summary.readiness))?;
        } else {
            out.success(&format!("{line} (local)"))?;
        }
    }

    if report.applied > 0 {
        out.info(&format!(
            "Wrote {} setting group(s) to the environment file",
            report.applied
        ))?;
    }
    Ok(())
}

fn plan_json(plan: &InfrastructurePlan) -> Value {
    fn entry<C: ServiceConfig>(out: &mut Map<String, Value>, kind: &str, config: Option<&C>) {
        if let Some(config) = config {
            out.insert(kind.to_string(), json!(config.to_mapping()));
        }
    }

    let mut out = Map::new();
    entry(&mut out, "database", plan.database.as_ref());
    entry(&mut out, "cache", plan.cache.as_ref());
    entry(&mut out, "queue", plan.queue.as_ref());
    entry(&mut out, "search", plan.search.as_ref());
    entry(&mut out, "storage", plan.storage.as_ref());
    Value::Object(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
