//! `rigger apply`: run a document of configuration operations.

use std::path::Path;

use serde_json::json;
use tracing::{info, instrument};

use rigger_adapters::{FileConfigWriter, LocalFilesystem};
use rigger_core::{application::ConfigService, domain::ConfigOperation};

use crate::{
    cli::{ApplyArgs, OutputFormat},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Decode the operations file and apply it under the project root.
#[instrument(skip_all, fields(ops = %args.operations.display(), project = %args.project.display()))]
pub fn execute(args: ApplyArgs, output: OutputManager) -> CliResult<()> {
    if !args.project.is_dir() {
        return Err(CliError::DirectoryNotFound { path: args.project });
    }

    let operations = read_operations(&args.operations)?;

    if args.dry_run {
        return show_operations(&operations, &args.project, &output);
    }

    let service = ConfigService::new(Box::new(FileConfigWriter::new(LocalFilesystem::new())));
    let applied = service
        .apply(&args.project, &operations)
        .with_cli_context(|| "applying operations")?;

    info!(applied, "Operations applied");

    if output.format() == OutputFormat::Json {
        output.json(&json!({ "applied": applied }))?;
    } else {
        output.success(&format!(
            "Applied {applied} operation(s) in {}",
            args.project.display()
        ))?;
    }
    Ok(())
}

fn read_operations(path: &Path) -> CliResult<Vec<ConfigOperation>> {
    let document = std::fs::read_to_string(path)
        .with_cli_context(|| format!("Failed to read operations file '{}'", path.display()))?;
    Ok(ConfigService::decode(&document)?)
}

fn show_operations(
    operations: &[ConfigOperation],
    project: &Path,
    out: &OutputManager,
) -> CliResult<()> {
    if out.format() == OutputFormat::Json {
        out.json(&json!({ "dry_run": true, "operations": operations }))?;
        return Ok(());
    }

    out.info(&format!(
        "Dry run: {} operation(s) in {}",
        operations.len(),
        project.display()
    ))?;
    for operation in operations {
        out.print(&format!("  {operation}"))?;
    }
    Ok(())
}
