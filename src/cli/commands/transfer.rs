use std::path::{Path, PathBuf};

use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::core::services::{FilterBounds, FilterService};
use crate::spreadsheet::{export_to_path, import_file, ExportFormat, ExportOutcome};
use crate::storage::DebtorStore;

use super::args::{ParsedArgs, FILTER_FLAGS};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "import",
            "Import debtors from a CSV, XLSX, XLS or ODS file",
            "import FILE",
            cmd_import,
        ),
        CommandEntry::new(
            "export",
            "Export debtors (optionally filtered) to CSV or XLSX",
            "export FILE [--format xlsx|csv] [list filter flags]",
            cmd_export,
        ),
    ]
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let path = PathBuf::from(parsed.positional(0, "file")?);
    let summary = import_file(&context.store, &path)?;
    io::print_success(summary.message());
    for sample in &summary.samples {
        io::print_warning(format!("line {}: {}", sample.line, sample.reason));
    }
    if summary.skipped > summary.samples.len() {
        io::print_info(format!(
            "... and {} more skipped row(s).",
            summary.skipped - summary.samples.len()
        ));
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut value_flags = FILTER_FLAGS.to_vec();
    value_flags.push("--format");
    let parsed = ParsedArgs::parse(args, &value_flags, &[])?;
    let raw_path = parsed.positional(0, "file")?;
    let format = match parsed.parsed::<ExportFormat>("--format")? {
        Some(format) => format,
        None => ExportFormat::from_path(Path::new(raw_path)).unwrap_or(context.config.export_format),
    };
    let path = resolve_target(raw_path, format, context.config.last_export_dir.as_deref());

    let debtors = context.store.get_all()?;
    let criteria = parsed.filter_criteria(&FilterBounds::observe(&debtors))?;
    let selection = FilterService::apply(&debtors, &criteria);
    let outcome = export_to_path(&selection, &path, format)?;
    match &outcome {
        ExportOutcome::Empty => io::print_warning(outcome.message()),
        ExportOutcome::Written { path, .. } => {
            io::print_success(outcome.message());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if context.config.last_export_dir.as_deref() != Some(parent) {
                    context.config.last_export_dir = Some(parent.to_path_buf());
                    context.persist_config()?;
                }
            }
        }
    }
    Ok(())
}

/// Relative names land in the last export directory; a missing extension is added.
fn resolve_target(raw: &str, format: ExportFormat, last_dir: Option<&Path>) -> PathBuf {
    let mut path = PathBuf::from(raw);
    if path.extension().is_none() {
        path.set_extension(format.extension());
    }
    match last_dir {
        Some(dir) if path.is_relative() && path.parent() == Some(Path::new("")) => dir.join(path),
        _ => path,
    }
}
