//! Markdown export implementation.
//!
//! Exports the metrics record in Markdown format for documentation and reporting.

use super::{ExportData, Exporter};
use std::io::{self, Write};

/// Markdown exporter implementation.
pub struct MarkdownExporter;

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

impl Exporter for MarkdownExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let metrics = &data.metrics;

        // Title
        writeln!(writer, "# Architecture Report")?;
        writeln!(writer)?;
        writeln!(writer, "**Project:** {}", data.project_name)?;
        writeln!(writer)?;

        // Summary section
        writeln!(writer, "## Summary")?;
        writeln!(writer)?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(writer, "| Files Scanned | {} |", data.files_scanned)?;
        writeln!(writer, "| Modules | {} |", metrics.module_count)?;
        writeln!(writer, "| Internal Edges | {} |", metrics.edge_count)?;
        writeln!(writer, "| External Imports | {} |", metrics.external_import_count)?;
        writeln!(
            writer,
            "| Directory Depth (avg / max) | {:.2} / {} |",
            metrics.depth.average, metrics.depth.max
        )?;
        writeln!(
            writer,
            "| Fanout (avg / max) | {:.2} / {} ({}) |",
            metrics.fanout.average,
            metrics.fanout.max,
            or_dash(metrics.fanout.max_module.as_deref())
        )?;
        writeln!(
            writer,
            "| Import Complexity (avg / max) | {:.2} / {} ({}) |",
            metrics.import_complexity.average,
            metrics.import_complexity.max,
            or_dash(metrics.import_complexity.max_import.as_deref())
        )?;
        writeln!(
            writer,
            "| Efferent Coupling (avg) | {:.2} |",
            metrics.coupling.average_efferent
        )?;
        writeln!(
            writer,
            "| Afferent Coupling (max) | {} ({}) |",
            metrics.coupling.max_afferent,
            or_dash(metrics.coupling.max_afferent_module.as_deref())
        )?;
        writeln!(writer, "| Circular Dependencies | {} |", metrics.cycles.len())?;
        writeln!(writer, "| Dead Exports | {} |", metrics.dead_exports.len())?;
        writeln!(writer)?;

        // Circular dependencies
        writeln!(writer, "## Circular Dependencies")?;
        writeln!(writer)?;
        if metrics.cycles.is_empty() {
            writeln!(writer, "No circular dependencies detected.")?;
        } else {
            writeln!(writer, "The following circular dependencies were detected:")?;
            writeln!(writer)?;
            for (i, cycle) in metrics.cycles.iter().enumerate() {
                writeln!(writer, "{}. `{}`", i + 1, cycle.cycle_path())?;
            }
        }
        writeln!(writer)?;

        // Dead exports
        if !metrics.dead_exports.is_empty() {
            writeln!(writer, "## Dead Exports ({})", metrics.dead_exports.len())?;
            writeln!(writer)?;
            writeln!(writer, "| Module | Symbol | Kind | Line |")?;
            writeln!(writer, "|--------|--------|------|------|")?;
            for dead in &metrics.dead_exports {
                writeln!(
                    writer,
                    "| {} | `{}` | {} | {} |",
                    dead.module, dead.name, dead.kind, dead.line
                )?;
            }
            writeln!(writer)?;
        }

        if !metrics.unreachable_modules.is_empty() {
            writeln!(
                writer,
                "## Unreachable Modules ({})",
                metrics.unreachable_modules.len()
            )?;
            writeln!(writer)?;
            for module in &metrics.unreachable_modules {
                writeln!(writer, "- {}", module)?;
            }
            writeln!(writer)?;
        }

        if !metrics.warnings.is_empty() {
            writeln!(writer, "## Warnings")?;
            writeln!(writer)?;
            for warning in &metrics.warnings {
                writeln!(writer, "- `{}`: {}", warning.path, warning.message)?;
            }
            writeln!(writer)?;
        }

        // Footer
        writeln!(writer, "---")?;
        writeln!(writer, "*Generated by archnav*")?;

        Ok(())
    }
}
