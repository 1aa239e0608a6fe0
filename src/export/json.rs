//! JSON export implementation.
//!
//! Exports the metrics record in JSON format for machine-readable output.

use super::{ExportData, Exporter};
use crate::analysis::{
    ComplexitySummary, CouplingSummary, DeadExport, DepthSummary, FanoutSummary, Warning,
};
use serde::Serialize;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Serializable cycle info for JSON output.
#[derive(Serialize)]
struct JsonCycle<'a> {
    modules: &'a [String],
    path: String,
}

/// Summary statistics for JSON output.
#[derive(Serialize)]
struct JsonSummary {
    files_scanned: usize,
    module_count: usize,
    edge_count: usize,
    external_import_count: usize,
    circular_dependencies: usize,
    dead_exports: usize,
}

/// Root JSON export structure.
#[derive(Serialize)]
struct JsonExport<'a> {
    project: &'a str,
    summary: JsonSummary,
    depth: &'a DepthSummary,
    fanout: &'a FanoutSummary,
    import_complexity: &'a ComplexitySummary,
    coupling: &'a CouplingSummary,
    cycles: Vec<JsonCycle<'a>>,
    dead_exports: &'a [DeadExport],
    unreachable_modules: &'a [String],
    #[serde(skip_serializing_if = "no_warnings")]
    warnings: &'a [Warning],
}

fn no_warnings(warnings: &&[Warning]) -> bool {
    warnings.is_empty()
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let metrics = &data.metrics;

        let cycles: Vec<JsonCycle> = metrics
            .cycles
            .iter()
            .map(|c| JsonCycle {
                modules: &c.modules,
                path: c.cycle_path(),
            })
            .collect();

        let export = JsonExport {
            project: &data.project_name,
            summary: JsonSummary {
                files_scanned: data.files_scanned,
                module_count: metrics.module_count,
                edge_count: metrics.edge_count,
                external_import_count: metrics.external_import_count,
                circular_dependencies: metrics.cycles.len(),
                dead_exports: metrics.dead_exports.len(),
            },
            depth: &metrics.depth,
            fanout: &metrics.fanout,
            import_complexity: &metrics.import_complexity,
            coupling: &metrics.coupling,
            cycles,
            dead_exports: &metrics.dead_exports,
            unreachable_modules: &metrics.unreachable_modules,
            warnings: &metrics.warnings,
        };

        serde_json::to_writer_pretty(&mut *writer, &export)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(writer)?;

        Ok(())
    }
}
