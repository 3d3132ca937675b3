//! Console and JSON rendering of a monitoring run.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use crate::data::duration::format_secs;
use crate::data::{MetricStats, RunSummary, TimingRecord, Workload};

const RULE_WIDTH: usize = 100;
const FAILED: &str = "Failed";

/// Per-target table, sorted by target.
///
/// Migration runs show the node each VMI landed on in place of the address
/// it had at the first milestone.
pub fn render_table(workload: Workload, records: &[TimingRecord]) -> String {
    let mut sorted: Vec<&TimingRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.target.cmp(&b.target));

    let location_column = match workload {
        Workload::Recovery => "IP at Run",
        Workload::Migration => "Target Node",
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "{:<30}{:<20}{:<15}{:<20}{:<20}",
        "Namespace",
        workload.milestone_column(),
        "Time to Ping(s)",
        location_column,
        "IP at Ping"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for record in sorted {
        let first = record.time_to_running().map_or(FAILED.to_string(), format_secs);
        let ping = record
            .time_to_reachable()
            .map_or(FAILED.to_string(), format_secs);
        let location = match workload {
            Workload::Recovery => record.address_at_running(),
            Workload::Migration => record.node_at_running(),
        };
        let _ = writeln!(
            out,
            "{:<30}{:<20}{:<15}{:<20}{:<20}",
            record.target.namespace,
            first,
            ping,
            location.unwrap_or(""),
            record.address_at_reachable().unwrap_or(""),
        );
    }

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

/// Totals plus stats for every metric that has values.
pub fn render_summary(workload: Workload, summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Statistics:", workload.title());
    let _ = writeln!(out, "  {:<27}{}", "Total VMIs:", summary.total);
    let _ = writeln!(
        out,
        "  {:<27}{}",
        format!("{}:", workload.success_label()),
        summary.successful
    );
    let _ = writeln!(
        out,
        "  {:<27}{}",
        format!("{}:", workload.failure_label()),
        summary.failed
    );

    if let Some(stats) = &summary.time_to_running {
        render_metric(&mut out, workload.milestone_title(), stats);
    }
    if let Some(stats) = &summary.time_to_reachable {
        render_metric(&mut out, "Time to Ping", stats);
    }

    out
}

fn render_metric(out: &mut String, title: &str, stats: &MetricStats) {
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}:", title);
    let _ = writeln!(out, "    Average:                 {:.2}s", stats.average);
    let _ = writeln!(out, "    Maximum:                 {:.2}s", stats.max);
    let _ = writeln!(out, "    Minimum:                 {:.2}s", stats.min);
}

/// Build the JSON export document.
pub fn to_json(
    workload: Workload,
    records: &[TimingRecord],
    summary: &RunSummary,
) -> serde_json::Value {
    let mut sorted: Vec<&TimingRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.target.cmp(&b.target));

    serde_json::json!({
        "workload": workload,
        "summary": summary,
        "targets": sorted,
    })
}

/// Write the JSON export to `path`.
pub fn export_json(
    path: &Path,
    workload: Workload,
    records: &[TimingRecord],
    summary: &RunSummary,
) -> Result<()> {
    let json = serde_json::to_string_pretty(&to_json(workload, records, summary))?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    Ok(())
}

/// Save a run under `folder/<workload>-<unix seconds>/`: `results.json` plus
/// the console table and summary in `summary.txt`. Returns the run directory.
pub fn save_results(
    folder: &Path,
    workload: Workload,
    records: &[TimingRecord],
    summary: &RunSummary,
) -> Result<PathBuf> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let dir = folder.join(format!("{}-{}", workload, stamp));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create results folder {}", dir.display()))?;

    export_json(&dir.join("results.json"), workload, records, summary)?;

    let text = format!(
        "{}\n{}",
        render_table(workload, records),
        render_summary(workload, summary)
    );
    let summary_path = dir.join("summary.txt");
    std::fs::write(&summary_path, text)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    Ok(dir)
}
