//! Writing tables, charts and exports to disk.

use crate::charts::{self, ChartData};
use crate::model::{Report, RequestResult};
use crate::tables::TableKind;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Write a rendered table into the output directory.
pub fn write_table(dir: &Path, kind: &TableKind, contents: &str) -> Result<PathBuf> {
    write_file(&dir.join(kind.file_name()), contents)
}

/// Write a chart's series as JSON and its text rendering.
pub fn write_chart(dir: &Path, chart: &ChartData, width: u16, height: u16) -> Result<Vec<PathBuf>> {
    let json = serde_json::to_string_pretty(chart)?;
    let series = write_file(&dir.join(format!("{}.json", chart.name)), &json)?;
    let text = charts::render_text(chart, width, height);
    let rendered = write_file(&dir.join(format!("{}.chart.txt", chart.name)), &text)?;
    Ok(vec![series, rendered])
}

pub fn export_json(path: &Path, report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    write_file(path, &json)?;
    Ok(())
}

const CSV_HEADER: &str = "source,cluster_id,crosses_clusters,rate_MBps,size_B,tstart,tend,ela_ms,usr_ms,sys_ms,acks,acked_B,start_slot,end_slot,ldr_usr_ms,ldr_sys_ms,fol_usr_ms,fol_sys_ms,latency_samples,latency_label";

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_row(r: &RequestResult, excluded: bool) -> String {
    format!(
        "{},{},{},{},{},{:.9},{:.9},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        csv_field(&r.source.display().to_string()),
        csv_field(&r.window.cluster_id),
        excluded,
        r.rate_mbps,
        r.size_b,
        r.tstart.as_secs_f64(),
        r.tend.as_secs_f64(),
        r.ela_ms,
        r.usr_ms,
        r.sys_ms,
        r.acks,
        r.acked_b,
        r.window.start_slot,
        r.window.end_slot,
        r.leader.user_ms(),
        r.leader.sys_ms(),
        r.follower.user_ms(),
        r.follower.sys_ms(),
        r.latencies.len(),
        csv_field(&r.latency_label),
    )
}

/// Export one row per request, included and excluded alike.
pub fn export_csv(path: &Path, report: &Report) -> Result<()> {
    let mut out = String::new();
    out.push_str(&format!("# generated {}\n", report.generated_utc));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in &report.records {
        out.push_str(&csv_row(r, false));
        out.push('\n');
    }
    for r in &report.excluded {
        out.push_str(&csv_row(r, true));
        out.push('\n');
    }
    write_file(path, &out)?;
    Ok(())
}
