//! Reading the benchmark's log directory.

mod client_log;
mod node_log;

pub use client_log::read_client_log;
pub use node_log::NodeStats;

use crate::model::{ClientRecord, ReportConfig};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Files directly inside `dir` whose name passes `keep`, sorted by name.
fn list_logs(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if keep(name) && entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Node logs named in the config, or every `node-*.log` in the logs dir.
pub fn node_log_paths(cfg: &ReportConfig) -> Result<Vec<PathBuf>> {
    if !cfg.node_logs.is_empty() {
        return Ok(cfg.node_logs.clone());
    }
    list_logs(&cfg.logs_dir, |name| {
        name.starts_with("node-") && name.ends_with(".log")
    })
}

pub fn client_log_paths(cfg: &ReportConfig) -> Result<Vec<PathBuf>> {
    list_logs(&cfg.logs_dir, |name| name.starts_with(&cfg.client_prefix))
}

pub fn load_node_stats(cfg: &ReportConfig) -> Result<NodeStats> {
    let mut stats = NodeStats::default();
    for path in node_log_paths(cfg)? {
        let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        stats.ingest(BufReader::new(file), cfg.leader_node, &path)?;
    }
    stats.finish();
    tracing::info!(
        clusters = stats.clusters().count(),
        samples = stats.sample_count(),
        leader_events = stats.events().len(),
        "node stats loaded"
    );
    Ok(stats)
}

pub fn load_client_records(cfg: &ReportConfig) -> Result<Vec<ClientRecord>> {
    let mut records = Vec::new();
    for path in client_log_paths(cfg)? {
        let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        records.extend(read_client_log(BufReader::new(file), &path)?);
    }
    tracing::info!(records = records.len(), "client logs loaded");
    Ok(records)
}
