//! Text summary builder for CLI output.

use crate::metrics::LatencyDistribution;
use crate::model::{CpuMode, Report, RequestResult, Role};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn request_line(r: &RequestResult) -> String {
    let dist = LatencyDistribution::new(&r.latencies);
    let ms = |p: f64| dist.percentile(p).map(|s| s * 1000.0);
    format!(
        "{:>4} MB/s {:>6} B  window {:<8} p50 {:>8} ms  p99 {:>8} ms  delivered {:>6}%  leader usr/sys {:>5}/{:>5}%  follower usr/sys {:>5}/{:>5}%",
        r.rate_mbps,
        r.size_b,
        humantime::format_duration(Duration::from_millis(r.ela_ms)).to_string(),
        fmt_opt(ms(50.0), 3),
        fmt_opt(ms(99.0), 3),
        fmt_opt(r.delivered_percent(), 1),
        fmt_opt(r.cpu_percent(Role::Leader, CpuMode::User), 1),
        fmt_opt(r.cpu_percent(Role::Leader, CpuMode::System), 1),
        fmt_opt(r.cpu_percent(Role::Follower, CpuMode::User), 1),
        fmt_opt(r.cpu_percent(Role::Follower, CpuMode::System), 1),
    )
}

/// Build a text summary of the report and the files it produced.
pub(crate) fn build_text_summary(report: &Report, written: &[PathBuf]) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Requests: {} correlated, {} excluded (cross-cluster), {} skipped",
        report.records.len(),
        report.excluded.len(),
        report.skipped
    ));

    let mut by_cluster: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &report.records {
        *by_cluster.entry(r.window.cluster_id.as_str()).or_default() += 1;
    }
    for (cluster, count) in &by_cluster {
        lines.push(format!("Cluster {cluster}: {count} requests"));
    }

    let mut sorted: Vec<&RequestResult> = report.records.iter().collect();
    sorted.sort_by_key(|r| (r.rate_mbps, r.size_b));
    for r in sorted {
        lines.push(request_line(r));
    }

    for r in &report.excluded {
        lines.push(format!(
            "Excluded: {} ({} MB/s, {} B) spans clusters {} -> {}",
            r.source.display(),
            r.rate_mbps,
            r.size_b,
            r.window.cluster_id,
            r.window.end_cluster_id.as_deref().unwrap_or("?")
        ));
    }

    if !written.is_empty() {
        lines.push(format!("Wrote {} files:", written.len()));
        lines.extend(written.iter().map(|p| format!("  {}", p.display())));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportConfig;
    use crate::orchestrator::sample_result;

    #[test]
    fn summary_counts_and_rows() {
        let report = Report {
            generated_utc: String::new(),
            config: ReportConfig {
                logs_dir: "logs".into(),
                node_logs: vec![],
                client_prefix: "client-".into(),
                output_dir: ".".into(),
                leader_node: 1,
                follower_node: 2,
                cumulative_points: 10,
                percentiles: vec![],
                include_cross_cluster: false,
                charts: false,
                chart_width: 10,
                chart_height: 10,
            },
            records: vec![sample_result(50, 100), sample_result(5, 100)],
            excluded: vec![],
            skipped: 2,
        };
        let summary = build_text_summary(&report, &[PathBuf::from("out/data-rate.txt")]);
        assert_eq!(
            summary.lines[0],
            "Requests: 2 correlated, 0 excluded (cross-cluster), 2 skipped"
        );
        assert_eq!(summary.lines[1], "Cluster aa: 2 requests");
        assert!(summary.lines[2].starts_with("   5 MB/s"));
        assert!(summary.lines[2].contains("window 1m"));
        assert!(summary.lines[3].starts_with("  50 MB/s"));
        assert_eq!(summary.lines.last().unwrap(), "  out/data-rate.txt");
    }
}
