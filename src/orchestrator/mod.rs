//! Report pipeline: load logs, correlate requests, and decide what is
//! aggregated.

mod correlate;
mod grid;

pub use grid::ResultGrid;

#[cfg(test)]
pub(crate) use grid::tests::result as sample_result;

use crate::ingest::{self, NodeStats};
use crate::model::{ClientRecord, Report, ReportConfig};
use anyhow::Result;
use correlate::Correlator;
use time::format_description::well_known::Rfc3339;

/// Correlate every client record against the node stats.
pub(crate) fn correlate_records(
    cfg: &ReportConfig,
    stats: &NodeStats,
    records: &[ClientRecord],
) -> Report {
    let correlator = Correlator::new(stats, cfg.leader_node, cfg.follower_node);
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    let mut skipped = 0;

    for record in records {
        match correlator.correlate(record) {
            Ok(r) if r.window.crosses_clusters() && !cfg.include_cross_cluster => excluded.push(r),
            Ok(r) => included.push(r),
            Err(e) => {
                tracing::warn!(file = %record.source.display(), "cannot correlate request: {e}");
                skipped += 1;
            }
        }
    }
    if !excluded.is_empty() {
        tracing::warn!(
            count = excluded.len(),
            "requests spanning two clusters were left out of the report"
        );
    }

    Report {
        generated_utc: time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        config: cfg.clone(),
        records: included,
        excluded,
        skipped,
    }
}

/// Read the log directory and build the report.
pub fn build_report(cfg: &ReportConfig) -> Result<Report> {
    tracing::info!("Reading node stats");
    let stats = ingest::load_node_stats(cfg)?;
    tracing::info!("Reading log files");
    let records = ingest::load_client_records(cfg)?;
    Ok(correlate_records(cfg, &stats, &records))
}
