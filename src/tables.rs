//! Pipe-delimited rate × size tables.

use crate::metrics::LatencyDistribution;
use crate::model::RequestResult;
use crate::orchestrator::ResultGrid;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableKind {
    /// Millions of acknowledged writes per second.
    TransactionRate,
    /// Fraction of the target bandwidth delivered.
    DataRate,
    /// Mean bytes per acknowledgement.
    MeanAckSize,
    /// Latency at the given percentile, in milliseconds.
    LatencyPercentile(f64),
}

enum Cell {
    Float(f64),
    Int(u64),
}

impl TableKind {
    pub fn file_name(&self) -> String {
        match self {
            TableKind::TransactionRate => "transaction-rate.txt".into(),
            TableKind::DataRate => "data-rate.txt".into(),
            TableKind::MeanAckSize => "mean-ack-size.txt".into(),
            TableKind::LatencyPercentile(p) => format!("latency-{p}-percentile.txt"),
        }
    }

    pub fn title(&self) -> String {
        match self {
            TableKind::TransactionRate => "Write rate (MHz)".into(),
            TableKind::DataRate => "Fraction of target delivered".into(),
            TableKind::MeanAckSize => "Mean ack size (B)".into(),
            TableKind::LatencyPercentile(p) => format!("Latency p{p} (ms)"),
        }
    }

    fn cell_width(&self) -> usize {
        match self {
            TableKind::TransactionRate | TableKind::DataRate => 7,
            TableKind::MeanAckSize | TableKind::LatencyPercentile(_) => 9,
        }
    }

    fn value(&self, r: &RequestResult) -> Option<Cell> {
        match self {
            TableKind::TransactionRate => r.write_rate_mhz().map(Cell::Float),
            TableKind::DataRate => r.delivered_fraction().map(Cell::Float),
            TableKind::MeanAckSize => r.mean_ack_size().map(Cell::Int),
            TableKind::LatencyPercentile(p) => LatencyDistribution::new(&r.latencies)
                .percentile(*p)
                .map(|s| Cell::Float(s * 1000.0)),
        }
    }

    /// Render the table for every rate (rows) and size (columns) in `grid`.
    pub fn render(&self, grid: &ResultGrid<'_>) -> String {
        let width = self.cell_width();
        let mut out = String::new();

        out.push_str(&format!("|{:10}", ""));
        let pad = " ".repeat(width - 6);
        for size in grid.sizes() {
            let _ = write!(out, "|{pad}{size:4} B");
        }
        out.push('\n');

        out.push_str("|----------");
        for _ in grid.sizes() {
            out.push('|');
            out.push_str(&"-".repeat(width));
        }
        out.push('\n');

        for (ri, rate) in grid.rates().iter().enumerate() {
            let _ = write!(out, "|{rate:3} MB/s  ");
            for si in 0..grid.sizes().len() {
                let cell = grid.get(ri, si).and_then(|r| {
                    let v = self.value(r);
                    if v.is_none() {
                        tracing::warn!(
                            table = %self.file_name(),
                            rate_mbps = r.rate_mbps,
                            size_b = r.size_b,
                            "no value for cell"
                        );
                    }
                    v
                });
                let _ = match cell {
                    None => write!(out, "|{:w$}", "", w = width),
                    Some(Cell::Float(v)) => write!(out, "|{v:w$.3}", w = width),
                    Some(Cell::Int(v)) => write!(out, "|{v:w$}", w = width),
                };
            }
            out.push('\n');
        }
        out
    }
}

/// Every table the report writes, in output order.
pub fn all_tables(percentiles: &[f64]) -> Vec<TableKind> {
    let mut kinds = vec![
        TableKind::TransactionRate,
        TableKind::DataRate,
        TableKind::MeanAckSize,
    ];
    kinds.extend(percentiles.iter().map(|p| TableKind::LatencyPercentile(*p)));
    kinds
}
