//! Client log parsing: `results:` lines and the `latency` lines that follow.

use crate::error::LineError;
use crate::metrics::sorted_samples;
use crate::model::{ClientRecord, ClientResults, Timestamp};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

const RESULTS_TAG: &str = "results:";
const LATENCY_TAG: &str = "latency";

fn field<T: FromStr>(name: &'static str, value: &str) -> Result<T, LineError> {
    value.parse().map_err(|_| LineError::InvalidField {
        field: name,
        value: value.to_string(),
    })
}

/// Parse a `sec.nanos` timestamp without going through floating point.
pub(crate) fn parse_timestamp(name: &'static str, value: &str) -> Result<Timestamp, LineError> {
    let invalid = || LineError::InvalidField {
        field: name,
        value: value.to_string(),
    };
    let (secs, frac) = value.split_once('.').unwrap_or((value, ""));
    if secs.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let secs: u64 = secs.parse().map_err(|_| invalid())?;
    let mut nanos = 0u64;
    for i in 0..9 {
        let digit = frac.as_bytes().get(i).map_or(0, |b| u64::from(b - b'0'));
        nanos = nanos * 10 + digit;
    }
    secs.checked_mul(1_000_000_000)
        .and_then(|n| n.checked_add(nanos))
        .map(Timestamp::from_nanos)
        .ok_or_else(invalid)
}

/// Parse the fields following the `results:` tag.
pub(crate) fn parse_results(cells: &[&str]) -> Result<ClientResults, LineError> {
    let [rate, size, start, end, ela, usr, sys, acks, acked] = cells else {
        return Err(LineError::FieldCount(cells.len()));
    };
    Ok(ClientResults {
        target_rate_bps: field("target rate", rate)?,
        size_b: field("request size", size)?,
        start: parse_timestamp("start time", start)?,
        end: parse_timestamp("end time", end)?,
        ela_ms: field("elapsed", ela)?,
        usr_ms: field("user time", usr)?,
        sys_ms: field("sys time", sys)?,
        acks: field("acks", acks)?,
        acked_b: field("acked bytes", acked)?,
    })
}

/// Parse the samples following the latency label, sorted ascending.
pub(crate) fn parse_latencies(cells: &[&str]) -> Result<Vec<f64>, LineError> {
    let samples = cells
        .iter()
        .map(|c| c.parse::<f64>().map_err(|_| LineError::InvalidSample(c.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sorted_samples(samples))
}

/// Read every complete `results:` + `latency` pair from one client log.
///
/// Malformed lines are logged and skipped.
pub fn read_client_log<R: BufRead>(reader: R, source: &Path) -> Result<Vec<ClientRecord>> {
    let mut records = Vec::new();
    let mut pending: Option<ClientResults> = None;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read {}:{}", source.display(), lineno + 1))?;
        let cells: Vec<&str> = line.split_whitespace().collect();
        let outcome = match cells.first().copied() {
            Some(RESULTS_TAG) => parse_results(&cells[1..]).map(|r| {
                if pending.replace(r).is_some() {
                    tracing::warn!(
                        file = %source.display(),
                        line = lineno + 1,
                        "results line without latency line was replaced"
                    );
                }
            }),
            Some(LATENCY_TAG) => match pending.take() {
                None => Err(LineError::OrphanLatency),
                Some(results) => parse_latencies(cells.get(2..).unwrap_or_default()).map(|latencies| {
                    records.push(ClientRecord {
                        source: source.to_path_buf(),
                        results,
                        latency_label: cells.get(1).copied().unwrap_or_default().to_string(),
                        latencies,
                    });
                }),
            },
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            tracing::warn!(file = %source.display(), line = lineno + 1, "skipping line: {e}");
        }
    }

    if pending.is_some() {
        tracing::warn!(file = %source.display(), "trailing results line has no latency line");
    }
    Ok(records)
}
