use crate::lookup::LookupError;
use thiserror::Error;

/// A client log line that could not be read.
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("results line has {0} fields, expected 9")]
    FieldCount(usize),
    #[error("invalid {field} {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("latency line without a preceding results line")]
    OrphanLatency,
    #[error("invalid latency sample {0:?}")]
    InvalidSample(String),
}

/// Why a client record could not be turned into a request result.
#[derive(Debug, Error)]
pub enum CorrelateError {
    #[error("no leader stats lines were found")]
    NoClientIndex,
    #[error("cluster {cluster_id} has no stats for node {node_id}")]
    MissingNode { cluster_id: String, node_id: u32 },
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
