use crate::lookup::Keyed;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub logs_dir: PathBuf,
    pub node_logs: Vec<PathBuf>,
    pub client_prefix: String,
    pub output_dir: PathBuf,
    pub leader_node: u32,
    pub follower_node: u32,
    pub cumulative_points: usize,
    pub percentiles: Vec<f64>,
    pub include_cross_cluster: bool,
    pub charts: bool,
    pub chart_width: u16,
    pub chart_height: u16,
}

/// One CPU-usage observation for a node, keyed by the first active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSample {
    pub slot: u64,
    pub user_time_us: u64,
    pub sys_time_us: u64,
}

impl Keyed for StatsSample {
    type Key = u64;

    fn key(&self) -> u64 {
        self.slot
    }
}

/// Samples for one node within one cluster incarnation, in log order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRun {
    pub samples: Vec<StatsSample>,
}

/// Leader-observed slot at a given client-visible elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientEvent {
    pub elapsed_time_us: u64,
    pub cluster_id: String,
    pub slot: u64,
}

impl Keyed for ClientEvent {
    type Key = u64;

    fn key(&self) -> u64 {
        self.elapsed_time_us
    }
}

/// Wall-clock timestamp as printed by the client (`sec.nanos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub nanos: u64,
}

impl Timestamp {
    pub fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Smallest whole microsecond not earlier than this instant.
    pub fn ceil_micros(self) -> u64 {
        self.nanos.div_ceil(1_000)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }
}

/// Fields of a client `results:` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResults {
    pub target_rate_bps: f64,
    pub size_b: u64,
    pub start: Timestamp,
    pub end: Timestamp,
    pub ela_ms: u64,
    pub usr_ms: u64,
    pub sys_ms: u64,
    pub acks: u64,
    pub acked_b: u64,
}

/// A `results:` line paired with the `latency` line that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub source: PathBuf,
    pub results: ClientResults,
    pub latency_label: String,
    pub latencies: Vec<f64>,
}

/// CPU time consumed by one node across a request window, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuDelta {
    pub user_us: i64,
    pub sys_us: i64,
}

impl CpuDelta {
    pub fn between(start: &StatsSample, end: &StatsSample) -> Self {
        Self {
            user_us: end.user_time_us as i64 - start.user_time_us as i64,
            sys_us: end.sys_time_us as i64 - start.sys_time_us as i64,
        }
    }

    pub fn user_ms(&self) -> i64 {
        self.user_us.div_euclid(1_000)
    }

    pub fn sys_ms(&self) -> i64 {
        self.sys_us.div_euclid(1_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Leader,
    Follower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuMode {
    User,
    System,
}

impl CpuMode {
    pub fn label(self) -> &'static str {
        match self {
            CpuMode::User => "User",
            CpuMode::System => "System",
        }
    }
}

/// Resolved slot window of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub cluster_id: String,
    pub start_slot: u64,
    pub end_slot: u64,
    /// Cluster the end timestamp resolved to, when it differs from the start.
    pub end_cluster_id: Option<String>,
}

impl SlotWindow {
    pub fn crosses_clusters(&self) -> bool {
        self.end_cluster_id.is_some()
    }
}

/// One correlated client transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    pub source: PathBuf,
    pub rate_mbps: u64,
    pub size_b: u64,
    pub tstart: Timestamp,
    pub tend: Timestamp,
    pub ela_ms: u64,
    pub usr_ms: u64,
    pub sys_ms: u64,
    pub acks: u64,
    pub acked_b: u64,
    pub window: SlotWindow,
    pub leader: CpuDelta,
    pub follower: CpuDelta,
    /// Label written by the client ahead of its latency samples.
    #[serde(default)]
    pub latency_label: String,
    /// Latency samples in seconds, sorted ascending.
    pub latencies: Vec<f64>,
}

impl RequestResult {
    pub fn target_bps(&self) -> f64 {
        self.rate_mbps as f64 * 1_000_000.0
    }

    pub fn cpu(&self, role: Role) -> &CpuDelta {
        match role {
            Role::Leader => &self.leader,
            Role::Follower => &self.follower,
        }
    }

    /// CPU time as a percentage of the request's elapsed time.
    pub fn cpu_percent(&self, role: Role, mode: CpuMode) -> Option<f64> {
        if self.ela_ms == 0 {
            return None;
        }
        let cpu = self.cpu(role);
        let ms = match mode {
            CpuMode::User => cpu.user_ms(),
            CpuMode::System => cpu.sys_ms(),
        };
        Some(100.0 * ms as f64 / self.ela_ms as f64)
    }

    /// Acknowledged writes per second.
    pub fn write_rate_hz(&self) -> Option<f64> {
        if self.ela_ms == 0 || self.size_b == 0 {
            return None;
        }
        Some(self.acked_b as f64 * 1000.0 / self.ela_ms as f64 / self.size_b as f64)
    }

    /// Acknowledged writes per microsecond (millions per second).
    pub fn write_rate_mhz(&self) -> Option<f64> {
        if self.ela_ms == 0 || self.size_b == 0 {
            return None;
        }
        Some(self.acked_b as f64 / 1000.0 / self.ela_ms as f64 / self.size_b as f64)
    }

    /// Delivered bandwidth as a fraction of the target.
    pub fn delivered_fraction(&self) -> Option<f64> {
        if self.ela_ms == 0 || self.rate_mbps == 0 {
            return None;
        }
        Some(self.acked_b as f64 / 1000.0 / self.ela_ms as f64 / self.rate_mbps as f64)
    }

    pub fn delivered_percent(&self) -> Option<f64> {
        self.delivered_fraction().map(|f| f * 100.0)
    }

    pub fn mean_ack_size(&self) -> Option<u64> {
        self.acked_b.checked_div(self.acks)
    }
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub generated_utc: String,
    pub config: ReportConfig,
    pub records: Vec<RequestResult>,
    /// Records left out of tables and charts (cross-cluster windows).
    pub excluded: Vec<RequestResult>,
    /// Client records that could not be correlated at all.
    pub skipped: usize,
}
