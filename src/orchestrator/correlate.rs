//! Aligns client request windows with leader/follower CPU samples.

use crate::error::CorrelateError;
use crate::ingest::NodeStats;
use crate::lookup::{ceiling, Resolution};
use crate::model::{ClientRecord, CpuDelta, NodeRun, RequestResult, SlotWindow};

pub(crate) struct Correlator<'a> {
    stats: &'a NodeStats,
    leader_node: u32,
    follower_node: u32,
}

impl<'a> Correlator<'a> {
    pub fn new(stats: &'a NodeStats, leader_node: u32, follower_node: u32) -> Self {
        Self {
            stats,
            leader_node,
            follower_node,
        }
    }

    fn node_run(&self, cluster_id: &str, node_id: u32) -> Result<&'a NodeRun, CorrelateError> {
        self.stats
            .run(cluster_id, node_id)
            .ok_or_else(|| CorrelateError::MissingNode {
                cluster_id: cluster_id.to_string(),
                node_id,
            })
    }

    /// Resolve the start and end of a request to leader slots.
    pub fn slot_window(&self, record: &ClientRecord) -> Result<SlotWindow, CorrelateError> {
        let events = self.stats.events();
        if events.is_empty() {
            return Err(CorrelateError::NoClientIndex);
        }
        let found = ceiling(events, record.results.start.ceil_micros())?;
        if found.resolution == Resolution::ClampedLow {
            tracing::debug!(
                file = %record.source.display(),
                index = found.index,
                first_sample_us = found.entry.elapsed_time_us,
                "request starts at or before the first leader sample"
            );
        }
        let start = found.entry;
        let end = ceiling(events, record.results.end.ceil_micros())?.entry;

        let end_cluster_id = if start.cluster_id != end.cluster_id {
            tracing::warn!(
                file = %record.source.display(),
                start_cluster = %start.cluster_id,
                end_cluster = %end.cluster_id,
                "request window crosses clusters"
            );
            Some(end.cluster_id.clone())
        } else {
            None
        };

        Ok(SlotWindow {
            cluster_id: start.cluster_id.clone(),
            start_slot: start.slot,
            end_slot: end.slot,
            end_cluster_id,
        })
    }

    /// CPU consumed by `node_id` between the window's start and end slots.
    pub fn cpu_delta(&self, window: &SlotWindow, node_id: u32) -> Result<CpuDelta, CorrelateError> {
        let run = self.node_run(&window.cluster_id, node_id)?;
        let start = ceiling(&run.samples, window.start_slot)?.entry;
        let end = ceiling(&run.samples, window.end_slot)?.entry;
        Ok(CpuDelta::between(start, end))
    }

    pub fn correlate(&self, record: &ClientRecord) -> Result<RequestResult, CorrelateError> {
        let window = self.slot_window(record)?;
        let leader = self.cpu_delta(&window, self.leader_node)?;
        let follower = self.cpu_delta(&window, self.follower_node)?;
        let r = &record.results;

        Ok(RequestResult {
            source: record.source.clone(),
            rate_mbps: r.target_rate_bps.trunc() as u64 / 1_000_000,
            size_b: r.size_b,
            tstart: r.start,
            tend: r.end,
            ela_ms: r.ela_ms,
            usr_ms: r.usr_ms,
            sys_ms: r.sys_ms,
            acks: r.acks,
            acked_b: r.acked_b,
            window,
            leader,
            follower,
            latency_label: record.latency_label.clone(),
            latencies: record.latencies.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientResults, Timestamp};
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    fn stats(leader: &str, follower: &str) -> NodeStats {
        let mut s = NodeStats::default();
        s.ingest(Cursor::new(leader), 1, Path::new("node-1.log")).unwrap();
        s.ingest(Cursor::new(follower), 1, Path::new("node-2.log")).unwrap();
        s.finish();
        s
    }

    fn record(start_s: u64, end_s: u64) -> ClientRecord {
        ClientRecord {
            source: PathBuf::from("client-x.log"),
            results: ClientResults {
                target_rate_bps: 25_500_000.9,
                size_b: 1000,
                start: Timestamp::from_nanos(start_s * 1_000_000_000),
                end: Timestamp::from_nanos(end_s * 1_000_000_000),
                ela_ms: 4000,
                usr_ms: 1,
                sys_ms: 2,
                acks: 10,
                acked_b: 10_000,
            },
            latency_label: "l".into(),
            latencies: vec![0.1, 0.2],
        }
    }

    const LEADER: &str = "\
Starting as cluster aa node 1
stats: real 1000000us user 100us sys 10us active slots [ 1, 2)
stats: real 3000000us user 300us sys 30us active slots [ 3, 4)
stats: real 5000000us user 500us sys 50us active slots [ 5, 6)
";

    const FOLLOWER: &str = "\
Starting as cluster aa node 2
stats: real 900000us user 20us sys 2us active slots [ 1, 2)
stats: real 4900000us user 220us sys 22us active slots [ 5, 6)
";

    #[test]
    fn leader_delta_between_window_slots() {
        let s = stats(LEADER, FOLLOWER);
        let c = Correlator::new(&s, 1, 2);
        let r = c.correlate(&record(1, 5)).unwrap();
        assert_eq!(r.window.start_slot, 1);
        assert_eq!(r.window.end_slot, 5);
        assert_eq!(r.leader, CpuDelta { user_us: 400, sys_us: 40 });
        assert_eq!(r.follower, CpuDelta { user_us: 200, sys_us: 20 });
        assert_eq!(r.rate_mbps, 25);
        assert_eq!(r.latency_label, "l");
        assert!(!r.window.crosses_clusters());
    }

    #[test]
    fn start_between_samples_rounds_up() {
        let s = stats(LEADER, FOLLOWER);
        let c = Correlator::new(&s, 1, 2);
        let w = c.slot_window(&record(2, 4)).unwrap();
        assert_eq!((w.start_slot, w.end_slot), (3, 5));
    }

    #[test]
    fn window_past_end_clamps() {
        let s = stats(LEADER, FOLLOWER);
        let c = Correlator::new(&s, 1, 2);
        let w = c.slot_window(&record(0, 60)).unwrap();
        assert_eq!((w.start_slot, w.end_slot), (1, 5));
    }

    #[test]
    fn crossing_clusters_is_flagged() {
        let leader = format!("{LEADER}Starting as cluster bb node 1\nstats: real 9000000us user 1us sys 1us active slots [ 1, 2)\n");
        let s = stats(&leader, FOLLOWER);
        let c = Correlator::new(&s, 1, 2);
        let w = c.slot_window(&record(4, 8)).unwrap();
        assert_eq!(w.cluster_id, "aa");
        assert_eq!(w.end_cluster_id.as_deref(), Some("bb"));
        assert!(w.crosses_clusters());
    }

    #[test]
    fn missing_follower_is_an_error() {
        let s = stats(LEADER, "");
        let c = Correlator::new(&s, 1, 2);
        assert!(matches!(
            c.correlate(&record(1, 5)),
            Err(CorrelateError::MissingNode { node_id: 2, .. })
        ));
    }

    #[test]
    fn no_leader_lines_is_an_error() {
        let s = stats("", FOLLOWER);
        let c = Correlator::new(&s, 1, 2);
        assert!(matches!(c.slot_window(&record(1, 5)), Err(CorrelateError::NoClientIndex)));
    }
}
