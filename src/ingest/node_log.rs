//! Node log parsing: startup banners and periodic CPU stats lines.

use crate::model::{ClientEvent, NodeRun, StatsSample};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

fn stats_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^stats: real +(?P<real>[0-9]+)us user +(?P<user>[0-9]+)us sys +(?P<sys>[0-9]+)us active slots \[ *(?P<slot>[0-9]+),",
        )
        .expect("static stats regex")
    })
}

fn startup_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Starting as cluster +(?P<cluster>[0-9a-f-]+) node +(?P<node>[0-9]+)")
            .expect("static startup regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeLine {
    Startup { cluster_id: String, node_id: u32 },
    Stats { elapsed_us: u64, sample: StatsSample },
}

/// Classify one node log line; unrecognised lines yield `None`.
pub(crate) fn parse_node_line(line: &str) -> Option<NodeLine> {
    if let Some(c) = startup_line_re().captures(line) {
        let node_id = c["node"].parse().ok()?;
        return Some(NodeLine::Startup {
            cluster_id: c["cluster"].to_string(),
            node_id,
        });
    }
    let c = stats_line_re().captures(line)?;
    Some(NodeLine::Stats {
        elapsed_us: c["real"].parse().ok()?,
        sample: StatsSample {
            slot: c["slot"].parse().ok()?,
            user_time_us: c["user"].parse().ok()?,
            sys_time_us: c["sys"].parse().ok()?,
        },
    })
}

/// CPU samples of every node in every cluster incarnation, plus the
/// client-time index built from the leader's stats lines.
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    runs: BTreeMap<String, BTreeMap<u32, NodeRun>>,
    events: Vec<ClientEvent>,
}

impl NodeStats {
    /// Fold one node log into the collection.
    pub fn ingest<R: BufRead>(&mut self, reader: R, leader_node: u32, source: &Path) -> Result<()> {
        let mut current: Option<(String, u32)> = None;
        let mut orphaned = 0usize;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("read {}:{}", source.display(), lineno + 1))?;
            match parse_node_line(&line) {
                Some(NodeLine::Startup {
                    cluster_id,
                    node_id,
                }) => {
                    tracing::debug!(cluster = %cluster_id, node = node_id, file = %source.display(), "node startup");
                    self.runs
                        .entry(cluster_id.clone())
                        .or_default()
                        .insert(node_id, NodeRun::default());
                    current = Some((cluster_id, node_id));
                }
                Some(NodeLine::Stats { elapsed_us, sample }) => {
                    let Some((cluster_id, node_id)) = current.as_ref() else {
                        orphaned += 1;
                        continue;
                    };
                    if let Some(run) = self
                        .runs
                        .get_mut(cluster_id)
                        .and_then(|nodes| nodes.get_mut(node_id))
                    {
                        if run.samples.last().is_some_and(|prev| prev.slot > sample.slot) {
                            tracing::warn!(
                                file = %source.display(),
                                line = lineno + 1,
                                slot = sample.slot,
                                "stats slot went backwards"
                            );
                        }
                        run.samples.push(sample);
                    }
                    if *node_id == leader_node {
                        self.events.push(ClientEvent {
                            elapsed_time_us: elapsed_us,
                            cluster_id: cluster_id.clone(),
                            slot: sample.slot,
                        });
                    }
                }
                None => {}
            }
        }

        if orphaned > 0 {
            tracing::warn!(
                file = %source.display(),
                count = orphaned,
                "stats lines before any startup line were ignored"
            );
        }
        Ok(())
    }

    /// Sort the client-time index; call once after all logs are ingested.
    pub fn finish(&mut self) {
        self.events.sort();
    }

    pub fn events(&self) -> &[ClientEvent] {
        &self.events
    }

    pub fn run(&self, cluster_id: &str, node_id: u32) -> Option<&NodeRun> {
        self.runs.get(cluster_id)?.get(&node_id)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &str> {
        self.runs.keys().map(String::as_str)
    }

    pub fn sample_count(&self) -> usize {
        self.runs
            .values()
            .flat_map(|nodes| nodes.values())
            .map(|run| run.samples.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LEADER_LOG: &str = "\
Starting as cluster 0a1b-2c node 1
some unrelated line
stats: real 1000us user 100us sys 10us active slots [ 1, 9)
stats: real 3000us user 500us sys 50us active slots [5, 12)
";

    #[test]
    fn parses_startup_line() {
        assert_eq!(
            parse_node_line("Starting as cluster deadbeef-01 node 2"),
            Some(NodeLine::Startup {
                cluster_id: "deadbeef-01".into(),
                node_id: 2
            })
        );
    }

    #[test]
    fn parses_stats_line_with_padded_slot() {
        let line = "stats: real  1505375940us user 12us sys 3us active slots [   42, 50)";
        assert_eq!(
            parse_node_line(line),
            Some(NodeLine::Stats {
                elapsed_us: 1_505_375_940,
                sample: StatsSample {
                    slot: 42,
                    user_time_us: 12,
                    sys_time_us: 3
                }
            })
        );
    }

    #[test]
    fn ignores_other_lines() {
        assert_eq!(parse_node_line("stats: real 1us"), None);
        assert_eq!(parse_node_line("  Starting as cluster a node 1"), None);
    }

    #[test]
    fn leader_lines_feed_client_index() {
        let mut stats = NodeStats::default();
        stats
            .ingest(Cursor::new(LEADER_LOG), 1, Path::new("node-1.log"))
            .unwrap();
        stats
            .ingest(
                Cursor::new("Starting as cluster 0a1b-2c node 2\nstats: real 2000us user 7us sys 1us active slots [ 3, 4)\n"),
                1,
                Path::new("node-2.log"),
            )
            .unwrap();
        stats.finish();

        assert_eq!(stats.events().len(), 2);
        assert_eq!(stats.events()[1].slot, 5);
        assert_eq!(stats.run("0a1b-2c", 1).unwrap().samples.len(), 2);
        assert_eq!(stats.run("0a1b-2c", 2).unwrap().samples[0].user_time_us, 7);
        assert_eq!(stats.sample_count(), 3);
    }

    #[test]
    fn stats_before_startup_are_dropped() {
        let mut stats = NodeStats::default();
        stats
            .ingest(
                Cursor::new("stats: real 1us user 1us sys 1us active slots [ 1, 2)\n"),
                1,
                Path::new("node-1.log"),
            )
            .unwrap();
        assert_eq!(stats.sample_count(), 0);
        assert!(stats.events().is_empty());
    }

    #[test]
    fn restart_replaces_run() {
        let mut stats = NodeStats::default();
        let log = format!("{LEADER_LOG}Starting as cluster 0a1b-2c node 1\nstats: real 9000us user 1us sys 1us active slots [ 1, 2)\n");
        stats.ingest(Cursor::new(log), 1, Path::new("n")).unwrap();
        assert_eq!(stats.run("0a1b-2c", 1).unwrap().samples.len(), 1);
        assert_eq!(stats.clusters().collect::<Vec<_>>(), vec!["0a1b-2c"]);
    }
}
