use crate::model::{Report, ReportConfig};
use crate::orchestrator::{self, ResultGrid};
use crate::{charts, storage, tables};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "bench-report",
    version,
    about = "Correlate write-benchmark client logs with leader/follower CPU stats"
)]
pub struct Cli {
    /// Directory holding node-*.log and client log files
    #[arg(long, default_value = "logs")]
    pub logs_dir: PathBuf,

    /// Node log file to read (repeatable; default: every node-*.log in --logs-dir)
    #[arg(long = "node-log")]
    pub node_logs: Vec<PathBuf>,

    /// File name prefix identifying client logs
    #[arg(long, default_value = "client-")]
    pub client_prefix: String,

    /// Directory receiving tables and charts
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Node id of the leader
    #[arg(long, default_value_t = 1)]
    pub leader_node: u32,

    /// Node id of the follower
    #[arg(long, default_value_t = 2)]
    pub follower_node: u32,

    /// Probability steps per exceedance curve
    #[arg(long, default_value_t = 2000)]
    pub cumulative_points: usize,

    /// Latency percentiles to tabulate
    #[arg(long, value_delimiter = ',', default_value = "50,90,95,99,99.5,99.9")]
    pub percentiles: Vec<f64>,

    /// Keep requests whose window spans two cluster incarnations
    #[arg(long)]
    pub include_cross_cluster: bool,

    /// Skip writing chart files
    #[arg(long)]
    pub no_charts: bool,

    /// Width of text-rendered charts
    #[arg(long, default_value_t = 100)]
    pub chart_width: u16,

    /// Height of each row of text-rendered chart panels
    #[arg(long, default_value_t = 30)]
    pub chart_height: u16,

    /// Print the report as JSON and exit
    #[arg(long)]
    pub json: bool,

    /// Print a text summary (default unless --json or --view)
    #[arg(long)]
    pub text: bool,

    /// Browse charts and tables interactively
    #[arg(long)]
    pub view: bool,

    /// Export the report as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export one CSV row per request
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Build a `ReportConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<ReportConfig> {
    if args.leader_node == args.follower_node {
        anyhow::bail!("--leader-node and --follower-node must differ");
    }
    if args.cumulative_points == 0 {
        anyhow::bail!("--cumulative-points must be positive");
    }
    if let Some(p) = args
        .percentiles
        .iter()
        .find(|p| !(0.0..=100.0).contains(*p))
    {
        anyhow::bail!("percentile {p} is outside 0-100");
    }
    if args.chart_width < 20 || args.chart_height < 5 {
        anyhow::bail!("charts need at least 20x5 cells");
    }
    Ok(ReportConfig {
        logs_dir: args.logs_dir.clone(),
        node_logs: args.node_logs.clone(),
        client_prefix: args.client_prefix.clone(),
        output_dir: args.output_dir.clone(),
        leader_node: args.leader_node,
        follower_node: args.follower_node,
        cumulative_points: args.cumulative_points,
        percentiles: args.percentiles.clone(),
        include_cross_cluster: args.include_cross_cluster,
        charts: !args.no_charts,
        chart_width: args.chart_width,
        chart_height: args.chart_height,
    })
}

/// Tracing filter directive implied by -v/-q.
pub fn log_level(args: &Cli) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn run(args: Cli) -> Result<()> {
    if [args.json, args.text, args.view].iter().filter(|m| **m).count() > 1 {
        return Err(anyhow::anyhow!(
            "--json, --text and --view are mutually exclusive"
        ));
    }
    let cfg = build_config(&args)?;
    let report = orchestrator::build_report(&cfg)?;
    let written = write_outputs(&cfg, &report)?;
    handle_exports(&args, &report)?;

    if args.json {
        writeln!(std::io::stdout(), "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    if args.view {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(&cfg, &report);
        }
        #[cfg(not(feature = "tui"))]
        {
            tracing::warn!("built without the tui feature, printing text summary instead");
        }
    }

    let summary = crate::text_summary::build_text_summary(&report, &written);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in summary.lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Write every table and chart into the output directory.
pub(crate) fn write_outputs(cfg: &ReportConfig, report: &Report) -> Result<Vec<PathBuf>> {
    let grid = ResultGrid::new(&report.records);
    if grid.is_empty() {
        tracing::warn!("no correlated requests, tables will be empty");
    }
    let mut written = Vec::new();

    if cfg.charts {
        for chart in charts::all_charts(&grid, cfg.cumulative_points) {
            tracing::info!("{}", chart.title);
            written.extend(
                storage::write_chart(&cfg.output_dir, &chart, cfg.chart_width, cfg.chart_height)
                    .with_context(|| format!("write chart {}", chart.name))?,
            );
        }
    }

    for kind in tables::all_tables(&cfg.percentiles) {
        tracing::info!("{}", kind.title());
        let text = kind.render(&grid);
        written.push(storage::write_table(&cfg.output_dir, &kind, &text)?);
    }
    Ok(written)
}

/// Handle export operations (JSON and CSV).
fn handle_exports(args: &Cli, report: &Report) -> Result<()> {
    if let Some(p) = args.export_json.as_deref() {
        storage::export_json(p, report)?;
    }
    if let Some(p) = args.export_csv.as_deref() {
        storage::export_csv(p, report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = vec!["bench-report"];
        argv.extend_from_slice(extra);
        Cli::parse_from(argv)
    }

    #[test]
    fn defaults_match_benchmark_layout() {
        let cfg = build_config(&parse(&[])).unwrap();
        assert_eq!(cfg.logs_dir, PathBuf::from("logs"));
        assert_eq!(cfg.percentiles, vec![50.0, 90.0, 95.0, 99.0, 99.5, 99.9]);
        assert_eq!(cfg.cumulative_points, 2000);
        assert_eq!((cfg.leader_node, cfg.follower_node), (1, 2));
        assert!(cfg.charts);
        assert!(!cfg.include_cross_cluster);
    }

    #[test]
    fn percentiles_are_comma_separated() {
        let cfg = build_config(&parse(&["--percentiles", "10,99.99"])).unwrap();
        assert_eq!(cfg.percentiles, vec![10.0, 99.99]);
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(build_config(&parse(&["--percentiles", "101"])).is_err());
        assert!(build_config(&parse(&["--leader-node", "2"])).is_err());
        assert!(build_config(&parse(&["--cumulative-points", "0"])).is_err());
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_level(&parse(&[])), "warn");
        assert_eq!(log_level(&parse(&["-vv"])), "debug");
        assert_eq!(log_level(&parse(&["-q", "-v"])), "error");
    }
}
