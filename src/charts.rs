//! Chart series built from the result grid, and their text rendering.
//!
//! Series are kept in natural units so they can be handed to an external
//! plotter as JSON; log axes are applied only when drawing.

use crate::metrics::LatencyDistribution;
use crate::model::{CpuMode, RequestResult, Role};
use crate::orchestrator::ResultGrid;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};
use serde::Serialize;

const TARGET_BPS_BOUNDS: [f64; 2] = [5e6, 250e6];

/// Colours assigned to payload sizes in ascending order.
const SIZE_COLORS: [Color; 10] = [
    Color::Blue,
    Color::Magenta,
    Color::LightRed,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::LightMagenta,
    Color::LightYellow,
    Color::LightGreen,
    Color::LightCyan,
];

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub label: String,
    pub size_index: usize,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_log: bool,
    pub y_log: bool,
    pub x_bounds: [f64; 2],
    pub y_bounds: Option<[f64; 2]>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub name: String,
    pub title: String,
    pub columns: usize,
    pub panels: Vec<Panel>,
}

/// One series per payload size, x = target bandwidth in B/s.
fn series_by_size(
    grid: &ResultGrid<'_>,
    y: impl Fn(&RequestResult) -> Option<f64>,
) -> Vec<Series> {
    grid.sizes()
        .iter()
        .enumerate()
        .map(|(si, size)| Series {
            label: format!("{size} B"),
            size_index: si,
            points: grid
                .column(si)
                .filter_map(|r| y(r).map(|v| (r.target_bps(), v)))
                .collect(),
        })
        .collect()
}

fn bandwidth_panel(title: &str, y_label: &str, y_log: bool, y_bounds: Option<[f64; 2]>, series: Vec<Series>) -> Panel {
    Panel {
        title: title.to_string(),
        x_label: "Target bandwidth (B/s)".into(),
        y_label: y_label.to_string(),
        x_log: true,
        y_log,
        x_bounds: TARGET_BPS_BOUNDS,
        y_bounds,
        series,
    }
}

pub fn cpu_usage(grid: &ResultGrid<'_>) -> ChartData {
    let mut panels = Vec::new();
    for role in [Role::Leader, Role::Follower] {
        for mode in [CpuMode::User, CpuMode::System] {
            let who = match role {
                Role::Leader => "Leader",
                Role::Follower => "Follower",
            };
            panels.push(bandwidth_panel(
                &format!("{who} {}", mode.label()),
                &format!("{who} CPU %"),
                false,
                Some([0.0, 100.0]),
                series_by_size(grid, |r| r.cpu_percent(role, mode)),
            ));
        }
    }
    ChartData {
        name: "cpu-usage".into(),
        title: "CPU usage".into(),
        columns: 2,
        panels,
    }
}

pub fn transaction_rate(grid: &ResultGrid<'_>) -> ChartData {
    ChartData {
        name: "transaction-rate".into(),
        title: "Write rate by target bandwidth".into(),
        columns: 1,
        panels: vec![bandwidth_panel(
            "Write rate",
            "Write rate (Hz)",
            true,
            Some([5e3, 2.5e6]),
            series_by_size(grid, RequestResult::write_rate_hz),
        )],
    }
}

pub fn data_rate(grid: &ResultGrid<'_>) -> ChartData {
    ChartData {
        name: "data-rate".into(),
        title: "Fraction of target bandwidth delivered".into(),
        columns: 1,
        panels: vec![bandwidth_panel(
            "Delivered",
            "% of target delivered",
            false,
            Some([0.0, 101.0]),
            series_by_size(grid, RequestResult::delivered_percent),
        )],
    }
}

pub fn mean_ack_size(grid: &ResultGrid<'_>) -> ChartData {
    ChartData {
        name: "mean-ack-size".into(),
        title: "Batch size by target bandwidth".into(),
        columns: 1,
        panels: vec![bandwidth_panel(
            "Mean batch size",
            "Mean batch size (B)",
            true,
            None,
            series_by_size(grid, |r| r.mean_ack_size().map(|b| b as f64)),
        )],
    }
}

/// Exceedance curves, one panel per target rate.
pub fn latency_distributions(grid: &ResultGrid<'_>, points: usize) -> ChartData {
    let panels = grid
        .rates()
        .iter()
        .enumerate()
        .map(|(ri, rate)| Panel {
            title: format!("{rate} MB/s"),
            x_label: "Latency (s)".into(),
            y_label: "P(exceedance)".into(),
            x_log: true,
            y_log: true,
            x_bounds: [5e-4, 5e-1],
            y_bounds: Some([1e-3, 1.1]),
            series: grid
                .row(ri)
                .map(|(si, r)| Series {
                    label: format!("{} B", r.size_b),
                    size_index: si,
                    points: LatencyDistribution::new(&r.latencies).exceedance(points),
                })
                .collect(),
        })
        .collect();
    ChartData {
        name: "latency-distributions".into(),
        title: "Latency distributions".into(),
        columns: 4,
        panels,
    }
}

pub fn all_charts(grid: &ResultGrid<'_>, cumulative_points: usize) -> Vec<ChartData> {
    vec![
        cpu_usage(grid),
        transaction_rate(grid),
        data_rate(grid),
        mean_ack_size(grid),
        latency_distributions(grid, cumulative_points),
    ]
}

fn to_axis(v: f64, log: bool) -> Option<f64> {
    if !log {
        return v.is_finite().then_some(v);
    }
    (v > 0.0 && v.is_finite()).then(|| v.log10())
}

fn from_axis(v: f64, log: bool) -> f64 {
    if log {
        10f64.powf(v)
    } else {
        v
    }
}

fn axis_labels(bounds: [f64; 2], log: bool) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| {
            let n = from_axis(*v, log);
            if log || n.abs() >= 1e4 {
                format!("{n:.1e}")
            } else {
                format!("{n:.0}")
            }
        })
        .collect()
}

/// Data bounds in axis space, padded so edge points stay visible.
fn fitted_bounds(points: &[Vec<(f64, f64)>]) -> [f64; 2] {
    let (lo, hi) = points
        .iter()
        .flatten()
        .map(|(_, y)| *y)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(0.1);
    [lo - pad, hi + pad]
}

/// Draw one panel into `area` of `buf`.
pub fn draw_panel(panel: &Panel, area: Rect, buf: &mut Buffer) {
    let transformed: Vec<Vec<(f64, f64)>> = panel
        .series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter_map(|(x, y)| Some((to_axis(*x, panel.x_log)?, to_axis(*y, panel.y_log)?)))
                .collect()
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(panel.title.clone());
    if transformed.iter().all(Vec::is_empty) {
        Paragraph::new("No data").block(block).render(area, buf);
        return;
    }

    let x_bounds = panel.x_bounds.map(|v| to_axis(v, panel.x_log).unwrap_or(0.0));
    let y_bounds = match panel.y_bounds {
        Some(b) => b.map(|v| to_axis(v, panel.y_log).unwrap_or(0.0)),
        None => fitted_bounds(&transformed),
    };

    let datasets: Vec<Dataset> = panel
        .series
        .iter()
        .zip(&transformed)
        .map(|(s, pts)| {
            Dataset::default()
                .name(s.label.clone())
                .graph_type(GraphType::Line)
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(SIZE_COLORS[s.size_index % SIZE_COLORS.len()]))
                .data(pts)
        })
        .collect();

    Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(panel.x_label.clone())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, panel.x_log)),
        )
        .y_axis(
            Axis::default()
                .title(panel.y_label.clone())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, panel.y_log)),
        )
        .render(area, buf);
}

/// Draw every panel of `chart` in a grid of `chart.columns` columns.
pub fn draw_chart(chart: &ChartData, area: Rect, buf: &mut Buffer) {
    let columns = chart.columns.max(1);
    let rows = chart.panels.len().div_ceil(columns).max(1);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);
    for (ri, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);
        for (ci, cell) in cells.iter().enumerate() {
            if let Some(panel) = chart.panels.get(ri * columns + ci) {
                draw_panel(panel, *cell, buf);
            }
        }
    }
}

/// Render `chart` off-screen and return it as plain text.
pub fn render_text(chart: &ChartData, width: u16, height: u16) -> String {
    let rows = chart.panels.len().div_ceil(chart.columns.max(1)).max(1) as u16;
    let area = Rect::new(0, 0, width, height.saturating_mul(rows).max(height));
    let mut buf = Buffer::empty(area);
    draw_chart(chart, area, &mut buf);

    let mut out = format!("{}\n", chart.title);
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buf[(x, y)].symbol())
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::sample_result;

    fn grid_results() -> Vec<RequestResult> {
        vec![
            sample_result(10, 100),
            sample_result(100, 100),
            sample_result(10, 1000),
        ]
    }

    #[test]
    fn bandwidth_series_follow_sizes() {
        let rs = grid_results();
        let grid = ResultGrid::new(&rs);
        let chart = transaction_rate(&grid);
        let series = &chart.panels[0].series;
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "100 B");
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[0].0, 10e6);
        assert_eq!(series[1].points.len(), 1);
    }

    #[test]
    fn cpu_usage_has_four_panels() {
        let rs = grid_results();
        let grid = ResultGrid::new(&rs);
        let chart = cpu_usage(&grid);
        let titles: Vec<&str> = chart.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Leader User", "Leader System", "Follower User", "Follower System"]);
        // 6 s of leader user time over a 60 s window.
        assert_eq!(chart.panels[0].series[0].points[0].1, 10.0);
    }

    #[test]
    fn latency_panels_per_rate() {
        let rs = grid_results();
        let grid = ResultGrid::new(&rs);
        let chart = latency_distributions(&grid, 100);
        assert_eq!(chart.panels.len(), 2);
        assert_eq!(chart.panels[0].title, "10 MB/s");
        assert_eq!(chart.panels[0].series.len(), 2);
        assert_eq!(chart.panels[0].series[0].points.len(), 101);
    }

    #[test]
    fn text_rendering_contains_titles() {
        let rs = grid_results();
        let grid = ResultGrid::new(&rs);
        let text = render_text(&cpu_usage(&grid), 80, 20);
        assert!(text.starts_with("CPU usage\n"));
        assert!(text.contains("Leader User"));
        assert!(text.contains("Follower System"));
        assert_eq!(text.lines().count(), 1 + 40);
    }

    #[test]
    fn empty_panel_renders_placeholder() {
        let grid = ResultGrid::new(&[]);
        let text = render_text(&mean_ack_size(&grid), 40, 6);
        assert!(text.contains("No data"));
    }

    #[test]
    fn log_axis_skips_non_positive() {
        assert_eq!(to_axis(0.0, true), None);
        assert_eq!(to_axis(100.0, true), Some(2.0));
        assert_eq!(to_axis(-1.0, false), Some(-1.0));
    }
}
