mod help;

use crate::charts::{self, ChartData};
use crate::model::{Report, ReportConfig};
use crate::orchestrator::ResultGrid;
use crate::tables::{self, TableKind};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use std::{io, time::Duration};

enum Page {
    Chart(ChartData),
    Table { kind: TableKind, text: String },
}

impl Page {
    fn tab_title(&self) -> String {
        match self {
            Page::Chart(c) => c.name.clone(),
            Page::Table { kind, .. } => kind.file_name().trim_end_matches(".txt").to_string(),
        }
    }
}

struct ViewerState {
    pages: Vec<Page>,
    page: usize,
    show_help: bool,
    info: String,
    /// Opened on first copy. Dropping it clears the selection on X11, so it
    /// lives as long as the viewer.
    clipboard: Option<arboard::Clipboard>,
}

impl ViewerState {
    fn new(cfg: &ReportConfig, report: &Report) -> Self {
        let grid = ResultGrid::new(&report.records);
        let mut pages: Vec<Page> = charts::all_charts(&grid, cfg.cumulative_points)
            .into_iter()
            .map(Page::Chart)
            .collect();
        pages.extend(tables::all_tables(&cfg.percentiles).into_iter().map(|kind| Page::Table {
            text: kind.render(&grid),
            kind,
        }));
        Self {
            pages,
            page: 0,
            show_help: false,
            info: format!(
                "{} requests, {} excluded, {} skipped  (? for help)",
                report.records.len(),
                report.excluded.len(),
                report.skipped
            ),
            clipboard: None,
        }
    }

    fn step(&mut self, forward: bool) {
        let n = self.pages.len().max(1);
        self.page = if forward {
            (self.page + 1) % n
        } else {
            (self.page + n - 1) % n
        };
    }

    fn copy_current(&mut self) {
        let text = match self.pages.get(self.page) {
            Some(Page::Table { text, .. }) => text.clone(),
            _ => {
                self.info = "Only tables can be copied".into();
                return;
            }
        };
        self.info = match self.set_clipboard(text) {
            Ok(()) => "Copied table to clipboard".into(),
            Err(e) => format!("Copy failed: {e:#}"),
        };
    }

    fn set_clipboard(&mut self, text: String) -> Result<()> {
        let mut clipboard = match self.clipboard.take() {
            Some(c) => c,
            None => arboard::Clipboard::new().context("open clipboard")?,
        };
        let copied = clipboard.set_text(text).context("set clipboard text");
        self.clipboard = Some(clipboard);
        copied
    }
}

/// Browse the report's charts and tables until the user quits.
pub fn run(cfg: &ReportConfig, report: &Report) -> Result<()> {
    let mut state = ViewerState::new(cfg, report);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let res = event_loop(&mut terminal, &mut state);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    res
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut ViewerState,
) -> Result<()> {
    loop {
        terminal
            .draw(|f| draw(f.area(), f, state))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(250)).context("poll input")? {
            continue;
        }
        let Event::Key(k) = event::read().context("read input")? else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }
        match (k.modifiers, k.code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                return Ok(());
            }
            (_, KeyCode::Right) | (_, KeyCode::Char('l')) | (_, KeyCode::Tab) => {
                state.step(true)
            }
            (_, KeyCode::Left) | (_, KeyCode::Char('h')) | (_, KeyCode::BackTab) => {
                state.step(false)
            }
            (_, KeyCode::Char('y')) => state.copy_current(),
            (_, KeyCode::Char('?')) => state.show_help = !state.show_help,
            _ => {}
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &ViewerState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);

    let tabs = Tabs::new(
        state
            .pages
            .iter()
            .map(|p| Line::from(p.tab_title()))
            .collect::<Vec<_>>(),
    )
    .select(state.page)
    .block(Block::default().borders(Borders::ALL).title("bench-report"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    if state.show_help {
        help::draw_help(chunks[1], f);
    } else {
        match state.pages.get(state.page) {
            Some(Page::Chart(chart)) => charts::draw_chart(chart, chunks[1], f.buffer_mut()),
            Some(Page::Table { kind, text }) => {
                let p = Paragraph::new(text.as_str())
                    .block(Block::default().borders(Borders::ALL).title(kind.title()));
                f.render_widget(p, chunks[1]);
            }
            None => f.render_widget(Paragraph::new("Nothing to show"), chunks[1]),
        }
    }

    f.render_widget(
        Paragraph::new(state.info.as_str()).style(Style::default().fg(Color::Gray)),
        chunks[2],
    );
}
