use crate::cli::Cli;
use crate::engine;
use crate::model::{
    Algorithm, Marker, Outcome, RunSummary, Step, VizEvent, MAX_DELAY_MS, MAX_SIZE, MIN_DELAY_MS,
    MIN_SIZE,
};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::RngCore;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// How many bars the sorted sweep advances per draw tick.
const SWEEP_BARS_PER_TICK: usize = 2;

struct UiState {
    algorithm: Algorithm,
    size: usize,
    delay_ms: u64,
    seed: u64,
    running: bool,
    paused: bool,

    values: Vec<u32>,
    highlight: Option<Step>,
    comparisons: u64,
    swaps: u64,
    steps: u64,
    progress: f64,
    run_start: Instant,

    info: String,
    status: String,
    last_summary: Option<RunSummary>,
    // Front of the green completion sweep; None when no sweep is active.
    sweep: Option<usize>,
    show_help: bool,
}

impl UiState {
    fn new(args: &Cli, seed: u64) -> Self {
        Self {
            algorithm: args.algorithm,
            size: args.size,
            delay_ms: args.delay_ms,
            seed,
            running: false,
            paused: false,
            values: engine::Dataset::generate(args.size, seed).into_values(),
            highlight: None,
            comparisons: 0,
            swaps: 0,
            steps: 0,
            progress: 0.0,
            run_start: Instant::now(),
            info: String::new(),
            status: "Press 'r' to start".into(),
            last_summary: None,
            sweep: None,
            show_help: false,
        }
    }

    /// Regenerate the idle preview after shuffle/resize/algorithm changes.
    fn reset_preview(&mut self) {
        self.values = engine::Dataset::generate(self.size, self.seed).into_values();
        self.highlight = None;
        self.sweep = None;
        self.progress = 0.0;
        self.comparisons = 0;
        self.swaps = 0;
        self.steps = 0;
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure and task switching in the hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<VizEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&args, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<VizEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(&args, seed);

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            advance_sweep(&mut state);
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('p')) | (_, KeyCode::Char(' ')) => {
                        if state.running {
                            state.paused = !state.paused;
                            let _ = cmd_tx.send(UiCommand::Pause(state.paused));
                            state.status = if state.paused {
                                "Paused".into()
                            } else {
                                format!("Running {}…", state.algorithm)
                            };
                        }
                    }
                    (_, KeyCode::Char('r')) => {
                        let _ = cmd_tx.send(UiCommand::Restart);
                    }
                    (_, KeyCode::Char('s')) => {
                        if !state.running {
                            state.seed = rand::thread_rng().next_u64();
                            state.reset_preview();
                            state.status = "Shuffled".into();
                            let _ = cmd_tx.send(UiCommand::Shuffle(state.seed));
                        }
                    }
                    (_, KeyCode::Left) => {
                        if !state.running {
                            state.size = state.size.saturating_sub(5).max(MIN_SIZE);
                            state.reset_preview();
                            state.status = format!("{} elements", state.size);
                            let _ = cmd_tx.send(UiCommand::SetSize(state.size));
                        }
                    }
                    (_, KeyCode::Right) => {
                        if !state.running {
                            state.size = (state.size + 5).min(MAX_SIZE);
                            state.reset_preview();
                            state.status = format!("{} elements", state.size);
                            let _ = cmd_tx.send(UiCommand::SetSize(state.size));
                        }
                    }
                    (_, KeyCode::Char('a')) | (_, KeyCode::Tab) => {
                        if !state.running {
                            state.algorithm = state.algorithm.next();
                            state.status = format!("Algorithm: {}", state.algorithm);
                            let _ = cmd_tx.send(UiCommand::SetAlgorithm(state.algorithm));
                        }
                    }
                    (_, KeyCode::Up) | (_, KeyCode::Char('+')) => {
                        state.delay_ms = (state.delay_ms + 10).min(MAX_DELAY_MS);
                        let _ = cmd_tx.send(UiCommand::SetDelay(state.delay_ms));
                    }
                    (_, KeyCode::Down) | (_, KeyCode::Char('-')) => {
                        state.delay_ms = state.delay_ms.saturating_sub(10).max(MIN_DELAY_MS);
                        let _ = cmd_tx.send(UiCommand::SetDelay(state.delay_ms));
                    }
                    (_, KeyCode::Char('?')) => {
                        state.show_help = !state.show_help;
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn apply_event(state: &mut UiState, ev: VizEvent) {
    match ev {
        VizEvent::RunStarted {
            algorithm,
            values,
            delay_ms,
        } => {
            state.algorithm = algorithm;
            state.size = values.len();
            state.values = values;
            state.delay_ms = delay_ms;
            state.running = true;
            state.paused = false;
            state.highlight = None;
            state.sweep = None;
            state.comparisons = 0;
            state.swaps = 0;
            state.steps = 0;
            state.progress = 0.0;
            state.run_start = Instant::now();
            state.info.clear();
            state.status = format!("Running {}…", algorithm);
        }
        VizEvent::Step(step) => {
            for &(idx, v) in &step.writes {
                if let Some(slot) = state.values.get_mut(idx) {
                    *slot = v;
                }
            }
            state.comparisons = step.comparisons;
            state.swaps = step.swaps;
            state.steps += 1;
            state.progress = step.progress;
            state.highlight = Some(step);
        }
        VizEvent::Info(info) => {
            state.info = info.to_message();
        }
        VizEvent::RunFinished { summary } => {
            state.running = false;
            state.paused = false;
            state.highlight = None;
            state.values = summary.values.clone();
            state.comparisons = summary.comparisons;
            state.swaps = summary.swaps;
            state.steps = summary.steps;
            match summary.outcome {
                Outcome::Completed => {
                    state.progress = 1.0;
                    state.status = "Sorting completed!".into();
                    state.sweep = Some(0);
                }
                Outcome::Cancelled => {
                    state.status = "Cancelled".into();
                }
            }
            state.last_summary = Some(*summary);
        }
    }
}

/// Advance the green completion sweep a few bars per draw tick.
fn advance_sweep(state: &mut UiState) {
    if let Some(front) = state.sweep {
        if front >= state.values.len() {
            return;
        }
        state.sweep = Some((front + SWEEP_BARS_PER_TICK).min(state.values.len()));
    }
}

fn marker_color(marker: Marker) -> Color {
    match marker {
        Marker::Comparing => Color::Red,
        Marker::Swapping => Color::Yellow,
        Marker::PivotSelect => Color::Magenta,
        Marker::RangeActive => Color::Cyan,
        Marker::Sorted => Color::Green,
    }
}

fn bar_color(state: &UiState, i: usize) -> Color {
    if let Some(front) = state.sweep {
        if i < front {
            return Color::Green;
        }
    }
    if let Some(step) = &state.highlight {
        if step.primary == Some(i) || step.secondary == Some(i) {
            return marker_color(step.marker);
        }
    }
    Color::LightBlue
}

fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(area);

    draw_header(rows[0], f, state);
    if state.show_help {
        draw_help(rows[1], f);
    } else {
        draw_bars(rows[1], f, state);
    }
    draw_gauge(rows[2], f, state);
    draw_status(rows[3], f, state);
}

fn draw_header(area: Rect, f: &mut Frame, state: &UiState) {
    let mode = if state.paused {
        "PAUSED"
    } else if state.running {
        "RUNNING"
    } else {
        "IDLE"
    };
    let header = Line::from(vec![
        Span::styled(
            format!(" {} ", state.algorithm),
            Style::default().fg(Color::White),
        ),
        Span::raw(format!(
            "| n={} | delay={}ms | seed={} | ",
            state.size, state.delay_ms, state.seed
        )),
        Span::styled(
            mode,
            Style::default().fg(if state.paused {
                Color::Yellow
            } else if state.running {
                Color::Green
            } else {
                Color::Gray
            }),
        ),
    ]);
    let block = Block::default().borders(Borders::ALL).title("sortviz");
    f.render_widget(Paragraph::new(header).block(block), area);
}

fn draw_bars(area: Rect, f: &mut Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL);
    let inner_width = area.width.saturating_sub(2) as usize;
    let n = state.values.len().max(1);

    // Fit one bar per element; shrink width before giving up the gap.
    let (bar_width, bar_gap) = if inner_width >= n * 2 {
        (((inner_width / n) - 1).min(4) as u16, 1u16)
    } else {
        (1u16, 0u16)
    };

    let bars: Vec<Bar> = state
        .values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            Bar::default()
                .value(u64::from(v))
                .text_value(String::new())
                .style(Style::default().fg(bar_color(state, i)))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width.max(1))
        .bar_gap(bar_gap)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn draw_gauge(area: Rect, f: &mut Frame, state: &UiState) {
    let ratio = state.progress.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0));
    f.render_widget(gauge, area);
}

fn draw_status(area: Rect, f: &mut Frame, state: &UiState) {
    let elapsed = if state.running {
        state.run_start.elapsed().as_secs_f64()
    } else {
        state
            .last_summary
            .as_ref()
            .map(|s| s.duration_ms as f64 / 1000.0)
            .unwrap_or(0.0)
    };
    let mut lines = vec![
        Line::from(format!(
            "comparisons: {}   swaps: {}   steps: {}   elapsed: {:.1}s",
            state.comparisons, state.swaps, state.steps, elapsed
        )),
        Line::from(Span::styled(
            "r run/restart  p/space pause  s shuffle  a/Tab algorithm  ←/→ size  ↑/↓ delay  ? help  q quit",
            Style::default().fg(Color::Gray),
        )),
    ];
    if !state.status.is_empty() || !state.info.is_empty() {
        let msg = if state.info.is_empty() {
            state.status.clone()
        } else {
            format!("{}  {}", state.status, state.info)
        };
        lines.insert(0, Line::from(Span::styled(msg, Style::default().fg(Color::Cyan))));
    }
    let block = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(area: Rect, f: &mut Frame) {
    let lines = vec![
        Line::from("r        start or restart the current algorithm"),
        Line::from("p, space pause / resume the run"),
        Line::from("s        shuffle the dataset (idle only)"),
        Line::from("a, Tab   cycle algorithms (idle only)"),
        Line::from("←, →     shrink / grow the dataset by 5 (idle only)"),
        Line::from("↑, ↓     slow down / speed up by 10 ms (applies live)"),
        Line::from("?        toggle this help"),
        Line::from("q        quit"),
    ];
    let block = Block::default().borders(Borders::ALL).title("Keys");
    f.render_widget(Paragraph::new(lines).block(block), area);
}
