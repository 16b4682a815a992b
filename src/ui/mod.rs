use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    assets::Background,
    audio::{ImpactCue, Silent, TerminalBell},
    config::Settings,
    core::{Population, TickReport},
    input::{PointerEvent, Selection},
    render::{self, FrameBuffer, RenderCell, Surface},
    types::{Rgb, Vec2},
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub fn run(settings: Settings) -> Result<()> {
    let mut terminal = setup_terminal().context("failed to initialize terminal")?;
    let result = App::new(settings).run(&mut terminal);
    let restored = shutdown_terminal(&mut terminal).context("failed to restore terminal");
    result.and(restored)
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn shutdown_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

struct App {
    population: Population,
    selection: Selection,
    background: Background,
    cue: Box<dyn ImpactCue>,
    framebuf: FrameBuffer,
    viewport: Rect,
    frame_interval: Duration,
    infinite: bool,
    active: bool,
    last_tick: TickReport,
    fps: FpsMeter,
}

impl App {
    fn new(settings: Settings) -> Self {
        let cue: Box<dyn ImpactCue> = if settings.display.sound {
            Box::new(TerminalBell::stdout())
        } else {
            Box::new(Silent)
        };
        let background = match settings.display.background.clone() {
            Some(path) => Background::load(path),
            None => Background::none(),
        };
        Self {
            population: Population::new(&settings),
            selection: Selection::default(),
            background,
            cue,
            framebuf: FrameBuffer::new(0, 0),
            viewport: Rect::default(),
            frame_interval: Duration::from_secs_f64(1.0 / settings.display.fps as f64),
            infinite: settings.population.infinite,
            active: false,
            last_tick: TickReport::default(),
            fps: FpsMeter::new(),
        }
    }

    fn run(&mut self, terminal: &mut Term) -> Result<()> {
        let mut next_frame = Instant::now();
        loop {
            let now = Instant::now();
            if now >= next_frame {
                self.frame(terminal, now)?;
                next_frame = now + self.frame_interval;
            }

            let timeout = next_frame.saturating_duration_since(Instant::now());
            if event::poll(timeout)? && self.handle_event(event::read()?) == Control::Quit {
                tracing::info!(stats = ?self.population.stats(), "quit");
                return Ok(());
            }
        }
    }

    fn frame(&mut self, terminal: &mut Term, now: Instant) -> Result<()> {
        let chunks = layout(terminal.size()?);
        let canvas_block = Block::default().borders(Borders::ALL).title("Canvas");
        self.ensure_viewport(canvas_block.inner(chunks[1]));

        self.framebuf.clear();
        self.background.draw(&mut self.framebuf);
        if self.active {
            self.last_tick =
                self.population
                    .tick(&mut self.framebuf, self.cue.as_mut(), now, self.infinite);
        }
        self.fps.record(now);

        let header = Paragraph::new(self.status_line())
            .block(Block::default().borders(Borders::ALL).title("splitbounce"));
        let canvas = if self.active {
            Paragraph::new(framebuffer_lines(&self.framebuf))
        } else {
            Paragraph::new(prompt_lines(self.viewport.height)).alignment(Alignment::Center)
        }
        .block(canvas_block);
        let footer = Paragraph::new(self.controls_line())
            .block(Block::default().borders(Borders::ALL).title("Controls"));

        terminal.draw(|frame| {
            frame.render_widget(header, chunks[0]);
            frame.render_widget(canvas, chunks[1]);
            frame.render_widget(footer, chunks[2]);
        })?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let stats = self.population.stats();
        let tick = self.last_tick;
        format!(
            "bodies: {} | dragged: {} | spawned: {} (+{}) | culled: {} (-{}) | contacts: {}{} | frame: {} | fps: {:.1}",
            stats.live,
            stats.dragged,
            stats.spawned_total,
            tick.spawned,
            stats.culled_total,
            tick.culled,
            tick.ground_contacts,
            if tick.cue_fired { " *" } else { "" },
            stats.frames,
            self.fps.fps
        )
    }

    fn controls_line(&self) -> String {
        format!(
            "a: select all [{}] | i: infinite [{}] | Enter/click: start | r: restart | q: quit",
            on_off(self.selection.select_all()),
            on_off(self.infinite)
        )
    }

    fn ensure_viewport(&mut self, area: Rect) {
        self.viewport = area;
        if self.framebuf.width() != area.width || self.framebuf.height() != area.height {
            self.framebuf.resize(area.width, area.height);
        }
    }

    fn handle_event(&mut self, event: CrosstermEvent) -> Control {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
                KeyCode::Char('a') => {
                    self.selection.toggle_select_all(&mut self.population);
                }
                KeyCode::Char('i') => {
                    self.infinite = !self.infinite;
                    tracing::info!(infinite = self.infinite, "infinite spawning toggled");
                }
                KeyCode::Char('r') => self.start(),
                KeyCode::Enter if !self.active => self.start(),
                _ => {}
            },
            CrosstermEvent::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        Control::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let inside = contains(self.viewport, mouse.column, mouse.row);
        let point = pointer_position(self.viewport, mouse.column, mouse.row);
        let pointer = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if inside => {
                if !self.active {
                    self.start();
                    return;
                }
                PointerEvent::Start(point)
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                PointerEvent::Move(point)
            }
            MouseEventKind::Up(MouseButton::Left) => PointerEvent::End,
            _ => return,
        };
        if self.active {
            self.selection.handle(pointer, &mut self.population);
        }
    }

    fn start(&mut self) {
        let restart = self.active;
        self.population.reset(self.framebuf.bounds());
        self.last_tick = TickReport::default();
        self.active = true;
        tracing::info!(restart, bounds = ?self.framebuf.bounds(), "simulation started");
    }
}

fn layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && row >= area.y
        && column < area.x.saturating_add(area.width)
        && row < area.y.saturating_add(area.height)
}

/// Canvas-pixel position of a terminal cell, clamped into the viewport.
fn pointer_position(area: Rect, column: u16, row: u16) -> Vec2 {
    let x = column
        .saturating_sub(area.x)
        .min(area.width.saturating_sub(1));
    let y = row.saturating_sub(area.y).min(area.height.saturating_sub(1));
    render::cell_center(x, y)
}

fn framebuffer_lines(framebuf: &FrameBuffer) -> Vec<Line<'static>> {
    (0..framebuf.height())
        .map(|y| {
            let spans: Vec<Span> = (0..framebuf.width())
                .map(|x| {
                    let cell = framebuf.get(x, y);
                    Span::styled(cell.ch.to_string(), cell_style(cell))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn cell_style(cell: RenderCell) -> Style {
    let style = Style::default().fg(color_for(cell.fg));
    match cell.bg {
        Some(bg) => style.bg(color_for(bg)),
        None => style,
    }
}

fn prompt_lines(height: u16) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""); (height / 2).saturating_sub(1) as usize];
    lines.push(Line::from("click or press Enter to drop a ball"));
    lines.push(Line::from(
        "drag circles with the mouse, a: grab all, i: no population cap",
    ));
    lines
}

fn color_for(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

struct FpsMeter {
    frames: u32,
    since: Instant,
    fps: f32,
}

impl FpsMeter {
    fn new() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
            fps: 0.0,
        }
    }

    fn record(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.since = now;
        }
    }
}
