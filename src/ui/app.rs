//! Main application state and UI rendering
//!
//! Manages the TUI application lifecycle: drains the sample source, draws
//! the meter and dispatches key and resize events to the controller.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::config::Config;
use crate::error::MeterError;
use crate::source::SampleSource;

use super::controller::{Action, Controller, Outcome};

/// Target frame rate
const TARGET_FPS: u64 = 60;

/// How long a status message stays in the bottom bar
const STATUS_DURATION: Duration = Duration::from_secs(3);

/// Rows reserved below the meter for the help/status bar
const STATUS_HEIGHT: u16 = 1;

/// Transient message shown in place of the help bar
struct Status {
    text: String,
    color: Color,
    since: Instant,
}

/// Main application state
pub struct App {
    /// Sample source handle
    source: SampleSource,

    /// Meter state and actions
    controller: Controller,

    /// Whether the app should quit
    should_quit: bool,

    /// Last frame time
    last_frame: Instant,

    status: Option<Status>,
}

impl App {
    /// Create a new application
    pub fn new(config: &Config, source: SampleSource) -> Self {
        Self {
            source,
            // Sized on the first draw
            controller: Controller::new(config, 0, 0),
            should_quit: false,
            last_frame: Instant::now(),
            status: None,
        }
    }

    /// Run the main application loop
    pub fn run(mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        // Stop the reader thread
        self.source.quit();
        let history = self.controller.history();
        log::debug!("History held {} of {} samples", history.len(), history.capacity());

        result
    }

    /// Main event loop
    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let frame_duration = Duration::from_millis(1000 / TARGET_FPS);

        while !self.should_quit {
            // Process samples from the source thread
            self.process_samples();

            // Draw UI
            terminal.draw(|f| self.render(f))?;

            // Handle input with timeout
            let timeout = frame_duration.saturating_sub(self.last_frame.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = Action::from_key(key.code) {
                            self.dispatch(action);
                        }
                    }
                    Event::Resize(width, height) => self.dispatch(Action::Resize {
                        width,
                        height: height.saturating_sub(STATUS_HEIGHT),
                    }),
                    _ => {}
                }
            }

            self.last_frame = Instant::now();
        }

        Ok(())
    }

    /// Move every pending sample into the history window
    fn process_samples(&mut self) {
        let was_empty = self.controller.history().is_empty();
        while let Some(sample) = self.source.try_recv() {
            if let Err(e) = self.controller.ingest(sample) {
                log::warn!("Dropping sample: {}", e);
            }
        }
        if was_empty && !self.controller.history().is_empty() {
            log::info!("First sample received");
        }
    }

    /// Apply an action and report its outcome
    fn dispatch(&mut self, action: Action) {
        match self.controller.apply(action) {
            Ok(Outcome::Quit) => self.should_quit = true,
            Ok(Outcome::Exported(path)) => {
                self.set_status(format!("Saved frame to {}", path.display()), Color::Green);
            }
            Ok(Outcome::Redraw) => {}
            Err(MeterError::EmptyWindow) => {
                self.set_status("Nothing to save yet".to_string(), Color::Yellow);
            }
            Err(e) => {
                log::error!("{}", e);
                self.set_status(e.to_string(), Color::Red);
            }
        }
    }

    fn set_status(&mut self, text: String, color: Color) {
        self.status = Some(Status {
            text,
            color,
            since: Instant::now(),
        });
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),                // Meter
                Constraint::Length(STATUS_HEIGHT), // Help / status
            ])
            .split(frame.area());

        // Keep the cached size in step with the layout
        let meter = chunks[0];
        let ctx = self.controller.context();
        if (ctx.width, ctx.height) != (meter.width, meter.height) {
            self.dispatch(Action::Resize {
                width: meter.width,
                height: meter.height,
            });
        }

        frame.render_widget(self.controller.view(), meter);
        self.render_status(frame, chunks[1]);
    }

    /// Render the status message, or the key help once it has expired
    fn render_status(&mut self, frame: &mut Frame, area: Rect) {
        if self.status.as_ref().is_some_and(|s| s.since.elapsed() > STATUS_DURATION) {
            self.status = None;
        }

        let line = match &self.status {
            Some(status) => Line::from(Span::styled(status.text.clone(), Style::default().fg(status.color))),
            None => Line::from(vec![
                Span::styled("y", Style::default().fg(Color::Yellow)),
                Span::raw(" LUFS/LU "),
                Span::styled("s", Style::default().fg(Color::Yellow)),
                Span::raw(" Save frame "),
                Span::styled("Space/Enter/q", Style::default().fg(Color::Yellow)),
                Span::raw(" Quit"),
            ]),
        };

        let help = Paragraph::new(line).style(Style::default().fg(Color::Gray));
        frame.render_widget(help, area);
    }
}
