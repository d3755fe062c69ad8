//! Interaction controller
//!
//! Owns the history window and the render context, and turns input
//! actions into state changes. Everything here runs on the UI loop.

use std::path::PathBuf;

use crossterm::event::KeyCode;
use ratatui::{buffer::Buffer, layout::Rect};

use crate::config::Config;
use crate::error::MeterError;
use crate::history::{HistoryWindow, Sample, HISTORY_SLACK};

use super::export;
use super::render::{FrameRenderer, FrameStats, RenderContext};
use super::terminal::BufferSurface;
use super::widgets::LoudnessView;

/// User-level actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleMode,
    ExportFrame,
    Resize { width: u16, height: u16 },
}

impl Action {
    /// Map a key to its action; unknown keys map to nothing
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('y') => Some(Action::ToggleMode),
            KeyCode::Char('s') => Some(Action::ExportFrame),
            _ => None,
        }
    }
}

/// Result of applying an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Redraw,
    Exported(PathBuf),
    Quit,
}

/// Meter state driven by samples and input
pub struct Controller {
    renderer: FrameRenderer,
    history: HistoryWindow,
    context: RenderContext,
    export_path: PathBuf,
}

impl Controller {
    pub fn new(config: &Config, width: u16, height: u16) -> Self {
        Self {
            renderer: FrameRenderer::new(config),
            history: HistoryWindow::new(config.history_len().saturating_add(HISTORY_SLACK)),
            context: RenderContext {
                mode: config.mode,
                width,
                height,
            },
            export_path: config.export_path.clone(),
        }
    }

    pub fn context(&self) -> RenderContext {
        self.context
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Store a new sample
    pub fn ingest(&mut self, sample: Sample) -> Result<(), MeterError> {
        self.history.append(sample)
    }

    /// Apply an action to the meter state
    pub fn apply(&mut self, action: Action) -> Result<Outcome, MeterError> {
        match action {
            Action::Quit => Ok(Outcome::Quit),
            Action::ToggleMode => {
                self.context.mode = self.context.mode.toggled();
                log::debug!("Display mode is now {:?}", self.context.mode);
                Ok(Outcome::Redraw)
            }
            Action::ExportFrame => self.export_frame().map(Outcome::Exported),
            Action::Resize { width, height } => {
                self.context.width = width;
                self.context.height = height;
                Ok(Outcome::Redraw)
            }
        }
    }

    /// Render the current frame into a buffer of the cached size
    pub fn render_offscreen(&self) -> Result<(Buffer, FrameStats), MeterError> {
        let area = Rect::new(0, 0, self.context.width, self.context.height);
        let mut buf = Buffer::empty(area);
        let stats = {
            let mut surface = BufferSurface::new(&mut buf, area);
            self.renderer.render(&mut surface, &self.context, &self.history)?
        };
        Ok((buf, stats))
    }

    /// Render the current frame offscreen and write it to the export path
    pub fn export_frame(&self) -> Result<PathBuf, MeterError> {
        let (buf, _) = self.render_offscreen()?;
        export::write_frame(&buf, &self.export_path)?;
        log::info!("Saved frame to {}", self.export_path.display());
        Ok(self.export_path.clone())
    }

    /// Widget drawing the live frame
    pub fn view(&self) -> LoudnessView<'_> {
        LoudnessView::new(&self.renderer, &self.history, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::DisplayMode;
    use ratatui::style::Color;

    fn controller_with_samples(config: &Config) -> Controller {
        let mut controller = Controller::new(config, 60, 30);
        for t in 1..=20u64 {
            controller.ingest(Sample::flat(t, -30.0 + t as f64)).unwrap();
        }
        controller
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Action::from_key(KeyCode::Enter), Some(Action::Quit));
        assert_eq!(Action::from_key(KeyCode::Char(' ')), Some(Action::Quit));
        assert_eq!(Action::from_key(KeyCode::Char('y')), Some(Action::ToggleMode));
        assert_eq!(Action::from_key(KeyCode::Char('s')), Some(Action::ExportFrame));
        assert_eq!(Action::from_key(KeyCode::Char('x')), None);
        assert_eq!(Action::from_key(KeyCode::F(1)), None);
    }

    #[test]
    fn test_toggle_twice_restores_mode() {
        let mut controller = Controller::new(&Config::default(), 80, 24);
        assert_eq!(controller.context().mode, DisplayMode::Relative);

        assert_eq!(controller.apply(Action::ToggleMode).unwrap(), Outcome::Redraw);
        assert_eq!(controller.context().mode, DisplayMode::Absolute);
        controller.apply(Action::ToggleMode).unwrap();
        assert_eq!(controller.context().mode, DisplayMode::Relative);
    }

    #[test]
    fn test_resize_updates_context() {
        let mut controller = controller_with_samples(&Config::default());
        controller.apply(Action::Resize { width: 100, height: 40 }).unwrap();

        let (buf, _) = controller.render_offscreen().unwrap();
        assert_eq!(buf.area, Rect::new(0, 0, 100, 40));
    }

    #[test]
    fn test_quit() {
        let mut controller = Controller::new(&Config::default(), 80, 24);
        assert_eq!(controller.apply(Action::Quit).unwrap(), Outcome::Quit);
    }

    #[test]
    fn test_rejected_sample_keeps_history() {
        let mut controller = controller_with_samples(&Config::default());
        let err = controller.ingest(Sample::flat(3, -10.0)).unwrap_err();

        assert!(matches!(err, MeterError::OutOfOrderSample { .. }));
        assert_eq!(controller.history().len(), 20);
        assert_eq!(controller.history().latest().unwrap().timestamp, 20);
    }

    #[test]
    fn test_history_is_bounded() {
        let config = Config::default();
        let mut controller = Controller::new(&config, 80, 24);
        for t in 1..=500u64 {
            controller.ingest(Sample::flat(t, -23.0)).unwrap();
        }
        assert_eq!(controller.history().len(), config.history_len() + HISTORY_SLACK);
    }

    #[test]
    fn test_unvalidated_timing_does_not_overflow() {
        let config = Config {
            timeframe_ms: u64::MAX,
            interval_ms: 1,
            ..Config::default()
        };
        let mut controller = Controller::new(&config, 80, 24);
        controller.ingest(Sample::flat(1, -23.0)).unwrap();

        let (_, stats) = controller.render_offscreen().unwrap();
        assert_eq!(stats.graph_points, 1);
    }

    #[test]
    fn test_export_without_samples() {
        let controller = Controller::new(&Config::default(), 80, 24);
        assert!(matches!(controller.export_frame(), Err(MeterError::EmptyWindow)));
    }

    #[test]
    fn test_failed_export_then_toggle() {
        let config = Config {
            export_path: std::env::temp_dir()
                .join("r128view-no-such-dir")
                .join("frame.ans"),
            ..Config::default()
        };
        let mut controller = controller_with_samples(&config);
        let (before, _) = controller.render_offscreen().unwrap();

        let err = controller.apply(Action::ExportFrame).unwrap_err();
        assert!(matches!(err, MeterError::ExportWriteFailure { .. }));

        assert_eq!(controller.apply(Action::ToggleMode).unwrap(), Outcome::Redraw);
        assert_eq!(controller.context().mode, DisplayMode::Absolute);

        let (after, stats) = controller.render_offscreen().unwrap();
        assert!(stats.skipped.is_empty());
        assert_ne!(before, after);

        // Scale labels switch to absolute values; the background stays put
        assert_eq!(after[(0, 0)].bg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_export_writes_file() {
        let path = std::env::temp_dir().join(format!("r128view-controller-{}.ans", std::process::id()));
        let config = Config {
            export_path: path.clone(),
            ..Config::default()
        };
        let mut controller = controller_with_samples(&config);

        assert_eq!(
            controller.apply(Action::ExportFrame).unwrap(),
            Outcome::Exported(path.clone())
        );
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(written.lines().count(), 30);
        assert!(written.contains("TARGET: -23 LUFS"));
    }
}
