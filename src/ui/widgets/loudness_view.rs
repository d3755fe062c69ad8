//! Loudness view widget
//!
//! Draws a full meter frame (header, scale, graph and gauge) into the
//! terminal buffer, or a placeholder until the first measurement arrives.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Widget},
};

use crate::error::MeterError;
use crate::history::HistoryWindow;
use crate::ui::render::{FrameRenderer, RenderContext};
use crate::ui::terminal::BufferSurface;

/// Placeholder shown while the history is empty
const WAITING_TEXT: &str = "Waiting for measurements...";

/// Widget rendering the current meter frame
pub struct LoudnessView<'a> {
    renderer: &'a FrameRenderer,
    history: &'a HistoryWindow,
    ctx: RenderContext,
}

impl<'a> LoudnessView<'a> {
    pub fn new(renderer: &'a FrameRenderer, history: &'a HistoryWindow, ctx: RenderContext) -> Self {
        Self { renderer, history, ctx }
    }
}

impl Widget for LoudnessView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        // The frame is laid out for the cached size, not the widget area
        let target = Rect {
            width: area.width.min(self.ctx.width),
            height: area.height.min(self.ctx.height),
            ..area
        };

        let mut surface = BufferSurface::new(buf, target);
        match self.renderer.render(&mut surface, &self.ctx, self.history) {
            Ok(stats) => log::trace!(
                "Frame drawn: unit {:?}, label stride {}, {} graph points, skipped {:?}",
                stats.unit,
                stats.label_stride,
                stats.graph_points,
                stats.skipped
            ),
            Err(MeterError::EmptyWindow) => {
                let middle = Rect {
                    y: target.y + target.height / 2,
                    height: 1,
                    ..target
                };
                Paragraph::new(WAITING_TEXT)
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center)
                    .render(middle, buf);
            }
            Err(err) => log::error!("Failed to render frame: {}", err),
        }
    }
}
