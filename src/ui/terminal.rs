//! Terminal drawing surface
//!
//! Paints surface primitives into a ratatui [`Buffer`]. One cell is one
//! pixel and every glyph is one cell tall. A cell belongs to a shape when
//! its center lies inside it. Fills blend into the cell background,
//! strokes and text into the foreground.

use ratatui::{buffer::Buffer, buffer::Cell, layout::Rect, style::Color};

use super::surface::{Argb, Font, Point, Region, Surface, TextExtents};

/// A [`Surface`] backed by an area of a ratatui buffer
pub struct BufferSurface<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    color: Argb,
}

impl<'a> BufferSurface<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect) -> Self {
        let area = area.intersection(buf.area);
        Self {
            buf,
            area,
            color: Argb(0xFFFF_FFFF),
        }
    }

    fn cell(&mut self, x: i64, y: i64) -> Option<&mut Cell> {
        if x < 0 || y < 0 || x >= self.area.width as i64 || y >= self.area.height as i64 {
            return None;
        }
        self.buf
            .cell_mut((self.area.x + x as u16, self.area.y + y as u16))
    }

    fn paint_background(&mut self, x: i64, y: i64) {
        let color = self.color;
        if let Some(cell) = self.cell(x, y) {
            let (r, g, b) = color.over(rgb_of(cell.bg));
            cell.set_symbol(" ").set_bg(Color::Rgb(r, g, b));
        }
    }

    fn paint_glyph(&mut self, x: i64, y: i64, symbol: char) {
        let color = self.color;
        if let Some(cell) = self.cell(x, y) {
            let (r, g, b) = color.over(rgb_of(cell.bg));
            cell.set_char(symbol).set_fg(Color::Rgb(r, g, b));
        }
    }

    /// Draw a horizontal run of glyphs between two x positions
    fn hline(&mut self, y: i64, x0: f64, x1: f64, symbol: char) {
        let (start, end) = span(x0.min(x1), x0.max(x1));
        for x in start..end {
            self.paint_glyph(x, y, symbol);
        }
    }

    fn vline(&mut self, x: i64, y0: f64, y1: f64, symbol: char) {
        let (start, end) = span(y0.min(y1), y0.max(y1));
        for y in start..end {
            self.paint_glyph(x, y, symbol);
        }
    }
}

/// Cells whose centers fall in `[from, to)`
fn span(from: f64, to: f64) -> (i64, i64) {
    ((from - 0.5).ceil() as i64, (to - 0.5).ceil() as i64)
}

fn rgb_of(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (0, 0, 0),
    }
}

impl Surface for BufferSurface<'_> {
    fn clear(&mut self, color: Argb) {
        let (r, g, b) = color.rgb();
        for y in 0..self.area.height as i64 {
            for x in 0..self.area.width as i64 {
                if let Some(cell) = self.cell(x, y) {
                    cell.reset();
                    cell.set_bg(Color::Rgb(r, g, b));
                }
            }
        }
    }

    fn set_color(&mut self, color: Argb) {
        self.color = color;
    }

    fn fill_rect(&mut self, rect: Region) {
        let (x0, x1) = span(rect.x.min(rect.right()), rect.x.max(rect.right()));
        let (y0, y1) = span(rect.y.min(rect.bottom()), rect.y.max(rect.bottom()));
        for y in y0..y1 {
            for x in x0..x1 {
                self.paint_background(x, y);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Region) {
        if rect.w < 1.0 || rect.h < 1.0 {
            return;
        }
        let left = rect.x.floor() as i64;
        let top = rect.y.floor() as i64;
        let right = (rect.right() - 1.0).floor() as i64;
        let bottom = (rect.bottom() - 1.0).floor() as i64;

        for x in left..=right {
            self.paint_glyph(x, top, '─');
            self.paint_glyph(x, bottom, '─');
        }
        for y in top..=bottom {
            self.paint_glyph(left, y, '│');
            self.paint_glyph(right, y, '│');
        }
        if right > left && bottom > top {
            self.paint_glyph(left, top, '┌');
            self.paint_glyph(right, top, '┐');
            self.paint_glyph(left, bottom, '└');
            self.paint_glyph(right, bottom, '┘');
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point) {
        let (row_from, row_to) = (from.y.floor() as i64, to.y.floor() as i64);
        let (col_from, col_to) = (from.x.floor() as i64, to.x.floor() as i64);

        if row_from == row_to {
            self.hline(row_from, from.x, to.x, '─');
        } else if col_from == col_to {
            self.vline(col_from, from.y, to.y, '│');
        } else {
            let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil() as i64;
            for step in 0..=steps {
                let t = step as f64 / steps as f64;
                let x = from.x + (to.x - from.x) * t;
                let y = from.y + (to.y - from.y) * t;
                self.paint_glyph(x.floor() as i64, y.floor() as i64, '·');
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Point]) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let mut crossings = Vec::with_capacity(points.len());
        let (row_start, row_end) = span(min_y, max_y);
        for y in row_start..row_end {
            let scan = y as f64 + 0.5;
            crossings.clear();

            for (i, p) in points.iter().enumerate() {
                let q = points[(i + 1) % points.len()];
                if (p.y <= scan && q.y > scan) || (q.y <= scan && p.y > scan) {
                    crossings.push(p.x + (scan - p.y) * (q.x - p.x) / (q.y - p.y));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for pair in crossings.chunks_exact(2) {
                let (start, end) = span(pair[0], pair[1]);
                for x in start..end {
                    self.paint_background(x, y);
                }
            }
        }
    }

    fn text(&mut self, at: Point, _font: Font, text: &str) {
        let x = at.x.round() as i64;
        let y = at.y.round() as i64;
        for (i, symbol) in text.chars().enumerate() {
            self.paint_glyph(x + i as i64, y, symbol);
        }
    }

    fn text_extents(&self, _font: Font, text: &str) -> TextExtents {
        TextExtents {
            width: text.chars().count() as f64,
            height: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bg(buf: &Buffer, x: u16, y: u16) -> Color {
        buf[(x, y)].bg
    }

    #[test]
    fn test_clear_and_fill() {
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        let mut surface = BufferSurface::new(&mut buf, area);

        surface.clear(Argb(0xFF00_0000));
        surface.set_color(Argb(0xFFDB_6666));
        surface.fill_rect(Region::new(1.0, 1.0, 3.0, 2.0));

        assert_eq!(bg(&buf, 0, 0), Color::Rgb(0, 0, 0));
        assert_eq!(bg(&buf, 1, 1), Color::Rgb(0xDB, 0x66, 0x66));
        assert_eq!(bg(&buf, 3, 2), Color::Rgb(0xDB, 0x66, 0x66));
        assert_eq!(bg(&buf, 4, 1), Color::Rgb(0, 0, 0));
        assert_eq!(bg(&buf, 1, 3), Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_translucent_fill_blends() {
        let area = Rect::new(0, 0, 4, 4);
        let mut buf = Buffer::empty(area);
        let mut surface = BufferSurface::new(&mut buf, area);

        surface.clear(Argb(0xFF64_6464));
        surface.set_color(Argb(0x9900_0000));
        surface.fill_rect(Region::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(bg(&buf, 0, 0), Color::Rgb(40, 40, 40));
        assert_eq!(bg(&buf, 1, 0), Color::Rgb(100, 100, 100));
    }

    #[test]
    fn test_stroke_rect_draws_box() {
        let area = Rect::new(0, 0, 6, 4);
        let mut buf = Buffer::empty(area);
        let mut surface = BufferSurface::new(&mut buf, area);

        surface.stroke_rect(Region::new(0.0, 0.0, 6.0, 4.0));

        assert_eq!(buf[(0, 0)].symbol(), "┌");
        assert_eq!(buf[(5, 0)].symbol(), "┐");
        assert_eq!(buf[(0, 3)].symbol(), "└");
        assert_eq!(buf[(5, 3)].symbol(), "┘");
        assert_eq!(buf[(2, 0)].symbol(), "─");
        assert_eq!(buf[(0, 2)].symbol(), "│");
        assert_eq!(buf[(2, 2)].symbol(), " ");
    }

    #[test]
    fn test_polygon_fill() {
        let area = Rect::new(0, 0, 8, 8);
        let mut buf = Buffer::empty(area);
        let mut surface = BufferSurface::new(&mut buf, area);

        surface.clear(Argb(0xFF00_0000));
        surface.set_color(Argb(0xFFFF_FFFF));
        // Step shape: tall on the right, short on the left
        surface.fill_polygon(&[
            Point::new(7.0, 7.0),
            Point::new(7.0, 2.0),
            Point::new(4.0, 2.0),
            Point::new(4.0, 5.0),
            Point::new(1.0, 5.0),
            Point::new(1.0, 7.0),
        ]);

        let white = Color::Rgb(255, 255, 255);
        assert_eq!(bg(&buf, 5, 3), white);
        assert_eq!(bg(&buf, 2, 3), Color::Rgb(0, 0, 0));
        assert_eq!(bg(&buf, 2, 6), white);
        assert_eq!(bg(&buf, 7, 6), Color::Rgb(0, 0, 0));
        assert_eq!(bg(&buf, 3, 7), Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_text_is_clipped_to_area() {
        let area = Rect::new(2, 1, 4, 2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 4));
        let mut surface = BufferSurface::new(&mut buf, area);

        surface.text(Point::new(1.0, 0.0), Font::Header, "HELLO");

        assert_eq!(buf[(3, 1)].symbol(), "H");
        assert_eq!(buf[(5, 1)].symbol(), "L");
        assert_eq!(buf[(6, 1)].symbol(), " ");
        assert_eq!(surface_extents("HELLO").width, 5.0);
    }

    fn surface_extents(text: &str) -> TextExtents {
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        BufferSurface::new(&mut buf, area).text_extents(Font::Scale, text)
    }

    #[test]
    fn test_horizontal_line() {
        let area = Rect::new(0, 0, 8, 3);
        let mut buf = Buffer::empty(area);
        let mut surface = BufferSurface::new(&mut buf, area);

        surface.stroke_line(Point::new(1.0, 1.0), Point::new(7.0, 1.0));

        assert_eq!(buf[(0, 1)].symbol(), " ");
        assert_eq!(buf[(1, 1)].symbol(), "─");
        assert_eq!(buf[(6, 1)].symbol(), "─");
        assert_eq!(buf[(7, 1)].symbol(), " ");
    }
}
