//! Drawing surface abstraction
//!
//! The frame renderer emits an ordered stream of primitives against a
//! [`Surface`]. Coordinates are pixels with the origin in the top-left
//! corner of the drawable area.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A color in ARGB layout, `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Argb(pub u32);

impl Argb {
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    /// Composite this color over an opaque base color
    pub fn over(self, base: (u8, u8, u8)) -> (u8, u8, u8) {
        let a = self.alpha() as f32 / 255.0;
        let (r, g, b) = self.rgb();
        let mix = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        (mix(r, base.0), mix(g, base.1), mix(b, base.2))
    }
}

impl FromStr for Argb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let value = u32::from_str_radix(hex, 16).map_err(|e| format!("invalid color '{}': {}", s, e))?;
        match hex.len() {
            8 => Ok(Argb(value)),
            6 => Ok(Argb(0xFF00_0000 | value)),
            _ => Err(format!("invalid color '{}': expected #AARRGGBB or #RRGGBB", s)),
        }
    }
}

impl TryFrom<String> for Argb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Argb> for String {
    fn from(color: Argb) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Region {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// The area left inside a 1px border
    pub fn inner(&self) -> Region {
        Region::new(self.x + 1.0, self.y + 1.0, self.w - 2.0, self.h - 2.0)
    }

    /// Whether anything fits inside the 1px border
    pub fn has_interior(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.w > 2.0 && self.h > 2.0
    }
}

/// Typeface roles used by the meter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Header,
    Scale,
}

/// Size of a rendered string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtents {
    pub width: f64,
    pub height: f64,
}

/// Target of the frame renderer
///
/// Fill, stroke and text primitives paint with the color set by the most
/// recent [`Surface::set_color`] call.
pub trait Surface {
    /// Paint the whole surface with one color
    fn clear(&mut self, color: Argb);

    fn set_color(&mut self, color: Argb);

    fn fill_rect(&mut self, rect: Region);

    /// Outline a rectangle with a 1px line along its edges
    fn stroke_rect(&mut self, rect: Region);

    fn stroke_line(&mut self, from: Point, to: Point);

    /// Fill a closed polygon; the last point connects back to the first
    fn fill_polygon(&mut self, points: &[Point]);

    /// Draw text with its top-left corner at `at`
    fn text(&mut self, at: Point, font: Font, text: &str);

    fn text_extents(&self, font: Font, text: &str) -> TextExtents;
}

#[cfg(test)]
pub mod recording {
    //! A surface that records primitives instead of painting them

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear(Argb),
        SetColor(Argb),
        FillRect(Region),
        StrokeRect(Region),
        Line(Point, Point),
        Polygon(Vec<Point>),
        Text(Point, Font, String),
    }

    /// Records every primitive; glyphs are `glyph_width` x `glyph_height`
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub ops: Vec<Op>,
        pub glyph_width: f64,
        pub glyph_height: f64,
    }

    impl RecordingSurface {
        pub fn new(glyph_width: f64, glyph_height: f64) -> Self {
            Self {
                ops: Vec::new(),
                glyph_width,
                glyph_height,
            }
        }

        pub fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(_, _, text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn polygons(&self) -> Vec<&Vec<Point>> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Polygon(points) => Some(points),
                    _ => None,
                })
                .collect()
        }

        pub fn lines(&self) -> usize {
            self.ops.iter().filter(|op| matches!(op, Op::Line(..))).count()
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self, color: Argb) {
            self.ops.push(Op::Clear(color));
        }

        fn set_color(&mut self, color: Argb) {
            self.ops.push(Op::SetColor(color));
        }

        fn fill_rect(&mut self, rect: Region) {
            self.ops.push(Op::FillRect(rect));
        }

        fn stroke_rect(&mut self, rect: Region) {
            self.ops.push(Op::StrokeRect(rect));
        }

        fn stroke_line(&mut self, from: Point, to: Point) {
            self.ops.push(Op::Line(from, to));
        }

        fn fill_polygon(&mut self, points: &[Point]) {
            self.ops.push(Op::Polygon(points.to_vec()));
        }

        fn text(&mut self, at: Point, font: Font, text: &str) {
            self.ops.push(Op::Text(at, font, text.to_string()));
        }

        fn text_extents(&self, _font: Font, text: &str) -> TextExtents {
            TextExtents {
                width: text.chars().count() as f64 * self.glyph_width,
                height: self.glyph_height,
            }
        }
    }
}
