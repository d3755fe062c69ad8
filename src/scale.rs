//! Loudness scale mapping
//!
//! Converts LUFS values into vertical pixel offsets and produces the signed
//! labels of the scale axis. The whole frame shares a single unit spacing:
//! the height of one scale division in pixels.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::MeterError;

/// Bottom inset of a data point: one border pixel plus one pixel of air
const BORDER_INSET: f64 = 2.0;

/// How values are presented on the scale and in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Raw LUFS values
    Absolute,
    /// Values relative to the target, in LU
    #[default]
    Relative,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Absolute => DisplayMode::Relative,
            DisplayMode::Relative => DisplayMode::Absolute,
        }
    }

    /// Unit label for loudness readouts
    pub fn unit(self) -> &'static str {
        match self {
            DisplayMode::Absolute => "LUFS",
            DisplayMode::Relative => "LU",
        }
    }

    /// Amount subtracted from a LUFS value before it is displayed
    pub fn correction(self, target: i32) -> f64 {
        match self {
            DisplayMode::Absolute => 0.0,
            DisplayMode::Relative => target as f64,
        }
    }
}

/// Scale bounds around the target level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    target: i32,
    from: i32,
    to: i32,
}

impl Scale {
    /// Create a scale spanning `from` (top) down to `to` (bottom), relative to `target`
    pub fn new(target: i32, from: i32, to: i32) -> Self {
        Self { target, from, to }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.target, config.scale_from, config.scale_to)
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    /// Top of the scale relative to the target
    pub fn upper(&self) -> i32 {
        self.from
    }

    /// Bottom of the scale relative to the target
    pub fn lower(&self) -> i32 {
        self.to
    }

    /// Number of labelled scale divisions
    pub fn divisions(&self) -> i32 {
        self.from - self.to + 1
    }

    /// Height of one scale division for a region of `region_height` pixels
    pub fn unit_spacing(&self, region_height: f64) -> Result<f64, MeterError> {
        let rows = (self.divisions() + 1) as f64;
        if region_height <= 0.0 || rows <= 0.0 {
            return Err(MeterError::DegenerateGeometry { region: "scale" });
        }
        Ok(region_height / rows)
    }

    /// Distance from the bottom of a region for a value, clamped to the scale
    pub fn pixel_offset(&self, value: f64, unit: f64) -> f64 {
        let relative = self.relative(value).min((self.from + 1) as f64);
        self.offset_of(relative, unit)
    }

    /// Like [`Scale::pixel_offset`] but only clamped at the bottom of the scale
    pub fn floor_offset(&self, value: f64, unit: f64) -> f64 {
        self.offset_of(self.relative(value), unit)
    }

    fn relative(&self, value: f64) -> f64 {
        let relative = value - self.target as f64;
        if relative.is_nan() {
            return self.to as f64;
        }
        relative.max(self.to as f64)
    }

    fn offset_of(&self, relative: f64, unit: f64) -> f64 {
        (relative - self.to as f64) * unit + unit - BORDER_INSET
    }

    /// Numeric value shown at a scale index
    pub fn label_value(&self, index: i32, mode: DisplayMode) -> i32 {
        match mode {
            DisplayMode::Relative => self.from - index,
            DisplayMode::Absolute => self.from - index + self.target,
        }
    }

    /// Text shown at a scale index
    pub fn label_for(&self, index: i32, mode: DisplayMode) -> String {
        with_sign(self.label_value(index, mode))
    }

    /// Vertical position of a scale index below the top of a region
    pub fn line_offset(&self, index: i32, unit: f64) -> f64 {
        (index as f64 * unit + unit).ceil()
    }

    /// Scale indices that get a label and a grid line
    pub fn label_indices(&self, stride: usize) -> impl Iterator<Item = i32> {
        (0..self.divisions().max(0)).step_by(stride.max(1))
    }
}

/// Step between labelled scale indices so that labels never overlap
pub fn label_stride(unit: f64, glyph_height: f64) -> usize {
    if unit <= 0.0 || !unit.is_finite() {
        return 1;
    }
    (1.0 / (unit / glyph_height)).ceil().max(1.0) as usize
}

/// Format an integer with an explicit sign; zero carries none
pub fn with_sign(value: i32) -> String {
    match value {
        0 => "0".to_string(),
        v if v < 0 => format!("-{}", v.unsigned_abs()),
        v => format!("+{}", v),
    }
}

/// Format a reading to two decimals with an explicit sign; a value that
/// rounds to zero carries none
pub fn signed_decimal(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00".to_string()
    } else {
        format!("{:+.2}", rounded)
    }
}

/// Map a peak level in dB onto `0.0..=1.0` of a gauge, stretching the
/// range just below full scale
///
/// Levels far above 0 dB map past 1.0; silence and NaN map to 0.0.
pub fn linearize_db(db: f64) -> f64 {
    if db.is_nan() {
        return 0.0;
    }
    let level = 1.0 - (-0.15 * db + 1.0).max(f64::MIN_POSITIVE).log10();
    level.max(0.0)
}
