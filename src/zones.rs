//! Color zone classification
//!
//! Splits a scale region into the too-loud, on-target and too-quiet bands.
//! The on-target band is always two scale divisions tall.

use crate::scale::{linearize_db, Scale};

/// Divisions covered by the on-target band
const ON_TARGET_DIVISIONS: f64 = 2.0;

/// Peak level above which the peak gauge shows the too-loud band
pub const PEAK_TOO_LOUD_DB: f64 = -2.5;

/// Peak level below which the peak gauge shows the too-quiet band
pub const PEAK_TOO_QUIET_DB: f64 = -20.0;

/// Heights of the three stacked bands, top to bottom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneHeights {
    pub too_loud: f64,
    pub on_target: f64,
    pub too_quiet: f64,
}

impl ZoneHeights {
    /// Band heights for a given unit spacing
    pub fn for_unit(scale: &Scale, unit: f64) -> Self {
        let band = |divisions: f64| ((divisions * unit).ceil() - 1.0).max(0.0);
        Self {
            too_loud: band(scale.upper().unsigned_abs() as f64),
            on_target: band(ON_TARGET_DIVISIONS),
            too_quiet: band(scale.lower().unsigned_abs() as f64),
        }
    }

    /// Band heights of a peak gauge whose interior is `inner_height` tall
    pub fn for_peak(inner_height: f64) -> Self {
        let inner_height = inner_height.max(0.0);
        let loud = linearize_db(PEAK_TOO_LOUD_DB);
        let quiet = linearize_db(PEAK_TOO_QUIET_DB);
        Self {
            too_loud: (inner_height * (1.0 - loud)).round(),
            on_target: (inner_height * (loud - quiet)).round(),
            too_quiet: (inner_height * quiet).round(),
        }
    }

    #[cfg(test)]
    fn total(&self) -> f64 {
        self.too_loud + self.on_target + self.too_quiet
    }
}
