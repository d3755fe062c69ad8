//! Configuration module for r128view
//!
//! Handles loading and parsing the YAML file that defines the target
//! level, scale bounds, timing, layout and colors of the meter. Every
//! field is optional and falls back to the EBU R128 defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::history::Sample;
use crate::scale::DisplayMode;
use crate::ui::Argb;

/// Largest number of samples one graph width may span
pub const MAX_HISTORY_LEN: usize = 100_000;

/// Largest magnitude accepted for the target and the scale bounds
pub const LEVEL_LIMIT: i32 = 200;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Target loudness in LUFS
    pub target: i32,

    /// Top of the scale, relative to the target
    pub scale_from: i32,

    /// Bottom of the scale, relative to the target
    pub scale_to: i32,

    /// Display mode at startup
    pub mode: DisplayMode,

    /// Which loudness drives the graph, and the gauge unless `gauges` is set
    pub measurement: Measurement,

    /// Gauges drawn right of the graph; one gauge following `measurement` when unset
    pub gauges: Option<Gauges>,

    /// Time span covered by the graph, in milliseconds
    pub timeframe_ms: u64,

    /// Expected time between two samples, in milliseconds
    pub interval_ms: u64,

    /// Append sample and true peak to the header
    pub show_peaks: bool,

    /// Where the export action writes the current frame
    pub export_path: PathBuf,

    pub geometry: Geometry,

    pub colors: Palette,

    /// Path to the config file (not serialized)
    #[serde(skip)]
    pub config_path: Option<String>,
}

/// Loudness series shown by the gauge and the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Momentary,
    #[default]
    ShortTerm,
}

impl Measurement {
    /// The value this series takes from a sample
    pub fn of(self, sample: &Sample) -> f64 {
        match self {
            Measurement::Momentary => sample.momentary,
            Measurement::ShortTerm => sample.shortterm,
        }
    }

    /// The gauge showing the same series
    pub fn gauge(self) -> GaugeKind {
        match self {
            Measurement::Momentary => GaugeKind::Momentary,
            Measurement::ShortTerm => GaugeKind::ShortTerm,
        }
    }
}

/// Gauge switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Gauges {
    pub short_term: bool,
    pub momentary: bool,
    /// True-peak gauge on a dBTP scale
    pub peak: bool,
}

impl Default for Gauges {
    fn default() -> Self {
        Self {
            short_term: true,
            momentary: false,
            peak: false,
        }
    }
}

impl Gauges {
    /// Enabled gauges, from the right edge inwards
    pub fn kinds(&self) -> Vec<GaugeKind> {
        [
            (self.short_term, GaugeKind::ShortTerm),
            (self.momentary, GaugeKind::Momentary),
            (self.peak, GaugeKind::TruePeak),
        ]
        .into_iter()
        .filter_map(|(enabled, kind)| enabled.then_some(kind))
        .collect()
    }
}

/// What a gauge displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeKind {
    ShortTerm,
    Momentary,
    TruePeak,
}

impl GaugeKind {
    /// The reading this gauge takes from a sample
    pub fn of(self, sample: &Sample) -> f64 {
        match self {
            GaugeKind::ShortTerm => sample.shortterm,
            GaugeKind::Momentary => sample.momentary,
            GaugeKind::TruePeak => sample.true_peak,
        }
    }

    /// Label drawn at the foot of the gauge
    pub fn label(self) -> &'static str {
        match self {
            GaugeKind::ShortTerm => "S",
            GaugeKind::Momentary => "M",
            GaugeKind::TruePeak => "TP",
        }
    }
}

/// Layout sizes, in pixels (terminal cells)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Geometry {
    pub gutter: u16,
    pub scale_width: u16,
    pub gauge_width: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            gutter: 1,
            scale_width: 4,
            gauge_width: 5,
        }
    }
}

/// Colors of every meter element
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Palette {
    pub background: Argb,
    pub border: Argb,
    pub scale: Argb,
    pub scale_lines: Argb,
    pub header: Argb,
    pub graph: Argb,
    pub too_loud: Argb,
    pub loudness_ok: Argb,
    pub not_loud_enough: Argb,
    /// Gauge bar colors; the graph color when unset
    pub gauge_short_term: Option<Argb>,
    pub gauge_momentary: Option<Argb>,
    pub gauge_peak: Option<Argb>,
}

impl Palette {
    /// Fill color of a gauge bar
    pub fn gauge(&self, kind: GaugeKind) -> Argb {
        let color = match kind {
            GaugeKind::ShortTerm => self.gauge_short_term,
            GaugeKind::Momentary => self.gauge_momentary,
            GaugeKind::TruePeak => self.gauge_peak,
        };
        color.unwrap_or(self.graph)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Argb(0xFF00_0000),
            border: Argb(0xFF00_CC00),
            scale: Argb(0xFF00_9999),
            scale_lines: Argb(0x4CFF_FFFF),
            header: Argb(0xFFFF_FF00),
            graph: Argb(0x9900_0000),
            too_loud: Argb(0xFFDB_6666),
            loudness_ok: Argb(0xFF66_DB66),
            not_loud_enough: Argb(0xFF66_66DB),
            gauge_short_term: None,
            gauge_momentary: None,
            gauge_peak: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: -23,
            scale_from: 18,
            scale_to: -36,
            mode: DisplayMode::Relative,
            measurement: Measurement::ShortTerm,
            gauges: None,
            timeframe_ms: 10_000,
            interval_ms: 100,
            show_peaks: false,
            export_path: PathBuf::from("frame.ans"),
            geometry: Geometry::default(),
            colors: Palette::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.config_path = Some(path.to_string_lossy().to_string());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn parse(contents: &str) -> Result<Self> {
        // An empty document means "all defaults"
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.scale_from <= self.scale_to {
            anyhow::bail!(
                "scale_from ({}) must be above scale_to ({})",
                self.scale_from,
                self.scale_to
            );
        }

        if self.scale_from < 0 || self.scale_to > 0 {
            anyhow::bail!(
                "the scale must include the target: scale_from >= 0 >= scale_to, got {}..{}",
                self.scale_from,
                self.scale_to
            );
        }

        for (name, value) in [
            ("target", self.target),
            ("scale_from", self.scale_from),
            ("scale_to", self.scale_to),
        ] {
            if !(-LEVEL_LIMIT..=LEVEL_LIMIT).contains(&value) {
                anyhow::bail!("{} ({}) must lie within -{limit}..={limit}", name, value, limit = LEVEL_LIMIT);
            }
        }

        if self.interval_ms == 0 {
            anyhow::bail!("interval_ms must be greater than zero");
        }

        if self.timeframe_ms < self.interval_ms {
            anyhow::bail!(
                "timeframe_ms ({}) must be at least one interval ({})",
                self.timeframe_ms,
                self.interval_ms
            );
        }

        if self.history_len() > MAX_HISTORY_LEN {
            anyhow::bail!(
                "timeframe_ms / interval_ms gives {} samples per screen, at most {} are supported",
                self.history_len(),
                MAX_HISTORY_LEN
            );
        }

        if self.export_path.as_os_str().is_empty() {
            anyhow::bail!("export_path cannot be empty");
        }

        Ok(())
    }

    /// Number of samples covering one graph width
    pub fn history_len(&self) -> usize {
        usize::try_from(self.timeframe_ms / self.interval_ms.max(1)).unwrap_or(usize::MAX)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Gauges to draw, right to left
    pub fn gauge_kinds(&self) -> Vec<GaugeKind> {
        match &self.gauges {
            Some(gauges) => gauges.kinds(),
            None => vec![self.measurement.gauge()],
        }
    }
}
