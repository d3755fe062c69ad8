//! Frame renderer
//!
//! Lays out the header, scale, graph and gauges and paints them onto a
//! [`Surface`]. The unit spacing is computed once per frame and handed to
//! every part of the drawing.

use crate::config::{Config, GaugeKind, Geometry, Measurement, Palette};
use crate::error::MeterError;
use crate::history::{HistoryWindow, Sample};
use crate::scale::{label_stride, linearize_db, signed_decimal, DisplayMode, Scale};
use crate::zones::ZoneHeights;

use super::surface::{Font, Point, Region, Surface};

/// Per-frame display state owned by the interaction controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    pub mode: DisplayMode,
    pub width: u16,
    pub height: u16,
}

/// Positions of the frame elements
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    /// Top-left corner of the header text
    pub header: Point,
    pub scale: Region,
    pub graph: Region,
    /// Gauge columns from the right edge inwards
    pub gauges: Vec<Region>,
}

impl FrameLayout {
    /// Scale, graph and gauges sit side by side below the header,
    /// separated and surrounded by one gutter
    pub fn compute(width: f64, height: f64, header_height: f64, geometry: &Geometry, gauge_count: usize) -> Self {
        let gutter = geometry.gutter as f64;
        let scale_w = geometry.scale_width as f64;
        let gauge_w = geometry.gauge_width as f64;
        let count = gauge_count as f64;

        let top = gutter + header_height + gutter;
        let column_h = height - header_height - 3.0 * gutter;
        let graph_x = gutter + scale_w + gutter;
        let graph_w = width - (3.0 + count) * gutter - scale_w - count * gauge_w;

        let gauges = (0..gauge_count)
            .map(|i| {
                let x = width - gutter - gauge_w - i as f64 * (gauge_w + gutter);
                Region::new(x, top, gauge_w, column_h)
            })
            .collect();

        Self {
            header: Point::new(graph_x + 1.0, gutter),
            scale: Region::new(gutter, top, scale_w, column_h),
            graph: Region::new(graph_x, top, graph_w, column_h),
            gauges,
        }
    }
}

/// What a render call ended up drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Unit spacing of the frame, if the scale could be laid out
    pub unit: Option<f64>,
    /// Step between labelled scale indices
    pub label_stride: usize,
    /// Samples plotted in the graph
    pub graph_points: usize,
    /// Regions left out because they were too small
    pub skipped: Vec<&'static str>,
}

impl FrameStats {
    fn skip(&mut self, err: MeterError) {
        log::debug!("Skipping part of the frame: {}", err);
        if let MeterError::DegenerateGeometry { region } = err {
            self.skipped.push(region);
        }
    }
}

/// Draws complete meter frames
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    scale: Scale,
    palette: Palette,
    geometry: Geometry,
    measurement: Measurement,
    gauges: Vec<GaugeKind>,
    history_len: usize,
    show_peaks: bool,
}

impl FrameRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            scale: Scale::from_config(config),
            palette: config.colors,
            geometry: config.geometry,
            measurement: config.measurement,
            gauges: config.gauge_kinds(),
            history_len: config.history_len(),
            show_peaks: config.show_peaks,
        }
    }

    /// Render one frame
    ///
    /// Fails with [`MeterError::EmptyWindow`] when there is nothing to show.
    /// Regions that do not fit are skipped and listed in the returned stats.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        ctx: &RenderContext,
        history: &HistoryWindow,
    ) -> Result<FrameStats, MeterError> {
        let mut stats = FrameStats::default();

        surface.clear(self.palette.background);

        let latest = history.latest()?;
        let header = self.header_text(latest, ctx.mode);
        let header_height = surface.text_extents(Font::Header, &header).height;
        let layout = FrameLayout::compute(
            ctx.width as f64,
            ctx.height as f64,
            header_height,
            &self.geometry,
            self.gauges.len(),
        );

        surface.set_color(self.palette.header);
        surface.text(layout.header, Font::Header, &header);

        let unit = match self.scale.unit_spacing(layout.scale.h) {
            Ok(unit) => unit,
            Err(err) => {
                stats.skip(err);
                return Ok(stats);
            }
        };
        let stride = label_stride(unit, surface.text_extents(Font::Scale, "0").height);
        stats.unit = Some(unit);
        stats.label_stride = stride;

        self.draw_scale(surface, &layout.scale, unit, stride, ctx.mode);

        let zones = ZoneHeights::for_unit(&self.scale, unit);

        let mut gauges_drawn = Vec::with_capacity(self.gauges.len());
        for (&kind, gauge) in self.gauges.iter().zip(&layout.gauges) {
            if gauge.has_interior() {
                self.draw_gauge(surface, kind, gauge, &zones, unit, latest);
                gauges_drawn.push((kind, *gauge));
            } else {
                stats.skip(MeterError::DegenerateGeometry { region: "gauge" });
            }
        }

        let graph_drawn = match self.column_width(&layout.graph) {
            Ok(column_width) => {
                stats.graph_points = self.draw_graph(surface, &layout.graph, &zones, unit, column_width, history);
                true
            }
            Err(err) => {
                stats.skip(err);
                false
            }
        };

        // The peak gauge has no loudness scale to line up with
        surface.set_color(self.palette.scale_lines);
        for (kind, gauge) in &gauges_drawn {
            if *kind != GaugeKind::TruePeak {
                self.draw_grid(surface, gauge, unit, stride);
            }
        }
        if graph_drawn {
            self.draw_grid(surface, &layout.graph, unit, stride);
        }

        for (kind, gauge) in &gauges_drawn {
            self.draw_gauge_label(surface, *kind, gauge);
        }

        Ok(stats)
    }

    /// Header line with the target and the latest readings
    pub fn header_text(&self, sample: &Sample, mode: DisplayMode) -> String {
        let unit = mode.unit();
        let correction = mode.correction(self.scale.target());

        let mut header = format!(
            "TARGET: {:+} LUFS | M: {:>7} {unit} | S: {:>7} {unit} | I: {:>7} {unit} | LRA: {:>7} LU",
            self.scale.target(),
            signed_decimal(sample.momentary - correction),
            signed_decimal(sample.shortterm - correction),
            signed_decimal(sample.global - correction),
            signed_decimal(sample.range),
            unit = unit,
        );
        if self.show_peaks {
            header.push_str(&format!(
                " | PK: {:>7} | TP: {:>7} dBTP",
                signed_decimal(sample.sample_peak),
                signed_decimal(sample.true_peak)
            ));
        }
        header
    }

    /// Width of one sample in the graph
    fn column_width(&self, graph: &Region) -> Result<f64, MeterError> {
        if !graph.has_interior() || self.history_len == 0 {
            return Err(MeterError::DegenerateGeometry { region: "graph" });
        }
        Ok((graph.w - 2.0) / self.history_len as f64)
    }

    fn draw_scale<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        scale: &Region,
        unit: f64,
        stride: usize,
        mode: DisplayMode,
    ) {
        surface.set_color(self.palette.scale);
        for index in self.scale.label_indices(stride) {
            let label = self.scale.label_for(index, mode);
            let extents = surface.text_extents(Font::Scale, &label);

            let x = scale.right() - extents.width;
            let y = scale.y + self.scale.line_offset(index, unit) - extents.height / 2.0 + 0.5;
            surface.text(Point::new(x, y), Font::Scale, &label);
        }
    }

    /// Paint the too-loud, on-target and too-quiet bands inside a border
    fn draw_zones<S: Surface + ?Sized>(&self, surface: &mut S, region: &Region, zones: &ZoneHeights) {
        let inner = region.inner();
        let bands = [
            (zones.too_loud, self.palette.too_loud),
            (zones.on_target, self.palette.loudness_ok),
            (zones.too_quiet, self.palette.not_loud_enough),
        ];

        let mut y = inner.y;
        for (height, color) in bands {
            surface.set_color(color);
            surface.fill_rect(Region::new(inner.x, y, inner.w, height));
            y += height;
        }
    }

    /// Loudness gauges share the scale and its zones; the peak gauge maps
    /// dBTP through [`linearize_db`] and has zones of its own
    fn draw_gauge<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        kind: GaugeKind,
        gauge: &Region,
        zones: &ZoneHeights,
        unit: f64,
        latest: &Sample,
    ) {
        let (zones, level) = match kind {
            GaugeKind::TruePeak => (
                ZoneHeights::for_peak(gauge.h - 2.0),
                linearize_db(kind.of(latest)) * gauge.h,
            ),
            GaugeKind::ShortTerm | GaugeKind::Momentary => {
                (*zones, self.scale.pixel_offset(kind.of(latest), unit))
            }
        };
        self.draw_zones(surface, gauge, &zones);

        let level = level.min(gauge.h - 2.0);
        if level > 0.0 {
            surface.set_color(self.palette.gauge(kind));
            surface.fill_rect(Region::new(gauge.x + 1.0, gauge.bottom() - 1.0 - level, gauge.w - 2.0, level));
        }

        surface.set_color(self.palette.border);
        surface.stroke_rect(*gauge);
    }

    /// Plot the history newest-first from the right edge and return the
    /// number of samples drawn
    fn draw_graph<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        graph: &Region,
        zones: &ZoneHeights,
        unit: f64,
        column_width: f64,
        history: &HistoryWindow,
    ) -> usize {
        self.draw_zones(surface, graph, zones);

        let outline = self.graph_outline(graph, unit, column_width, history);
        surface.set_color(self.palette.graph);
        surface.fill_polygon(&outline);

        surface.set_color(self.palette.border);
        surface.stroke_rect(*graph);

        outline.len() - 2
    }

    /// Top edge of the graph polygon, closed against the baseline
    fn graph_outline(&self, graph: &Region, unit: f64, column_width: f64, history: &HistoryWindow) -> Vec<Point> {
        let right = graph.right() - 1.0;
        let baseline = graph.bottom() - 1.0;
        let ceiling = graph.y + 1.0;

        let mut outline = Vec::with_capacity(self.history_len.min(history.len()) + 2);
        outline.push(Point::new(right, baseline));

        // At most `history_len` columns fit, so the walk ends inside the border
        let mut last_x = right;
        for (i, sample) in history.iter_newest_first().take(self.history_len).enumerate() {
            let x = right - i as f64 * column_width;
            let offset = self.scale.floor_offset(self.measurement.of(sample), unit);
            outline.push(Point::new(x, (baseline - offset).clamp(ceiling, baseline)));
            last_x = x;
        }

        outline.push(Point::new(last_x, baseline));
        outline
    }

    fn draw_grid<S: Surface + ?Sized>(&self, surface: &mut S, region: &Region, unit: f64, stride: usize) {
        for index in self.scale.label_indices(stride) {
            let y = region.y + self.scale.line_offset(index, unit);
            surface.stroke_line(Point::new(region.x + 1.0, y), Point::new(region.right() - 1.0, y));
        }
    }

    fn draw_gauge_label<S: Surface + ?Sized>(&self, surface: &mut S, kind: GaugeKind, gauge: &Region) {
        let label = kind.label();
        let extents = surface.text_extents(Font::Header, label);

        surface.set_color(self.palette.header);
        surface.text(
            Point::new(
                gauge.x + (gauge.w - extents.width) / 2.0,
                gauge.bottom() - 1.0 - extents.height,
            ),
            Font::Header,
            label,
        );
    }
}
