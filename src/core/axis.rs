//! Axis: one or more nested scales bound to a pixel extent.
//!
//! Level 0 is the outer scale. Additional levels only exist for nested
//! banded axes, where level `k` subdivides each band of level `k - 1`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::scale::{BandScale, Domain, Scale, ScaleKind};
use crate::core::ticks::{
    AXIS_MAX_TICKS, AXIS_MIN_TICKS, AXIS_TARGET_SPACING_PX, LabelSpan, TickFormat, format_tick,
    suppressed_label_indices, tick_target_count,
};
use crate::core::types::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::render::{
    Color, LinePrimitive, RenderFrame, RenderLayer, Renderer, TextHAlign, TextPrimitive,
};

/// Widest a single discrete band may grow, in pixels.
pub const MAX_DISCRETE_WIDTH: f64 = 50.0;
/// Minimum free space between two kept tick labels.
pub const DEFAULT_TICK_GAP_PX: f64 = 4.0;
pub const DEFAULT_TICK_FONT_SIZE_PX: f64 = 11.0;
const TICK_LENGTH_PX: f64 = 5.0;
const LABEL_PADDING_PX: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisAlignment {
    Left,
    Right,
    Top,
    Bottom,
}

impl AxisAlignment {
    #[must_use]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Value under a pixel offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisValue {
    Number(f64),
    /// One key per nested level, outermost first.
    Category(Vec<String>),
}

impl AxisValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Category(_) => None,
        }
    }

    /// Innermost category key.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Category(path) => path.last().map(String::as_str),
            Self::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    /// Pixel offset along the axis.
    pub position: f64,
    pub label: String,
    /// Numeric tick value; `None` for band ticks.
    pub value: Option<f64>,
}

/// What one `Axis::render` call did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AxisRenderOutcome {
    /// `false` when the cached pixel/domain snapshot matched.
    pub drawn: bool,
    pub passes: usize,
    /// Tick indices whose labels were blanked.
    pub suppressed: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct AxisSnapshot {
    pixels: f64,
    origin: (f64, f64),
    domain: String,
}

#[derive(Debug, Clone)]
pub struct Axis {
    id: String,
    alignment: AxisAlignment,
    levels: Vec<Scale>,
    tick_format: TickFormat,
    tick_gap_px: f64,
    font_size_px: f64,
    label_color: Color,
    pixels: f64,
    origin: (f64, f64),
    last_rendered: Option<AxisSnapshot>,
    draw_count: usize,
}

impl Axis {
    #[must_use]
    pub fn new(id: impl Into<String>, alignment: AxisAlignment, kind: ScaleKind) -> Self {
        Self {
            id: id.into(),
            alignment,
            levels: vec![Scale::new(kind)],
            tick_format: TickFormat::default(),
            tick_gap_px: DEFAULT_TICK_GAP_PX,
            font_size_px: DEFAULT_TICK_FONT_SIZE_PX,
            label_color: Color::rgb(0.2, 0.2, 0.2),
            pixels: 0.0,
            origin: (0.0, 0.0),
            last_rendered: None,
            draw_count: 0,
        }
    }

    /// Banded axis with `level_count` nested band levels.
    pub fn nested_bands(
        id: impl Into<String>,
        alignment: AxisAlignment,
        level_count: usize,
    ) -> ChartResult<Self> {
        if level_count == 0 {
            return Err(ChartError::InvalidConfiguration(
                "nested band axis needs at least one level".to_owned(),
            ));
        }
        let mut axis = Self::new(id, alignment, ScaleKind::Band);
        axis.levels = (0..level_count)
            .map(|_| Scale::Band(BandScale::default()))
            .collect();
        Ok(axis)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn alignment(&self) -> AxisAlignment {
        self.alignment
    }

    #[must_use]
    pub fn kind(&self) -> ScaleKind {
        self.scale().kind()
    }

    #[must_use]
    pub fn is_banded(&self) -> bool {
        self.scale().is_banded()
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Outer scale.
    #[must_use]
    pub fn scale(&self) -> &Scale {
        &self.levels[0]
    }

    #[must_use]
    pub fn level(&self, level: usize) -> Option<&Scale> {
        self.levels.get(level)
    }

    #[must_use]
    pub fn tick_format(&self) -> TickFormat {
        self.tick_format
    }

    pub fn set_tick_format(&mut self, format: TickFormat) {
        self.tick_format = format;
    }

    pub fn set_tick_gap(&mut self, gap_px: f64) {
        self.tick_gap_px = gap_px.max(0.0);
    }

    pub fn set_font_size(&mut self, font_size_px: f64) {
        if font_size_px.is_finite() && font_size_px > 0.0 {
            self.font_size_px = font_size_px;
        }
    }

    /// Top-left corner of the axis line inside the chart viewport.
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.origin = (x, y);
    }

    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Pixels most recently passed to `commit_range`.
    #[must_use]
    pub fn committed_pixels(&self) -> f64 {
        self.pixels
    }

    /// Pixel length actually used by the outer scale.
    #[must_use]
    pub fn range_pixels(&self) -> f64 {
        let (start, end) = self.scale().range();
        (end - start).abs()
    }

    #[must_use]
    pub fn continuous_domain(&self) -> Option<(f64, f64)> {
        self.scale().as_continuous().map(|scale| scale.domain())
    }

    /// Number of expensive draws performed so far.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Sets the domain of `level` and recomputes the mapping right away.
    pub fn set_domain(&mut self, domain: Domain, level: usize) -> ChartResult<()> {
        let scale = self.level_mut(level)?;
        match (scale, domain) {
            (Scale::Continuous(scale), Domain::Continuous { start, end }) => {
                let _ = scale.set_domain(start, end);
            }
            (Scale::Band(scale), Domain::Categories(keys)) => scale.set_domain(keys),
            (scale, domain) => {
                return Err(ChartError::InvalidConfiguration(format!(
                    "domain {domain:?} does not fit a {:?} scale",
                    scale.kind()
                )));
            }
        }
        self.apply_range();
        Ok(())
    }

    /// Merges categorical keys after the existing ones, first occurrence wins.
    ///
    /// Returns how many keys were new.
    pub fn append_domain<I, S>(&mut self, keys: I, level: usize) -> ChartResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added = match self.level_mut(level)? {
            Scale::Band(scale) => scale.append_domain(keys),
            Scale::Continuous(scale) => {
                return Err(ChartError::InvalidConfiguration(format!(
                    "cannot append categorical keys to a {:?} scale",
                    scale.kind()
                )));
            }
        };
        if added > 0 {
            self.apply_range();
        }
        Ok(added)
    }

    /// Establishes the numeric range for `pixels` available pixels.
    pub fn commit_range(&mut self, pixels: f64) {
        self.pixels = if pixels.is_finite() { pixels.max(0.0) } else { 0.0 };
        self.apply_range();
    }

    /// `min(outer keys * keys per outer key * MAX_DISCRETE_WIDTH, pixels)`.
    #[must_use]
    pub fn band_range_pixels(&self, pixels: f64) -> f64 {
        let keys: usize = self
            .levels
            .iter()
            .filter_map(Scale::as_band)
            .map(BandScale::len)
            .product();
        (keys as f64 * MAX_DISCRETE_WIDTH).min(pixels)
    }

    fn apply_range(&mut self) {
        let pixels = self.pixels;
        let vertical = self.alignment.is_vertical();
        let band_pixels = self.band_range_pixels(pixels);

        let mut parent_bandwidth = None;
        for (index, scale) in self.levels.iter_mut().enumerate() {
            match scale {
                Scale::Continuous(scale) => {
                    if vertical {
                        scale.set_range(pixels, 0.0);
                    } else {
                        scale.set_range(0.0, pixels);
                    }
                    scale.set_clamp(vertical);
                }
                Scale::Band(scale) => {
                    if index == 0 {
                        if vertical {
                            scale.set_range(band_pixels, 0.0);
                        } else {
                            scale.set_range(0.0, band_pixels);
                        }
                    } else {
                        scale.set_range(0.0, parent_bandwidth.unwrap_or(0.0));
                    }
                    parent_bandwidth = Some(scale.bandwidth());
                }
            }
        }
        trace!(axis = %self.id, pixels, band_pixels, "axis range committed");
    }

    fn level_mut(&mut self, level: usize) -> ChartResult<&mut Scale> {
        let count = self.levels.len();
        self.levels.get_mut(level).ok_or_else(|| {
            ChartError::InvalidConfiguration(format!(
                "axis level {level} out of range (axis has {count} levels)"
            ))
        })
    }

    /// Pixel position of a continuous value, `None` on a banded axis.
    #[must_use]
    pub fn map_value(&self, value: f64) -> Option<f64> {
        self.scale().as_continuous().map(|scale| scale.map(value))
    }

    /// Center of the innermost band addressed by `path` (outermost key first).
    #[must_use]
    pub fn map_category(&self, path: &[&str]) -> Option<f64> {
        if path.is_empty() || path.len() > self.levels.len() {
            return None;
        }
        let mut start = 0.0;
        let mut bandwidth = 0.0;
        for (key, scale) in path.iter().zip(&self.levels) {
            let band = scale.as_band()?;
            start += band.map(key)?;
            bandwidth = band.bandwidth();
        }
        Some(start + bandwidth / 2.0)
    }

    /// Width of the innermost band, `0` for continuous axes.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.levels
            .last()
            .and_then(Scale::as_band)
            .map_or(0.0, BandScale::bandwidth)
    }

    /// Inverse mapping for interaction.
    ///
    /// Continuous axes use the analytic inverse. Banded axes snap to the
    /// nearest band per level, clamped to the first/last key.
    #[must_use]
    pub fn map_coordinate_to_value(&self, offset: f64) -> Option<AxisValue> {
        match self.scale() {
            Scale::Continuous(scale) => Some(AxisValue::Number(scale.invert(offset))),
            Scale::Band(_) => self.walk_bands(offset, nearest_band_index),
        }
    }

    /// Band strictly containing `offset`, level by level.
    ///
    /// Offsets outside the band area, including padding before the first
    /// band and past the last one, have no hovered band.
    #[must_use]
    pub fn current_band(&self, offset: f64) -> Option<AxisValue> {
        if !self.is_banded() {
            return None;
        }
        self.walk_bands(offset, containing_band_index)
    }

    fn walk_bands(
        &self,
        offset: f64,
        locate: fn(&BandScale, f64) -> Option<usize>,
    ) -> Option<AxisValue> {
        let mut relative = offset;
        let mut path = Vec::with_capacity(self.levels.len());
        for scale in &self.levels {
            let band = scale.as_band()?;
            let index = locate(band, relative)?;
            path.push(band.key_at(index)?.to_owned());
            relative -= band.map_index(index)?;
        }
        Some(AxisValue::Category(path))
    }

    /// Tick positions and labels for the current domain and range.
    #[must_use]
    pub fn ticks(&self) -> Vec<AxisTick> {
        match self.scale() {
            Scale::Continuous(scale) => {
                let count = tick_target_count(
                    scale.range_extent(),
                    AXIS_TARGET_SPACING_PX,
                    AXIS_MIN_TICKS,
                    AXIS_MAX_TICKS,
                );
                let values = scale.ticks(count);
                let step = smallest_gap(&values).unwrap_or_else(|| {
                    let (start, end) = scale.domain();
                    (end - start).abs()
                });
                values
                    .into_iter()
                    .map(|value| AxisTick {
                        position: scale.map(value),
                        label: format_tick(value, self.tick_format, step),
                        value: Some(value),
                    })
                    .collect()
            }
            Scale::Band(scale) => {
                let half = scale.bandwidth() / 2.0;
                scale
                    .keys()
                    .enumerate()
                    .filter_map(|(index, key)| {
                        scale.map_index(index).map(|start| AxisTick {
                            position: start + half,
                            label: key.to_owned(),
                            value: None,
                        })
                    })
                    .collect()
            }
        }
    }

    /// Tick indices whose labels would overlap an already kept label.
    ///
    /// Band ticks are walked in ascending domain order, continuous ticks in
    /// descending value order.
    pub fn overlapping_ticks<R: Renderer + ?Sized>(
        &self,
        ticks: &[AxisTick],
        renderer: &R,
    ) -> Vec<usize> {
        let mut order: Vec<usize> = (0..ticks.len()).collect();
        if !self.is_banded() {
            order.sort_by(|lhs, rhs| {
                let lhs = ticks[*lhs].value.unwrap_or(f64::NEG_INFINITY);
                let rhs = ticks[*rhs].value.unwrap_or(f64::NEG_INFINITY);
                rhs.total_cmp(&lhs)
            });
        }

        let spans: Vec<LabelSpan> = order
            .iter()
            .map(|index| {
                let tick = &ticks[*index];
                let extent = renderer.measure_text(&tick.label, self.font_size_px);
                let along = if self.alignment.is_vertical() {
                    extent.height
                } else {
                    extent.width
                };
                LabelSpan::centered(tick.position, along)
            })
            .collect();

        let mut suppressed: Vec<usize> = suppressed_label_indices(&spans, self.tick_gap_px)
            .into_iter()
            .map(|walk_index| order[walk_index])
            .collect();
        suppressed.sort_unstable();
        suppressed
    }

    /// Draws axis line, tick marks and labels.
    ///
    /// Skips the draw entirely when pixels, origin and domain match the last
    /// drawn state. When labels overlap, a second pass is drawn with the
    /// overlapping labels left out.
    pub fn render<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        viewport: Viewport,
    ) -> ChartResult<AxisRenderOutcome> {
        let snapshot = self.snapshot()?;
        if self.last_rendered.as_ref() == Some(&snapshot) {
            trace!(axis = %self.id, "axis unchanged, skipping draw");
            return Ok(AxisRenderOutcome::default());
        }

        let ticks = self.ticks();
        renderer.render(&self.build_frame(viewport, &ticks, &[]))?;
        let mut passes = 1;

        let suppressed = self.overlapping_ticks(&ticks, renderer);
        if !suppressed.is_empty() {
            debug!(
                axis = %self.id,
                suppressed = suppressed.len(),
                total = ticks.len(),
                "tick labels overlap, redrawing without them"
            );
            renderer.render(&self.build_frame(viewport, &ticks, &suppressed))?;
            passes += 1;
        }

        self.last_rendered = Some(snapshot);
        self.draw_count += 1;
        Ok(AxisRenderOutcome {
            drawn: true,
            passes,
            suppressed,
        })
    }

    /// Forgets the cached snapshot so the next `render` draws.
    pub fn invalidate(&mut self) {
        self.last_rendered = None;
    }

    fn snapshot(&self) -> ChartResult<AxisSnapshot> {
        let domains: Vec<Domain> = self.levels.iter().map(domain_of).collect();
        Ok(AxisSnapshot {
            pixels: self.pixels,
            origin: self.origin,
            domain: serde_json::to_string(&domains)?,
        })
    }

    /// Builds the axis frame; labels listed in `suppressed` are left blank.
    #[must_use]
    pub fn build_frame(
        &self,
        viewport: Viewport,
        ticks: &[AxisTick],
        suppressed: &[usize],
    ) -> RenderFrame {
        let (ox, oy) = self.origin;
        let extent = self.range_pixels();
        let color = self.label_color;
        let mut frame = RenderFrame::new(viewport, RenderLayer::Axis);

        let (x2, y2) = if self.alignment.is_vertical() {
            (ox, oy + extent)
        } else {
            (ox + extent, oy)
        };
        if extent > 0.0 {
            frame.lines.push(LinePrimitive::new(ox, oy, x2, y2, 1.0, color));
        }

        for (index, tick) in ticks.iter().enumerate() {
            let (line, label) = match self.alignment {
                AxisAlignment::Bottom => {
                    let x = ox + tick.position;
                    let label_y = oy + TICK_LENGTH_PX + LABEL_PADDING_PX + self.font_size_px;
                    (
                        LinePrimitive::new(x, oy, x, oy + TICK_LENGTH_PX, 1.0, color),
                        (x, label_y, TextHAlign::Center),
                    )
                }
                AxisAlignment::Top => {
                    let x = ox + tick.position;
                    (
                        LinePrimitive::new(x, oy, x, oy - TICK_LENGTH_PX, 1.0, color),
                        (x, oy - TICK_LENGTH_PX - LABEL_PADDING_PX, TextHAlign::Center),
                    )
                }
                AxisAlignment::Left => {
                    let y = oy + tick.position;
                    (
                        LinePrimitive::new(ox - TICK_LENGTH_PX, y, ox, y, 1.0, color),
                        (ox - TICK_LENGTH_PX - LABEL_PADDING_PX, y, TextHAlign::Right),
                    )
                }
                AxisAlignment::Right => {
                    let y = oy + tick.position;
                    (
                        LinePrimitive::new(ox, y, ox + TICK_LENGTH_PX, y, 1.0, color),
                        (ox + TICK_LENGTH_PX + LABEL_PADDING_PX, y, TextHAlign::Left),
                    )
                }
            };
            frame.lines.push(line);
            if tick.label.is_empty() || suppressed.contains(&index) {
                continue;
            }
            let (x, y, h_align) = label;
            frame.texts.push(TextPrimitive::new(
                tick.label.clone(),
                x,
                y,
                self.font_size_px,
                color,
                h_align,
            ));
        }
        frame
    }
}

fn domain_of(scale: &Scale) -> Domain {
    match scale {
        Scale::Continuous(scale) => {
            let (start, end) = scale.domain();
            Domain::Continuous { start, end }
        }
        Scale::Band(scale) => Domain::Categories(scale.keys().map(str::to_owned).collect()),
    }
}

fn smallest_gap(values: &[f64]) -> Option<f64> {
    values
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .filter(|gap| *gap > 0.0)
        .min_by(f64::total_cmp)
}

/// Converts a slot counted from the range start into a domain index.
fn slot_to_index(scale: &BandScale, slot: usize) -> usize {
    let (start, end) = scale.range();
    if end < start {
        scale.len() - 1 - slot
    } else {
        slot
    }
}

fn nearest_band_index(scale: &BandScale, offset: f64) -> Option<usize> {
    let count = scale.len();
    let step = scale.step();
    if count == 0 || step <= 0.0 || !offset.is_finite() {
        return None;
    }
    let first_center = scale.offset() + scale.bandwidth() / 2.0;
    let slot = ((offset - first_center) / step + 0.5)
        .floor()
        .clamp(0.0, (count - 1) as f64) as usize;
    Some(slot_to_index(scale, slot))
}

fn containing_band_index(scale: &BandScale, offset: f64) -> Option<usize> {
    let count = scale.len();
    let step = scale.step();
    if count == 0 || step <= 0.0 || !offset.is_finite() {
        return None;
    }
    let slot = ((offset - scale.offset()) / step).floor();
    if slot < 0.0 || slot >= count as f64 {
        return None;
    }
    Some(slot_to_index(scale, slot as usize))
}
