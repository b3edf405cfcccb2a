//! Ordered lookup from a series and its decimated output to the code that
//! turns it into primitives.
//!
//! Registrations are tried in order and the first matching predicate wins,
//! so a specific registration must come before a general one.

use std::fmt;

use crate::core::{Axis, Scale};
use crate::decimation::{DecimatedValues, EnvelopePoint, StackedColumn, TraceRect};
use crate::error::{ChartError, ChartResult};
use crate::render::{CirclePrimitive, ElementStyle, PathPrimitive, RectPrimitive, RenderFrame};

use super::{HoverHighlighter, SeriesKind};

const LINE_STROKE_PX: f64 = 1.5;
const MARKER_RADIUS_PX: f64 = 3.0;

/// Everything a series renderer may read while drawing.
#[derive(Debug, Clone, Copy)]
pub struct SeriesDrawContext<'a> {
    pub series_id: &'a str,
    pub kind: SeriesKind,
    pub x_axis: &'a Axis,
    pub y_axis: &'a Axis,
    /// Top-left corner of the plot area in viewport pixels.
    pub plot_origin: (f64, f64),
    pub style: ElementStyle,
    pub hover: &'a HoverHighlighter,
}

impl SeriesDrawContext<'_> {
    #[must_use]
    pub fn x_pixel(&self, x: f64) -> Option<f64> {
        self.x_axis
            .scale()
            .map_numeric(x)
            .map(|pixel| pixel + self.plot_origin.0)
            .filter(|pixel| pixel.is_finite())
    }

    #[must_use]
    pub fn y_pixel(&self, y: f64) -> Option<f64> {
        self.y_axis
            .scale()
            .map_numeric(y)
            .map(|pixel| pixel + self.plot_origin.1)
            .filter(|pixel| pixel.is_finite())
    }

    /// Element style, highlighted while `key` is hovered.
    #[must_use]
    pub fn style_for(&self, key: &str) -> ElementStyle {
        self.hover.style_for(key, self.style)
    }
}

pub trait SeriesRenderer: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Appends primitives for `values`; entries that map outside finite
    /// pixel space are skipped.
    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    );
}

pub type RendererPredicate = fn(SeriesKind, &DecimatedValues) -> bool;
pub type RendererConstructor = fn() -> Box<dyn SeriesRenderer>;

#[derive(Debug, Clone, Copy)]
struct Registration {
    name: &'static str,
    predicate: RendererPredicate,
    constructor: RendererConstructor,
}

#[derive(Debug, Clone)]
pub struct SeriesRendererRegistry {
    registrations: Vec<Registration>,
}

impl Default for SeriesRendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SeriesRendererRegistry {
    /// Registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Registry with the built-in renderers, specific ones first.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "bar",
            |kind, values| kind == SeriesKind::Bar && matches!(values, DecimatedValues::Points(_)),
            || Box::new(BarRenderer),
        );
        registry.register(
            "scatter",
            |kind, values| {
                kind == SeriesKind::Scatter && matches!(values, DecimatedValues::Points(_))
            },
            || Box::new(MarkerRenderer),
        );
        registry.register(
            "line",
            |_, values| matches!(values, DecimatedValues::Points(_)),
            || Box::new(LineRenderer),
        );
        registry.register(
            "envelope",
            |_, values| matches!(values, DecimatedValues::Envelope(_)),
            || Box::new(EnvelopeRenderer),
        );
        registry.register(
            "flame",
            |kind, values| kind == SeriesKind::Flame && matches!(values, DecimatedValues::Rects(_)),
            || Box::new(StateRectRenderer { by_depth: true }),
        );
        registry.register(
            "state",
            |_, values| matches!(values, DecimatedValues::Rects(_)),
            || Box::new(StateRectRenderer { by_depth: false }),
        );
        registry.register(
            "stacked",
            |_, values| matches!(values, DecimatedValues::Stacked { .. }),
            || Box::new(StackedRenderer),
        );
        registry
    }

    /// Appends a registration; it is tried after every existing one.
    pub fn register(
        &mut self,
        name: &'static str,
        predicate: RendererPredicate,
        constructor: RendererConstructor,
    ) {
        self.registrations.push(Registration {
            name,
            predicate,
            constructor,
        });
    }

    /// Inserts a registration right before the one called `before`.
    pub fn register_before(
        &mut self,
        before: &str,
        name: &'static str,
        predicate: RendererPredicate,
        constructor: RendererConstructor,
    ) -> ChartResult<()> {
        let index = self
            .registrations
            .iter()
            .position(|registration| registration.name == before)
            .ok_or_else(|| {
                ChartError::InvalidConfiguration(format!(
                    "no series renderer registered as `{before}`"
                ))
            })?;
        self.registrations.insert(
            index,
            Registration {
                name,
                predicate,
                constructor,
            },
        );
        Ok(())
    }

    /// Registration names in lookup order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.registrations
            .iter()
            .map(|registration| registration.name)
            .collect()
    }

    /// First renderer whose predicate accepts the series.
    #[must_use]
    pub fn resolve(
        &self,
        kind: SeriesKind,
        values: &DecimatedValues,
    ) -> Option<Box<dyn SeriesRenderer>> {
        self.registrations
            .iter()
            .find(|registration| (registration.predicate)(kind, values))
            .map(|registration| (registration.constructor)())
    }
}

#[derive(Debug)]
struct LineRenderer;

impl SeriesRenderer for LineRenderer {
    fn name(&self) -> &'static str {
        "line"
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let DecimatedValues::Points(points) = values else {
            return;
        };
        let path: Vec<(f64, f64)> = points
            .iter()
            .filter_map(|point| Some((context.x_pixel(point.x)?, context.y_pixel(point.y)?)))
            .collect();
        if path.len() < 2 {
            return;
        }
        frame.paths.push(PathPrimitive {
            points: path,
            closed: false,
            stroke_width: LINE_STROKE_PX,
            style: context.style,
        });
    }
}

#[derive(Debug)]
struct MarkerRenderer;

impl SeriesRenderer for MarkerRenderer {
    fn name(&self) -> &'static str {
        "scatter"
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let DecimatedValues::Points(points) = values else {
            return;
        };
        frame.circles.extend(points.iter().filter_map(|point| {
            Some(CirclePrimitive {
                cx: context.x_pixel(point.x)?,
                cy: context.y_pixel(point.y)?,
                radius: MARKER_RADIUS_PX,
                style: context.style,
            })
        }));
    }
}

#[derive(Debug)]
struct EnvelopeRenderer;

impl SeriesRenderer for EnvelopeRenderer {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let DecimatedValues::Envelope(points) = values else {
            return;
        };
        let pixel = |point: &EnvelopePoint| {
            Some((
                context.x_pixel(point.x)?,
                context.y_pixel(point.min)?,
                context.y_pixel(point.max)?,
                context.y_pixel(point.y)?,
            ))
        };
        let columns: Vec<(f64, f64, f64, f64)> = points.iter().filter_map(pixel).collect();
        if columns.len() < 2 {
            return;
        }

        let mut outline: Vec<(f64, f64)> =
            columns.iter().map(|(x, _, max, _)| (*x, *max)).collect();
        outline.extend(columns.iter().rev().map(|(x, min, _, _)| (*x, *min)));
        frame.paths.push(PathPrimitive {
            points: outline,
            closed: true,
            stroke_width: 0.0,
            style: context.style,
        });
        frame.paths.push(PathPrimitive {
            points: columns.iter().map(|(x, _, _, avg)| (*x, *avg)).collect(),
            closed: false,
            stroke_width: LINE_STROKE_PX,
            style: context.style,
        });
    }
}

/// Bars on a banded x axis; point `x` is the category index.
#[derive(Debug)]
struct BarRenderer;

impl SeriesRenderer for BarRenderer {
    fn name(&self) -> &'static str {
        "bar"
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let DecimatedValues::Points(points) = values else {
            return;
        };
        let Some(band) = context.x_axis.scale().as_band() else {
            return;
        };
        let Some(baseline) = context.y_pixel(0.0) else {
            return;
        };
        let width = band.bandwidth();
        for point in points {
            if point.x < 0.0 || !point.x.is_finite() {
                continue;
            }
            let index = point.x as usize;
            let (Some(key), Some(center), Some(top)) = (
                band.key_at(index),
                context.x_pixel(point.x),
                context.y_pixel(point.y),
            ) else {
                continue;
            };
            frame.rects.push(
                RectPrimitive::new(
                    center - width / 2.0,
                    top.min(baseline),
                    width,
                    (baseline - top).abs(),
                    context.style_for(key),
                )
                .with_key(key),
            );
        }
    }
}

/// Interval rectangles, one lane per state name on a banded y axis or one
/// row per depth otherwise.
#[derive(Debug)]
struct StateRectRenderer {
    by_depth: bool,
}

impl StateRectRenderer {
    fn lane(&self, context: &SeriesDrawContext<'_>, rect: &TraceRect) -> Option<(f64, f64)> {
        match context.y_axis.scale() {
            Scale::Band(band) if !self.by_depth => {
                let start = band.map(&rect.name)?;
                Some((start + context.plot_origin.1, band.bandwidth()))
            }
            Scale::Band(band) => {
                let start = band.map_index(rect.depth)?;
                Some((start + context.plot_origin.1, band.bandwidth()))
            }
            Scale::Continuous(_) => {
                let top = context.y_pixel(rect.depth as f64)?;
                let bottom = context.y_pixel(rect.depth as f64 + 1.0)?;
                Some((top.min(bottom), (bottom - top).abs()))
            }
        }
    }
}

impl SeriesRenderer for StateRectRenderer {
    fn name(&self) -> &'static str {
        if self.by_depth { "flame" } else { "state" }
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let DecimatedValues::Rects(rects) = values else {
            return;
        };
        for rect in rects {
            let (Some(left), Some(right), Some((top, height))) = (
                context.x_pixel(rect.x),
                context.x_pixel(rect.end()),
                self.lane(context, rect),
            ) else {
                continue;
            };
            frame.rects.push(
                RectPrimitive::new(
                    left.min(right),
                    top,
                    (right - left).abs(),
                    height,
                    context.style_for(&rect.name),
                )
                .with_key(rect.name.clone()),
            );
        }
    }
}

#[derive(Debug)]
struct StackedRenderer;

impl SeriesRenderer for StackedRenderer {
    fn name(&self) -> &'static str {
        "stacked"
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let DecimatedValues::Stacked { states, columns } = values else {
            return;
        };
        let mut lower = vec![0.0; columns.len()];
        for (state_index, state) in states.iter().enumerate() {
            let upper: Vec<f64> = columns
                .iter()
                .zip(&lower)
                .map(|(column, base)| base + column.values.get(state_index).copied().unwrap_or(0.0))
                .collect();
            let edge = |column: &StackedColumn, value: f64| {
                Some((context.x_pixel(column.x + column.dx / 2.0)?, context.y_pixel(value)?))
            };
            let mut outline: Vec<(f64, f64)> = columns
                .iter()
                .zip(&upper)
                .filter_map(|(column, value)| edge(column, *value))
                .collect();
            outline.extend(
                columns
                    .iter()
                    .zip(&lower)
                    .rev()
                    .filter_map(|(column, value)| edge(column, *value)),
            );
            if outline.len() >= 4 {
                frame.paths.push(PathPrimitive {
                    points: outline,
                    closed: true,
                    stroke_width: 0.0,
                    style: context.style_for(state),
                });
            }
            lower = upper;
        }
    }
}
