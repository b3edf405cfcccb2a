//! The render pipeline.
//!
//! 1. merge layout options, 2. commit axis ranges and domains, 3. redraw
//! stale series, 4. decimate every series (fan-out, fan-in), 5. auto-range
//! dynamic axes, draw, and lay the legend out again. A legend whose row
//! count changed triggers one more full pass.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::scale::{DEFAULT_LINEAR_DOMAIN, DEFAULT_LOG_DOMAIN};
use crate::core::{AxisAlignment, Domain, ScaleKind};
use crate::error::{ChartError, ChartResult};
use crate::interaction::ChartId;
use crate::render::{
    Color, ElementStyle, LinePrimitive, RectPrimitive, RenderFrame, RenderLayer, Renderer,
};

use super::{
    Chart, LayoutUpdate, LegendEntry, LegendLayout, LegendPosition, PlotArea, Relayout,
    SeriesDrawContext, series_decimation::decimate_all,
};

/// Extra passes allowed after a legend row-count change.
const MAX_RELAYOUT_PASSES: usize = 1;
/// Share of the data extent added on both sides of a dynamic axis.
const DYNAMIC_RANGE_PADDING: f64 = 0.05;
const CROSSHAIR_COLOR: Color = Color::rgba(0.3, 0.3, 0.3, 0.8);
const BRUSH_STYLE: ElementStyle = ElementStyle {
    fill: Color::rgba(0.4, 0.6, 0.9, 0.25),
    stroke: Color::rgba(0.2, 0.4, 0.8, 0.9),
};

/// What one `Chart::render` call did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub relayout: Relayout,
    /// Pipeline passes, `1` unless the legend forced a relayout.
    pub passes: usize,
    pub decimated: usize,
    pub superseded: usize,
    /// Series redrawn from previous output before decimation finished.
    pub stale_redraws: usize,
    pub legend_rows: usize,
    /// Render-group siblings that should render along with this chart.
    pub group_render: Vec<ChartId>,
}

pub(super) struct RenderCoordinator;

impl RenderCoordinator {
    pub(super) fn render<R: Renderer>(
        chart: &mut Chart<R>,
        update: LayoutUpdate,
    ) -> ChartResult<RenderReport> {
        let relayout = chart.core.layout.merge(update);
        if !chart.core.layout.viewport.is_valid() {
            let viewport = chart.core.layout.viewport;
            return Err(ChartError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if relayout == Relayout::Full || !chart.backend().retains_layers() {
            chart.invalidate_axes();
        }

        let mut report = RenderReport {
            relayout,
            passes: 0,
            decimated: 0,
            superseded: 0,
            stale_redraws: 0,
            legend_rows: chart.core.legend.row_count(),
            group_render: Vec::new(),
        };

        loop {
            report.passes += 1;
            let rows_before = chart.core.legend.row_count();

            Self::commit_axes(chart);
            report.stale_redraws += chart.draw_stale_series()?;

            let summary = decimate_all(&mut chart.core)?;
            report.decimated += summary.completed;
            report.superseded += summary.superseded;

            Self::update_dynamic_axes(chart)?;
            chart.draw_axes()?;
            chart.draw_series()?;
            chart.draw_overlays()?;
            let rows = chart.relayout_legend()?;
            report.legend_rows = rows;

            if rows == rows_before || report.passes > MAX_RELAYOUT_PASSES {
                break;
            }
            debug!(chart = %chart.id(), rows_before, rows, "legend rows changed, laying out again");
            chart.invalidate_axes();
        }

        if let Some(hub) = &chart.core.hub {
            report.group_render = hub.request_group_render(&chart.core.description.id);
        }
        trace!(
            chart = %chart.id(),
            passes = report.passes,
            decimated = report.decimated,
            "render finished"
        );
        Ok(report)
    }

    /// Lays out the plot area and commits every axis to it.
    fn commit_axes<R: Renderer>(chart: &mut Chart<R>) {
        let core = &mut chart.core;
        let viewport = core.layout.viewport;
        let margin = core.layout.margin;
        let legend_height = core.legend.height();
        let legend_on_top = core
            .description
            .legends
            .first()
            .is_some_and(|legend| legend.position == LegendPosition::Top);

        let plot = PlotArea {
            left: margin.left,
            top: margin.top + if legend_on_top { legend_height } else { 0.0 },
            width: (f64::from(viewport.width) - margin.left - margin.right).max(0.0),
            height: (f64::from(viewport.height) - margin.top - margin.bottom - legend_height)
                .max(0.0),
        };
        core.plot = plot;

        let mut domains = Vec::new();
        for config in &core.description.axes {
            if config.kind.is_banded() || config.alignment.is_vertical() {
                continue;
            }
            let zoom = core
                .zoom_window
                .filter(|_| core.primary_x.as_deref() == Some(config.id.as_str()));
            let domain = match zoom.or_else(|| core.full_x_domain(&config.id)) {
                Some(domain) => domain,
                None => {
                    debug!(axis = %config.id, "no data for axis, using default domain");
                    if config.kind == ScaleKind::Log {
                        DEFAULT_LOG_DOMAIN
                    } else {
                        DEFAULT_LINEAR_DOMAIN
                    }
                }
            };
            domains.push((config.id.clone(), domain));
        }

        for (id, (start, end)) in domains {
            if let Some(axis) = core.axes.get_mut(&id) {
                if let Err(err) = axis.set_domain(Domain::Continuous { start, end }, 0) {
                    warn!(error = %err, axis = %id, "skipping x domain update");
                }
            }
        }

        for axis in core.axes.values_mut() {
            let pixels = if axis.alignment().is_vertical() {
                plot.height
            } else {
                plot.width
            };
            axis.commit_range(pixels);
            let (x, y) = match axis.alignment() {
                AxisAlignment::Bottom => (plot.left, plot.bottom()),
                AxisAlignment::Top | AxisAlignment::Left => (plot.left, plot.top),
                AxisAlignment::Right => (plot.right(), plot.top),
            };
            axis.set_origin(x, y);
        }
    }

    /// Re-ranges dynamic axes to the padded union of their series output.
    fn update_dynamic_axes<R: Renderer>(chart: &mut Chart<R>) -> ChartResult<()> {
        let core = &mut chart.core;
        let mut updates = Vec::new();
        for config in core.description.axes.iter().filter(|axis| axis.dynamic) {
            let extent = core
                .series
                .iter()
                .filter(|state| state.config.y_axis == config.id)
                .filter_map(|state| state.decimated.as_ref()?.y_extent())
                .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)));
            let Some((min, max)) = extent else {
                debug!(axis = %config.id, "no decimated data for dynamic axis, keeping domain");
                continue;
            };
            let padding = (max - min) * DYNAMIC_RANGE_PADDING;
            updates.push((config.id.clone(), min - padding, max + padding));
        }

        for (id, start, end) in updates {
            if let Some(axis) = core.axes.get_mut(&id) {
                axis.set_domain(Domain::Continuous { start, end }, 0)?;
                trace!(axis = %id, start, end, "dynamic axis ranged");
            }
        }
        Ok(())
    }
}

impl<R: Renderer> Chart<R> {
    /// Sends `frame` to the renderer unless a retained backend already shows
    /// an identical frame for that layer. Returns whether it was sent.
    pub(super) fn emit_frame(&mut self, frame: RenderFrame) -> ChartResult<bool> {
        let frame = frame.with_mode(self.backend().frame_mode());
        let unchanged = self.core.last_frames.get(&frame.layer) == Some(&frame);
        if self.backend().retains_layers() && unchanged {
            trace!(layer = ?frame.layer, "layer unchanged, not re-sent");
            return Ok(false);
        }
        self.renderer.render(&frame)?;
        self.core.last_frames.insert(frame.layer, frame);
        Ok(true)
    }

    pub(super) fn invalidate_axes(&mut self) {
        for axis in self.core.axes.values_mut() {
            axis.invalidate();
        }
    }

    fn draw_axes(&mut self) -> ChartResult<()> {
        let viewport = self.core.layout.viewport;
        let mut changed = false;
        for (id, axis) in &mut self.core.axes {
            let outcome = axis.render(&mut self.renderer, viewport)?;
            if outcome.drawn {
                let frame = axis.build_frame(viewport, &axis.ticks(), &outcome.suppressed);
                self.core.axis_frames.insert(id.clone(), frame);
                changed = true;
            }
        }
        if changed {
            let mut merged = RenderFrame::new(viewport, RenderLayer::Axis);
            for frame in self.core.axis_frames.values() {
                merged.merge(frame.clone());
            }
            self.core.last_frames.insert(RenderLayer::Axis, merged);
        }
        Ok(())
    }

    /// Series layer built from whatever decimated output each series has.
    pub(super) fn build_series_frame(&self, stale_only: bool) -> RenderFrame {
        let core = &self.core;
        let mut frame = RenderFrame::new(core.layout.viewport, RenderLayer::Series);
        for state in &core.series {
            if stale_only && !state.config.keep_stale {
                continue;
            }
            let Some(values) = state.decimated.as_ref() else {
                continue;
            };
            let (Some(x_axis), Some(y_axis)) = (
                core.axes.get(&state.config.x_axis),
                core.axes.get(&state.config.y_axis),
            ) else {
                continue;
            };
            let Some(renderer) = core.series_renderers.resolve(state.config.kind, values) else {
                debug!(
                    series = %state.config.id,
                    kind = ?state.config.kind,
                    "no series renderer matches"
                );
                continue;
            };
            let context = SeriesDrawContext {
                series_id: &state.config.id,
                kind: state.config.kind,
                x_axis,
                y_axis,
                plot_origin: (core.plot.left, core.plot.top),
                style: state.config.style,
                hover: &core.hover,
            };
            renderer.draw(&context, values, &mut frame);
        }
        frame
    }

    /// Step 3: shows previous output of `keep_stale` series whose data
    /// changed, so the chart is never blank while decimation runs.
    fn draw_stale_series(&mut self) -> ChartResult<usize> {
        let stale = self
            .core
            .series
            .iter()
            .filter(|state| state.config.keep_stale && state.dirty && state.decimated.is_some())
            .count();
        if stale == 0 {
            return Ok(0);
        }
        let frame = self.build_series_frame(true);
        self.emit_frame(frame)?;
        Ok(stale)
    }

    pub(super) fn draw_series(&mut self) -> ChartResult<()> {
        let frame = self.build_series_frame(false);
        self.emit_frame(frame)?;
        Ok(())
    }

    /// Crosshair line and brush rectangle.
    pub(super) fn draw_overlays(&mut self) -> ChartResult<()> {
        let viewport = self.core.layout.viewport;
        let plot = self.core.plot;
        let mut crosshair = RenderFrame::new(viewport, RenderLayer::Crosshair);
        let mut overlay = RenderFrame::new(viewport, RenderLayer::Overlay);

        if let Some(axis) = self.core.primary_axis() {
            let cursor = self
                .core
                .coordinator
                .cursor()
                .and_then(|value| {
                    if axis.is_banded() {
                        Some(value)
                    } else {
                        axis.map_value(value)
                    }
                })
                .filter(|pixel| pixel.is_finite());
            if let Some(pixel) = cursor {
                let x = plot.left + pixel;
                crosshair.lines.push(LinePrimitive::new(
                    x,
                    plot.top,
                    x,
                    plot.bottom(),
                    1.0,
                    CROSSHAIR_COLOR,
                ));
            }

            if let Some(brush) = self.core.coordinator.brush() {
                let (start, end) = brush.ordered();
                if let (Some(p0), Some(p1)) = (axis.map_value(start), axis.map_value(end)) {
                    if p0.is_finite() && p1.is_finite() {
                        overlay.rects.push(
                            RectPrimitive::new(
                                plot.left + p0.min(p1),
                                plot.top,
                                (p1 - p0).abs(),
                                plot.height,
                                BRUSH_STYLE,
                            )
                            .with_key("brush"),
                        );
                    }
                }
            }
        }

        self.emit_frame(crosshair)?;
        self.emit_frame(overlay)?;
        Ok(())
    }

    /// Recomputes legend contents and returns the new row count.
    fn relayout_legend(&mut self) -> ChartResult<usize> {
        let core = &self.core;
        let Some(first) = core.description.legends.first() else {
            return Ok(0);
        };
        let font_size_px = first.font_size_px;
        let position = first.position;

        let mut entries: Vec<LegendEntry> = Vec::new();
        for legend in &core.description.legends {
            for state in &core.series {
                let listed = legend.series.is_empty() || legend.series.contains(&state.config.id);
                if listed && !entries.iter().any(|entry| entry.series == state.config.id) {
                    entries.push(LegendEntry {
                        series: state.config.id.clone(),
                        label: state.config.display_label().to_owned(),
                        style: state.config.style,
                    });
                }
            }
        }

        let viewport = core.layout.viewport;
        let margin = core.layout.margin;
        let available = (f64::from(viewport.width) - margin.left - margin.right).max(0.0);
        let renderer = &self.renderer;
        let layout = LegendLayout::wrap(entries, available, font_size_px, |text, size| {
            renderer.measure_text(text, size)
        });

        let top = match position {
            LegendPosition::Top => 0.0,
            LegendPosition::Bottom => f64::from(viewport.height) - layout.height(),
        };
        let frame = layout.build_frame(viewport, margin.left, top.max(0.0));
        let rows = layout.row_count();
        self.core.legend = layout;
        self.emit_frame(frame)?;
        Ok(rows)
    }
}
