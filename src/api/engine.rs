use std::fmt;

use crate::core::Axis;
use crate::decimation::DecimatedValues;
use crate::error::ChartResult;
use crate::interaction::{ChartId, EventCoordinator};
use crate::render::{RenderBackend, Renderer};

use super::{
    HoverHighlighter, LayoutOptions, LayoutUpdate, LegendLayout, PlotArea, RenderReport,
    SeriesRendererRegistry, engine_core::ChartCore, render_coordinator::RenderCoordinator,
};

/// Main orchestration facade consumed by host applications.
///
/// `Chart` owns the axes, series buffers and decimators of one chart
/// element, drives the render pipeline and routes interaction events to and
/// from its linked charts.
pub struct Chart<R: Renderer> {
    pub(super) renderer: R,
    pub(super) core: ChartCore,
}

impl<R: Renderer> fmt::Debug for Chart<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("id", self.id())
            .field("backend", &self.backend())
            .field("series", &self.core.series.len())
            .field("zoom_window", &self.core.zoom_window)
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> Chart<R> {
    /// Runs the full render pipeline after merging `update` into the
    /// persisted layout.
    pub fn render(&mut self, update: LayoutUpdate) -> ChartResult<RenderReport> {
        RenderCoordinator::render(self, update)
    }

    #[must_use]
    pub fn id(&self) -> &ChartId {
        &self.core.description.id
    }

    #[must_use]
    pub fn backend(&self) -> RenderBackend {
        self.core.description.backend
    }

    #[must_use]
    pub fn layout(&self) -> LayoutOptions {
        self.core.layout
    }

    #[must_use]
    pub fn plot_area(&self) -> PlotArea {
        self.core.plot
    }

    #[must_use]
    pub fn axis(&self, id: &str) -> Option<&Axis> {
        self.core.axes.get(id)
    }

    /// Axis used for interaction, zoom and pan.
    #[must_use]
    pub fn primary_x_axis(&self) -> Option<&Axis> {
        self.core.primary_axis()
    }

    /// Latest decimated output of a series.
    #[must_use]
    pub fn decimated(&self, series_id: &str) -> Option<&DecimatedValues> {
        self.core.series(series_id)?.decimated.as_ref()
    }

    /// Raw entry count of a series.
    #[must_use]
    pub fn series_len(&self, series_id: &str) -> Option<usize> {
        self.core.series(series_id).map(|state| state.values.len())
    }

    #[must_use]
    pub fn legend(&self) -> &LegendLayout {
        &self.core.legend
    }

    #[must_use]
    pub fn coordinator(&self) -> &EventCoordinator {
        &self.core.coordinator
    }

    #[must_use]
    pub fn hover_styles(&self) -> &HoverHighlighter {
        &self.core.hover
    }

    /// Current zoom window, in either zoom mode.
    #[must_use]
    pub fn zoom_window(&self) -> Option<(f64, f64)> {
        self.core.coordinator.zoom_window()
    }

    pub fn series_renderers_mut(&mut self) -> &mut SeriesRendererRegistry {
        &mut self.core.series_renderers
    }

    /// Terminates every in-flight decimation worker.
    pub fn cancel_decimation(&self) {
        self.core.dispatcher.cancel_all();
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
