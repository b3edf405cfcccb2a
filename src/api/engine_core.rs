use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Axis, Buffer, DataPoint, Domain, RingBuffer, SeriesBuffer, TraceBuffer};
use crate::decimation::{DecimatedValues, Decimator, SeriesValues};
use crate::error::ChartResult;
use crate::interaction::{EventCoordinator, GroupHub};
use crate::render::{RenderFrame, RenderLayer};
use crate::worker::DecimationDispatcher;

use super::{
    ChartDescription, HoverHighlighter, LayoutOptions, LegendLayout, SeriesConfig,
    SeriesRendererRegistry,
};

/// Plot rectangle inside the viewport, between margins and legend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Raw data, decimator and latest decimated output of one series.
#[derive(Debug)]
pub(super) struct SeriesState {
    pub(super) config: SeriesConfig,
    pub(super) decimator: Option<Box<dyn Decimator>>,
    pub(super) values: SeriesValues,
    pub(super) decimated: Option<DecimatedValues>,
    /// Data changed since `decimated` was produced.
    pub(super) dirty: bool,
}

impl SeriesState {
    pub(super) fn new(config: SeriesConfig) -> ChartResult<Self> {
        let values = if config.kind.consumes_intervals() {
            SeriesValues::Intervals(TraceBuffer::new(empty_buffer(config.ring_capacity)?))
        } else {
            SeriesValues::Points(empty_buffer(config.ring_capacity)?)
        };
        let decimator = config.effective_decimator().map(|key| key.create());
        Ok(Self {
            config,
            decimator,
            values,
            decimated: None,
            dirty: false,
        })
    }

    /// Output for series that are drawn without decimation.
    pub(super) fn undecimated(&self) -> Option<DecimatedValues> {
        match &self.values {
            SeriesValues::Points(buffer) => Some(DecimatedValues::Points(buffer.data())),
            SeriesValues::Intervals(_) => None,
        }
    }

    pub(super) fn points_mut(&mut self) -> Option<&mut SeriesBuffer<DataPoint>> {
        match &mut self.values {
            SeriesValues::Points(buffer) => Some(buffer),
            SeriesValues::Intervals(_) => None,
        }
    }

    pub(super) fn intervals_mut(&mut self) -> Option<&mut TraceBuffer> {
        match &mut self.values {
            SeriesValues::Intervals(buffer) => Some(buffer),
            SeriesValues::Points(_) => None,
        }
    }
}

pub(super) fn empty_buffer<T>(ring_capacity: Option<usize>) -> ChartResult<SeriesBuffer<T>> {
    Ok(match ring_capacity {
        Some(capacity) => SeriesBuffer::Ring(RingBuffer::with_capacity(capacity)?),
        None => SeriesBuffer::default(),
    })
}

/// Internal chart state used by the public facade (`Chart`).
pub(super) struct ChartCore {
    pub(super) description: ChartDescription,
    pub(super) layout: LayoutOptions,
    pub(super) axes: IndexMap<String, Axis>,
    pub(super) series: Vec<SeriesState>,
    /// Axis driving interaction, zoom and pan.
    pub(super) primary_x: Option<String>,
    pub(super) coordinator: EventCoordinator,
    pub(super) dispatcher: DecimationDispatcher,
    pub(super) hub: Option<GroupHub>,
    pub(super) series_renderers: SeriesRendererRegistry,
    pub(super) hover: HoverHighlighter,
    pub(super) legend: LegendLayout,
    pub(super) plot: PlotArea,
    /// Visible x window when zoomed by re-rendering.
    pub(super) zoom_window: Option<(f64, f64)>,
    pub(super) resizing: bool,
    pub(super) last_frames: IndexMap<RenderLayer, RenderFrame>,
    pub(super) axis_frames: IndexMap<String, RenderFrame>,
}

impl ChartCore {
    pub(super) fn series(&self, id: &str) -> Option<&SeriesState> {
        self.series.iter().find(|state| state.config.id == id)
    }

    pub(super) fn series_mut(&mut self, id: &str) -> Option<&mut SeriesState> {
        self.series.iter_mut().find(|state| state.config.id == id)
    }

    pub(super) fn primary_axis(&self) -> Option<&Axis> {
        self.primary_x.as_deref().and_then(|id| self.axes.get(id))
    }

    /// Unzoomed domain of a continuous x axis: its configured domain, or
    /// the x extent of every series bound to it.
    pub(super) fn full_x_domain(&self, axis_id: &str) -> Option<(f64, f64)> {
        let config = self.description.axis(axis_id)?;
        if config.kind.is_banded() {
            return None;
        }
        if let Some(Domain::Continuous { start, end }) = &config.domain {
            return Some((*start, *end));
        }
        self.series
            .iter()
            .filter(|state| state.config.x_axis == axis_id)
            .filter_map(|state| state.values.x_extent())
            .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)))
    }
}
