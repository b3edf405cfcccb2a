use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::Axis;
use crate::error::ChartResult;
use crate::interaction::{EventCoordinator, GroupHub, GroupKind};
use crate::render::Renderer;
use crate::worker::{DecimationDispatcher, ThreadWorkerRuntime, WorkerRuntime};

use super::{
    AxisConfig, Chart, ChartDescription, HoverHighlighter, LayoutOptions, LegendLayout, PlotArea,
    SeriesRendererRegistry,
    engine_core::{ChartCore, SeriesState},
    validation::{validate_description, validate_layout},
};

impl<R: Renderer> Chart<R> {
    /// Validates `description` and builds every axis and series.
    ///
    /// Configuration errors (`EmptyChart`, `InvalidConfiguration`) are
    /// returned here and never later from `render`.
    pub fn finalize(
        renderer: R,
        description: ChartDescription,
        layout: LayoutOptions,
    ) -> ChartResult<Self> {
        validate_layout(&layout)?;
        validate_description(&description)?;

        let mut axes = IndexMap::with_capacity(description.axes.len());
        for config in &description.axes {
            axes.insert(config.id.clone(), build_axis(config)?);
        }
        let series = description
            .series
            .iter()
            .cloned()
            .map(SeriesState::new)
            .collect::<ChartResult<Vec<_>>>()?;

        let primary_x = description
            .series
            .first()
            .map(|series| series.x_axis.clone())
            .or_else(|| {
                description
                    .axes
                    .iter()
                    .find(|axis| !axis.alignment.is_vertical())
                    .map(|axis| axis.id.clone())
            });

        let dispatcher = if description.workers.enabled {
            let runtime = match &description.workers.name_prefix {
                Some(prefix) => ThreadWorkerRuntime::with_name_prefix(prefix.clone()),
                None => ThreadWorkerRuntime::default(),
            };
            DecimationDispatcher::with_runtime(Arc::new(runtime))
        } else {
            DecimationDispatcher::inline()
        };

        debug!(
            chart = %description.id,
            axes = axes.len(),
            series = series.len(),
            workers = dispatcher.uses_workers(),
            "chart finalized"
        );

        let coordinator = EventCoordinator::new(description.id.clone(), description.interaction);
        Ok(Self {
            renderer,
            core: ChartCore {
                description,
                layout,
                axes,
                series,
                primary_x,
                coordinator,
                dispatcher,
                hub: None,
                series_renderers: SeriesRendererRegistry::with_defaults(),
                hover: HoverHighlighter::default(),
                legend: LegendLayout::default(),
                plot: PlotArea::default(),
                zoom_window: None,
                resizing: false,
                last_frames: IndexMap::new(),
                axis_frames: IndexMap::new(),
            },
        })
    }

    /// Decimates on workers from `runtime` instead of the configured ones.
    #[must_use]
    pub fn with_worker_runtime(mut self, runtime: Arc<dyn WorkerRuntime>) -> Self {
        self.core.dispatcher.cancel_all();
        self.core.dispatcher = DecimationDispatcher::with_runtime(runtime);
        self
    }

    #[must_use]
    pub fn with_series_renderers(mut self, registry: SeriesRendererRegistry) -> Self {
        self.core.series_renderers = registry;
        self
    }

    /// Links this chart to a dashboard hub and joins its configured groups.
    pub fn attach_hub(&mut self, hub: GroupHub) {
        let id = self.core.description.id.clone();
        hub.register_chart(&id);
        let groups = &self.core.description.groups;
        for (kind, group) in [
            (GroupKind::Tooltip, &groups.tooltip),
            (GroupKind::Highlight, &groups.highlight),
            (GroupKind::Render, &groups.render),
        ] {
            if let Some(group) = group {
                hub.join(kind, group, &id);
            }
        }
        self.core.hub = Some(hub);
    }

    /// Leaves every group of the attached hub. Callers must detach before
    /// dropping a chart, or the hub keeps its mailbox.
    pub fn detach_hub(&mut self) -> Option<GroupHub> {
        let hub = self.core.hub.take()?;
        hub.unregister_chart(&self.core.description.id);
        Some(hub)
    }

    #[must_use]
    pub fn hub(&self) -> Option<&GroupHub> {
        self.core.hub.as_ref()
    }
}

fn build_axis(config: &AxisConfig) -> ChartResult<Axis> {
    let mut axis = if config.kind.is_banded() {
        Axis::nested_bands(config.id.clone(), config.alignment, config.levels)?
    } else {
        Axis::new(config.id.clone(), config.alignment, config.kind)
    };
    axis.set_tick_format(config.tick_format);
    if let Some(domain) = &config.domain {
        axis.set_domain(domain.clone(), 0)?;
    }
    Ok(axis)
}
