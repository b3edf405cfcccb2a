//! Chart orchestration: declarative descriptions, the render pipeline and
//! the imperative zoom/pan/export surface.

mod chart_config;
mod data_controller;
mod engine;
mod engine_core;
mod engine_init;
mod event_controller;
mod hover_style;
mod legend_layout;
mod render_coordinator;
mod series_decimation;
mod series_renderer_registry;
mod snapshot_controller;
mod tooltip_controller;
mod validation;
mod zoom_controller;

pub use chart_config::{
    AxisConfig, ChartDescription, ChartGroups, LayoutOptions, LayoutUpdate, LegendConfig,
    LegendPosition, Relayout, SeriesConfig, SeriesKind, WorkerOptions,
};
pub use engine::Chart;
pub use engine_core::PlotArea;
pub use event_controller::EventOutcome;
pub use hover_style::HoverHighlighter;
pub use legend_layout::{LegendEntry, LegendLayout, PlacedLegendEntry};
pub use render_coordinator::RenderReport;
pub use series_renderer_registry::{
    RendererConstructor, RendererPredicate, SeriesDrawContext, SeriesRenderer,
    SeriesRendererRegistry,
};
pub use snapshot_controller::{ChartOptions, ChartSnapshot};
