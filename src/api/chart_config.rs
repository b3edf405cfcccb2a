use serde::{Deserialize, Serialize};

use crate::core::{AxisAlignment, Domain, Margin, ScaleKind, TickFormat, Viewport};
use crate::decimation::DecimatorKey;
use crate::error::{ChartError, ChartResult};
use crate::interaction::{ChartId, InteractionOptions};
use crate::render::{ElementStyle, RenderBackend};

/// Visual kind of a series; picks the default decimator and renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    /// Min/max envelope with an average centerline.
    Area,
    Scatter,
    /// One bar per category of a banded x axis.
    Bar,
    /// State lanes of named intervals.
    Trace,
    Flame,
    /// Time share of each state, stacked per pixel column.
    StackedTrace,
}

impl SeriesKind {
    /// Decimator used when the series does not name one.
    ///
    /// Bars are drawn per category and never decimated.
    #[must_use]
    pub fn default_decimator(self) -> Option<DecimatorKey> {
        match self {
            Self::Line => Some(DecimatorKey::Point),
            Self::Area => Some(DecimatorKey::MinMax),
            Self::Scatter => Some(DecimatorKey::Marker),
            Self::Bar => None,
            Self::Trace | Self::Flame => Some(DecimatorKey::State),
            Self::StackedTrace => Some(DecimatorKey::Residency),
        }
    }

    #[must_use]
    pub fn consumes_intervals(self) -> bool {
        matches!(self, Self::Trace | Self::Flame | Self::StackedTrace)
    }
}

fn default_levels() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub id: String,
    pub alignment: AxisAlignment,
    #[serde(default)]
    pub kind: ScaleKind,
    /// Nested band levels; only banded axes may use more than one.
    #[serde(default = "default_levels")]
    pub levels: usize,
    /// Fixed level-0 domain. Continuous x axes without one follow the data.
    #[serde(default)]
    pub domain: Option<Domain>,
    /// Re-range from decimated output after every render.
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub tick_format: TickFormat,
}

impl AxisConfig {
    #[must_use]
    pub fn new(id: impl Into<String>, alignment: AxisAlignment, kind: ScaleKind) -> Self {
        Self {
            id: id.into(),
            alignment,
            kind,
            levels: 1,
            domain: None,
            dynamic: false,
            tick_format: TickFormat::default(),
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    #[must_use]
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    #[must_use]
    pub fn with_tick_format(mut self, tick_format: TickFormat) -> Self {
        self.tick_format = tick_format;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub id: String,
    pub kind: SeriesKind,
    pub x_axis: String,
    pub y_axis: String,
    /// Overrides `SeriesKind::default_decimator`.
    #[serde(default)]
    pub decimator: Option<DecimatorKey>,
    /// Tooltip section shared with other series of the same group.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub style: ElementStyle,
    /// Redraw the previous decimation while a new one is running.
    #[serde(default)]
    pub keep_stale: bool,
    /// Stacking order for state decimators.
    #[serde(default)]
    pub state_names: Vec<String>,
    /// Streaming storage that keeps only the newest entries.
    #[serde(default)]
    pub ring_capacity: Option<usize>,
}

impl SeriesConfig {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: SeriesKind,
        x_axis: impl Into<String>,
        y_axis: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            x_axis: x_axis.into(),
            y_axis: y_axis.into(),
            decimator: None,
            group: None,
            label: None,
            style: ElementStyle::default(),
            keep_stale: false,
            state_names: Vec::new(),
            ring_capacity: None,
        }
    }

    #[must_use]
    pub fn with_decimator(mut self, decimator: DecimatorKey) -> Self {
        self.decimator = Some(decimator);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn keep_stale(mut self) -> Self {
        self.keep_stale = true;
        self
    }

    #[must_use]
    pub fn with_state_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state_names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = Some(capacity);
        self
    }

    /// Decimator actually used: explicit choice, then the kind's default.
    #[must_use]
    pub fn effective_decimator(&self) -> Option<DecimatorKey> {
        self.decimator.or(self.kind.default_decimator())
    }

    /// Legend and tooltip label.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Tooltip section this series contributes to.
    #[must_use]
    pub fn tooltip_group(&self) -> &str {
        self.group.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    #[default]
    Bottom,
}

fn default_legend_font_size() -> f64 {
    12.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendConfig {
    pub id: String,
    #[serde(default)]
    pub position: LegendPosition,
    /// Series listed in the legend; empty means every series.
    #[serde(default)]
    pub series: Vec<String>,
    #[serde(default = "default_legend_font_size")]
    pub font_size_px: f64,
}

impl LegendConfig {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: LegendPosition::default(),
            series: Vec::new(),
            font_size_px: default_legend_font_size(),
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: LegendPosition) -> Self {
        self.position = position;
        self
    }
}

/// Background decimation settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOptions {
    pub enabled: bool,
    /// Thread name prefix for worker threads.
    pub name_prefix: Option<String>,
}

/// Group names this chart joins when attached to a hub.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartGroups {
    pub tooltip: Option<String>,
    pub highlight: Option<String>,
    pub render: Option<String>,
}

/// Declarative chart description consumed by `Chart::finalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    pub id: ChartId,
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    #[serde(default)]
    pub legends: Vec<LegendConfig>,
    #[serde(default)]
    pub interaction: InteractionOptions,
    #[serde(default)]
    pub workers: WorkerOptions,
    #[serde(default)]
    pub backend: RenderBackend,
    #[serde(default)]
    pub groups: ChartGroups,
}

impl ChartDescription {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ChartId::new(id),
            axes: Vec::new(),
            series: Vec::new(),
            legends: Vec::new(),
            interaction: InteractionOptions::default(),
            workers: WorkerOptions::default(),
            backend: RenderBackend::default(),
            groups: ChartGroups::default(),
        }
    }

    #[must_use]
    pub fn with_axis(mut self, axis: AxisConfig) -> Self {
        self.axes.push(axis);
        self
    }

    #[must_use]
    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series.push(series);
        self
    }

    #[must_use]
    pub fn with_legend(mut self, legend: LegendConfig) -> Self {
        self.legends.push(legend);
        self
    }

    #[must_use]
    pub fn with_interaction(mut self, interaction: InteractionOptions) -> Self {
        self.interaction = interaction;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: WorkerOptions) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: RenderBackend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: ChartGroups) -> Self {
        self.groups = groups;
        self
    }

    pub fn from_json(input: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn axis(&self, id: &str) -> Option<&AxisConfig> {
        self.axes.iter().find(|axis| axis.id == id)
    }

    /// Folds `other` into this description.
    ///
    /// Axes with a new id are appended; an axis id present in both must keep
    /// the same banded-ness. Series and legends with a new id are appended,
    /// existing ones are replaced.
    pub fn merge(&mut self, other: ChartDescription) -> ChartResult<()> {
        for axis in &other.axes {
            if let Some(existing) = self.axis(&axis.id) {
                if existing.kind.is_banded() != axis.kind.is_banded() {
                    return Err(ChartError::InvalidConfiguration(format!(
                        "axis `{}` cannot merge a {:?} description into a {:?} one",
                        axis.id, axis.kind, existing.kind
                    )));
                }
            }
        }

        for axis in other.axes {
            match self.axes.iter_mut().find(|existing| existing.id == axis.id) {
                Some(existing) => *existing = axis,
                None => self.axes.push(axis),
            }
        }
        for series in other.series {
            match self.series.iter_mut().find(|existing| existing.id == series.id) {
                Some(existing) => *existing = series,
                None => self.series.push(series),
            }
        }
        for legend in other.legends {
            match self.legends.iter_mut().find(|existing| existing.id == legend.id) {
                Some(existing) => *existing = legend,
                None => self.legends.push(legend),
            }
        }
        Ok(())
    }
}

/// Pixel layout persisted across renders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub viewport: Viewport,
    #[serde(default = "default_margin")]
    pub margin: Margin,
}

fn default_margin() -> Margin {
    Margin {
        top: 10.0,
        right: 20.0,
        bottom: 30.0,
        left: 50.0,
    }
}

impl LayoutOptions {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            margin: default_margin(),
        }
    }

    #[must_use]
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    /// Applies `update` and reports how much of the chart must be laid out.
    pub fn merge(&mut self, update: LayoutUpdate) -> Relayout {
        let mut relayout = Relayout::Reposition;
        if let Some(viewport) = update.viewport {
            if viewport != self.viewport {
                self.viewport = viewport;
                relayout = Relayout::Full;
            }
        }
        if let Some(margin) = update.margin {
            if margin != self.margin {
                self.margin = margin;
                relayout = Relayout::Full;
            }
        }
        relayout
    }
}

/// Incoming layout options for one `render` call; `None` keeps the
/// persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutUpdate {
    pub viewport: Option<Viewport>,
    pub margin: Option<Margin>,
}

impl LayoutUpdate {
    #[must_use]
    pub fn resize(viewport: Viewport) -> Self {
        Self {
            viewport: Some(viewport),
            margin: None,
        }
    }
}

/// Extent of the layout work a render performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relayout {
    /// Dimensions or margins changed; every axis redraws.
    Full,
    /// Only domains may have moved.
    Reposition,
}

#[cfg(test)]
mod tests {
    use super::{
        AxisConfig, ChartDescription, LayoutOptions, LayoutUpdate, Relayout, SeriesConfig,
        SeriesKind,
    };
    use crate::core::{AxisAlignment, Margin, ScaleKind, Viewport};
    use crate::decimation::DecimatorKey;
    use crate::error::ChartError;

    #[test]
    fn description_loads_from_json_with_defaults() {
        let description = ChartDescription::from_json(
            r#"{
                "id": "cpu",
                "axes": [
                    {"id": "time", "alignment": "bottom"},
                    {"id": "value", "alignment": "left", "dynamic": true}
                ],
                "series": [
                    {"id": "user", "kind": "area", "x_axis": "time", "y_axis": "value"}
                ]
            }"#,
        )
        .expect("parse description");

        assert_eq!(description.id.as_str(), "cpu");
        assert_eq!(description.axes[0].kind, ScaleKind::Linear);
        assert_eq!(description.axes[0].levels, 1);
        assert!(description.axes[1].dynamic);
        assert_eq!(
            description.series[0].effective_decimator(),
            Some(DecimatorKey::MinMax)
        );
        assert!(description.interaction.hover);
    }

    #[test]
    fn merging_banded_into_continuous_axis_is_rejected() {
        let mut base = ChartDescription::new("a")
            .with_axis(AxisConfig::new("x", AxisAlignment::Bottom, ScaleKind::Linear));
        let ordinal = ChartDescription::new("a")
            .with_axis(AxisConfig::new("x", AxisAlignment::Bottom, ScaleKind::Band));

        let err = base.merge(ordinal).expect_err("mismatched merge");
        assert!(matches!(err, ChartError::InvalidConfiguration(_)));
    }

    #[test]
    fn merge_replaces_series_by_id() {
        let mut base = ChartDescription::new("a")
            .with_series(SeriesConfig::new("s", SeriesKind::Line, "x", "y"));
        let update = ChartDescription::new("a")
            .with_series(SeriesConfig::new("s", SeriesKind::Scatter, "x", "y"))
            .with_series(SeriesConfig::new("t", SeriesKind::Line, "x", "y"));

        base.merge(update).expect("merge");
        assert_eq!(base.series.len(), 2);
        assert_eq!(base.series[0].kind, SeriesKind::Scatter);
    }

    #[test]
    fn layout_merge_flags_dimension_changes() {
        let mut options = LayoutOptions::new(Viewport::new(800, 400));
        assert_eq!(options.merge(LayoutUpdate::default()), Relayout::Reposition);
        assert_eq!(
            options.merge(LayoutUpdate::resize(Viewport::new(800, 400))),
            Relayout::Reposition
        );
        assert_eq!(
            options.merge(LayoutUpdate {
                viewport: None,
                margin: Some(Margin::uniform(5.0)),
            }),
            Relayout::Full
        );
        assert_eq!(options.margin, Margin::uniform(5.0));
    }
}
