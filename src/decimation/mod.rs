//! Reduces raw series data to roughly one output entry per visible pixel.
//!
//! Every decimator follows the same lifecycle: `initialize` binds the scales
//! of the owning chart, then any number of `decimate_values` calls reduce a
//! buffer for a visible window. A call never mutates its input and depends
//! only on the bound scales, the window and the data, so the same decimator
//! can run inline or on a worker thread with identical results.

mod flame;
mod marker;
mod min_max;
mod point;
mod residency;
mod state;

pub use flame::{DepthWalker, generate_rects};
pub use marker::MarkerDecimator;
pub use min_max::MinMaxDecimator;
pub use point::PointDecimator;
pub use residency::ResidencyDecimator;
pub use state::StateDecimator;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::core::{Buffer, ContinuousScale, DataPoint, Scale, SeriesBuffer, TraceBuffer};
use crate::error::{ChartError, ChartResult};

/// Stable identity of a decimation algorithm, sent to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimatorKey {
    Point,
    MinMax,
    Marker,
    State,
    Residency,
}

impl DecimatorKey {
    #[must_use]
    pub fn create(self) -> Box<dyn Decimator> {
        match self {
            Self::Point => Box::new(PointDecimator::default()),
            Self::MinMax => Box::new(MinMaxDecimator::default()),
            Self::Marker => Box::new(MarkerDecimator::default()),
            Self::State => Box::new(StateDecimator::default()),
            Self::Residency => Box::new(ResidencyDecimator::default()),
        }
    }

    /// Whether the algorithm consumes trace intervals rather than points.
    #[must_use]
    pub fn consumes_intervals(self) -> bool {
        matches!(self, Self::State | Self::Residency)
    }
}

/// Scales a decimator is bound to. Plain data, so it can cross threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecimatorScales {
    pub x: ContinuousScale,
    pub y: Scale,
    /// Category names for state-based decimators, in stacking order.
    #[serde(default)]
    pub state_names: Vec<String>,
}

/// Raw series data handed to a decimator.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValues {
    Points(SeriesBuffer<DataPoint>),
    Intervals(TraceBuffer),
}

impl SeriesValues {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Points(buffer) => buffer.len(),
            Self::Intervals(buffer) => buffer.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Domain extent of the data along x, ignoring non-finite entries.
    #[must_use]
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let mut extent: Option<(f64, f64)> = None;
        let mut include = |lo: f64, hi: f64| {
            if lo.is_finite() && hi.is_finite() {
                extent = Some(match extent {
                    Some((min, max)) => (min.min(lo), max.max(hi)),
                    None => (lo, hi),
                });
            }
        };
        match self {
            Self::Points(buffer) => {
                for index in 0..buffer.len() {
                    if let Some(point) = buffer.get(index) {
                        include(point.x, point.x);
                    }
                }
            }
            Self::Intervals(buffer) => {
                for index in 0..buffer.len() {
                    if let Some(interval) = buffer.get(index) {
                        include(interval.x, interval.end());
                    }
                }
            }
        }
        extent
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Points(_) => "points",
            Self::Intervals(_) => "intervals",
        }
    }
}

/// One min/max/average column of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub x: f64,
    /// Average y of the column.
    pub y: f64,
    pub min: f64,
    pub max: f64,
}

/// Merged interval rectangle in domain units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRect {
    pub x: f64,
    pub dx: f64,
    pub name: String,
    pub depth: usize,
    /// Number of input intervals folded into this one.
    pub merged: usize,
}

impl TraceRect {
    #[must_use]
    pub fn end(&self) -> f64 {
        self.x + self.dx
    }
}

/// Fraction of one pixel column spent in each state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedColumn {
    pub x: f64,
    pub dx: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimatedValues {
    Points(Vec<DataPoint>),
    Envelope(Vec<EnvelopePoint>),
    Rects(Vec<TraceRect>),
    Stacked {
        states: Vec<String>,
        columns: Vec<StackedColumn>,
    },
}

impl DecimatedValues {
    /// Empty output of the shape `key` produces.
    #[must_use]
    pub fn empty(key: DecimatorKey) -> Self {
        match key {
            DecimatorKey::Point | DecimatorKey::Marker => Self::Points(Vec::new()),
            DecimatorKey::MinMax => Self::Envelope(Vec::new()),
            DecimatorKey::State => Self::Rects(Vec::new()),
            DecimatorKey::Residency => Self::Stacked {
                states: Vec::new(),
                columns: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Points(points) => points.len(),
            Self::Envelope(points) => points.len(),
            Self::Rects(rects) => rects.len(),
            Self::Stacked { columns, .. } => columns.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leading x of every output entry, in output order.
    #[must_use]
    pub fn x_values(&self) -> Vec<f64> {
        match self {
            Self::Points(points) => points.iter().map(|point| point.x).collect(),
            Self::Envelope(points) => points.iter().map(|point| point.x).collect(),
            Self::Rects(rects) => rects.iter().map(|rect| rect.x).collect(),
            Self::Stacked { columns, .. } => columns.iter().map(|column| column.x).collect(),
        }
    }

    /// Value extent along y, used by dynamic y axes.
    ///
    /// Rects have no value axis and report `None`.
    #[must_use]
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        match self {
            Self::Points(points) => union_extent(points.iter().map(|point| (point.y, point.y))),
            Self::Envelope(points) => {
                union_extent(points.iter().map(|point| (point.min, point.max)))
            }
            Self::Rects(_) => None,
            Self::Stacked { columns, .. } => union_extent(
                columns
                    .iter()
                    .map(|column| (0.0, column.values.iter().sum::<f64>())),
            ),
        }
    }
}

fn union_extent(ranges: impl Iterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    ranges
        .filter(|(lo, hi)| lo.is_finite() && hi.is_finite())
        .fold(None, |acc, (lo, hi)| {
            Some(match acc {
                Some((min, max)) => (f64::min(min, lo), f64::max(max, hi)),
                None => (lo, hi),
            })
        })
}

/// A decimation algorithm bound to a chart's scales.
pub trait Decimator: Debug + Send + Sync {
    fn key(&self) -> DecimatorKey;

    /// Binds the scales used to derive the pixel grid.
    fn initialize(&mut self, scales: DecimatorScales);

    fn scales(&self) -> Option<&DecimatorScales>;

    /// Reduces `data` for the visible window `[x_start, x_end]`.
    ///
    /// A missing bound falls back to the x scale domain. Empty data or a
    /// window narrower than one pixel yields empty output.
    fn decimate_values(
        &self,
        x_start: Option<f64>,
        x_end: Option<f64>,
        data: &SeriesValues,
    ) -> ChartResult<DecimatedValues>;
}

pub(crate) fn require_scales(decimator: &dyn Decimator) -> ChartResult<&DecimatorScales> {
    decimator.scales().ok_or_else(|| {
        ChartError::InvalidConfiguration(format!(
            "{:?} decimator used before initialize",
            decimator.key()
        ))
    })
}

pub(crate) fn wrong_data(key: DecimatorKey, data: &SeriesValues) -> ChartError {
    ChartError::InvalidConfiguration(format!(
        "{key:?} decimator cannot consume {} data",
        data.kind_name()
    ))
}

/// Visible window resolved against the x scale.
///
/// Column `c` covers the domain span `[edge(c), edge(c + 1))`.
#[derive(Debug, Clone)]
pub(crate) struct PixelWindow<'a> {
    scale: &'a ContinuousScale,
    pub start: f64,
    pub end: f64,
    pixel_start: f64,
    direction: f64,
    pub width: usize,
}

impl<'a> PixelWindow<'a> {
    pub fn resolve(
        scale: &'a ContinuousScale,
        x_start: Option<f64>,
        x_end: Option<f64>,
    ) -> Option<Self> {
        let (domain_start, domain_end) = scale.domain();
        let mut start = x_start.filter(|value| value.is_finite()).unwrap_or(domain_start);
        let mut end = x_end.filter(|value| value.is_finite()).unwrap_or(domain_end);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }

        let pixel_start = scale.map(start);
        let pixel_end = scale.map(end);
        let span = (pixel_end - pixel_start).abs();
        if !span.is_finite() || span < 1.0 {
            return None;
        }

        Some(Self {
            scale,
            start,
            end,
            pixel_start,
            direction: if pixel_end >= pixel_start { 1.0 } else { -1.0 },
            width: span.floor() as usize,
        })
    }

    /// Domain value at the left edge of `column`.
    pub fn edge(&self, column: usize) -> f64 {
        if column == 0 {
            return self.start;
        }
        self.scale
            .invert(self.pixel_start + self.direction * column as f64)
    }

    /// All `width + 1` column edges.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.width).map(|column| self.edge(column)).collect()
    }

    /// Column containing `value`, clamped to the grid.
    pub fn column_of(&self, value: f64) -> usize {
        let offset = (self.scale.map(value) - self.pixel_start) * self.direction;
        if !offset.is_finite() || offset <= 0.0 {
            return 0;
        }
        (offset.floor() as usize).min(self.width - 1)
    }

    /// Pixel offset of `value` from the window start, rounded.
    pub fn rounded_pixel(&self, value: f64) -> i64 {
        ((self.scale.map(value) - self.pixel_start) * self.direction).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::{DecimatedValues, DecimatorKey, EnvelopePoint, PixelWindow};
    use crate::core::{ContinuousScale, DataPoint};

    #[test]
    fn window_defaults_to_scale_domain() {
        let scale = ContinuousScale::linear((0.0, 100.0), (0.0, 400.0));
        let window = PixelWindow::resolve(&scale, None, None).expect("window");
        assert_eq!(window.width, 400);
        assert!((window.edge(1) - 0.25).abs() < 1e-12);
        assert_eq!(window.column_of(100.0), 399);
    }

    #[test]
    fn sub_pixel_window_is_empty() {
        let scale = ContinuousScale::linear((0.0, 100.0), (0.0, 100.0));
        assert!(PixelWindow::resolve(&scale, Some(10.0), Some(10.5)).is_none());
    }

    #[test]
    fn envelope_extent_spans_min_and_max() {
        let values = DecimatedValues::Envelope(vec![
            EnvelopePoint { x: 0.0, y: 1.0, min: -2.0, max: 3.0 },
            EnvelopePoint { x: 1.0, y: 0.0, min: -1.0, max: 5.0 },
        ]);
        assert_eq!(values.y_extent(), Some((-2.0, 5.0)));
        assert_eq!(
            DecimatedValues::Points(vec![DataPoint::new(0.0, f64::NAN)]).y_extent(),
            None
        );
        assert!(DecimatedValues::empty(DecimatorKey::Residency).is_empty());
    }
}
