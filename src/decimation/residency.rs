use indexmap::IndexSet;
use tracing::trace;

use crate::core::{Buffer, TraceBuffer, TraceInterval, bisect_left};
use crate::decimation::{
    DecimatedValues, Decimator, DecimatorKey, DecimatorScales, PixelWindow, SeriesValues,
    StackedColumn, require_scales, wrong_data,
};
use crate::error::ChartResult;

/// Fraction of every pixel column spent in each named state.
///
/// States listed at `initialize` keep their order; unknown names found in
/// the data are appended in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ResidencyDecimator {
    scales: Option<DecimatorScales>,
}

impl Decimator for ResidencyDecimator {
    fn key(&self) -> DecimatorKey {
        DecimatorKey::Residency
    }

    fn initialize(&mut self, scales: DecimatorScales) {
        self.scales = Some(scales);
    }

    fn scales(&self) -> Option<&DecimatorScales> {
        self.scales.as_ref()
    }

    fn decimate_values(
        &self,
        x_start: Option<f64>,
        x_end: Option<f64>,
        data: &SeriesValues,
    ) -> ChartResult<DecimatedValues> {
        let SeriesValues::Intervals(buffer) = data else {
            return Err(wrong_data(self.key(), data));
        };
        let scales = require_scales(self)?;
        let window = match PixelWindow::resolve(&scales.x, x_start, x_end) {
            Some(window) if !buffer.is_empty() => window,
            _ => return Ok(DecimatedValues::empty(self.key())),
        };

        let mut states: IndexSet<String> = scales.state_names.iter().cloned().collect();
        let columns = residency(buffer, &window, &mut states);
        trace!(
            input = buffer.len(),
            columns = columns.len(),
            states = states.len(),
            "residency decimation"
        );
        Ok(DecimatedValues::Stacked {
            states: states.into_iter().collect(),
            columns,
        })
    }
}

/// Per-state coverage accumulated as partial edge fractions plus a
/// difference array for columns an interval covers completely.
struct Coverage {
    partial: Vec<f64>,
    full: Vec<f64>,
}

impl Coverage {
    fn new(width: usize) -> Self {
        Self {
            partial: vec![0.0; width],
            full: vec![0.0; width + 1],
        }
    }

    fn fraction(&self, running_full: f64, column: usize) -> f64 {
        (self.partial[column] + running_full).clamp(0.0, 1.0)
    }
}

fn residency(
    buffer: &TraceBuffer,
    window: &PixelWindow<'_>,
    states: &mut IndexSet<String>,
) -> Vec<StackedColumn> {
    let width = window.width;
    let edges = window.edges();
    let column_span = |column: usize| edges[column + 1] - edges[column];
    let column_of = |value: f64| {
        edges
            .partition_point(|edge| *edge <= value)
            .saturating_sub(1)
            .min(width - 1)
    };

    let mut coverage: Vec<Coverage> = (0..states.len()).map(|_| Coverage::new(width)).collect();
    let first = buffer.seek(window.start, 1.0);
    let last = bisect_left(buffer, window.end, |interval: &TraceInterval| interval.x);
    for interval in (first..last).filter_map(|index| buffer.get(index)) {
        let start = interval.x.max(window.start);
        let end = interval.end().min(window.end);
        if end <= start {
            continue;
        }

        let (state, inserted) = states.insert_full(interval.name.clone());
        if inserted {
            coverage.push(Coverage::new(width));
        }
        let cover = &mut coverage[state];

        let first = column_of(start);
        let last = column_of(end);
        if first == last {
            cover.partial[first] += (end - start) / column_span(first);
            continue;
        }
        cover.partial[first] += (edges[first + 1] - start) / column_span(first);
        cover.partial[last] += (end - edges[last]) / column_span(last);
        cover.full[first + 1] += 1.0;
        cover.full[last] -= 1.0;
    }

    let mut running = vec![0.0; coverage.len()];
    (0..width)
        .map(|column| {
            let values = coverage
                .iter()
                .zip(running.iter_mut())
                .map(|(cover, running_full)| {
                    *running_full += cover.full[column];
                    cover.fraction(*running_full, column)
                })
                .collect();
            StackedColumn {
                x: edges[column],
                dx: column_span(column),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::ResidencyDecimator;
    use crate::core::{ContinuousScale, Scale, ScaleKind, TraceBuffer, TraceInterval};
    use crate::decimation::{DecimatedValues, Decimator, DecimatorScales, SeriesValues};

    #[test]
    fn column_fractions_follow_time_in_state() {
        let mut decimator = ResidencyDecimator::default();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 40.0), (0.0, 4.0)),
            y: Scale::new(ScaleKind::Linear),
            state_names: vec!["idle".to_owned()],
        });
        let data = SeriesValues::Intervals(TraceBuffer::from(vec![
            TraceInterval::new(0.0, 5.0, "run").expect("interval"),
            TraceInterval::new(5.0, 30.0, "idle").expect("interval"),
            TraceInterval::new(35.0, 5.0, "run").expect("interval"),
        ]));

        let DecimatedValues::Stacked { states, columns } =
            decimator.decimate_values(None, None, &data).expect("decimate")
        else {
            panic!("expected stacked columns");
        };

        assert_eq!(states, vec!["idle".to_owned(), "run".to_owned()]);
        assert_eq!(columns.len(), 4);
        assert_relative_eq!(columns[0].values[0], 0.5);
        assert_relative_eq!(columns[0].values[1], 0.5);
        assert_relative_eq!(columns[1].values[0], 1.0);
        assert_relative_eq!(columns[2].values[0], 1.0);
        assert_relative_eq!(columns[3].values[0], 0.5);
        assert_relative_eq!(columns[3].values[1], 0.5);
    }

    #[test]
    fn zoomed_window_counts_a_state_opened_long_before() {
        let mut decimator = ResidencyDecimator::default();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 100.0), (0.0, 100.0)),
            y: Scale::new(ScaleKind::Linear),
            state_names: Vec::new(),
        });
        let mut intervals = vec![TraceInterval::new(0.0, 95.0, "idle").expect("interval")];
        intervals.extend((0..100).map(|index| {
            TraceInterval::new(1.0 + f64::from(index) * 0.5, 0.1, "spin").expect("interval")
        }));
        intervals.push(TraceInterval::new(95.0, 5.0, "run").expect("interval"));
        let data = SeriesValues::Intervals(TraceBuffer::from(intervals));

        let DecimatedValues::Stacked { states, columns } = decimator
            .decimate_values(Some(90.0), Some(100.0), &data)
            .expect("decimate")
        else {
            panic!("expected stacked columns");
        };

        assert_eq!(states, vec!["idle".to_owned(), "run".to_owned()]);
        assert_eq!(columns.len(), 10);
        assert_relative_eq!(columns[0].values[0], 1.0);
        assert_relative_eq!(columns[4].values[0], 1.0);
        assert_relative_eq!(columns[5].values[1], 1.0);
        assert_relative_eq!(columns[9].values[1], 1.0);
    }
}
