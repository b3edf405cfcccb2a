use tracing::trace;

use crate::core::{Buffer, DataPoint, bisect_left, bisect_right};
use crate::decimation::{
    DecimatedValues, Decimator, DecimatorKey, DecimatorScales, EnvelopePoint, PixelWindow,
    SeriesValues, require_scales, wrong_data,
};
use crate::error::ChartResult;

/// Min, max and mean of every pixel column, for envelope plus centerline.
#[derive(Debug, Clone, Default)]
pub struct MinMaxDecimator {
    scales: Option<DecimatorScales>,
}

impl Decimator for MinMaxDecimator {
    fn key(&self) -> DecimatorKey {
        DecimatorKey::MinMax
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
        let SeriesValues::Points(buffer) = data else {
            return Err(wrong_data(self.key(), data));
        };
        let scales = require_scales(self)?;
        let Some(window) = PixelWindow::resolve(&scales.x, x_start, x_end) else {
            return Ok(DecimatedValues::Envelope(Vec::new()));
        };
        let envelope = envelope(buffer, &window);
        trace!(input = buffer.len(), output = envelope.len(), "min/max decimation");
        Ok(DecimatedValues::Envelope(envelope))
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnAccumulator {
    column: usize,
    count: usize,
    sum_x: f64,
    sum_y: f64,
    min: f64,
    max: f64,
}

impl ColumnAccumulator {
    fn start(column: usize, point: &DataPoint) -> Self {
        Self {
            column,
            count: 1,
            sum_x: point.x,
            sum_y: point.y,
            min: point.y,
            max: point.y,
        }
    }

    fn add(&mut self, point: &DataPoint) {
        self.count += 1;
        self.sum_x += point.x;
        self.sum_y += point.y;
        self.min = self.min.min(point.y);
        self.max = self.max.max(point.y);
    }

    fn finish(self) -> EnvelopePoint {
        let count = self.count as f64;
        EnvelopePoint {
            x: self.sum_x / count,
            y: self.sum_y / count,
            min: self.min,
            max: self.max,
        }
    }
}

fn envelope<B>(buffer: &B, window: &PixelWindow<'_>) -> Vec<EnvelopePoint>
where
    B: Buffer<DataPoint> + ?Sized,
{
    let key = |point: &DataPoint| point.x;
    let first = bisect_left(buffer, window.start, key);
    let last = bisect_right(buffer, window.end, key);

    let mut output = Vec::with_capacity(window.width.min(last.saturating_sub(first)));
    let mut current: Option<ColumnAccumulator> = None;
    for point in (first..last).filter_map(|index| buffer.get(index)) {
        if !point.x.is_finite() || !point.y.is_finite() {
            continue;
        }
        let column = window.column_of(point.x);
        match current.as_mut() {
            Some(accumulator) if accumulator.column == column => accumulator.add(point),
            _ => {
                if let Some(done) = current.replace(ColumnAccumulator::start(column, point)) {
                    output.push(done.finish());
                }
            }
        }
    }
    if let Some(done) = current {
        output.push(done.finish());
    }
    output
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::MinMaxDecimator;
    use crate::core::{ContinuousScale, DataPoint, Scale, ScaleKind, SeriesBuffer};
    use crate::decimation::{DecimatedValues, Decimator, DecimatorScales, SeriesValues};

    #[test]
    fn column_reports_min_max_and_mean() {
        let mut decimator = MinMaxDecimator::default();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 10.0), (0.0, 2.0)),
            y: Scale::new(ScaleKind::Linear),
            state_names: Vec::new(),
        });
        let data = SeriesValues::Points(SeriesBuffer::from(vec![
            DataPoint::new(0.0, 1.0),
            DataPoint::new(1.0, 5.0),
            DataPoint::new(2.0, -3.0),
            DataPoint::new(6.0, 2.0),
        ]));

        let DecimatedValues::Envelope(columns) =
            decimator.decimate_values(None, None, &data).expect("decimate")
        else {
            panic!("expected envelope");
        };

        assert_eq!(columns.len(), 2);
        assert_relative_eq!(columns[0].x, 1.0);
        assert_relative_eq!(columns[0].y, 1.0);
        assert_relative_eq!(columns[0].min, -3.0);
        assert_relative_eq!(columns[0].max, 5.0);
        assert_relative_eq!(columns[1].y, 2.0);
    }
}
