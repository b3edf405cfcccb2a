use tracing::trace;

use crate::core::{Buffer, DataPoint, bisect_left};
use crate::decimation::{
    DecimatedValues, Decimator, DecimatorKey, DecimatorScales, PixelWindow, SeriesValues,
    require_scales, wrong_data,
};
use crate::error::ChartResult;

/// Keeps the first point of every pixel column, plus the last point before
/// the window so a line enters the view from the left edge.
#[derive(Debug, Clone, Default)]
pub struct PointDecimator {
    scales: Option<DecimatorScales>,
}

impl Decimator for PointDecimator {
    fn key(&self) -> DecimatorKey {
        DecimatorKey::Point
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
            return Ok(DecimatedValues::Points(Vec::new()));
        };
        let points = first_per_column(buffer, &window);
        trace!(input = buffer.len(), output = points.len(), "point decimation");
        Ok(DecimatedValues::Points(points))
    }
}

fn first_per_column<B>(buffer: &B, window: &PixelWindow<'_>) -> Vec<DataPoint>
where
    B: Buffer<DataPoint> + ?Sized,
{
    let mut output = Vec::with_capacity(window.width + 1);
    if buffer.is_empty() {
        return output;
    }

    let key = |point: &DataPoint| point.x;
    let first_visible = bisect_left(buffer, window.start, key);
    if let Some(previous) = first_visible.checked_sub(1).and_then(|index| buffer.get(index)) {
        output.push(*previous);
    }

    let mut cursor = first_visible;
    let mut lower = window.edge(0);
    for column in 0..window.width {
        let upper = window.edge(column + 1);
        // Columns are visited left to right, so the search never moves back.
        let index = cursor + bisect_left(&Suffix { buffer, offset: cursor }, lower, key);
        let last_column = column + 1 == window.width;
        match buffer.get(index) {
            Some(point) if point.x < upper || (last_column && point.x <= window.end) => {
                output.push(*point);
                cursor = index + 1;
            }
            Some(_) => cursor = index,
            None => break,
        }
        lower = upper;
    }
    output
}

/// View of a buffer starting at `offset`.
struct Suffix<'a, B: ?Sized> {
    buffer: &'a B,
    offset: usize,
}

impl<B> Buffer<DataPoint> for Suffix<'_, B>
where
    B: Buffer<DataPoint> + ?Sized,
{
    fn get(&self, index: usize) -> Option<&DataPoint> {
        self.buffer.get(self.offset + index)
    }

    fn len(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::PointDecimator;
    use crate::core::{ContinuousScale, DataPoint, Scale, ScaleKind, SeriesBuffer};
    use crate::decimation::{DecimatedValues, Decimator, DecimatorScales, SeriesValues};

    fn decimator(width: f64) -> PointDecimator {
        let mut decimator = PointDecimator::default();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 100.0), (0.0, width)),
            y: Scale::new(ScaleKind::Linear),
            state_names: Vec::new(),
        });
        decimator
    }

    fn points(xs: &[f64]) -> SeriesValues {
        SeriesValues::Points(SeriesBuffer::from(
            xs.iter().map(|x| DataPoint::new(*x, *x * 2.0)).collect::<Vec<_>>(),
        ))
    }

    #[test]
    fn keeps_first_point_per_column_and_leading_point() {
        let output = decimator(10.0)
            .decimate_values(Some(20.0), Some(80.0), &points(&[5.0, 21.0, 22.0, 29.0, 35.0, 90.0]))
            .expect("decimate");
        let DecimatedValues::Points(points) = output else {
            panic!("expected points");
        };
        let xs: Vec<f64> = points.iter().map(|point| point.x).collect();
        assert_eq!(xs, vec![5.0, 21.0, 35.0]);
    }

    #[test]
    fn uninitialized_decimator_is_a_configuration_error() {
        let err = PointDecimator::default()
            .decimate_values(None, None, &points(&[1.0]))
            .expect_err("not initialized");
        assert!(err.is_configuration_error());
    }
}
