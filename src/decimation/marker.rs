use smallvec::SmallVec;
use tracing::trace;

use crate::core::{Buffer, DataPoint, Scale, bisect_left, bisect_right};
use crate::decimation::{
    DecimatedValues, Decimator, DecimatorKey, DecimatorScales, PixelWindow, SeriesValues,
    require_scales, wrong_data,
};
use crate::error::ChartResult;

/// Thins markers so each pixel cell draws at most one.
#[derive(Debug, Clone, Default)]
pub struct MarkerDecimator {
    scales: Option<DecimatorScales>,
}

impl Decimator for MarkerDecimator {
    fn key(&self) -> DecimatorKey {
        DecimatorKey::Marker
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
        let markers = thin_markers(buffer, &window, &scales.y);
        trace!(input = buffer.len(), output = markers.len(), "marker decimation");
        Ok(DecimatedValues::Points(markers))
    }
}

fn thin_markers<B>(buffer: &B, window: &PixelWindow<'_>, y_scale: &Scale) -> Vec<DataPoint>
where
    B: Buffer<DataPoint> + ?Sized,
{
    let key = |point: &DataPoint| point.x;
    let first = bisect_left(buffer, window.start, key);
    let last = bisect_right(buffer, window.end, key);

    let mut output = Vec::new();
    let mut column = usize::MAX;
    let mut rows: SmallVec<[i64; 16]> = SmallVec::new();
    for point in (first..last).filter_map(|index| buffer.get(index)) {
        let Some(y_pixel) = y_scale.map_numeric(point.y).filter(|pixel| pixel.is_finite()) else {
            continue;
        };
        let point_column = window.column_of(point.x);
        if point_column != column {
            column = point_column;
            rows.clear();
        }
        let row = y_pixel.floor() as i64;
        if rows.contains(&row) {
            continue;
        }
        rows.push(row);
        output.push(*point);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::MarkerDecimator;
    use crate::core::{ContinuousScale, DataPoint, Scale, SeriesBuffer};
    use crate::decimation::{DecimatedValues, Decimator, DecimatorScales, SeriesValues};

    #[test]
    fn markers_in_same_cell_collapse() {
        let mut decimator = MarkerDecimator::default();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 10.0), (0.0, 10.0)),
            y: Scale::Continuous(ContinuousScale::linear((0.0, 10.0), (10.0, 0.0))),
            state_names: Vec::new(),
        });
        let data = SeriesValues::Points(SeriesBuffer::from(vec![
            DataPoint::new(1.1, 5.2),
            DataPoint::new(1.4, 5.4),
            DataPoint::new(1.5, 8.0),
            DataPoint::new(2.2, 5.2),
            DataPoint::new(20.0, 5.2),
        ]));
        let DecimatedValues::Points(points) =
            decimator.decimate_values(None, None, &data).expect("decimate")
        else {
            panic!("expected points");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], DataPoint::new(1.5, 8.0));
    }
}
