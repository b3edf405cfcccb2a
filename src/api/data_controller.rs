use tracing::{debug, trace};

use crate::core::{Axis, DataPoint, Domain, TraceBuffer, TraceInterval};
use crate::error::{ChartError, ChartResult};
use crate::render::Renderer;

use super::{Chart, engine_core::SeriesState, engine_core::empty_buffer};

fn unknown_series(id: &str) -> ChartError {
    ChartError::InvalidConfiguration(format!("unknown series `{id}`"))
}

fn validate_point(point: DataPoint) -> ChartResult<()> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return Err(ChartError::InvalidData(
            "data point must have finite x and y".to_owned(),
        ));
    }
    Ok(())
}

fn validate_interval(interval: &TraceInterval) -> ChartResult<()> {
    if !interval.x.is_finite() || !interval.dx.is_finite() || interval.dx < 0.0 {
        return Err(ChartError::InvalidData(
            "trace interval needs a finite start and a finite duration >= 0".to_owned(),
        ));
    }
    Ok(())
}

impl<R: Renderer> Chart<R> {
    /// Replaces the points of a line, area, scatter or bar series.
    ///
    /// Bar series use the category index as `x`.
    pub fn set_points(&mut self, series_id: &str, points: Vec<DataPoint>) -> ChartResult<()> {
        for point in &points {
            validate_point(*point)?;
        }
        let state = self.series_state_mut(series_id)?;
        let mut buffer = empty_buffer(state.config.ring_capacity)?;
        let count = points.len();
        for point in points {
            buffer.push(point);
        }
        let target = state
            .points_mut()
            .ok_or_else(|| point_series_expected(series_id))?;
        *target = buffer;
        state.dirty = true;
        debug!(series = series_id, count, "set series points");
        Ok(())
    }

    /// Appends one sample; ring-backed series drop their oldest sample when full.
    pub fn append_point(&mut self, series_id: &str, point: DataPoint) -> ChartResult<()> {
        validate_point(point)?;
        let state = self.series_state_mut(series_id)?;
        state
            .points_mut()
            .ok_or_else(|| point_series_expected(series_id))?
            .push(point);
        state.dirty = true;
        trace!(series = series_id, x = point.x, "append data point");
        Ok(())
    }

    /// Replaces the intervals of a trace, flame or stacked-trace series.
    ///
    /// Intervals must be sorted by start time; they are not re-sorted.
    pub fn set_intervals(
        &mut self,
        series_id: &str,
        intervals: Vec<TraceInterval>,
    ) -> ChartResult<()> {
        for interval in &intervals {
            validate_interval(interval)?;
        }
        let state = self.series_state_mut(series_id)?;
        let mut buffer = TraceBuffer::new(empty_buffer(state.config.ring_capacity)?);
        let count = intervals.len();
        for interval in intervals {
            buffer.push(interval);
        }
        let target = state
            .intervals_mut()
            .ok_or_else(|| interval_series_expected(series_id))?;
        *target = buffer;
        state.dirty = true;
        debug!(series = series_id, count, "set series intervals");
        Ok(())
    }

    pub fn append_interval(&mut self, series_id: &str, interval: TraceInterval) -> ChartResult<()> {
        validate_interval(&interval)?;
        let state = self.series_state_mut(series_id)?;
        let x = interval.x;
        state
            .intervals_mut()
            .ok_or_else(|| interval_series_expected(series_id))?
            .push(interval);
        state.dirty = true;
        trace!(series = series_id, x, "append trace interval");
        Ok(())
    }

    /// Sets the domain of one axis level.
    pub fn set_axis_domain(
        &mut self,
        axis_id: &str,
        domain: Domain,
        level: usize,
    ) -> ChartResult<()> {
        self.axis_mut(axis_id)?.set_domain(domain, level)
    }

    /// Adds category keys to a banded axis level, keeping first-seen order.
    pub fn append_categories<I, S>(
        &mut self,
        axis_id: &str,
        keys: I,
        level: usize,
    ) -> ChartResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added = self.axis_mut(axis_id)?.append_domain(keys, level)?;
        debug!(axis = axis_id, level, added, "appended axis categories");
        Ok(added)
    }

    fn series_state_mut(&mut self, series_id: &str) -> ChartResult<&mut SeriesState> {
        self.core
            .series_mut(series_id)
            .ok_or_else(|| unknown_series(series_id))
    }

    fn axis_mut(&mut self, axis_id: &str) -> ChartResult<&mut Axis> {
        self.core.axes.get_mut(axis_id).ok_or_else(|| {
            ChartError::InvalidConfiguration(format!("unknown axis `{axis_id}`"))
        })
    }
}

fn point_series_expected(id: &str) -> ChartError {
    ChartError::InvalidConfiguration(format!("series `{id}` holds trace intervals, not points"))
}

fn interval_series_expected(id: &str) -> ChartError {
    ChartError::InvalidConfiguration(format!("series `{id}` holds points, not trace intervals"))
}
