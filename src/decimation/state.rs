use std::ops::Range;

use tracing::trace;

use crate::core::{Buffer, TraceBuffer, TraceInterval, bisect_left};
use crate::decimation::{
    DecimatedValues, Decimator, DecimatorKey, DecimatorScales, DepthWalker, PixelWindow,
    SeriesValues, TraceRect, require_scales, wrong_data,
};
use crate::error::ChartResult;

/// Merges trace/flame intervals that would draw into the same pixels.
///
/// Depths come from the open-ancestor stack, so a single-lane state trace
/// stays at depth 0 and nested flame frames stack up. Per depth, the open
/// rect absorbs the next interval when both carry the same name and touch
/// in pixel space, or when the next interval lies inside pixels the open
/// rect already covers.
#[derive(Debug, Clone, Default)]
pub struct StateDecimator {
    scales: Option<DecimatorScales>,
}

impl Decimator for StateDecimator {
    fn key(&self) -> DecimatorKey {
        DecimatorKey::State
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
        let Some(window) = PixelWindow::resolve(&scales.x, x_start, x_end) else {
            return Ok(DecimatedValues::Rects(Vec::new()));
        };
        let rects = merge_intervals(buffer, &window);
        trace!(input = buffer.len(), output = rects.len(), "state decimation");
        Ok(DecimatedValues::Rects(rects))
    }
}

#[derive(Debug)]
struct OpenRect {
    rect: TraceRect,
    pixel_end: i64,
}

fn merge_intervals(buffer: &TraceBuffer, window: &PixelWindow<'_>) -> Vec<TraceRect> {
    // A visible interval starts at most one longest duration before the
    // window, and its ancestors at most one more; anything earlier has closed.
    let first = buffer.seek(window.start, 2.0);
    let last = bisect_left(buffer, window.end, |interval: &TraceInterval| interval.x);
    merge_range(buffer, window, first..last.max(first))
}

fn merge_range<B>(buffer: &B, window: &PixelWindow<'_>, range: Range<usize>) -> Vec<TraceRect>
where
    B: Buffer<TraceInterval> + ?Sized,
{
    let mut walker = DepthWalker::new();
    let mut open: Vec<Option<OpenRect>> = Vec::new();
    let mut output = Vec::new();

    for interval in range.filter_map(|index| buffer.get(index)) {
        let depth = walker.push(interval);
        if interval.end() <= window.start {
            continue;
        }

        let pixel_start = window.rounded_pixel(interval.x);
        let pixel_end = window.rounded_pixel(interval.end());
        if open.len() <= depth {
            open.resize_with(depth + 1, || None);
        }

        if let Some(current) = open[depth].as_mut() {
            let same_name = current.rect.name == interval.name;
            if (same_name && current.pixel_end >= pixel_start) || pixel_end <= current.pixel_end {
                let end = current.rect.end().max(interval.end());
                current.rect.dx = end - current.rect.x;
                current.rect.merged += 1;
                current.pixel_end = current.pixel_end.max(pixel_end);
                continue;
            }
        }

        let next = OpenRect {
            rect: TraceRect {
                x: interval.x,
                dx: interval.dx,
                name: interval.name.clone(),
                depth,
                merged: 1,
            },
            pixel_end,
        };
        if let Some(done) = open[depth].replace(next) {
            output.push(done.rect);
        }
    }

    output.extend(open.into_iter().flatten().map(|open| open.rect));
    output.sort_by(|lhs, rhs| lhs.x.total_cmp(&rhs.x).then(lhs.depth.cmp(&rhs.depth)));
    output
}
