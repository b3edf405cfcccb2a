use crate::core::{Buffer, TraceInterval};

/// Running stack of open ancestors for start-sorted intervals.
///
/// Each pushed interval first pops every ancestor that ended at or before
/// its start; its depth is the number of ancestors left open.
#[derive(Debug, Clone)]
pub struct DepthWalker {
    open_ends: Vec<f64>,
    last_start: f64,
}

impl DepthWalker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open_ends: Vec::new(),
            last_start: f64::NEG_INFINITY,
        }
    }

    /// Records `interval` and returns its stack depth.
    pub fn push(&mut self, interval: &TraceInterval) -> usize {
        debug_assert!(
            interval.x >= self.last_start,
            "trace intervals must be sorted by start time"
        );
        self.last_start = interval.x;

        while self
            .open_ends
            .last()
            .is_some_and(|end| *end <= interval.x)
        {
            self.open_ends.pop();
        }
        let depth = self.open_ends.len();
        self.open_ends.push(interval.end());
        depth
    }
}

impl Default for DepthWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack depth of every interval, in input order.
///
/// Input must already be sorted by start time. This is checked in debug
/// builds only; callers own the ordering.
pub fn generate_rects<B>(intervals: &B) -> Vec<usize>
where
    B: Buffer<TraceInterval> + ?Sized,
{
    let mut walker = DepthWalker::new();
    (0..intervals.len())
        .filter_map(|index| intervals.get(index))
        .map(|interval| walker.push(interval))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::generate_rects;
    use crate::core::{ArrayBuffer, TraceInterval};

    fn buffer(spans: &[(f64, f64)]) -> ArrayBuffer<TraceInterval> {
        spans
            .iter()
            .map(|(x, dx)| TraceInterval::new(*x, *dx, "frame").expect("interval"))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn siblings_share_depth_after_ancestor_pop() {
        let depths = generate_rects(&buffer(&[
            (0.0, 10.0),
            (0.0, 4.0),
            (1.0, 1.0),
            (4.0, 2.0),
            (12.0, 1.0),
        ]));
        assert_eq!(depths, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "sorted by start time")]
    #[cfg(debug_assertions)]
    fn unsorted_input_trips_debug_assertion() {
        let _ = generate_rects(&buffer(&[(5.0, 1.0), (1.0, 1.0)]));
    }
}
