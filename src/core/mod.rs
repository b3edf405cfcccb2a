pub mod axis;
pub mod buffer;
pub mod scale;
pub mod ticks;
pub mod trace_tree;
pub mod types;

pub use axis::{Axis, AxisAlignment, AxisRenderOutcome, AxisTick, AxisValue, MAX_DISCRETE_WIDTH};
pub use buffer::{
    ArrayBuffer, Buffer, BufferIter, RingBuffer, SeriesBuffer, TraceBuffer, bisect_left,
    bisect_range, bisect_right,
};
pub use scale::{BandScale, ContinuousKind, ContinuousScale, Domain, Scale, ScaleKind};
pub use ticks::TickFormat;
pub use trace_tree::{TraceNode, TraceTree};
pub use types::{DataPoint, Margin, TraceInterval, Viewport};
