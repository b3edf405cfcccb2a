mod backend;
mod frame;
mod layer_stack;
mod null_renderer;
mod primitives;

pub use backend::RenderBackend;
pub use frame::{FrameMode, RenderFrame};
pub use layer_stack::RenderLayer;
pub use null_renderer::{NullRenderer, RecordingRenderer};
pub use primitives::{
    CirclePrimitive, Color, ElementStyle, LinePrimitive, PathPrimitive, RectPrimitive,
    TextExtent, TextHAlign, TextPrimitive,
};

use crate::error::ChartResult;

/// Contract implemented by any drawing surface.
///
/// Backends receive a fully materialized, deterministic `RenderFrame` so
/// drawing code stays isolated from scales, decimation and interaction logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()>;

    /// Bounding box of `text` once drawn at `font_size_px`.
    fn measure_text(&self, text: &str, font_size_px: f64) -> TextExtent {
        TextExtent::estimate(text, font_size_px)
    }
}
