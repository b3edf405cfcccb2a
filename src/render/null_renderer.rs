use indexmap::IndexMap;

use crate::error::ChartResult;
use crate::render::{RenderFrame, RenderLayer, Renderer};

/// No-op renderer used by tests and headless usage.
///
/// It still validates frame content so tests can catch invalid geometry before
/// a real backend is plugged in.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_line_count: usize,
    pub last_text_count: usize,
    pub frames_per_layer: IndexMap<RenderLayer, usize>,
}

impl NullRenderer {
    #[must_use]
    pub fn frames_for(&self, layer: RenderLayer) -> usize {
        self.frames_per_layer.get(&layer).copied().unwrap_or(0)
    }
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_line_count = frame.lines.len();
        self.last_text_count = frame.texts.len();
        *self.frames_per_layer.entry(frame.layer).or_insert(0) += 1;
        Ok(())
    }
}

/// Renderer that keeps every validated frame, for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<RenderFrame>,
}

impl RecordingRenderer {
    pub fn frames_for(&self, layer: RenderLayer) -> impl Iterator<Item = &RenderFrame> {
        self.frames.iter().filter(move |frame| frame.layer == layer)
    }

    #[must_use]
    pub fn last_for(&self, layer: RenderLayer) -> Option<&RenderFrame> {
        self.frames.iter().rev().find(|frame| frame.layer == layer)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.frames.push(frame.clone());
        Ok(())
    }
}
