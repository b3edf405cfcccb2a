use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::render::{
    CirclePrimitive, LinePrimitive, PathPrimitive, RectPrimitive, RenderLayer, TextPrimitive,
};

/// How a backend should apply a frame to its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameMode {
    /// Clear the layer and draw everything again.
    Immediate,
    /// Update keyed elements of the layer in place.
    Retained,
}

/// Backend-agnostic scene for one layer of one chart draw pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub layer: RenderLayer,
    pub mode: FrameMode,
    pub lines: Vec<LinePrimitive>,
    pub rects: Vec<RectPrimitive>,
    pub circles: Vec<CirclePrimitive>,
    pub paths: Vec<PathPrimitive>,
    pub texts: Vec<TextPrimitive>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(viewport: Viewport, layer: RenderLayer) -> Self {
        Self {
            viewport,
            layer,
            mode: FrameMode::Immediate,
            lines: Vec::new(),
            rects: Vec::new(),
            circles: Vec::new(),
            paths: Vec::new(),
            texts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: FrameMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: LinePrimitive) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TextPrimitive) -> Self {
        self.texts.push(text);
        self
    }

    #[must_use]
    pub fn with_rect(mut self, rect: RectPrimitive) -> Self {
        self.rects.push(rect);
        self
    }

    /// Appends every primitive of `other`, keeping this frame's layer.
    pub fn merge(&mut self, other: RenderFrame) {
        self.lines.extend(other.lines);
        self.rects.extend(other.rects);
        self.circles.extend(other.circles);
        self.paths.extend(other.paths);
        self.texts.extend(other.texts);
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }

        for line in &self.lines {
            line.validate()?;
        }
        for rect in &self.rects {
            rect.validate()?;
        }
        for circle in &self.circles {
            circle.validate()?;
        }
        for path in &self.paths {
            path.validate()?;
        }
        for text in &self.texts {
            text.validate()?;
        }

        Ok(())
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.lines.len()
            + self.rects.len()
            + self.circles.len()
            + self.paths.len()
            + self.texts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }
}
