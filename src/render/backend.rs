use serde::{Deserialize, Serialize};

use crate::render::FrameMode;

/// Drawing backend, picked once when a chart is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderBackend {
    /// Retained scene graph; keyed elements are updated per layer.
    #[default]
    Svg,
    /// Immediate surface; every layer is cleared and redrawn.
    Canvas,
}

impl RenderBackend {
    #[must_use]
    pub fn frame_mode(self) -> FrameMode {
        match self {
            Self::Svg => FrameMode::Retained,
            Self::Canvas => FrameMode::Immediate,
        }
    }

    /// Whether a frame for an unchanged layer can be skipped entirely.
    #[must_use]
    pub fn retains_layers(self) -> bool {
        matches!(self.frame_mode(), FrameMode::Retained)
    }
}
