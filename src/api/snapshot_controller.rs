use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::ChartResult;
use crate::interaction::{ChartId, ZoomTransform};
use crate::render::{RenderBackend, RenderFrame, Renderer};

use super::{Chart, ChartDescription, LayoutOptions};

/// Last composed state of a chart, layers back to front.
///
/// Raster export is left to the host; this is the scene it would export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub chart: ChartId,
    pub backend: RenderBackend,
    pub viewport: Viewport,
    pub zoom_window: Option<(f64, f64)>,
    pub zoom_transform: Option<ZoomTransform>,
    pub frames: Vec<RenderFrame>,
}

/// Persisted options after every layout merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub description: ChartDescription,
    pub layout: LayoutOptions,
    pub zoom_window: Option<(f64, f64)>,
}

impl<R: Renderer> Chart<R> {
    #[must_use]
    pub fn snapshot(&self) -> ChartSnapshot {
        let mut frames: Vec<RenderFrame> = self.core.last_frames.values().cloned().collect();
        frames.sort_by_key(|frame| frame.layer.z_index());
        ChartSnapshot {
            chart: self.core.description.id.clone(),
            backend: self.backend(),
            viewport: self.core.layout.viewport,
            zoom_window: self.core.coordinator.zoom_window(),
            zoom_transform: self.core.coordinator.zoom_transform(),
            frames,
        }
    }

    /// Serializes the composed scene as pretty JSON.
    pub fn save_image(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    #[must_use]
    pub fn get_options(&self) -> ChartOptions {
        ChartOptions {
            description: self.core.description.clone(),
            layout: self.core.layout,
            zoom_window: self.core.coordinator.zoom_window(),
        }
    }
}
