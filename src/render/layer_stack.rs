use serde::{Deserialize, Serialize};

/// Drawing layer a frame targets, in back-to-front order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Background,
    Grid,
    Series,
    /// Brush selection rectangle.
    Overlay,
    /// Hover line.
    Crosshair,
    Axis,
    Legend,
}

impl RenderLayer {
    /// Composition order used when a chart snapshot is flattened.
    pub const ORDERED: [RenderLayer; 7] = [
        RenderLayer::Background,
        RenderLayer::Grid,
        RenderLayer::Series,
        RenderLayer::Overlay,
        RenderLayer::Crosshair,
        RenderLayer::Axis,
        RenderLayer::Legend,
    ];

    #[must_use]
    pub fn z_index(self) -> usize {
        Self::ORDERED
            .iter()
            .position(|layer| *layer == self)
            .unwrap_or(Self::ORDERED.len())
    }
}
