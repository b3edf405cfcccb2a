use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Outer chart margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Named interval of trace data: a state lane entry or a flame-chart frame.
///
/// `x` is the start time and `dx` the duration, both in domain units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInterval {
    pub x: f64,
    pub dx: f64,
    pub name: String,
}

impl TraceInterval {
    pub fn new(x: f64, dx: f64, name: impl Into<String>) -> ChartResult<Self> {
        if !x.is_finite() || !dx.is_finite() || dx < 0.0 {
            return Err(ChartError::InvalidData(
                "trace interval start must be finite and duration finite and >= 0".to_owned(),
            ));
        }
        Ok(Self {
            x,
            dx,
            name: name.into(),
        })
    }

    #[must_use]
    pub fn end(&self) -> f64 {
        self.x + self.dx
    }
}
