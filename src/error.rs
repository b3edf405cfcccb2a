use thiserror::Error;

use crate::interaction::EventKind;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A chart description with neither axes nor series.
    #[error("chart has no axes and no data series")]
    EmptyChart,

    #[error("invalid chart configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unexpected event kind: expected {expected:?}, got {actual:?}")]
    UnexpectedEventKind { expected: EventKind, actual: EventKind },

    /// Worker construction or runtime failure. Recovered by synchronous
    /// fallback before reaching `Chart::render` callers.
    #[error("decimation worker failed: {0}")]
    Worker(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChartError {
    /// Returns `true` for caller contract violations that must never be
    /// swallowed by the render pipeline.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyChart | Self::InvalidConfiguration(_) | Self::UnexpectedEventKind { .. }
        )
    }
}
