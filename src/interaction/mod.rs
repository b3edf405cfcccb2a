//! Interaction vocabulary shared by every chart in a dashboard.
//!
//! Pointer input is translated into `InteractionEvent`s, the only type the
//! coordinator, the group hub and tooltip aggregation exchange.

mod coordinator;
mod groups;
mod tooltip;

pub use coordinator::{
    BrushSelection, CoordinatorState, EventContext, EventCoordinator, InteractionOptions,
    ZoomAction, ZoomMode, ZoomTransform,
};
pub use groups::{GroupHub, GroupKind, GroupRegistry};
pub use tooltip::{SeriesTooltip, TooltipSection, merge_tooltips};

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    CursorStart,
    CursorMove,
    CursorEnd,
    HoverStart,
    HoverEnd,
    BrushStart,
    BrushMove,
    BrushEnd,
    Zoom,
    Click,
    DoubleClick,
}

impl EventKind {
    /// High-frequency kinds whose queued copies may be coalesced.
    #[must_use]
    pub fn is_move(self) -> bool {
        matches!(self, Self::CursorMove | Self::BrushMove)
    }

    /// Kinds silenced while a chart is being resized.
    #[must_use]
    pub fn is_pointer_feedback(self) -> bool {
        matches!(
            self,
            Self::CursorStart
                | Self::CursorMove
                | Self::CursorEnd
                | Self::HoverStart
                | Self::HoverEnd
        )
    }
}

/// Identity of one chart element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChartId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One interaction, in domain space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub event: EventKind,
    pub caller: ChartId,
    /// Band center in axis pixels for cursor events on banded axes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_end: Option<f64>,
    /// Category key under the pointer on banded axes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl InteractionEvent {
    #[must_use]
    pub fn new(event: EventKind, caller: ChartId) -> Self {
        Self {
            event,
            caller,
            x_start: None,
            x_end: None,
            y_start: None,
            y_end: None,
            selection: None,
            data: None,
        }
    }

    #[must_use]
    pub fn zoom(caller: ChartId, x_start: f64, x_end: f64) -> Self {
        Self::new(EventKind::Zoom, caller).with_x(Some(x_start), Some(x_end))
    }

    #[must_use]
    pub fn with_x(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.x_start = start;
        self.x_end = end;
        self
    }

    #[must_use]
    pub fn with_y(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.y_start = start;
        self.y_end = end;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Domain window carried by the event, ordered low to high.
    #[must_use]
    pub fn x_window(&self) -> Option<(f64, f64)> {
        match (self.x_start, self.x_end) {
            (Some(start), Some(end)) if start.is_finite() && end.is_finite() => {
                Some((start.min(end), start.max(end)))
            }
            _ => None,
        }
    }
}

/// Raw pointer input in plot-area pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerInput {
    Enter { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Leave,
    Down { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    DoubleClick { x: f64, y: f64 },
}

/// Whether `key` can identify a hovered element.
///
/// Keys are turned into element identifiers, so blank and purely numeric
/// keys are rejected.
#[must_use]
pub fn is_valid_selection_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_err()
}
