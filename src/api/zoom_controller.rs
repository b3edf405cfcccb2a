use tracing::debug;

use crate::error::ChartResult;
use crate::interaction::{EventKind, InteractionEvent};
use crate::render::Renderer;

use super::{Chart, EventOutcome};

const ZOOM_FACTOR: f64 = 2.0;
/// Share of the current window moved by one pan step.
const PAN_FRACTION: f64 = 0.25;

/// Fits `window` inside `full`, keeping its width where possible.
///
/// Returns `None` when the window covers the whole domain, which is a
/// reset rather than a zoom.
pub(super) fn clamp_window(window: (f64, f64), full: (f64, f64)) -> Option<(f64, f64)> {
    let (full_start, full_end) = full;
    let full_width = full_end - full_start;
    let width = (window.1 - window.0).min(full_width);
    if width.is_nan() || width <= 0.0 || width >= full_width {
        return None;
    }
    let start = window.0.clamp(full_start, full_end - width);
    Some((start, start + width))
}

impl<R: Renderer> Chart<R> {
    /// Halves the visible x window around its center.
    pub fn zoom_in(&mut self) -> ChartResult<EventOutcome> {
        self.scale_window(1.0 / ZOOM_FACTOR)
    }

    /// Doubles the visible x window around its center.
    pub fn zoom_out(&mut self) -> ChartResult<EventOutcome> {
        self.scale_window(ZOOM_FACTOR)
    }

    /// Shows the full x domain again.
    pub fn zoom_reset(&mut self) -> ChartResult<EventOutcome> {
        let event = InteractionEvent::new(EventKind::Zoom, self.core.description.id.clone());
        self.handle_event(event)
    }

    pub fn pan_left(&mut self) -> ChartResult<EventOutcome> {
        self.shift_window(-PAN_FRACTION)
    }

    pub fn pan_right(&mut self) -> ChartResult<EventOutcome> {
        self.shift_window(PAN_FRACTION)
    }

    /// Zooms to `[start, end]`, clamped to the full x domain.
    pub fn zoom_to(&mut self, start: f64, end: f64) -> ChartResult<EventOutcome> {
        let Some((_, full)) = self.windows() else {
            return Ok(EventOutcome::default());
        };
        let window = (start.min(end), start.max(end));
        self.emit_window(clamp_window(window, full))
    }

    fn scale_window(&mut self, factor: f64) -> ChartResult<EventOutcome> {
        let Some(((start, end), full)) = self.windows() else {
            return Ok(EventOutcome::default());
        };
        let center = (start + end) / 2.0;
        let half = (end - start) * factor / 2.0;
        self.emit_window(clamp_window((center - half, center + half), full))
    }

    fn shift_window(&mut self, fraction: f64) -> ChartResult<EventOutcome> {
        let Some(((start, end), full)) = self.windows() else {
            return Ok(EventOutcome::default());
        };
        if self.core.coordinator.zoom_window().is_none() {
            debug!(chart = %self.id(), "not zoomed, nothing to pan");
            return Ok(EventOutcome::default());
        }
        let delta = (end - start) * fraction;
        self.emit_window(clamp_window((start + delta, end + delta), full))
    }

    fn emit_window(&mut self, window: Option<(f64, f64)>) -> ChartResult<EventOutcome> {
        let id = self.core.description.id.clone();
        let event = match window {
            Some((start, end)) => InteractionEvent::zoom(id, start, end),
            None => InteractionEvent::new(EventKind::Zoom, id),
        };
        self.handle_event(event)
    }

    /// Current and full window of the primary x axis; `None` for banded
    /// axes and charts without data.
    fn windows(&self) -> Option<((f64, f64), (f64, f64))> {
        let primary = self.core.primary_x.as_deref()?;
        let Some(full) = self.core.full_x_domain(primary) else {
            debug!(chart = %self.id(), axis = primary, "no continuous x domain to zoom");
            return None;
        };
        if full.1 <= full.0 {
            debug!(chart = %self.id(), "degenerate x domain, zoom ignored");
            return None;
        }
        let current = self.core.coordinator.zoom_window().unwrap_or(full);
        Some((current, full))
    }
}
