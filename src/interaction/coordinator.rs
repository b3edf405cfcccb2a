//! Per-chart interaction state machine.
//!
//! `Idle -> Cursor -> Idle` tracks the hover line and, on banded axes, the
//! hovered category. `Idle -> Brushing -> Idle` tracks a drag selection that
//! is promoted to a `Zoom` when it ends.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{Axis, AxisValue};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{
    ChartId, EventKind, InteractionEvent, PointerInput, is_valid_selection_key,
};

/// How a chart reacts to a zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// Narrow the x domain and decimate again.
    #[default]
    Rerender,
    /// Keep the current view and show the window as a brush plus transform.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionOptions {
    pub hover: bool,
    pub brush: bool,
    /// Leave the brush rectangle visible after the drag ends.
    pub persistent_brush: bool,
    /// Do not turn a finished brush into a zoom.
    pub suppress_brush_zoom: bool,
    pub zoom_mode: ZoomMode,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            hover: true,
            brush: true,
            persistent_brush: false,
            suppress_brush_zoom: false,
            zoom_mode: ZoomMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CoordinatorState {
    #[default]
    Idle,
    Cursor {
        hovered: Option<String>,
    },
    Brushing {
        origin: f64,
        current: f64,
    },
}

/// Brush window in domain units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSelection {
    pub start: f64,
    pub end: f64,
    pub persistent: bool,
}

impl BrushSelection {
    #[must_use]
    pub fn ordered(&self) -> (f64, f64) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// Scale-then-translate transform placing a zoom window over the full view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate: f64,
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: 0.0,
    };

    #[must_use]
    pub fn apply(&self, pixel: f64) -> f64 {
        pixel * self.scale + self.translate
    }
}

/// What the owning chart must do after a zoom event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomAction {
    Rerender { start: f64, end: f64 },
    Overlay(ZoomTransform),
    Reset,
    /// Banded axes have no continuous zoom.
    Ignored,
}

/// Chart-level facts the state machine needs per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventContext {
    pub banded: bool,
    pub resizing: bool,
}

#[derive(Debug, Clone)]
pub struct EventCoordinator {
    chart: ChartId,
    options: InteractionOptions,
    state: CoordinatorState,
    cursor: Option<f64>,
    brush: Option<BrushSelection>,
    zoom_window: Option<(f64, f64)>,
    zoom_transform: Option<ZoomTransform>,
    remote_hover: Option<String>,
}

impl EventCoordinator {
    #[must_use]
    pub fn new(chart: ChartId, options: InteractionOptions) -> Self {
        Self {
            chart,
            options,
            state: CoordinatorState::Idle,
            cursor: None,
            brush: None,
            zoom_window: None,
            zoom_transform: None,
            remote_hover: None,
        }
    }

    #[must_use]
    pub fn chart(&self) -> &ChartId {
        &self.chart
    }

    #[must_use]
    pub fn options(&self) -> InteractionOptions {
        self.options
    }

    pub fn set_options(&mut self, options: InteractionOptions) {
        self.options = options;
    }

    #[must_use]
    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Category hovered on this chart.
    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        match &self.state {
            CoordinatorState::Cursor { hovered } => hovered.as_deref(),
            _ => None,
        }
    }

    /// Category highlighted because a linked chart hovers it.
    #[must_use]
    pub fn remote_hover(&self) -> Option<&str> {
        self.remote_hover.as_deref()
    }

    /// Position of the hover line.
    ///
    /// A domain value on continuous axes; on banded axes, the pixel center
    /// of the hovered band.
    #[must_use]
    pub fn cursor(&self) -> Option<f64> {
        self.cursor
    }

    #[must_use]
    pub fn brush(&self) -> Option<BrushSelection> {
        self.brush
    }

    #[must_use]
    pub fn zoom_window(&self) -> Option<(f64, f64)> {
        self.zoom_window
    }

    #[must_use]
    pub fn zoom_transform(&self) -> Option<ZoomTransform> {
        self.zoom_transform
    }

    /// Converts raw pointer input into an event using `axis` for inversion.
    ///
    /// Returns `None` for input that has no meaning in the current state.
    #[must_use]
    pub fn translate(&self, input: PointerInput, axis: &Axis) -> Option<InteractionEvent> {
        let brushing = matches!(self.state, CoordinatorState::Brushing { .. });
        let (kind, x) = match input {
            PointerInput::Enter { x, .. } => (EventKind::CursorStart, Some(x)),
            PointerInput::Move { x, .. } if brushing => (EventKind::BrushMove, Some(x)),
            PointerInput::Move { x, .. } => (EventKind::CursorMove, Some(x)),
            PointerInput::Leave => (EventKind::CursorEnd, None),
            PointerInput::Down { x, .. } if self.options.brush => (EventKind::BrushStart, Some(x)),
            PointerInput::Down { .. } => return None,
            PointerInput::Up { x, .. } if brushing => (EventKind::BrushEnd, Some(x)),
            PointerInput::Up { .. } => return None,
            PointerInput::Click { x, .. } => (EventKind::Click, Some(x)),
            PointerInput::DoubleClick { x, .. } => (EventKind::DoubleClick, Some(x)),
        };

        let mut event = InteractionEvent::new(kind, self.chart.clone());
        let Some(x) = x else {
            return Some(event);
        };

        if axis.is_banded() {
            let Some(AxisValue::Category(mut path)) = axis.current_band(x) else {
                return Some(event);
            };
            if matches!(kind, EventKind::CursorStart | EventKind::CursorMove) {
                let keys: Vec<&str> = path.iter().map(String::as_str).collect();
                event.x_start = axis.map_category(&keys);
            }
            event.selection = path.pop();
            return Some(event);
        }

        let value = axis.map_coordinate_to_value(x).and_then(|value| value.as_number());
        match kind {
            EventKind::BrushMove | EventKind::BrushEnd => event.x_end = value,
            _ => event.x_start = value,
        }
        Some(event)
    }

    /// Advances the state machine and returns the events it derives.
    ///
    /// Derived `HoverStart`/`HoverEnd` pairs follow the hovered category;
    /// a `Zoom` is derived from a local brush that ends on a continuous axis.
    pub fn handle(
        &mut self,
        event: &InteractionEvent,
        context: EventContext,
    ) -> Vec<InteractionEvent> {
        let mut derived = Vec::new();
        if context.resizing && event.event.is_pointer_feedback() {
            debug!(
                chart = %self.chart,
                kind = ?event.event,
                "dropping pointer feedback while resizing"
            );
            return derived;
        }

        match event.event {
            EventKind::CursorStart | EventKind::CursorMove => {
                if !matches!(self.state, CoordinatorState::Cursor { .. }) {
                    self.state = CoordinatorState::Cursor { hovered: None };
                }
                if context.banded {
                    // Band centers are pixels of the sending chart's axis.
                    let local = event.caller == self.chart && event.selection.is_some();
                    self.cursor = event.x_start.filter(|_| local);
                    if self.options.hover {
                        self.update_hover(event.selection.as_deref(), &mut derived);
                    }
                } else {
                    self.cursor = event.x_start.filter(|_| event.selection.is_none());
                }
            }
            EventKind::CursorEnd => {
                self.update_hover(None, &mut derived);
                self.state = CoordinatorState::Idle;
                self.cursor = None;
            }
            EventKind::HoverStart if event.caller != self.chart => {
                match event.selection.as_deref() {
                    Some(key) if is_valid_selection_key(key) => {
                        self.remote_hover = Some(key.to_owned());
                    }
                    other => debug!(
                        chart = %self.chart,
                        selection = ?other,
                        "ignoring hover with unusable key"
                    ),
                }
            }
            EventKind::HoverEnd if event.caller != self.chart => {
                self.remote_hover = None;
            }
            EventKind::BrushStart => {
                if let Some(origin) = event.x_start.or(event.x_end) {
                    self.state = CoordinatorState::Brushing {
                        origin,
                        current: origin,
                    };
                    self.brush = Some(BrushSelection {
                        start: origin,
                        end: origin,
                        persistent: false,
                    });
                }
            }
            EventKind::BrushMove => {
                if let CoordinatorState::Brushing { origin, current } = &mut self.state {
                    if let Some(x) = event.x_end.or(event.x_start) {
                        *current = x;
                    }
                    self.brush = Some(BrushSelection {
                        start: *origin,
                        end: *current,
                        persistent: false,
                    });
                }
            }
            EventKind::BrushEnd => self.finish_brush(event, context, &mut derived),
            EventKind::HoverStart
            | EventKind::HoverEnd
            | EventKind::Zoom
            | EventKind::Click
            | EventKind::DoubleClick => {}
        }

        trace!(chart = %self.chart, kind = ?event.event, derived = derived.len(), "event handled");
        derived
    }

    fn update_hover(&mut self, selection: Option<&str>, derived: &mut Vec<InteractionEvent>) {
        if let Some(key) = selection {
            if !is_valid_selection_key(key) {
                debug!(chart = %self.chart, selection = key, "ignoring hover with unusable key");
                return;
            }
        }

        let CoordinatorState::Cursor { hovered } = &mut self.state else {
            return;
        };
        if hovered.as_deref() == selection {
            return;
        }

        if let Some(previous) = hovered.take() {
            derived.push(
                InteractionEvent::new(EventKind::HoverEnd, self.chart.clone())
                    .with_selection(previous),
            );
        }
        if let Some(key) = selection {
            derived.push(
                InteractionEvent::new(EventKind::HoverStart, self.chart.clone())
                    .with_selection(key),
            );
            *hovered = Some(key.to_owned());
        }
    }

    fn finish_brush(
        &mut self,
        event: &InteractionEvent,
        context: EventContext,
        derived: &mut Vec<InteractionEvent>,
    ) {
        let CoordinatorState::Brushing { origin, current } = self.state else {
            return;
        };
        let end = event.x_end.or(event.x_start).unwrap_or(current);
        self.state = CoordinatorState::Idle;

        let selection = BrushSelection {
            start: origin,
            end,
            persistent: self.options.persistent_brush,
        };
        self.brush = self.options.persistent_brush.then_some(selection);

        let (start, end) = selection.ordered();
        let local = event.caller == self.chart;
        if local && !self.options.suppress_brush_zoom && !context.banded && end > start {
            derived.push(InteractionEvent::zoom(self.chart.clone(), start, end));
        }
    }

    /// Applies a zoom to this chart's view state.
    ///
    /// A zoom without a window resets the view. `axis` is the chart's x axis
    /// in its unzoomed state, used to place the overlay transform.
    pub fn apply_zoom(&mut self, event: &InteractionEvent, axis: &Axis) -> ChartResult<ZoomAction> {
        if event.event != EventKind::Zoom {
            return Err(ChartError::UnexpectedEventKind {
                expected: EventKind::Zoom,
                actual: event.event,
            });
        }
        if axis.is_banded() {
            debug!(chart = %self.chart, "banded axis ignores zoom");
            return Ok(ZoomAction::Ignored);
        }

        let Some((start, end)) = event.x_window().filter(|(start, end)| end > start) else {
            self.zoom_window = None;
            self.zoom_transform = None;
            if self.options.zoom_mode == ZoomMode::Overlay {
                self.brush = None;
            }
            return Ok(ZoomAction::Reset);
        };
        self.zoom_window = Some((start, end));

        match self.options.zoom_mode {
            ZoomMode::Rerender => {
                self.zoom_transform = None;
                Ok(ZoomAction::Rerender { start, end })
            }
            ZoomMode::Overlay => {
                let transform = overlay_transform(axis, start, end);
                self.zoom_transform = Some(transform);
                self.brush = Some(BrushSelection {
                    start,
                    end,
                    persistent: true,
                });
                Ok(ZoomAction::Overlay(transform))
            }
        }
    }
}

fn overlay_transform(axis: &Axis, start: f64, end: f64) -> ZoomTransform {
    let (Some(p0), Some(p1)) = (axis.map_value(start), axis.map_value(end)) else {
        return ZoomTransform::IDENTITY;
    };
    let span = (p1 - p0).abs();
    if span <= 0.0 || !span.is_finite() {
        return ZoomTransform::IDENTITY;
    }
    let scale = axis.range_pixels() / span;
    ZoomTransform {
        scale,
        translate: -p0.min(p1) * scale,
    }
}

#[cfg(test)]
mod tests {
    use super::{EventContext, EventCoordinator, InteractionOptions, ZoomAction, ZoomMode};
    use crate::core::{Axis, AxisAlignment, Domain, ScaleKind};
    use crate::interaction::{ChartId, EventKind, InteractionEvent, PointerInput};

    fn linear_axis() -> Axis {
        let mut axis = Axis::new("x", AxisAlignment::Bottom, ScaleKind::Linear);
        axis.set_domain(Domain::Continuous { start: 0.0, end: 100.0 }, 0)
            .expect("domain");
        axis.commit_range(100.0);
        axis
    }

    #[test]
    fn local_brush_end_promotes_to_zoom() {
        let axis = linear_axis();
        let mut coordinator =
            EventCoordinator::new(ChartId::new("a"), InteractionOptions::default());
        let context = EventContext::default();

        for input in [
            PointerInput::Down { x: 20.0, y: 0.0 },
            PointerInput::Move { x: 30.0, y: 0.0 },
            PointerInput::Up { x: 40.0, y: 0.0 },
        ] {
            let event = coordinator.translate(input, &axis).expect("event");
            let derived = coordinator.handle(&event, context);
            if event.event == EventKind::BrushEnd {
                assert_eq!(derived.len(), 1);
                assert_eq!(derived[0].x_window(), Some((20.0, 40.0)));
            }
        }
        assert!(coordinator.brush().is_none());
    }

    #[test]
    fn suppressed_brush_keeps_overlay_without_zoom() {
        let axis = linear_axis();
        let options = InteractionOptions {
            persistent_brush: true,
            suppress_brush_zoom: true,
            ..InteractionOptions::default()
        };
        let mut coordinator = EventCoordinator::new(ChartId::new("a"), options);
        let context = EventContext::default();
        let start = coordinator
            .translate(PointerInput::Down { x: 10.0, y: 0.0 }, &axis)
            .expect("start");
        coordinator.handle(&start, context);
        let end = coordinator
            .translate(PointerInput::Up { x: 50.0, y: 0.0 }, &axis)
            .expect("end");
        assert!(coordinator.handle(&end, context).is_empty());
        assert_eq!(coordinator.brush().map(|brush| brush.ordered()), Some((10.0, 50.0)));
    }

    #[test]
    fn zoom_with_wrong_kind_is_rejected() {
        let axis = linear_axis();
        let mut coordinator =
            EventCoordinator::new(ChartId::new("a"), InteractionOptions::default());
        let event = InteractionEvent::new(EventKind::BrushEnd, ChartId::new("a"));
        let err = coordinator.apply_zoom(&event, &axis).expect_err("wrong kind");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn overlay_zoom_places_window_over_full_view() {
        let axis = linear_axis();
        let options = InteractionOptions {
            zoom_mode: ZoomMode::Overlay,
            ..InteractionOptions::default()
        };
        let mut coordinator = EventCoordinator::new(ChartId::new("a"), options);
        let action = coordinator
            .apply_zoom(&InteractionEvent::zoom(ChartId::new("b"), 25.0, 75.0), &axis)
            .expect("zoom");
        let ZoomAction::Overlay(transform) = action else {
            panic!("expected overlay");
        };
        assert!((transform.apply(25.0) - 0.0).abs() < 1e-9);
        assert!((transform.apply(75.0) - 100.0).abs() < 1e-9);
        assert!(coordinator.brush().is_some_and(|brush| brush.persistent));
    }

    #[test]
    fn banded_cursor_sits_on_the_hovered_band_center() {
        let mut axis = Axis::new("hosts", AxisAlignment::Bottom, ScaleKind::Band);
        axis.set_domain(
            Domain::Categories(vec!["a".into(), "b".into(), "c".into()]),
            0,
        )
        .expect("keys");
        axis.commit_range(150.0);
        let mut coordinator =
            EventCoordinator::new(ChartId::new("a"), InteractionOptions::default());
        let context = EventContext {
            banded: true,
            resizing: false,
        };

        let enter = coordinator
            .translate(PointerInput::Enter { x: 75.0, y: 0.0 }, &axis)
            .expect("enter");
        let derived = coordinator.handle(&enter, context);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].selection.as_deref(), Some("b"));
        let center = axis.map_category(&["b"]).expect("center");
        assert_eq!(coordinator.cursor(), Some(center));

        // Band centers from another chart do not move the local line.
        let remote = InteractionEvent::new(EventKind::CursorMove, ChartId::new("b"))
            .with_x(Some(10.0), None)
            .with_selection("c");
        coordinator.handle(&remote, context);
        assert_eq!(coordinator.cursor(), None);

        let leave = coordinator.translate(PointerInput::Leave, &axis).expect("leave");
        coordinator.handle(&leave, context);
        assert_eq!(coordinator.cursor(), None);
    }

    #[test]
    fn resizing_silences_cursor_feedback() {
        let mut coordinator =
            EventCoordinator::new(ChartId::new("a"), InteractionOptions::default());
        let event = InteractionEvent::new(EventKind::CursorMove, ChartId::new("a"))
            .with_x(Some(3.0), None);
        coordinator.handle(
            &event,
            EventContext {
                banded: false,
                resizing: true,
            },
        );
        assert_eq!(coordinator.cursor(), None);
    }
}
