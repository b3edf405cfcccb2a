use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ChartResult;
use crate::interaction::{
    EventContext, EventKind, InteractionEvent, PointerInput, TooltipSection, ZoomAction,
    is_valid_selection_key,
};
use crate::render::{ElementStyle, Renderer};

use super::{Chart, LayoutUpdate, RenderReport};

/// What an interaction forced the chart to redraw, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
enum Redraw {
    #[default]
    Nothing,
    Overlays,
    Series,
    Full,
}

/// Result of routing one interaction through a chart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Events the state machine derived (hover pairs, brush zooms).
    pub derived: usize,
    /// Deliveries to linked charts.
    pub published: usize,
    /// Events taken from this chart's mailbox.
    pub received: usize,
    pub tooltip: Vec<TooltipSection>,
    /// Present when the interaction re-ran the render pipeline.
    pub render: Option<RenderReport>,
}

impl<R: Renderer> Chart<R> {
    /// Translates raw pointer input on the plot area and handles the event.
    pub fn handle_pointer(&mut self, input: PointerInput) -> ChartResult<EventOutcome> {
        let event = self
            .core
            .primary_axis()
            .and_then(|axis| self.core.coordinator.translate(input, axis));
        match event {
            Some(event) => self.handle_event(event),
            None => {
                trace!(chart = %self.id(), ?input, "pointer input without event");
                Ok(EventOutcome::default())
            }
        }
    }

    /// Handles a local event and every event it derives, publishing each
    /// one to the linked charts.
    pub fn handle_event(&mut self, event: InteractionEvent) -> ChartResult<EventOutcome> {
        let mut outcome = EventOutcome::default();
        let mut redraw = Redraw::Nothing;
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let derived = self.apply_event(&event, &mut redraw, &mut outcome.tooltip)?;
            outcome.derived += derived.len();
            if event.caller == self.core.description.id {
                if let Some(hub) = &self.core.hub {
                    outcome.published += hub.publish(&event);
                }
            }
            queue.extend(derived);
        }

        outcome.render = self.redraw(redraw)?;
        Ok(outcome)
    }

    /// Applies every event linked charts sent to this chart.
    ///
    /// Received events are never published again; events they derive here
    /// (hover pairs of a synchronized cursor) only update this chart.
    pub fn process_inbox(&mut self) -> ChartResult<EventOutcome> {
        let mut outcome = EventOutcome::default();
        let Some(hub) = self.core.hub.clone() else {
            return Ok(outcome);
        };
        hub.flush_deferred();
        let received = hub.drain(&self.core.description.id);
        outcome.received = received.len();

        let mut redraw = Redraw::Nothing;
        let mut queue = VecDeque::from(received);
        while let Some(event) = queue.pop_front() {
            let derived = self.apply_event(&event, &mut redraw, &mut outcome.tooltip)?;
            outcome.derived += derived.len();
            queue.extend(derived);
        }

        if outcome.received > 0 {
            debug!(chart = %self.id(), received = outcome.received, "processed linked events");
        }
        outcome.render = self.redraw(redraw)?;
        Ok(outcome)
    }

    /// Silences pointer feedback until `end_resize`.
    pub fn begin_resize(&mut self) {
        self.core.resizing = true;
        if let Some(hub) = &self.core.hub {
            hub.begin_resize();
        }
    }

    pub fn end_resize(&mut self) {
        self.core.resizing = false;
        if let Some(hub) = &self.core.hub {
            hub.end_resize();
        }
    }

    fn is_resizing(&self) -> bool {
        self.core.resizing || self.core.hub.as_ref().is_some_and(|hub| hub.is_resizing())
    }

    fn apply_event(
        &mut self,
        event: &InteractionEvent,
        redraw: &mut Redraw,
        tooltip: &mut Vec<TooltipSection>,
    ) -> ChartResult<Vec<InteractionEvent>> {
        let context = EventContext {
            banded: self.core.primary_axis().is_some_and(|axis| axis.is_banded()),
            resizing: self.is_resizing(),
        };
        if context.resizing && event.event.is_pointer_feedback() {
            debug!(chart = %self.id(), kind = ?event.event, "resizing, event dropped");
            return Ok(Vec::new());
        }

        let derived = self.core.coordinator.handle(event, context);
        match event.event {
            EventKind::Zoom => {
                *redraw = (*redraw).max(self.apply_zoom_event(event)?);
            }
            EventKind::HoverStart => {
                if let Some(key) = event
                    .selection
                    .as_deref()
                    .filter(|key| is_valid_selection_key(key))
                {
                    let original = self.hover_base_style();
                    self.core.hover.apply(key, original);
                    *redraw = (*redraw).max(Redraw::Series);
                }
            }
            EventKind::HoverEnd => {
                match event.selection.as_deref() {
                    Some(key) => {
                        self.core.hover.restore(key);
                    }
                    None => {
                        self.core.hover.release_all();
                    }
                }
                *redraw = (*redraw).max(Redraw::Series);
            }
            EventKind::CursorStart | EventKind::CursorMove => {
                *tooltip = match (&event.selection, event.x_start) {
                    (Some(key), _) => self.tooltip_for_category(key),
                    (None, Some(x)) => self.tooltip_at(x),
                    (None, None) => Vec::new(),
                };
                *redraw = (*redraw).max(Redraw::Overlays);
            }
            EventKind::CursorEnd => {
                tooltip.clear();
                *redraw = (*redraw).max(Redraw::Overlays);
            }
            EventKind::BrushStart | EventKind::BrushMove | EventKind::BrushEnd => {
                *redraw = (*redraw).max(Redraw::Overlays);
            }
            EventKind::Click | EventKind::DoubleClick => {}
        }
        Ok(derived)
    }

    fn apply_zoom_event(&mut self, event: &InteractionEvent) -> ChartResult<Redraw> {
        let axis = self
            .core
            .primary_x
            .as_deref()
            .and_then(|id| self.core.axes.get(id));
        let Some(axis) = axis else {
            debug!(chart = %self.core.description.id, "zoom without an x axis ignored");
            return Ok(Redraw::Nothing);
        };
        let action = self.core.coordinator.apply_zoom(event, axis)?;
        debug!(chart = %self.core.description.id, ?action, "zoom applied");
        Ok(match action {
            ZoomAction::Rerender { start, end } => {
                self.core.zoom_window = Some((start, end));
                Redraw::Full
            }
            ZoomAction::Reset if self.core.zoom_window.take().is_some() => Redraw::Full,
            ZoomAction::Reset | ZoomAction::Overlay(_) => Redraw::Overlays,
            ZoomAction::Ignored => Redraw::Nothing,
        })
    }

    /// Style saved while a category is highlighted: the first series bound
    /// to the primary x axis.
    fn hover_base_style(&self) -> ElementStyle {
        let primary = self.core.primary_x.as_deref();
        self.core
            .series
            .iter()
            .find(|state| Some(state.config.x_axis.as_str()) == primary)
            .map(|state| state.config.style)
            .unwrap_or_default()
    }

    fn redraw(&mut self, redraw: Redraw) -> ChartResult<Option<RenderReport>> {
        match redraw {
            Redraw::Nothing => Ok(None),
            Redraw::Overlays => {
                self.draw_overlays()?;
                Ok(None)
            }
            Redraw::Series => {
                self.draw_series()?;
                self.draw_overlays()?;
                Ok(None)
            }
            Redraw::Full => self.render(LayoutUpdate::default()).map(Some),
        }
    }
}
