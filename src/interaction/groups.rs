//! Named groups of linked charts and the hub that fans events out to them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::interaction::{ChartId, EventKind, InteractionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Synchronized tooltips.
    Tooltip,
    /// Synchronized hover, cursor, brush and zoom.
    Highlight,
    /// Charts that re-render together.
    Render,
}

impl GroupKind {
    pub const ALL: [GroupKind; 3] = [GroupKind::Tooltip, GroupKind::Highlight, GroupKind::Render];

    fn index(self) -> usize {
        match self {
            Self::Tooltip => 0,
            Self::Highlight => 1,
            Self::Render => 2,
        }
    }

    /// Whether events of `kind` travel to siblings of this group kind.
    #[must_use]
    pub fn propagates(self, kind: EventKind) -> bool {
        match self {
            Self::Highlight => !matches!(kind, EventKind::Click | EventKind::DoubleClick),
            Self::Tooltip => matches!(
                kind,
                EventKind::CursorStart | EventKind::CursorMove | EventKind::CursorEnd
            ),
            Self::Render => false,
        }
    }
}

/// Group membership per kind. A chart is in at most one group per kind.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: [IndexMap<String, Vec<ChartId>>; 3],
    membership: [HashMap<ChartId, String>; 3],
}

impl GroupRegistry {
    /// Adds `chart` to `group`, leaving its previous group of the same kind.
    ///
    /// Returns the group it left, if any.
    pub fn add(&mut self, kind: GroupKind, group: &str, chart: ChartId) -> Option<String> {
        let previous = self.remove(kind, &chart);
        let index = kind.index();
        self.groups[index]
            .entry(group.to_owned())
            .or_default()
            .push(chart.clone());
        self.membership[index].insert(chart, group.to_owned());
        previous.filter(|previous| previous != group)
    }

    /// Removes `chart` from its group of `kind`; empty groups are dropped.
    pub fn remove(&mut self, kind: GroupKind, chart: &ChartId) -> Option<String> {
        let index = kind.index();
        let group = self.membership[index].remove(chart)?;
        if let Some(members) = self.groups[index].get_mut(&group) {
            members.retain(|member| member != chart);
            if members.is_empty() {
                self.groups[index].shift_remove(&group);
            }
        }
        Some(group)
    }

    /// Removes `chart` from every group of every kind.
    pub fn remove_chart(&mut self, chart: &ChartId) {
        for kind in GroupKind::ALL {
            let _ = self.remove(kind, chart);
        }
    }

    #[must_use]
    pub fn group_of(&self, kind: GroupKind, chart: &ChartId) -> Option<&str> {
        self.membership[kind.index()].get(chart).map(String::as_str)
    }

    #[must_use]
    pub fn members(&self, kind: GroupKind, group: &str) -> &[ChartId] {
        self.groups[kind.index()]
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Other members of `chart`'s group of `kind`, in join order.
    #[must_use]
    pub fn siblings(&self, kind: GroupKind, chart: &ChartId) -> Vec<ChartId> {
        self.group_of(kind, chart)
            .map(|group| {
                self.members(kind, group)
                    .iter()
                    .filter(|member| *member != chart)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn group_names(&self, kind: GroupKind) -> impl Iterator<Item = &str> {
        self.groups[kind.index()].keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GroupZoom {
    caller: ChartId,
    start: f64,
    end: f64,
}

#[derive(Debug, Default)]
struct HubState {
    registry: GroupRegistry,
    mailboxes: HashMap<ChartId, VecDeque<InteractionEvent>>,
    zoom_windows: HashMap<String, GroupZoom>,
    deferred: Vec<(ChartId, InteractionEvent)>,
    resizing: bool,
}

impl HubState {
    fn deliver(&mut self, recipient: &ChartId, event: &InteractionEvent) -> bool {
        let Some(mailbox) = self.mailboxes.get_mut(recipient) else {
            return false;
        };
        if event.event.is_move() {
            if let Some(last) = mailbox.back_mut() {
                if last.event == event.event && last.caller == event.caller {
                    *last = event.clone();
                    return true;
                }
            }
        }
        mailbox.push_back(event.clone());
        true
    }
}

/// Shared interaction context for one dashboard.
///
/// Cloning is cheap; clones share the same registry, mailboxes and resize
/// flag. Independent dashboards use independent hubs.
#[derive(Debug, Clone, Default)]
pub struct GroupHub {
    state: Arc<Mutex<HubState>>,
}

impl GroupHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `chart` a mailbox. Charts without one receive nothing.
    pub fn register_chart(&self, chart: &ChartId) {
        self.state
            .lock()
            .mailboxes
            .entry(chart.clone())
            .or_default();
    }

    /// Drops `chart` from every group along with its pending events.
    pub fn unregister_chart(&self, chart: &ChartId) {
        let mut state = self.state.lock();
        state.registry.remove_chart(chart);
        state.mailboxes.remove(chart);
        state.deferred.retain(|(recipient, _)| recipient != chart);
    }

    /// Adds `chart` to `group`.
    ///
    /// Joining a highlight group that already has a zoom window queues a
    /// synthetic `Zoom` for the newcomer; it is delivered by the next
    /// `flush_deferred`, not during this call.
    pub fn join(&self, kind: GroupKind, group: &str, chart: &ChartId) {
        let mut state = self.state.lock();
        if let Some(previous) = state.registry.add(kind, group, chart.clone()) {
            debug!(%chart, from = %previous, to = group, ?kind, "chart moved between groups");
        }
        if kind != GroupKind::Highlight {
            return;
        }
        if let Some(zoom) = state.zoom_windows.get(group).cloned() {
            let event = InteractionEvent::zoom(zoom.caller, zoom.start, zoom.end);
            state.deferred.push((chart.clone(), event));
        }
    }

    pub fn leave(&self, kind: GroupKind, chart: &ChartId) -> Option<String> {
        self.state.lock().registry.remove(kind, chart)
    }

    #[must_use]
    pub fn group_of(&self, kind: GroupKind, chart: &ChartId) -> Option<String> {
        self.state
            .lock()
            .registry
            .group_of(kind, chart)
            .map(str::to_owned)
    }

    #[must_use]
    pub fn members(&self, kind: GroupKind, group: &str) -> Vec<ChartId> {
        self.state.lock().registry.members(kind, group).to_vec()
    }

    /// Delivers queued synthetic events. Returns how many were delivered.
    pub fn flush_deferred(&self) -> usize {
        let mut state = self.state.lock();
        let deferred = std::mem::take(&mut state.deferred);
        deferred
            .into_iter()
            .filter(|(recipient, event)| state.deliver(recipient, event))
            .count()
    }

    /// Fans `event` out to the caller's siblings. Returns the recipient count.
    ///
    /// Zoom events also update the highlight group's current window.
    pub fn publish(&self, event: &InteractionEvent) -> usize {
        let mut state = self.state.lock();
        if state.resizing && event.event.is_pointer_feedback() {
            debug!(kind = ?event.event, caller = %event.caller, "resizing, not propagating");
            return 0;
        }

        if event.event == EventKind::Zoom {
            if let Some(group) = state
                .registry
                .group_of(GroupKind::Highlight, &event.caller)
                .map(str::to_owned)
            {
                match event.x_window() {
                    Some((start, end)) => {
                        state.zoom_windows.insert(
                            group,
                            GroupZoom {
                                caller: event.caller.clone(),
                                start,
                                end,
                            },
                        );
                    }
                    None => {
                        state.zoom_windows.remove(&group);
                    }
                }
            }
        }

        let mut recipients: Vec<ChartId> = Vec::new();
        for kind in [GroupKind::Highlight, GroupKind::Tooltip] {
            if !kind.propagates(event.event) {
                continue;
            }
            for sibling in state.registry.siblings(kind, &event.caller) {
                if !recipients.contains(&sibling) {
                    recipients.push(sibling);
                }
            }
        }

        let delivered = recipients
            .iter()
            .filter(|recipient| state.deliver(recipient, event))
            .count();
        trace!(kind = ?event.event, caller = %event.caller, delivered, "event published");
        delivered
    }

    /// Takes every event waiting for `chart`, oldest first.
    #[must_use]
    pub fn drain(&self, chart: &ChartId) -> Vec<InteractionEvent> {
        self.state
            .lock()
            .mailboxes
            .get_mut(chart)
            .map(|mailbox| mailbox.drain(..).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pending(&self, chart: &ChartId) -> usize {
        self.state
            .lock()
            .mailboxes
            .get(chart)
            .map_or(0, VecDeque::len)
    }

    /// Current zoom window of a highlight group.
    #[must_use]
    pub fn zoom_window(&self, group: &str) -> Option<(f64, f64)> {
        self.state
            .lock()
            .zoom_windows
            .get(group)
            .map(|zoom| (zoom.start, zoom.end))
    }

    /// Charts that must re-render along with `chart`.
    #[must_use]
    pub fn request_group_render(&self, chart: &ChartId) -> Vec<ChartId> {
        self.state.lock().registry.siblings(GroupKind::Render, chart)
    }

    pub fn begin_resize(&self) {
        self.state.lock().resizing = true;
    }

    pub fn end_resize(&self) {
        self.state.lock().resizing = false;
    }

    #[must_use]
    pub fn is_resizing(&self) -> bool {
        self.state.lock().resizing
    }
}
