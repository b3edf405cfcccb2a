//! Per-series decimation fan-out and fan-in for one render pass.

use tracing::{debug, trace};

use crate::decimation::DecimatorScales;
use crate::error::ChartResult;
use crate::worker::DecimationJob;

use super::engine_core::ChartCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct DecimationSummary {
    pub(super) completed: usize,
    /// Jobs whose result was dropped because a newer one replaced them.
    pub(super) superseded: usize,
}

/// Rebinds every decimator to the freshly committed scales.
pub(super) fn bind_scales(core: &mut ChartCore) {
    for state in &mut core.series {
        let Some(decimator) = state.decimator.as_mut() else {
            continue;
        };
        let x = core
            .axes
            .get(&state.config.x_axis)
            .and_then(|axis| axis.scale().as_continuous())
            .copied();
        let y = core
            .axes
            .get(&state.config.y_axis)
            .map(|axis| axis.scale().clone());
        let (Some(x), Some(y)) = (x, y) else {
            debug!(series = %state.config.id, "series axes unavailable, decimator left unbound");
            continue;
        };
        decimator.initialize(DecimatorScales {
            x,
            y,
            state_names: state.config.state_names.clone(),
        });
    }
}

/// Starts one decimation per series, then waits for all of them.
///
/// Every job is dispatched before the first one is awaited, so a slow
/// series never delays the start of another.
pub(super) fn decimate_all(core: &mut ChartCore) -> ChartResult<DecimationSummary> {
    bind_scales(core);

    let zoom_window = core.zoom_window;
    let primary_x = core.primary_x.as_deref();
    let mut pending = Vec::new();
    let mut slots = Vec::new();
    for (index, state) in core.series.iter().enumerate() {
        let Some(decimator) = state.decimator.as_deref() else {
            continue;
        };
        let window = zoom_window.filter(|_| primary_x == Some(state.config.x_axis.as_str()));
        let job = DecimationJob {
            slot: &state.config.id,
            decimator,
            x_start: window.map(|(start, _)| start),
            x_end: window.map(|(_, end)| end),
            values: &state.values,
        };
        pending.push(core.dispatcher.dispatch(job)?);
        slots.push(index);
    }
    let results = core.dispatcher.join_all(pending);

    let mut summary = DecimationSummary::default();
    for (index, result) in slots.into_iter().zip(results) {
        let state = &mut core.series[index];
        match result? {
            Some(values) => {
                trace!(
                    series = %state.config.id,
                    input = state.values.len(),
                    output = values.len(),
                    "series decimated"
                );
                state.decimated = Some(values);
                state.dirty = false;
                summary.completed += 1;
            }
            None => summary.superseded += 1,
        }
    }

    for state in &mut core.series {
        if state.decimator.is_none() {
            state.decimated = state.undecimated();
            state.dirty = false;
        }
    }
    Ok(summary)
}
