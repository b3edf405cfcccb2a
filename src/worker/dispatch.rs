//! Runs decimation on workers when a runtime is configured, inline otherwise.
//!
//! A worker failure of any kind (spawn, post, error event, malformed or
//! mismatched reply) is logged and answered by running the same decimator
//! inline. Configuration errors from the decimator itself are returned.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::decimation::{DecimatedValues, Decimator, SeriesValues, require_scales};
use crate::error::{ChartError, ChartResult};
use crate::worker::payload::{PayloadValues, WorkerRequest, WorkerResponse};
use crate::worker::runtime::{WorkerHandle, WorkerRuntime};

/// One series' decimation request.
#[derive(Debug, Clone, Copy)]
pub struct DecimationJob<'a> {
    /// Series slot; a newer job for the same slot supersedes older ones.
    pub slot: &'a str,
    pub decimator: &'a dyn Decimator,
    pub x_start: Option<f64>,
    pub x_end: Option<f64>,
    pub values: &'a SeriesValues,
}

impl DecimationJob<'_> {
    /// Inline decimation; the reference result for every worker path.
    pub fn run_inline(&self) -> ChartResult<DecimatedValues> {
        self.decimator
            .decimate_values(self.x_start, self.x_end, self.values)
    }
}

#[derive(Default)]
struct SlotState {
    generation: u64,
    outstanding: Option<Arc<dyn WorkerHandle>>,
}

#[derive(Default)]
struct DispatchState {
    next_request_id: u64,
    slots: HashMap<String, SlotState>,
}

pub struct DecimationDispatcher {
    runtime: Option<Arc<dyn WorkerRuntime>>,
    state: Mutex<DispatchState>,
}

impl std::fmt::Debug for DecimationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecimationDispatcher")
            .field("runtime", &self.runtime)
            .field("slots", &self.state.lock().slots.len())
            .finish()
    }
}

impl Default for DecimationDispatcher {
    fn default() -> Self {
        Self::inline()
    }
}

impl DecimationDispatcher {
    /// Dispatcher that never leaves the calling thread.
    #[must_use]
    pub fn inline() -> Self {
        Self {
            runtime: None,
            state: Mutex::new(DispatchState::default()),
        }
    }

    #[must_use]
    pub fn with_runtime(runtime: Arc<dyn WorkerRuntime>) -> Self {
        Self {
            runtime: Some(runtime),
            state: Mutex::new(DispatchState::default()),
        }
    }

    #[must_use]
    pub fn uses_workers(&self) -> bool {
        self.runtime.is_some()
    }

    /// Starts `job`, terminating any worker still running for its slot.
    pub fn dispatch<'a>(&self, job: DecimationJob<'a>) -> ChartResult<PendingDecimation<'a>> {
        let (generation, request_id) = self.begin(job.slot);

        let Some(runtime) = self.runtime.as_ref() else {
            return Ok(PendingDecimation {
                job,
                generation,
                worker: None,
            });
        };

        let request = WorkerRequest {
            request_id,
            key: job.decimator.key(),
            scales: require_scales(job.decimator)?.clone(),
            x_start: job.x_start,
            x_end: job.x_end,
            values: PayloadValues::from(job.values),
        };

        let worker = match start_worker(runtime.as_ref(), &request) {
            Ok(handle) => {
                let handle: Arc<dyn WorkerHandle> = Arc::from(handle);
                if let Some(slot) = self.state.lock().slots.get_mut(job.slot) {
                    slot.outstanding = Some(Arc::clone(&handle));
                }
                Some((handle, request_id))
            }
            Err(err) => {
                warn!(error = %err, slot = job.slot, "worker unavailable, decimating inline");
                None
            }
        };

        Ok(PendingDecimation {
            job,
            generation,
            worker,
        })
    }

    /// Waits for every pending job. Results keep the input order; a
    /// superseded job yields `Ok(None)`.
    pub fn join_all(
        &self,
        pending: Vec<PendingDecimation<'_>>,
    ) -> Vec<ChartResult<Option<DecimatedValues>>> {
        #[cfg(feature = "parallel-decimation")]
        {
            use rayon::prelude::*;
            if !self.uses_workers() {
                return pending.into_par_iter().map(|job| job.wait(self)).collect();
            }
        }
        pending.into_iter().map(|job| job.wait(self)).collect()
    }

    /// Whether `generation` is still the latest dispatch for `slot`.
    #[must_use]
    pub fn is_current(&self, slot: &str, generation: u64) -> bool {
        self.state
            .lock()
            .slots
            .get(slot)
            .is_some_and(|state| state.generation == generation)
    }

    /// Terminates every outstanding worker.
    pub fn cancel_all(&self) {
        let mut state = self.state.lock();
        for slot in state.slots.values_mut() {
            slot.generation += 1;
            if let Some(handle) = slot.outstanding.take() {
                handle.terminate();
            }
        }
    }

    fn begin(&self, slot: &str) -> (u64, u64) {
        let mut state = self.state.lock();
        state.next_request_id += 1;
        let request_id = state.next_request_id;
        let entry = state.slots.entry(slot.to_owned()).or_default();
        entry.generation += 1;
        if let Some(previous) = entry.outstanding.take() {
            debug!(slot, "superseding in-flight decimation");
            previous.terminate();
        }
        (entry.generation, request_id)
    }

    fn finish(&self, slot: &str, generation: u64) {
        let mut state = self.state.lock();
        if let Some(entry) = state.slots.get_mut(slot) {
            if entry.generation == generation {
                entry.outstanding = None;
            }
        }
    }
}

fn start_worker(
    runtime: &dyn WorkerRuntime,
    request: &WorkerRequest,
) -> ChartResult<Box<dyn WorkerHandle>> {
    let handle = runtime.spawn()?;
    let message = request.to_message()?;
    if let Err(err) = handle.post_message(message) {
        handle.terminate();
        return Err(err);
    }
    Ok(handle)
}

/// A dispatched job, resolved by `wait`.
pub struct PendingDecimation<'a> {
    job: DecimationJob<'a>,
    generation: u64,
    worker: Option<(Arc<dyn WorkerHandle>, u64)>,
}

impl std::fmt::Debug for PendingDecimation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDecimation")
            .field("slot", &self.job.slot)
            .field("generation", &self.generation)
            .field("on_worker", &self.worker.is_some())
            .finish()
    }
}

impl PendingDecimation<'_> {
    #[must_use]
    pub fn slot(&self) -> &str {
        self.job.slot
    }

    #[must_use]
    pub fn on_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Resolves the job. Returns `Ok(None)` when a newer dispatch for the
    /// same slot was issued in the meantime.
    pub fn wait(self, dispatcher: &DecimationDispatcher) -> ChartResult<Option<DecimatedValues>> {
        let Self {
            job,
            generation,
            worker,
        } = self;

        if !dispatcher.is_current(job.slot, generation) {
            if let Some((handle, _)) = worker {
                handle.terminate();
            }
            trace!(slot = job.slot, "dropping superseded decimation");
            return Ok(None);
        }

        let values = match worker {
            None => job.run_inline()?,
            Some((handle, request_id)) => {
                let outcome = receive(handle.as_ref(), request_id);
                handle.terminate();
                match outcome {
                    Ok(values) => values,
                    Err(err) => {
                        warn!(error = %err, slot = job.slot, "worker failed, decimating inline");
                        job.run_inline()?
                    }
                }
            }
        };

        if !dispatcher.is_current(job.slot, generation) {
            trace!(slot = job.slot, "decimation superseded while running");
            return Ok(None);
        }
        dispatcher.finish(job.slot, generation);
        Ok(Some(values))
    }
}

fn receive(handle: &dyn WorkerHandle, request_id: u64) -> ChartResult<DecimatedValues> {
    let message = handle.on_message()?;
    match WorkerResponse::from_message(&message)? {
        WorkerResponse::Done {
            request_id: answered,
            values,
        } if answered == request_id => Ok(values),
        WorkerResponse::Done {
            request_id: answered,
            ..
        } => Err(ChartError::Worker(format!(
            "worker answered request {answered}, expected {request_id}"
        ))),
        WorkerResponse::Failed { message, .. } => Err(ChartError::Worker(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::{DecimationDispatcher, DecimationJob};
    use crate::core::{ContinuousScale, DataPoint, Scale, ScaleKind, SeriesBuffer};
    use crate::decimation::{Decimator, DecimatorScales, PointDecimator, SeriesValues};

    fn point_decimator() -> PointDecimator {
        let mut decimator = PointDecimator::default();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 10.0), (0.0, 10.0)),
            y: Scale::new(ScaleKind::Linear),
            state_names: Vec::new(),
        });
        decimator
    }

    #[test]
    fn newer_dispatch_supersedes_older_one() {
        let dispatcher = DecimationDispatcher::inline();
        let decimator = point_decimator();
        let values = SeriesValues::Points(SeriesBuffer::from(vec![DataPoint::new(1.0, 1.0)]));
        let job = DecimationJob {
            slot: "cpu",
            decimator: &decimator,
            x_start: None,
            x_end: None,
            values: &values,
        };

        let first = dispatcher.dispatch(job).expect("dispatch");
        let second = dispatcher.dispatch(job).expect("dispatch");
        assert_eq!(first.wait(&dispatcher).expect("first"), None);
        assert!(second.wait(&dispatcher).expect("second").is_some());
    }
}
