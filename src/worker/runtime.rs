use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{ChartError, ChartResult};
use crate::worker::payload::handle_request_message;

/// Creates message-passing workers.
pub trait WorkerRuntime: Debug + Send + Sync {
    fn spawn(&self) -> ChartResult<Box<dyn WorkerHandle>>;
}

/// One live worker: `post_message` in, `on_message` out.
pub trait WorkerHandle: Send + Sync {
    fn post_message(&self, message: String) -> ChartResult<()>;

    /// Blocks until the worker answers or goes away.
    fn on_message(&self) -> ChartResult<String>;

    /// Stops the worker immediately; a pending answer is discarded.
    fn terminate(&self);
}

/// One short-lived OS thread per request.
#[derive(Debug, Clone, Default)]
pub struct ThreadWorkerRuntime {
    name_prefix: Option<String>,
}

impl ThreadWorkerRuntime {
    #[must_use]
    pub fn with_name_prefix(prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: Some(prefix.into()),
        }
    }
}

impl WorkerRuntime for ThreadWorkerRuntime {
    fn spawn(&self) -> ChartResult<Box<dyn WorkerHandle>> {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (response_tx, response_rx) = mpsc::channel::<String>();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_cancelled = Arc::clone(&cancelled);
        let name = self
            .name_prefix
            .as_deref()
            .map_or_else(
                || "decimation-worker".to_owned(),
                |prefix| format!("{prefix}-decimation"),
            );
        thread::Builder::new()
            .name(name)
            .spawn(move || run_worker(&request_rx, &response_tx, &worker_cancelled))
            .map_err(|err| ChartError::Worker(format!("failed to spawn worker thread: {err}")))?;

        Ok(Box::new(ThreadWorkerHandle {
            requests: Mutex::new(Some(request_tx)),
            responses: Mutex::new(response_rx),
            cancelled,
        }))
    }
}

fn run_worker(requests: &Receiver<String>, responses: &Sender<String>, cancelled: &AtomicBool) {
    let Ok(message) = requests.recv() else {
        return;
    };
    if cancelled.load(Ordering::Acquire) {
        return;
    }
    let response = handle_request_message(&message);
    if cancelled.load(Ordering::Acquire) {
        trace!("worker terminated before replying");
        return;
    }
    let _ = responses.send(response);
}

struct ThreadWorkerHandle {
    requests: Mutex<Option<Sender<String>>>,
    responses: Mutex<Receiver<String>>,
    cancelled: Arc<AtomicBool>,
}

impl WorkerHandle for ThreadWorkerHandle {
    fn post_message(&self, message: String) -> ChartResult<()> {
        let requests = self.requests.lock();
        let Some(sender) = requests.as_ref() else {
            return Err(ChartError::Worker("worker was terminated".to_owned()));
        };
        sender
            .send(message)
            .map_err(|_| ChartError::Worker("worker thread is gone".to_owned()))
    }

    fn on_message(&self) -> ChartResult<String> {
        self.responses
            .lock()
            .recv()
            .map_err(|_| ChartError::Worker("worker exited without a response".to_owned()))
    }

    fn terminate(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.requests.lock().take();
    }
}

/// Runtime whose workers can never be constructed.
#[derive(Debug, Clone, Default)]
pub struct UnavailableWorkerRuntime;

impl WorkerRuntime for UnavailableWorkerRuntime {
    fn spawn(&self) -> ChartResult<Box<dyn WorkerHandle>> {
        Err(ChartError::Worker("worker runtime unavailable".to_owned()))
    }
}

/// Runtime whose workers accept a request and then fail with a runtime error.
#[derive(Debug, Clone, Default)]
pub struct CrashingWorkerRuntime;

impl WorkerRuntime for CrashingWorkerRuntime {
    fn spawn(&self) -> ChartResult<Box<dyn WorkerHandle>> {
        Ok(Box::new(CrashingWorkerHandle))
    }
}

struct CrashingWorkerHandle;

impl WorkerHandle for CrashingWorkerHandle {
    fn post_message(&self, _message: String) -> ChartResult<()> {
        Ok(())
    }

    fn on_message(&self) -> ChartResult<String> {
        Err(ChartError::Worker("worker raised an error event".to_owned()))
    }

    fn terminate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::{ThreadWorkerRuntime, WorkerRuntime};

    #[test]
    fn terminated_worker_rejects_messages() {
        let handle = ThreadWorkerRuntime::default().spawn().expect("spawn");
        handle.terminate();
        assert!(handle.post_message("{}".to_owned()).is_err());
        assert!(handle.on_message().is_err());
    }
}
