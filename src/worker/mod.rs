mod dispatch;
mod payload;
mod runtime;

pub use dispatch::{DecimationDispatcher, DecimationJob, PendingDecimation};
pub use payload::{PayloadValues, WorkerRequest, WorkerResponse, handle_request_message};
pub use runtime::{
    CrashingWorkerRuntime, ThreadWorkerRuntime, UnavailableWorkerRuntime, WorkerHandle,
    WorkerRuntime,
};
