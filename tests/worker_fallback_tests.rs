use std::sync::Arc;

use linked_charts::core::{
    ContinuousScale, DataPoint, Scale, ScaleKind, SeriesBuffer, TraceBuffer, TraceInterval,
};
use linked_charts::decimation::{DecimatorKey, DecimatorScales, SeriesValues};
use linked_charts::worker::{
    CrashingWorkerRuntime, DecimationDispatcher, DecimationJob, ThreadWorkerRuntime,
    UnavailableWorkerRuntime, WorkerRuntime,
};

fn points() -> SeriesValues {
    SeriesValues::Points(SeriesBuffer::from(
        (0..5_000)
            .map(|index| DataPoint::new(index as f64 * 0.5, ((index * 31) % 97) as f64))
            .collect::<Vec<_>>(),
    ))
}

fn intervals() -> SeriesValues {
    SeriesValues::Intervals(TraceBuffer::from(
        (0..500)
            .map(|index| {
                let name = if index % 3 == 0 { "idle" } else { "busy" };
                TraceInterval::new(index as f64 * 4.0, 3.0, name).expect("interval")
            })
            .collect::<Vec<_>>(),
    ))
}

fn runtimes() -> Vec<(&'static str, Arc<dyn WorkerRuntime>)> {
    vec![
        ("unavailable", Arc::new(UnavailableWorkerRuntime)),
        ("crashing", Arc::new(CrashingWorkerRuntime)),
        ("threads", Arc::new(ThreadWorkerRuntime::default())),
    ]
}

#[test]
fn every_worker_path_matches_inline_decimation() {
    let cases = [
        (DecimatorKey::Point, points()),
        (DecimatorKey::MinMax, points()),
        (DecimatorKey::Marker, points()),
        (DecimatorKey::State, intervals()),
        (DecimatorKey::Residency, intervals()),
    ];

    for (key, values) in &cases {
        let mut decimator = key.create();
        decimator.initialize(DecimatorScales {
            x: ContinuousScale::linear((0.0, 2_000.0), (0.0, 640.0)),
            y: Scale::new(ScaleKind::Linear),
            state_names: vec!["busy".to_owned(), "idle".to_owned()],
        });
        let job = DecimationJob {
            slot: "series",
            decimator: decimator.as_ref(),
            x_start: Some(250.0),
            x_end: Some(1_750.0),
            values,
        };
        let expected = job.run_inline().expect("inline decimation");

        for (name, runtime) in runtimes() {
            let dispatcher = DecimationDispatcher::with_runtime(runtime);
            let pending = dispatcher.dispatch(job).expect("dispatch");
            let actual = pending
                .wait(&dispatcher)
                .expect("worker path never fails")
                .expect("latest job is current");
            assert_eq!(actual, expected, "{key:?} through {name} runtime");
        }
    }
}

#[test]
fn fan_in_returns_results_in_dispatch_order() {
    let values = points();
    let mut decimator = DecimatorKey::Point.create();
    decimator.initialize(DecimatorScales {
        x: ContinuousScale::linear((0.0, 2_500.0), (0.0, 300.0)),
        y: Scale::new(ScaleKind::Linear),
        state_names: Vec::new(),
    });
    let dispatcher = DecimationDispatcher::with_runtime(Arc::new(ThreadWorkerRuntime::default()));

    let slots = ["a", "b", "c", "d"];
    let pending = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            dispatcher.dispatch(DecimationJob {
                slot,
                decimator: decimator.as_ref(),
                x_start: Some(index as f64 * 100.0),
                x_end: Some(index as f64 * 100.0 + 1_000.0),
                values: &values,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .expect("dispatch");
    let results = dispatcher.join_all(pending);

    assert_eq!(results.len(), slots.len());
    for (index, result) in results.into_iter().enumerate() {
        let output = result.expect("decimated").expect("current");
        let first_visible = output
            .x_values()
            .into_iter()
            .find(|x| *x >= index as f64 * 100.0)
            .expect("visible point");
        assert!(first_visible < index as f64 * 100.0 + 10.0);
    }
}

#[test]
fn superseded_worker_result_is_discarded() {
    let values = points();
    let mut decimator = DecimatorKey::MinMax.create();
    decimator.initialize(DecimatorScales {
        x: ContinuousScale::linear((0.0, 2_500.0), (0.0, 300.0)),
        y: Scale::new(ScaleKind::Linear),
        state_names: Vec::new(),
    });
    let dispatcher = DecimationDispatcher::with_runtime(Arc::new(ThreadWorkerRuntime::default()));
    let job = DecimationJob {
        slot: "cpu",
        decimator: decimator.as_ref(),
        x_start: None,
        x_end: None,
        values: &values,
    };

    let stale = dispatcher.dispatch(job).expect("first");
    let fresh = dispatcher.dispatch(job).expect("second");
    assert_eq!(stale.wait(&dispatcher).expect("stale"), None);
    assert!(fresh.wait(&dispatcher).expect("fresh").is_some());
}
