use linked_charts::api::{
    AxisConfig, Chart, ChartDescription, LayoutOptions, LayoutUpdate, SeriesConfig, SeriesKind,
};
use linked_charts::core::{
    AxisAlignment, ContinuousScale, DataPoint, Scale, ScaleKind, SeriesBuffer, TraceBuffer,
    TraceInterval, Viewport,
};
use linked_charts::decimation::{DecimatorKey, DecimatorScales, SeriesValues};
use linked_charts::render::NullRenderer;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn wave(count: usize) -> SeriesValues {
    SeriesValues::Points(SeriesBuffer::from(
        (0..count)
            .map(|i| {
                let x = i as f64;
                DataPoint::new(x, (x * 0.01).sin() * 100.0 + (i % 13) as f64)
            })
            .collect::<Vec<_>>(),
    ))
}

fn scales(end: f64) -> DecimatorScales {
    DecimatorScales {
        x: ContinuousScale::linear((0.0, end), (0.0, 1_920.0)),
        y: Scale::new(ScaleKind::Linear),
        state_names: vec!["busy".to_owned(), "idle".to_owned()],
    }
}

fn bench_point_decimation_1m(c: &mut Criterion) {
    let values = wave(1_000_000);
    let mut decimator = DecimatorKey::Point.create();
    decimator.initialize(scales(1_000_000.0));

    c.bench_function("point_decimation_1m", |b| {
        b.iter(|| {
            let _ = decimator
                .decimate_values(None, None, black_box(&values))
                .expect("decimate");
        })
    });
}

fn bench_min_max_zoomed_1m(c: &mut Criterion) {
    let values = wave(1_000_000);
    let mut decimator = DecimatorKey::MinMax.create();
    decimator.initialize(scales(1_000_000.0));

    c.bench_function("min_max_zoomed_1m", |b| {
        b.iter(|| {
            let _ = decimator
                .decimate_values(black_box(Some(250_000.0)), black_box(Some(500_000.0)), &values)
                .expect("decimate");
        })
    });
}

fn bench_residency_100k(c: &mut Criterion) {
    let intervals: Vec<TraceInterval> = (0..100_000)
        .map(|i| {
            let name = if i % 4 == 0 { "idle" } else { "busy" };
            TraceInterval::new(i as f64 * 10.0, 7.5, name).expect("valid interval")
        })
        .collect();
    let values = SeriesValues::Intervals(TraceBuffer::from(intervals));
    let mut decimator = DecimatorKey::Residency.create();
    decimator.initialize(scales(1_000_000.0));

    c.bench_function("residency_100k", |b| {
        b.iter(|| {
            let _ = decimator
                .decimate_values(None, None, black_box(&values))
                .expect("decimate");
        })
    });
}

fn bench_state_zoomed_tail_1m(c: &mut Criterion) {
    let intervals: Vec<TraceInterval> = (0..1_000_000)
        .map(|i| {
            let name = if i % 5 == 0 { "wait" } else { "run" };
            TraceInterval::new(i as f64 * 2.0, 1.5, name).expect("valid interval")
        })
        .collect();
    let values = SeriesValues::Intervals(TraceBuffer::from(intervals));
    let mut decimator = DecimatorKey::State.create();
    decimator.initialize(scales(2_000_000.0));

    c.bench_function("state_zoomed_tail_1m", |b| {
        b.iter(|| {
            let _ = decimator
                .decimate_values(Some(1_990_000.0), Some(2_000_000.0), black_box(&values))
                .expect("decimate");
        })
    });
}

fn bench_chart_render_200k(c: &mut Criterion) {
    let description = ChartDescription::new("bench")
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("value", AxisAlignment::Left, ScaleKind::Linear).dynamic())
        .with_series(SeriesConfig::new("line", SeriesKind::Line, "time", "value"))
        .with_series(SeriesConfig::new("area", SeriesKind::Area, "time", "value"));
    let mut chart = Chart::finalize(
        NullRenderer::default(),
        description,
        LayoutOptions::new(Viewport::new(1600, 900)),
    )
    .expect("chart init");
    let points: Vec<DataPoint> = (0..200_000)
        .map(|i| DataPoint::new(i as f64, (i % 97) as f64))
        .collect();
    chart.set_points("line", points.clone()).expect("line points");
    chart.set_points("area", points).expect("area points");

    c.bench_function("chart_render_200k", |b| {
        b.iter(|| {
            let _ = chart.render(LayoutUpdate::default()).expect("render");
        })
    });
}

criterion_group!(
    benches,
    bench_point_decimation_1m,
    bench_min_max_zoomed_1m,
    bench_residency_100k,
    bench_state_zoomed_tail_1m,
    bench_chart_render_200k
);
criterion_main!(benches);
