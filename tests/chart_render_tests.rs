use std::sync::Arc;

use approx::assert_relative_eq;
use linked_charts::api::{
    AxisConfig, Chart, ChartDescription, ChartGroups, LayoutOptions, LayoutUpdate, LegendConfig,
    Relayout, SeriesConfig, SeriesDrawContext, SeriesKind, SeriesRenderer, WorkerOptions,
};
use linked_charts::core::{AxisAlignment, DataPoint, Domain, ScaleKind, TraceInterval, Viewport};
use linked_charts::decimation::DecimatedValues;
use linked_charts::error::ChartError;
use linked_charts::interaction::{GroupHub, PointerInput};
use linked_charts::render::{
    ElementStyle, RecordingRenderer, RectPrimitive, RenderBackend, RenderFrame, RenderLayer,
};
use linked_charts::worker::CrashingWorkerRuntime;

fn line_description(id: &str) -> ChartDescription {
    ChartDescription::new(id)
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("value", AxisAlignment::Left, ScaleKind::Linear).dynamic())
        .with_series(SeriesConfig::new("cpu", SeriesKind::Line, "time", "value"))
}

fn sawtooth(count: usize) -> Vec<DataPoint> {
    (0..count)
        .map(|index| DataPoint::new(index as f64, (index % 50) as f64))
        .collect()
}

fn chart(description: ChartDescription) -> Chart<RecordingRenderer> {
    Chart::finalize(
        RecordingRenderer::default(),
        description,
        LayoutOptions::new(Viewport::new(640, 240)),
    )
    .expect("finalize")
}

fn rendered_line_chart() -> Chart<RecordingRenderer> {
    let mut chart = chart(line_description("lane"));
    chart.set_points("cpu", sawtooth(1_000)).expect("points");
    chart.render(LayoutUpdate::default()).expect("render");
    chart
}

#[test]
fn description_without_axes_or_series_is_rejected() {
    let err = Chart::finalize(
        RecordingRenderer::default(),
        ChartDescription::new("empty"),
        LayoutOptions::new(Viewport::new(100, 100)),
    )
    .expect_err("empty chart");
    assert!(matches!(err, ChartError::EmptyChart));
    assert!(err.is_configuration_error());
}

#[test]
fn debug_output_names_the_chart() {
    let chart = rendered_line_chart();
    let printed = format!("{chart:?}");
    assert!(printed.starts_with("Chart {"));
    assert!(printed.contains("\"lane\""));
    assert!(printed.contains("series: 1"));
}

#[test]
fn zero_sized_viewport_fails_the_render() {
    let mut chart = rendered_line_chart();
    let err = chart
        .render(LayoutUpdate::resize(Viewport::new(0, 240)))
        .expect_err("invalid viewport");
    assert!(matches!(err, ChartError::InvalidViewport { width: 0, height: 240 }));
}

#[test]
fn first_render_draws_axes_and_decimated_series() {
    let chart = rendered_line_chart();
    let renderer = chart.renderer();

    assert!(renderer.frames_for(RenderLayer::Axis).count() >= 2);
    let series = renderer.last_for(RenderLayer::Series).expect("series frame");
    assert_eq!(series.paths.len(), 1);

    let plot = chart.plot_area();
    let decimated = chart.decimated("cpu").expect("decimated");
    assert!(decimated.len() <= plot.width as usize + 1);
    assert_eq!(chart.series_len("cpu"), Some(1_000));
}

#[test]
fn dynamic_axis_is_padded_around_the_data() {
    let chart = rendered_line_chart();
    let (min, max) = chart
        .decimated("cpu")
        .and_then(DecimatedValues::y_extent)
        .expect("extent");
    let padding = (max - min) * 0.05;
    let (start, end) = chart
        .axis("value")
        .and_then(|axis| axis.continuous_domain())
        .expect("dynamic domain");
    assert!(padding > 0.0);
    assert_relative_eq!(start, min - padding, epsilon = 1e-9);
    assert_relative_eq!(end, max + padding, epsilon = 1e-9);
}

#[test]
fn retained_backend_skips_unchanged_layers() {
    let mut chart = rendered_line_chart();
    assert_eq!(chart.backend(), RenderBackend::Svg);
    chart.renderer_mut().clear();

    let report = chart.render(LayoutUpdate::default()).expect("render");
    assert_eq!(report.relayout, Relayout::Reposition);
    assert_eq!(report.passes, 1);
    assert_eq!(chart.renderer().frames_for(RenderLayer::Axis).count(), 0);
    assert_eq!(chart.renderer().frames_for(RenderLayer::Series).count(), 0);
}

#[test]
fn immediate_backend_redraws_every_layer() {
    let mut chart = chart(line_description("lane").with_backend(RenderBackend::Canvas));
    chart.set_points("cpu", sawtooth(200)).expect("points");
    chart.render(LayoutUpdate::default()).expect("first");
    chart.renderer_mut().clear();

    chart.render(LayoutUpdate::default()).expect("second");
    assert!(chart.renderer().frames_for(RenderLayer::Axis).count() >= 2);
    assert_eq!(chart.renderer().frames_for(RenderLayer::Series).count(), 1);
}

#[test]
fn resize_relays_out_every_axis() {
    let mut chart = rendered_line_chart();
    chart.renderer_mut().clear();
    let report = chart
        .render(LayoutUpdate::resize(Viewport::new(900, 300)))
        .expect("resize");
    assert_eq!(report.relayout, Relayout::Full);
    assert!(chart.renderer().frames_for(RenderLayer::Axis).count() >= 2);
    assert_eq!(chart.get_options().layout.viewport, Viewport::new(900, 300));
}

#[test]
fn legend_row_change_costs_exactly_one_more_pass() {
    let mut description = ChartDescription::new("legend")
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("value", AxisAlignment::Left, ScaleKind::Linear))
        .with_legend(LegendConfig::new("legend"));
    for index in 0..12 {
        description = description.with_series(
            SeriesConfig::new(format!("series-{index}"), SeriesKind::Line, "time", "value")
                .with_label(format!("a fairly long series label {index}")),
        );
    }
    let mut chart = chart(description);

    let first = chart.render(LayoutUpdate::default()).expect("first");
    assert_eq!(first.passes, 2);
    assert!(first.legend_rows > 1);

    let second = chart.render(LayoutUpdate::default()).expect("second");
    assert_eq!(second.passes, 1);
    assert_eq!(second.legend_rows, first.legend_rows);

    let expected_height = 240.0 - 10.0 - 30.0 - chart.legend().height();
    assert_relative_eq!(chart.plot_area().height, expected_height);
}

#[test]
fn stale_series_are_redrawn_before_new_output_arrives() {
    let description = ChartDescription::new("stale")
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("value", AxisAlignment::Left, ScaleKind::Linear))
        .with_series(SeriesConfig::new("cpu", SeriesKind::Line, "time", "value").keep_stale());
    let mut chart = chart(description);
    chart.set_points("cpu", sawtooth(100)).expect("points");
    assert_eq!(chart.render(LayoutUpdate::default()).expect("first").stale_redraws, 0);

    chart.set_points("cpu", sawtooth(300)).expect("points");
    let report = chart.render(LayoutUpdate::default()).expect("second");
    assert_eq!(report.stale_redraws, 1);
    assert_eq!(report.decimated, 1);
}

#[test]
fn zoom_helpers_halve_double_and_pan_the_window() {
    let mut chart = rendered_line_chart();

    chart.pan_left().expect("pan");
    assert_eq!(chart.zoom_window(), None, "panning an unzoomed chart does nothing");

    let outcome = chart.zoom_in().expect("zoom in");
    assert!(outcome.render.is_some());
    let (start, end) = chart.zoom_window().expect("zoomed");
    assert_relative_eq!(start, 249.75);
    assert_relative_eq!(end, 749.25);
    assert_eq!(
        chart.primary_x_axis().and_then(|axis| axis.continuous_domain()),
        Some((249.75, 749.25))
    );

    chart.pan_right().expect("pan");
    let (start, end) = chart.zoom_window().expect("panned");
    assert_relative_eq!(start, 374.625);
    assert_relative_eq!(end, 874.125);

    chart.pan_right().expect("pan");
    chart.pan_right().expect("pan");
    let (_, end) = chart.zoom_window().expect("clamped");
    assert_relative_eq!(end, 999.0);

    chart.zoom_out().expect("zoom out");
    assert_eq!(chart.zoom_window(), None, "a window covering everything resets");

    chart.zoom_in().expect("zoom in");
    chart.zoom_reset().expect("reset");
    assert_eq!(chart.zoom_window(), None);
    assert_eq!(
        chart.primary_x_axis().and_then(|axis| axis.continuous_domain()),
        Some((0.0, 999.0))
    );
}

#[test]
fn zoomed_decimation_only_covers_the_window() {
    let mut chart = rendered_line_chart();
    chart.zoom_to(100.0, 200.0).expect("zoom");
    let xs = chart.decimated("cpu").expect("decimated").x_values();
    assert!(xs.iter().skip(1).all(|x| (100.0..=200.0).contains(x)));
}

#[test]
fn save_image_serializes_the_composed_layers() {
    let mut chart = rendered_line_chart();
    chart.zoom_to(10.0, 20.0).expect("zoom");
    let json = chart.save_image().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["chart"], "lane");
    assert_eq!(value["zoom_window"][0], 10.0);
    let frames = value["frames"].as_array().expect("frames");
    assert!(!frames.is_empty());

    let snapshot = chart.snapshot();
    let layers: Vec<RenderLayer> = snapshot.frames.iter().map(|frame| frame.layer).collect();
    assert!(layers.windows(2).all(|pair| pair[0].z_index() <= pair[1].z_index()));
}

#[test]
fn options_round_trip_through_json() {
    let chart = rendered_line_chart();
    let options = chart.get_options();
    assert_eq!(options.description.series.len(), 1);
    let json = options.description.to_json_pretty().expect("json");
    let parsed = ChartDescription::from_json(&json).expect("parsed");
    assert_eq!(parsed, options.description);
}

#[test]
fn tooltips_from_one_group_are_merged() {
    let description = ChartDescription::new("merged")
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("value", AxisAlignment::Left, ScaleKind::Linear))
        .with_series(
            SeriesConfig::new("user", SeriesKind::Line, "time", "value").with_group("cpu"),
        )
        .with_series(
            SeriesConfig::new("system", SeriesKind::Line, "time", "value").with_group("cpu"),
        );
    let mut chart = chart(description);
    chart
        .set_points("user", vec![DataPoint::new(0.0, 1.0), DataPoint::new(10.0, 2.0)])
        .expect("user");
    chart
        .set_points("system", vec![DataPoint::new(0.0, 3.0), DataPoint::new(10.0, 4.0)])
        .expect("system");
    chart.render(LayoutUpdate::default()).expect("render");

    let sections = chart.tooltip_at(9.0);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].group, "cpu");
    assert_eq!(sections[0].entries.get("user").map(String::as_str), Some("2"));
    assert_eq!(sections[0].entries.get("system").map(String::as_str), Some("4"));
}

#[test]
fn flame_tooltip_shows_call_path_and_self_time() {
    let description = ChartDescription::new("flame")
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("depth", AxisAlignment::Left, ScaleKind::Linear))
        .with_series(SeriesConfig::new("calls", SeriesKind::Flame, "time", "depth"));
    let mut chart = chart(description);
    chart
        .set_intervals(
            "calls",
            vec![
                TraceInterval::new(0.0, 10.0, "main").expect("main"),
                TraceInterval::new(0.0, 5.0, "parse").expect("parse"),
                TraceInterval::new(6.0, 2.0, "eval").expect("eval"),
            ],
        )
        .expect("intervals");
    chart.render(LayoutUpdate::default()).expect("render");

    let sections = chart.tooltip_at(2.0);
    assert_eq!(sections.len(), 1);
    let entries = &sections[0].entries;
    assert_eq!(entries.get("calls").map(String::as_str), Some("main > parse"));
    assert_eq!(entries.get("calls self time").map(String::as_str), Some("5"));

    let root = chart.tooltip_at(5.5);
    assert_eq!(root[0].entries.get("calls").map(String::as_str), Some("main"));
    assert_eq!(root[0].entries.get("calls self time").map(String::as_str), Some("3"));
}

#[test]
fn bar_hover_highlights_the_category_under_the_pointer() {
    let description = ChartDescription::new("bars")
        .with_axis(
            AxisConfig::new("host", AxisAlignment::Bottom, ScaleKind::Band)
                .with_domain(Domain::Categories(vec!["a".into(), "b".into(), "c".into()])),
        )
        .with_axis(AxisConfig::new("load", AxisAlignment::Left, ScaleKind::Linear).dynamic())
        .with_series(SeriesConfig::new("load", SeriesKind::Bar, "host", "load"));
    let mut chart = chart(description);
    chart
        .set_points(
            "load",
            vec![DataPoint::new(0.0, 3.0), DataPoint::new(1.0, 5.0), DataPoint::new(2.0, 1.0)],
        )
        .expect("bars");
    chart.render(LayoutUpdate::default()).expect("render");

    let center = {
        let band = chart
            .primary_x_axis()
            .and_then(|axis| axis.scale().as_band())
            .expect("band axis");
        band.map("b").expect("b") + band.bandwidth() / 2.0
    };
    let outcome = chart
        .handle_pointer(PointerInput::Move { x: center, y: 10.0 })
        .expect("move");
    assert_eq!(outcome.derived, 1);
    assert!(chart.hover_styles().is_highlighted("b"));
    assert_eq!(outcome.tooltip.len(), 1);
    assert_eq!(outcome.tooltip[0].entries.get("load").map(String::as_str), Some("5"));

    let plot = chart.plot_area();
    let crosshair = chart.renderer().last_for(RenderLayer::Crosshair).expect("crosshair");
    assert_eq!(crosshair.lines.len(), 1);
    assert_relative_eq!(crosshair.lines[0].x1, plot.left + center, epsilon = 1e-9);
    assert_relative_eq!(crosshair.lines[0].x2, plot.left + center, epsilon = 1e-9);

    chart.handle_pointer(PointerInput::Leave).expect("leave");
    assert!(chart.hover_styles().is_empty());
    let crosshair = chart.renderer().last_for(RenderLayer::Crosshair).expect("crosshair");
    assert!(crosshair.lines.is_empty());
}

#[derive(Debug)]
struct BlockRenderer;

impl SeriesRenderer for BlockRenderer {
    fn name(&self) -> &'static str {
        "block"
    }

    fn draw(
        &self,
        context: &SeriesDrawContext<'_>,
        values: &DecimatedValues,
        frame: &mut RenderFrame,
    ) {
        let (left, top) = context.plot_origin;
        frame.rects.push(RectPrimitive::new(
            left,
            top,
            values.len() as f64,
            1.0,
            ElementStyle::default(),
        ));
    }
}

#[test]
fn earlier_series_renderer_registration_wins() {
    let mut chart = chart(line_description("custom"));
    chart
        .series_renderers_mut()
        .register_before("line", "block", |kind, _| kind == SeriesKind::Line, || {
            Box::new(BlockRenderer)
        })
        .expect("line is registered");
    assert_eq!(chart.series_renderers_mut().names()[..3], ["bar", "scatter", "block"]);

    chart.set_points("cpu", sawtooth(10)).expect("points");
    chart.render(LayoutUpdate::default()).expect("render");
    let series = chart.renderer().last_for(RenderLayer::Series).expect("series");
    assert_eq!(series.rects.len(), 1);
    assert!(series.paths.is_empty());

    let err = chart
        .series_renderers_mut()
        .register_before("missing", "other", |_, _| true, || Box::new(BlockRenderer))
        .expect_err("unknown anchor");
    assert!(err.is_configuration_error());
}

#[test]
fn ring_backed_series_keeps_only_the_newest_samples() {
    let description = ChartDescription::new("stream")
        .with_axis(AxisConfig::new("time", AxisAlignment::Bottom, ScaleKind::Linear))
        .with_axis(AxisConfig::new("value", AxisAlignment::Left, ScaleKind::Linear))
        .with_series(
            SeriesConfig::new("cpu", SeriesKind::Line, "time", "value").with_ring_capacity(100),
        );
    let mut chart = chart(description);
    chart.set_points("cpu", sawtooth(500)).expect("points");
    chart.append_point("cpu", DataPoint::new(500.0, 7.0)).expect("append");
    assert_eq!(chart.series_len("cpu"), Some(100));

    chart.render(LayoutUpdate::default()).expect("render");
    assert_eq!(
        chart.primary_x_axis().and_then(|axis| axis.continuous_domain()),
        Some((401.0, 500.0))
    );
}

#[test]
fn worker_decimation_matches_inline_decimation() {
    let mut inline = rendered_line_chart();
    inline.render(LayoutUpdate::default()).expect("inline");

    let mut threaded = Chart::finalize(
        RecordingRenderer::default(),
        line_description("lane").with_workers(WorkerOptions {
            enabled: true,
            name_prefix: Some("decimate".to_owned()),
        }),
        LayoutOptions::new(Viewport::new(640, 240)),
    )
    .expect("finalize");
    threaded.set_points("cpu", sawtooth(1_000)).expect("points");
    threaded.render(LayoutUpdate::default()).expect("threaded");
    assert_eq!(threaded.decimated("cpu"), inline.decimated("cpu"));

    let mut crashing = chart(line_description("lane"))
        .with_worker_runtime(Arc::new(CrashingWorkerRuntime));
    crashing.set_points("cpu", sawtooth(1_000)).expect("points");
    crashing.render(LayoutUpdate::default()).expect("fallback");
    assert_eq!(crashing.decimated("cpu"), inline.decimated("cpu"));
}

#[test]
fn render_group_siblings_are_reported() {
    let hub = GroupHub::new();
    let groups = ChartGroups {
        render: Some("row".to_owned()),
        ..ChartGroups::default()
    };
    let mut a = chart(line_description("a").with_groups(groups.clone()));
    let mut b = chart(line_description("b").with_groups(groups));
    a.attach_hub(hub.clone());
    b.attach_hub(hub.clone());

    a.set_points("cpu", sawtooth(10)).expect("points");
    let report = a.render(LayoutUpdate::default()).expect("render");
    assert_eq!(report.group_render, vec![b.id().clone()]);

    b.detach_hub();
    let report = a.render(LayoutUpdate::default()).expect("render");
    assert!(report.group_render.is_empty());
}
